//! Operator quit: the `q` key or Ctrl-C.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

pub type QuitFlag = Arc<AtomicBool>;

/// Raw mode for as long as this lives.
pub struct RawModeGuard(());

impl RawModeGuard {
    pub fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self(()))
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

pub fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => true,
        // Raw mode swallows SIGINT.
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Ctrl-C delivered as a signal (no terminal, or raw mode unavailable).
pub fn spawn_ctrl_c(flag: QuitFlag) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received");
            flag.store(true, Ordering::Release);
        }
    })
}

/// Watches the terminal for a quit key until the flag is set by anyone.
pub fn spawn_key_listener(flag: QuitFlag) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let _raw = match RawModeGuard::enable() {
            Ok(guard) => guard,
            Err(e) => {
                tracing::warn!(error = %e, "No raw terminal; press Ctrl-C to quit");
                return;
            }
        };

        while !flag.load(Ordering::Acquire) {
            match poll_quit_key(Duration::from_millis(100)) {
                Ok(true) => {
                    tracing::info!("Quit key pressed");
                    flag.store(true, Ordering::Release);
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Terminal input failed; key listener stopped");
                    return;
                }
            }
        }
    })
}

fn poll_quit_key(timeout: Duration) -> io::Result<bool> {
    if !event::poll(timeout)? {
        return Ok(false);
    }
    match event::read()? {
        Event::Key(key) => Ok(is_quit_key(&key)),
        _ => Ok(false),
    }
}
