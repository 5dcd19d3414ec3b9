//! External player process.
//!
//! One child per clip. A live child counts as a frame being shown; once it
//! exits the clip is over. Rewinding restarts the child.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Instant;

use anyhow::{Context, Result};
use clipdeck_core::{AudioFrame, FrameStep, MediaError, MediaPlayer};

use crate::config::PlayerSection;

pub struct ProcessPlayer {
    program: PathBuf,
    args: Vec<String>,
    clip: Option<PathBuf>,
    child: Option<Child>,
    started: Option<Instant>,
}

impl std::fmt::Debug for ProcessPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessPlayer")
            .field("program", &self.program)
            .field("clip", &self.clip)
            .field("pid", &self.child.as_ref().map(Child::id))
            .finish()
    }
}

impl ProcessPlayer {
    /// Resolves the player program on `PATH`.
    pub fn new(section: &PlayerSection) -> Result<Self> {
        let program = which::which(&section.program)
            .with_context(|| format!("Player program '{}' not found", section.program))?;
        tracing::info!(program = %program.display(), "Using external player");

        Ok(Self {
            program,
            args: section.args.clone(),
            clip: None,
            child: None,
            started: None,
        })
    }

    pub fn clip(&self) -> Option<&Path> {
        self.clip.as_deref()
    }

    pub fn child_is_alive(&mut self) -> bool {
        match self.child.as_mut().map(Child::try_wait) {
            Some(Ok(None)) => true,
            Some(Ok(Some(_))) | None => false,
            Some(Err(_)) => true,
        }
    }

    fn spawn(&mut self, path: &Path) -> Result<(), MediaError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| MediaError::Open {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        tracing::debug!(pid = child.id(), clip = %path.display(), "Player started");
        self.child = Some(child);
        self.started = Some(Instant::now());
        Ok(())
    }

    fn kill_child(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
            tracing::debug!(pid = child.id(), "Player stopped");
        }
        self.started = None;
    }
}

impl MediaPlayer for ProcessPlayer {
    fn open(&mut self, path: &Path) -> Result<(), MediaError> {
        self.kill_child();
        self.clip = None;

        if !path.is_file() {
            return Err(MediaError::Open {
                path: path.to_path_buf(),
                reason: "no such file".to_string(),
            });
        }

        self.spawn(path)?;
        self.clip = Some(path.to_path_buf());
        Ok(())
    }

    fn read_frame(&mut self) -> Result<FrameStep, MediaError> {
        let Some(child) = self.child.as_mut() else {
            return Err(MediaError::NotOpen);
        };

        match child.try_wait() {
            Ok(None) => Ok(FrameStep::Frame),
            Ok(Some(status)) => {
                if !status.success() {
                    tracing::debug!(%status, "Player exited with failure");
                }
                Ok(FrameStep::EndOfStream)
            }
            Err(e) => Err(MediaError::Playback(e.to_string())),
        }
    }

    fn read_audio(&mut self) -> Option<AudioFrame> {
        // The child renders its own audio; report its clock.
        self.started.map(|t| AudioFrame {
            pts: t.elapsed().as_secs_f64(),
        })
    }

    fn seek_start(&mut self) -> Result<(), MediaError> {
        let path = self.clip.clone().ok_or(MediaError::NotOpen)?;
        self.kill_child();
        self.spawn(&path)
            .map_err(|e| MediaError::Seek(e.to_string()))
    }

    fn release(&mut self) {
        self.kill_child();
        self.clip = None;
    }
}

impl Drop for ProcessPlayer {
    fn drop(&mut self) {
        self.kill_child();
    }
}
