use std::io::{self, Write};

use tracing_subscriber::EnvFilter;

/// Turns bare `\n` into `\r\n`. The quit key listener keeps the terminal
/// raw, where a bare newline does not return the cursor.
pub struct CrlfWriter<W>(pub W);

impl<W: Write> Write for CrlfWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut start = 0;
        for (i, &b) in buf.iter().enumerate() {
            if b == b'\n' && (i == 0 || buf[i - 1] != b'\r') {
                self.0.write_all(&buf[start..i])?;
                self.0.write_all(b"\r\n")?;
                start = i + 1;
            }
        }
        self.0.write_all(&buf[start..])?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

/// `RUST_LOG` wins; otherwise `level` applies to every target.
pub fn init_tracing(level: &str) {
    // RUST_LOG=clipdeck_core=debug,clipdeck_io=trace
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(|| CrlfWriter(io::stderr()))
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .compact()
        .try_init();
}

pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        // The key listener may have left the terminal raw.
        let _ = crossterm::terminal::disable_raw_mode();

        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| info.payload().downcast_ref::<String>().map(|s| s.as_str()))
            .unwrap_or("<non-string panic payload>");

        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "<unknown>".to_string());

        tracing::error!(%location, %payload, "panic");
    }));
}
