use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{ConsoleError, FrameError};
use crate::frame::{self, Frame, Opcode};
use crate::request::{ControlRequest, ShellVersion};

/// Where the console lives and how to log in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub host: String,
    pub port: u16,
    pub password: String,
    /// Require a `101` status line from the upgrade response.
    pub strict_handshake: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            host: "192.168.4.1".to_string(),
            port: 8266,
            password: "repl".to_string(),
            strict_handshake: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Socket open, still speaking plain HTTP.
    Connected,
    /// Upgrade done; all traffic is framed.
    FrameMode,
    /// Password sent. The device never confirms it.
    Authenticated,
    Closed,
}

/// One live console connection.
pub struct ConsoleSession<S> {
    stream: S,
    /// Unread remainder of the last accepted frame.
    pending: Bytes,
    state: SessionState,
}

impl<S> std::fmt::Debug for ConsoleSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleSession")
            .field("stream", &"<stream>")
            .field("pending", &self.pending.len())
            .field("state", &self.state)
            .finish()
    }
}

impl ConsoleSession<TcpStream> {
    /// Connect, upgrade and log in.
    pub async fn connect(config: &ConsoleConfig) -> Result<Self, ConsoleError> {
        let addr = format!("{}:{}", config.host, config.port);
        tracing::info!(%addr, "Connecting to console");

        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|source| ConsoleError::Connect {
                addr: addr.clone(),
                source,
            })?;
        stream.set_nodelay(true)?;

        let mut session = Self::new(stream);
        session
            .handshake(&config.host, config.strict_handshake)
            .await?;
        session.login(&config.password).await?;
        Ok(session)
    }
}

impl<S> ConsoleSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            pending: Bytes::new(),
            state: SessionState::Connected,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Send the upgrade request and skip the response headers.
    ///
    /// Any reply counts as success unless `strict` is set.
    pub async fn handshake(&mut self, host: &str, strict: bool) -> Result<(), ConsoleError> {
        let request = format!(
            "GET / HTTP/1.1\r\nHost: {host}\r\nConnection: Upgrade\r\nUpgrade: websocket\r\nSec-WebSocket-Key: foo\r\n\r\n"
        );
        self.stream.write_all(request.as_bytes()).await?;
        self.stream.flush().await?;

        let status = self.read_header_line().await?;
        let status = String::from_utf8_lossy(&status).trim_end().to_string();
        tracing::debug!(%status, "Upgrade response");
        if strict && !status.contains(" 101") {
            return Err(self.fail(ConsoleError::HandshakeRejected(status)));
        }

        loop {
            let line = self.read_header_line().await?;
            if line == b"\r\n" {
                break;
            }
        }

        self.state = SessionState::FrameMode;
        Ok(())
    }

    /// Wait for the `": "` password prompt and answer it.
    pub async fn login(&mut self, password: &str) -> Result<(), ConsoleError> {
        loop {
            let c = self.read(1, true).await?;
            if c[..] == *b":" {
                let next = self.read(1, true).await?;
                if next[..] != *b" " {
                    return Err(self.fail(ConsoleError::UnexpectedPrompt(next[0])));
                }
                break;
            }
        }

        let mut answer = Vec::with_capacity(password.len() + 1);
        answer.extend_from_slice(password.as_bytes());
        answer.push(b'\r');
        self.write(&answer, Opcode::Binary).await?;

        self.state = SessionState::Authenticated;
        tracing::info!("Console password sent");
        Ok(())
    }

    pub async fn write(&mut self, data: &[u8], opcode: Opcode) -> Result<(), ConsoleError> {
        self.ensure_open()?;
        match frame::write_frame(&mut self.stream, opcode, data).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Read exactly `n` bytes of frame payload.
    ///
    /// Leftover payload is kept for the next call. A fresh frame that is
    /// shorter than `n` is fatal.
    pub async fn read(&mut self, n: usize, text_ok: bool) -> Result<Bytes, ConsoleError> {
        if n == 0 {
            return Ok(Bytes::new());
        }
        if self.pending.is_empty() {
            let frame = self.next_frame(text_ok).await?;
            self.pending = frame.payload;
        }
        if self.pending.len() < n {
            let got = self.pending.len();
            self.pending = Bytes::new();
            return Err(self.fail(FrameError::ShortPayload { wanted: n, got }.into()));
        }
        Ok(self.pending.split_to(n))
    }

    /// Whatever payload is available next: the buffered remainder, or the
    /// next accepted frame.
    pub async fn read_chunk(&mut self, text_ok: bool) -> Result<Bytes, ConsoleError> {
        if !self.pending.is_empty() {
            return Ok(std::mem::take(&mut self.pending));
        }
        Ok(self.next_frame(text_ok).await?.payload)
    }

    pub async fn get_version(&mut self) -> Result<ShellVersion, ConsoleError> {
        let request = ControlRequest::get_version().encode();
        self.write(&request, Opcode::Binary).await?;
        let d = self.read(3, false).await?;
        Ok(ShellVersion::from_bytes([d[0], d[1], d[2]]))
    }

    pub async fn close(&mut self) -> Result<(), ConsoleError> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        self.state = SessionState::Closed;
        self.pending = Bytes::new();
        self.stream.shutdown().await?;
        Ok(())
    }

    async fn next_frame(&mut self, text_ok: bool) -> Result<Frame, ConsoleError> {
        self.ensure_open()?;
        loop {
            let frame = match frame::read_frame(&mut self.stream).await {
                Ok(frame) => frame,
                Err(e) => return Err(self.fail(e)),
            };
            if frame.opcode.is_accepted(text_ok) {
                return Ok(frame);
            }
            tracing::trace!(
                opcode = frame.opcode.as_byte(),
                len = frame.payload.len(),
                "Discarding out-of-band frame"
            );
        }
    }

    /// One `\n`-terminated line of the plain-HTTP response, read a byte at
    /// a time so nothing past the headers is consumed.
    async fn read_header_line(&mut self) -> Result<Vec<u8>, ConsoleError> {
        let mut line = Vec::new();
        loop {
            let mut b = [0u8; 1];
            let n = self.stream.read(&mut b).await?;
            if n == 0 {
                return Err(self.fail(ConsoleError::Closed));
            }
            line.push(b[0]);
            if b[0] == b'\n' {
                return Ok(line);
            }
        }
    }

    fn ensure_open(&self) -> Result<(), ConsoleError> {
        if self.state == SessionState::Closed {
            Err(ConsoleError::Closed)
        } else {
            Ok(())
        }
    }

    fn fail(&mut self, err: ConsoleError) -> ConsoleError {
        self.state = SessionState::Closed;
        err
    }
}
