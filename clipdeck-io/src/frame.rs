//! Length-prefixed console frames.
//!
//! ```text
//! short:    | opcode | len (0..=125) | payload      |
//! extended: | opcode | 126 | len u16 BE | payload   |
//! ```
//!
//! No masking and no fragmentation. The console never sends more than
//! 65535 bytes in one frame.

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ConsoleError, FrameError};

pub const SHORT_LEN_MAX: usize = 125;
pub const EXTENDED_LEN_MARKER: u8 = 126;
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// Frame type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Text,
    Binary,
    Other(u8),
}

impl Opcode {
    pub const TEXT: u8 = 0x81;
    pub const BINARY: u8 = 0x82;

    pub fn from_byte(b: u8) -> Self {
        match b {
            Self::TEXT => Opcode::Text,
            Self::BINARY => Opcode::Binary,
            other => Opcode::Other(other),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Opcode::Text => Self::TEXT,
            Opcode::Binary => Self::BINARY,
            Opcode::Other(b) => b,
        }
    }

    /// Binary frames are always delivered; text frames only when the
    /// caller is reading shell output.
    pub fn is_accepted(self, text_ok: bool) -> bool {
        match self {
            Opcode::Binary => true,
            Opcode::Text => text_ok,
            Opcode::Other(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub opcode: Opcode,
    pub payload: Bytes,
}

/// Append one encoded frame to `dst`.
pub fn encode_frame(opcode: Opcode, payload: &[u8], dst: &mut BytesMut) -> Result<(), FrameError> {
    let len = payload.len();
    if len > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge(len));
    }

    dst.reserve(len + 4);
    dst.put_u8(opcode.as_byte());
    if len <= SHORT_LEN_MAX {
        dst.put_u8(len as u8);
    } else {
        dst.put_u8(EXTENDED_LEN_MARKER);
        dst.put_u16(len as u16);
    }
    dst.put_slice(payload);
    Ok(())
}

pub async fn write_frame<W>(writer: &mut W, opcode: Opcode, payload: &[u8]) -> Result<(), ConsoleError>
where
    W: AsyncWrite + Unpin,
{
    let mut buf = BytesMut::new();
    encode_frame(opcode, payload, &mut buf)?;
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one complete frame, whatever its opcode.
///
/// A clean EOF before the first header byte is `ConsoleError::Closed`;
/// EOF anywhere later is `FrameError::Truncated`.
pub async fn read_frame<R>(reader: &mut R) -> Result<Frame, ConsoleError>
where
    R: AsyncRead + Unpin,
{
    let mut hdr = [0u8; 2];
    fill(reader, &mut hdr, true).await?;

    let opcode = Opcode::from_byte(hdr[0]);
    let len = match hdr[1] {
        n if n as usize <= SHORT_LEN_MAX => n as usize,
        EXTENDED_LEN_MARKER => {
            let mut ext = [0u8; 2];
            fill(reader, &mut ext, false).await?;
            u16::from_be_bytes(ext) as usize
        }
        other => return Err(FrameError::BadLengthMarker(other).into()),
    };

    let mut payload = vec![0u8; len];
    fill(reader, &mut payload, false).await?;

    Ok(Frame {
        opcode,
        payload: Bytes::from(payload),
    })
}

async fn fill<R>(reader: &mut R, buf: &mut [u8], at_boundary: bool) -> Result<(), ConsoleError>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            return Err(if at_boundary && filled == 0 {
                ConsoleError::Closed
            } else {
                FrameError::Truncated.into()
            });
        }
        filled += n;
    }
    Ok(())
}
