//! Fixed-layout control requests understood by the device shell.
//!
//! Little-endian, 82 bytes:
//! `"WA" | op u8 | reserved u8 | offset u64 | size u32 | name_len u16 | name [u8; 64]`

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use crate::error::ConsoleError;

pub const REQUEST_MAGIC: &[u8; 2] = b"WA";
pub const NAME_FIELD_LEN: usize = 64;
pub const REQUEST_LEN: usize = 2 + 1 + 1 + 8 + 4 + 2 + NAME_FIELD_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RequestOp {
    PutFile = 1,
    GetFile = 2,
    GetVersion = 3,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlRequest {
    pub op: RequestOp,
    pub offset: u64,
    pub size: u32,
    name: Vec<u8>,
}

impl ControlRequest {
    pub fn new(op: RequestOp, name: &[u8]) -> Result<Self, ConsoleError> {
        if name.len() > NAME_FIELD_LEN {
            return Err(ConsoleError::NameTooLong(name.len()));
        }
        Ok(Self {
            op,
            offset: 0,
            size: 0,
            name: name.to_vec(),
        })
    }

    pub fn get_version() -> Self {
        Self {
            op: RequestOp::GetVersion,
            offset: 0,
            size: 0,
            name: Vec::new(),
        }
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn name(&self) -> &[u8] {
        &self.name
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(REQUEST_LEN);
        buf.put_slice(REQUEST_MAGIC);
        buf.put_u8(self.op as u8);
        buf.put_u8(0);
        buf.put_u64_le(self.offset);
        buf.put_u32_le(self.size);
        buf.put_u16_le(self.name.len() as u16);
        buf.put_slice(&self.name);
        buf.put_bytes(0, NAME_FIELD_LEN - self.name.len());
        buf.freeze()
    }
}

/// Firmware version reported by the shell (three raw bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl ShellVersion {
    pub fn from_bytes(b: [u8; 3]) -> Self {
        Self {
            major: b[0],
            minor: b[1],
            patch: b[2],
        }
    }
}

impl fmt::Display for ShellVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
