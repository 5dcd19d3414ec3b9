use thiserror::Error;

/// Problems with a single frame on the wire.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("payload of {0} bytes exceeds the 65535-byte frame limit")]
    PayloadTooLarge(usize),

    #[error("unsupported frame length marker {0}")]
    BadLengthMarker(u8),

    #[error("frame payload of {got} bytes cannot satisfy a {wanted}-byte read")]
    ShortPayload { wanted: usize, got: usize },

    #[error("stream ended inside a frame")]
    Truncated,
}

/// Session-level failures. Every variant except `NameTooLong` ends the session.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("console closed the connection")]
    Closed,

    #[error("upgrade rejected: {0:?}")]
    HandshakeRejected(String),

    #[error("unexpected byte {0:#04x} after ':' in login prompt")]
    UnexpectedPrompt(u8),

    #[error("request name is {0} bytes; at most 64 fit")]
    NameTooLong(usize),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
