//! # Clipdeck IO
//!
//! The Console Bridge.
//! Attaches to the microcontroller's remote shell over TCP and speaks its
//! small length-prefixed frame protocol. Everything above this crate only
//! ever sees bytes and text.

pub mod error;
pub mod frame;
pub mod request;
pub mod session;

pub use error::{ConsoleError, FrameError};
pub use frame::{Frame, Opcode};
pub use request::{ControlRequest, RequestOp, ShellVersion};
pub use session::{ConsoleConfig, ConsoleSession, SessionState};
