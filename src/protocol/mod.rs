//! Tuple space wire protocol
//!
//! This module provides length-prefixed framing and the request and
//! response messages carried in those frames.

pub mod command;
pub mod frame;
pub mod response;

pub use command::Command;
pub use frame::FrameError;
pub use response::Response;
