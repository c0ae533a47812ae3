use crate::protocol::frame::{self, FrameError};

/// Server responses, one per request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// READ found the key
    Read { key: String, value: String },
    /// GET found and removed the key
    Removed { key: String, value: String },
    /// PUT inserted the key
    Added { key: String },
    /// READ or GET against an absent key
    NotFound { key: String },
    /// PUT against a present key
    AlreadyExists { key: String },
}

impl Response {
    /// Whether this response reports a failed operation
    pub fn is_error(&self) -> bool {
        matches!(self, Response::NotFound { .. } | Response::AlreadyExists { .. })
    }

    /// Response text without the length header
    pub fn body(&self) -> String {
        match self {
            Response::Read { key, value } => format!("OK ({}, {}) read", key, value),
            Response::Removed { key, value } => format!("OK ({}, {}) removed", key, value),
            Response::Added { key } => format!("OK {} added", key),
            Response::NotFound { key } => format!("ERR {} does not exist", key),
            Response::AlreadyExists { key } => format!("ERR {} already exists", key),
        }
    }

    /// Encode to a complete length-prefixed frame
    pub fn encode(&self) -> Result<String, FrameError> {
        frame::encode(&self.body())
    }
}
