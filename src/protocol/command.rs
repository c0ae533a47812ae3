use crate::protocol::frame::{self, FrameError, MAX_TUPLE_LEN};
use crate::protocol::response::Response;
use crate::store::{PutOutcome, TupleStore};

/// Tuple space request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `R <key>`
    Read { key: String },
    /// `G <key>`
    Get { key: String },
    /// `P <key> <value>`
    Put { key: String, value: String },
}

impl Command {
    pub fn key(&self) -> &str {
        match self {
            Command::Read { key } | Command::Get { key } | Command::Put { key, .. } => key,
        }
    }

    /// Single-letter operation code
    pub fn op(&self) -> char {
        match self {
            Command::Read { .. } => 'R',
            Command::Get { .. } => 'G',
            Command::Put { .. } => 'P',
        }
    }

    /// Decode a complete request frame.
    ///
    /// The body splits on its first two spaces into op, key and the rest;
    /// for PUT the rest is the value verbatim, spaces included.
    pub fn from_frame(frame: &str) -> Result<Self, FrameError> {
        let body = frame::body(frame)?;
        let mut parts = body.splitn(3, ' ');

        let op = parts.next().unwrap_or_default();
        let key = match parts.next() {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => return Err(FrameError::malformed("missing key")),
        };
        let rest = parts.next();

        // Applies to every op: responses echo the key, and must fit the length field.
        if key.len() + rest.map_or(0, str::len) > MAX_TUPLE_LEN {
            return Err(FrameError::malformed(format!(
                "tuple exceeds {} bytes",
                MAX_TUPLE_LEN
            )));
        }

        match (op, rest) {
            ("R", None) => Ok(Command::Read { key }),
            ("G", None) => Ok(Command::Get { key }),
            ("R" | "G", Some(_)) => Err(FrameError::malformed(format!(
                "unexpected value for '{}'",
                op
            ))),
            ("P", Some(value)) => Ok(Command::Put {
                key,
                value: value.to_string(),
            }),
            ("P", None) => Err(FrameError::malformed("missing value for 'P'")),
            _ => Err(FrameError::malformed(format!("unknown operation '{}'", op))),
        }
    }

    /// Encode to a complete request frame
    pub fn to_frame(&self) -> Result<String, FrameError> {
        let body = match self {
            Command::Read { key } => format!("R {}", key),
            Command::Get { key } => format!("G {}", key),
            Command::Put { key, value } => format!("P {} {}", key, value),
        };
        frame::encode(&body)
    }

    /// Apply the command to the store
    pub fn execute(self, store: &TupleStore) -> Response {
        match self {
            Command::Read { key } => match store.read(&key) {
                Some(value) => Response::Read { key, value },
                None => Response::NotFound { key },
            },
            Command::Get { key } => match store.get(&key) {
                Some(value) => Response::Removed { key, value },
                None => Response::NotFound { key },
            },
            Command::Put { key, value } => match store.put(key.clone(), value) {
                PutOutcome::Added => Response::Added { key },
                PutOutcome::AlreadyExists => Response::AlreadyExists { key },
            },
        }
    }
}
