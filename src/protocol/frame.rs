//! Length-prefixed framing
//!
//! Every message on the wire, in both directions, is `<LEN> <BODY>` where
//! `<LEN>` is exactly three zero-padded decimal digits holding the byte
//! length of the whole frame, the header included. There is no terminator:
//! the declared length is the only frame boundary.

use thiserror::Error;

/// Width of the decimal length field
pub const LEN_DIGITS: usize = 3;

/// Length field plus its separating space
pub const HEADER_LEN: usize = LEN_DIGITS + 1;

/// Largest frame a three digit length field can describe
pub const MAX_FRAME_LEN: usize = 999;

/// Upper bound on `len(key) + len(value)` carried by a request
pub const MAX_TUPLE_LEN: usize = 970;

/// Framing and decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Not enough data buffered yet to hold a full frame
    #[error("stream ended early")]
    Incomplete,
    /// The bytes do not form a valid frame
    #[error("malformed frame: {0}")]
    Malformed(String),
    /// The frame would not fit the three digit length field
    #[error("frame of {0} bytes exceeds the {} byte limit", MAX_FRAME_LEN)]
    TooLong(usize),
}

impl FrameError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        FrameError::Malformed(reason.into())
    }
}

/// Check whether `src` starts with a complete frame.
///
/// Returns the frame length on success. A prefix that can still become a
/// valid frame yields `Incomplete`; a prefix that never can yields
/// `Malformed` as soon as the offending byte is seen.
pub fn check(src: &[u8]) -> Result<usize, FrameError> {
    let digits = &src[..src.len().min(LEN_DIGITS)];
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(FrameError::malformed("length field is not a decimal number"));
    }

    if src.len() < HEADER_LEN {
        return Err(FrameError::Incomplete);
    }

    if src[LEN_DIGITS] != b' ' {
        return Err(FrameError::malformed("length field is not followed by a space"));
    }

    let len = declared_len(src)?;
    if src.len() < len {
        return Err(FrameError::Incomplete);
    }

    Ok(len)
}

/// Split a complete frame into its body, verifying the declared length.
pub fn body(frame: &str) -> Result<&str, FrameError> {
    let bytes = frame.as_bytes();
    if bytes.len() < HEADER_LEN
        || !bytes[..LEN_DIGITS].iter().all(u8::is_ascii_digit)
        || bytes[LEN_DIGITS] != b' '
    {
        return Err(FrameError::malformed("missing length header"));
    }

    let len = declared_len(bytes)?;
    if len != bytes.len() {
        return Err(FrameError::malformed(format!(
            "declared length {} does not match frame length {}",
            len,
            bytes.len()
        )));
    }

    // The header is pure ASCII, so HEADER_LEN is a char boundary.
    Ok(&frame[HEADER_LEN..])
}

/// Prefix `body` with its length header.
pub fn encode(body: &str) -> Result<String, FrameError> {
    let len = HEADER_LEN + body.len();
    if len > MAX_FRAME_LEN {
        return Err(FrameError::TooLong(len));
    }

    Ok(format!("{:03} {}", len, body))
}

fn declared_len(src: &[u8]) -> Result<usize, FrameError> {
    let len = atoi::atoi::<usize>(&src[..LEN_DIGITS])
        .ok_or_else(|| FrameError::malformed("invalid length field"))?;

    // A frame must carry at least one body byte after the header.
    if len <= HEADER_LEN {
        return Err(FrameError::malformed(format!("declared length {} is too short", len)));
    }

    Ok(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_complete_frame() {
        assert_eq!(check(b"007 R A"), Ok(7));
    }

    #[test]
    fn test_check_stops_at_declared_length() {
        // Second frame already buffered behind the first one.
        assert_eq!(check(b"007 R A007 G A"), Ok(7));
    }

    #[test]
    fn test_check_incomplete() {
        assert_eq!(check(b""), Err(FrameError::Incomplete));
        assert_eq!(check(b"00"), Err(FrameError::Incomplete));
        assert_eq!(check(b"007"), Err(FrameError::Incomplete));
        assert_eq!(check(b"010 P key"), Err(FrameError::Incomplete));
    }

    #[test]
    fn test_check_rejects_bad_header_early() {
        assert!(matches!(check(b"R"), Err(FrameError::Malformed(_))));
        assert!(matches!(check(b"0x7 R A"), Err(FrameError::Malformed(_))));
        assert!(matches!(check(b"0071R A"), Err(FrameError::Malformed(_))));
    }

    #[test]
    fn test_check_rejects_too_short_length() {
        assert!(matches!(check(b"004 "), Err(FrameError::Malformed(_))));
        assert!(matches!(check(b"000 R A"), Err(FrameError::Malformed(_))));
    }

    #[test]
    fn test_body() {
        assert_eq!(body("007 R A"), Ok("R A"));
        assert!(matches!(body("008 R A"), Err(FrameError::Malformed(_))));
        assert!(matches!(body("R A"), Err(FrameError::Malformed(_))));
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode("OK A added").unwrap(), "014 OK A added");
    }

    #[test]
    fn test_encode_too_long() {
        let body = "x".repeat(MAX_FRAME_LEN);
        assert_eq!(encode(&body), Err(FrameError::TooLong(MAX_FRAME_LEN + HEADER_LEN)));

        let body = "x".repeat(MAX_FRAME_LEN - HEADER_LEN);
        assert_eq!(encode(&body).unwrap().len(), MAX_FRAME_LEN);
    }
}
