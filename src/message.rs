// src/message.rs

//! One status message: the payload of a single pipe read.
//!
//! There is no framing on the pipe. Whatever one non-blocking read returns is
//! one message, so a writer that sends two lines faster than the reader drains
//! them will have them rendered together.

use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Payload up to (not including) the first NUL.
    bytes: Vec<u8>,
    /// Length of the read before NUL truncation.
    raw_len: usize,
}

impl Message {
    pub fn from_read(raw: &[u8]) -> Self {
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        Self {
            bytes: raw[..end].to_vec(),
            raw_len: raw.len(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// True only when the whole read is exactly `sentinel`, with nothing
    /// before or after it.
    pub fn is_sentinel(&self, sentinel: &str) -> bool {
        self.raw_len == self.bytes.len() && self.bytes == sentinel.as_bytes()
    }

    /// Text to put on the status line: lossily decoded, with one trailing
    /// line ending removed.
    pub fn display_text(&self) -> Cow<'_, str> {
        let mut end = self.bytes.len();
        if self.bytes[..end].ends_with(b"\n") {
            end -= 1;
            if self.bytes[..end].ends_with(b"\r") {
                end -= 1;
            }
        }
        String::from_utf8_lossy(&self.bytes[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_at_first_nul() {
        let msg = Message::from_read(b"Loading\0garbage");
        assert_eq!(msg.as_bytes(), b"Loading");
        assert_eq!(msg.display_text(), "Loading");
    }

    #[test]
    fn sentinel_requires_exact_payload() {
        assert!(Message::from_read(b"exit").is_sentinel("exit"));
        assert!(!Message::from_read(b"exit\n").is_sentinel("exit"));
        assert!(!Message::from_read(b"EXIT").is_sentinel("exit"));
        assert!(!Message::from_read(b"exit\0").is_sentinel("exit"));
        assert!(!Message::from_read(b"exiting").is_sentinel("exit"));
    }

    #[test]
    fn trailing_line_ending_is_not_displayed() {
        assert_eq!(Message::from_read(b"Mounting\n").display_text(), "Mounting");
        assert_eq!(Message::from_read(b"Mounting\r\n").display_text(), "Mounting");
        assert_eq!(Message::from_read(b"a\nb\n").display_text(), "a\nb");
        assert_eq!(Message::from_read(b"\n").display_text(), "");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        assert_eq!(Message::from_read(b"ok \xff").display_text(), "ok \u{fffd}");
    }
}
