//! Display handles
//!
//! A handle tags every outbound line. It is validated once and never changes.

use std::fmt;

use thiserror::Error;

/// Maximum handle length in characters
pub const MAX_HANDLE_LEN: usize = 10;

/// Errors that can occur while validating a handle
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandleError {
    #[error("Handle is empty")]
    Empty,

    #[error("Handle is {0} characters, must be 1-10")]
    TooLong(usize),

    #[error("Handle is not valid UTF-8")]
    NotText,

    #[error("Handle contains control character {0:?}")]
    NotPrintable(char),
}

/// A validated display handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handle(String);

impl Handle {
    /// Validate a raw input line as a handle
    ///
    /// Trailing whitespace, line terminators and NUL characters are stripped
    /// before the checks. What remains must be 1-10 printable characters.
    pub fn parse(raw: &[u8]) -> Result<Self, HandleError> {
        let text = std::str::from_utf8(raw).map_err(|_| HandleError::NotText)?;
        let trimmed = text.trim_end_matches(|c: char| c.is_whitespace() || c == '\0');

        if let Some(c) = trimmed.chars().find(|c| c.is_control()) {
            return Err(HandleError::NotPrintable(c));
        }

        match trimmed.chars().count() {
            0 => Err(HandleError::Empty),
            n if n > MAX_HANDLE_LEN => Err(HandleError::TooLong(n)),
            _ => Ok(Self(trimmed.to_string())),
        }
    }

    /// Get the handle text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The prompt shown before operator input, e.g. `bob> `
    pub fn prompt(&self) -> String {
        format!("{}> ", self.0)
    }

    /// Tag a raw input line for the wire
    ///
    /// The line bytes are sent as typed. A missing trailing newline is added.
    pub fn tag_line(&self, line: &[u8]) -> Vec<u8> {
        let mut tagged = self.prompt().into_bytes();
        tagged.extend_from_slice(line);
        if !line.ends_with(b"\n") {
            tagged.push(b'\n');
        }
        tagged
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
