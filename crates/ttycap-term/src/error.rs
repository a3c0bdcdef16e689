// SPDX-License-Identifier: MIT
//
// Error taxonomy for the terminal core.
//
// Three failure families, each fatal only to the call that hit it:
//
// - the terminal itself is unreachable (attribute get/set failed),
// - the input stream broke or closed under a blocking read,
// - a cursor position reply could not be parsed.
//
// A recognized-but-unmapped escape sequence is *not* an error. It is
// decoded as `Key::Unsupported` so callers can ignore it in-band.

use std::io;

use thiserror::Error;

/// Errors produced by the terminal core.
#[derive(Error, Debug)]
pub enum Error {
    /// Reading or writing terminal attributes failed, usually because
    /// the process is not attached to a real terminal.
    #[error("terminal unavailable: {0}")]
    TerminalUnavailable(#[source] io::Error),

    /// The byte source failed hard or was closed under a blocking read.
    #[error("input error: {0}")]
    Input(#[source] io::Error),

    /// The cursor position reply was malformed or truncated.
    #[error("cursor position protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Writing an escape sequence to the terminal failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Why a cursor position report could not be read or parsed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// The reply buffer filled up before the `R` terminator arrived.
    #[error("reply exceeded {0} bytes without a terminator")]
    Unterminated(usize),

    /// The input stream closed before the reply was complete.
    #[error("input closed before the reply was complete")]
    Truncated,

    /// The reply did not start with `ESC [`.
    #[error("reply does not start with ESC [")]
    MissingPrefix,

    /// A byte that is neither a digit nor the expected delimiter.
    #[error("unexpected byte {0:#04x} in reply")]
    UnexpectedByte(u8),

    /// The `;` separating row from column never appeared.
    #[error("reply has no ';' separator")]
    MissingSeparator,

    /// A row or column field had no digits.
    #[error("reply has an empty field")]
    EmptyField,

    /// A field does not fit in a `u16`.
    #[error("reply field out of range")]
    Overflow,
}

/// Result alias for terminal core operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// An input error for a byte source that closed under a blocking read.
    pub(crate) fn input_closed() -> Self {
        Self::Input(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "byte source closed",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_converts() {
        let err: Error = ProtocolError::MissingSeparator.into();
        assert!(matches!(err, Error::Protocol(ProtocolError::MissingSeparator)));
    }

    #[test]
    fn input_closed_is_unexpected_eof() {
        match Error::input_closed() {
            Error::Input(e) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("expected input error, got {other:?}"),
        }
    }

    #[test]
    fn display_mentions_kind() {
        let err = Error::TerminalUnavailable(io::Error::other("tcgetattr failed"));
        assert!(err.to_string().starts_with("terminal unavailable"));

        let err: Error = ProtocolError::UnexpectedByte(b'x').into();
        assert!(err.to_string().contains("0x78"));
    }
}
