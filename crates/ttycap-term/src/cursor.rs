// SPDX-License-Identifier: MIT
//
// Cursor position query (DSR 6 / CPR).
//
// The terminal answers `ESC [ 6 n` by typing `ESC [ row ; column R` into
// our own input stream. For that round trip canonical mode and echo must
// be off, or the reply would sit in the line buffer and be printed back
// at the user. `query_position` suspends both for exactly the duration of
// the exchange and puts the previous attributes back on every exit path.
//
// Replies are read into a fixed 32-byte buffer; anything longer is a
// protocol error, not an allocation.

use std::fmt;
#[cfg(unix)]
use std::io::Write;
#[cfg(unix)]
use std::time::Duration;

use crate::error::ProtocolError;
#[cfg(unix)]
use crate::error::{Error, Result};
#[cfg(unix)]
use crate::input::DEFAULT_POLL_INTERVAL;
#[cfg(unix)]
use crate::source::{ByteSource, next_byte_blocking};
#[cfg(unix)]
use crate::terminal::{AttributeAccess, TerminalMode};

/// The Device Status Report request for the cursor position.
pub const REPORT_REQUEST: &[u8] = b"\x1b[6n";

/// Longest reply accepted, terminator included.
pub const REPLY_CAPACITY: usize = 32;

/// A cursor position as reported by the terminal (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub row: u16,
    pub column: u16,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}, column {}", self.row, self.column)
    }
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// Ask the terminal where the cursor is.
///
/// Writes the request to `out`, then reads the reply from `source` with
/// canonical input and echo suspended. Not re-entrant: callers must not
/// read keys from `source` while a query is in flight.
///
/// # Errors
///
/// - [`Error::TerminalUnavailable`] if echo cannot be suspended.
/// - [`Error::Io`] if the request cannot be written.
/// - [`Error::Input`] if `source` fails.
/// - [`Error::Protocol`] if the reply is malformed, longer than
///   [`REPLY_CAPACITY`], or cut off by end of input.
#[cfg(unix)]
pub fn query_position<A, S, W>(
    mode: &mut TerminalMode<A>,
    source: &mut S,
    out: &mut W,
) -> Result<Position>
where
    A: AttributeAccess,
    S: ByteSource + ?Sized,
    W: Write + ?Sized,
{
    let _quiet = mode.suspend_echo()?;

    out.write_all(REPORT_REQUEST)?;
    out.flush()?;

    let mut buf = [0u8; REPLY_CAPACITY];
    let reply = read_reply(source, &mut buf, DEFAULT_POLL_INTERVAL)?;
    log::trace!("cursor report {:?}", String::from_utf8_lossy(reply));

    Ok(parse_position_report(reply)?)
}

/// Read bytes up to and including the `R` terminator.
#[cfg(unix)]
fn read_reply<'b, S: ByteSource + ?Sized>(
    source: &mut S,
    buf: &'b mut [u8; REPLY_CAPACITY],
    interval: Duration,
) -> Result<&'b [u8]> {
    let mut len = 0;
    loop {
        if len == buf.len() {
            return Err(ProtocolError::Unterminated(REPLY_CAPACITY).into());
        }
        let Some(byte) = next_byte_blocking(source, interval).map_err(Error::Input)? else {
            return Err(ProtocolError::Truncated.into());
        };
        buf[len] = byte;
        len += 1;
        if byte == b'R' {
            return Ok(&buf[..len]);
        }
    }
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// Parse a cursor position report, `ESC [ row ; column R`.
///
/// # Errors
///
/// Returns the [`ProtocolError`] describing the first problem found.
///
/// # Example
///
/// ```
/// use ttycap_term::cursor::{Position, parse_position_report};
///
/// let pos = parse_position_report(b"\x1b[24;80R")?;
/// assert_eq!(pos, Position { row: 24, column: 80 });
/// # Ok::<(), ttycap_term::ProtocolError>(())
/// ```
pub fn parse_position_report(reply: &[u8]) -> std::result::Result<Position, ProtocolError> {
    let rest = reply
        .strip_prefix(b"\x1b[")
        .ok_or(ProtocolError::MissingPrefix)?;
    let (row, rest) = parse_field(rest, b';')?;
    let (column, rest) = parse_field(rest, b'R')?;
    if let Some(&extra) = rest.first() {
        return Err(ProtocolError::UnexpectedByte(extra));
    }
    Ok(Position { row, column })
}

/// Accumulate decimal digits up to `terminator`, returning the value and
/// the bytes after the terminator.
fn parse_field(bytes: &[u8], terminator: u8) -> std::result::Result<(u16, &[u8]), ProtocolError> {
    let mut value: u16 = 0;
    let mut digits = 0usize;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'0'..=b'9' => {
                value = value
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(u16::from(b - b'0')))
                    .ok_or(ProtocolError::Overflow)?;
                digits += 1;
            }
            _ if b == terminator => {
                if digits == 0 {
                    return Err(ProtocolError::EmptyField);
                }
                return Ok((value, &bytes[i + 1..]));
            }
            b'R' => return Err(ProtocolError::MissingSeparator),
            _ => return Err(ProtocolError::UnexpectedByte(b)),
        }
    }

    Err(if terminator == b';' {
        ProtocolError::MissingSeparator
    } else {
        ProtocolError::Truncated
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
