// SPDX-License-Identifier: MIT
//
// ttycap-term: terminal capability core.
//
// The small set of things every interactive terminal program needs before
// it can draw anything: switch the line discipline in and out of raw mode
// without ever leaving the user's shell broken, turn the byte soup a
// keyboard produces into named keys, ask the terminal where its cursor is,
// and pick the right color escape for whatever fidelity the terminal
// advertises.
//
// There is no global state. Raw mode belongs to an owned `TerminalMode`
// value, input comes from an explicit `ByteSource`, and output goes to any
// `io::Write`. Everything that touches a real terminal is unix-only; the
// color model, key types, decoder and escape builders are portable.

pub mod ansi;
pub mod color;
pub mod cursor;
pub mod error;
pub mod input;
pub mod key;
pub mod reader;
pub mod source;
#[cfg(unix)]
pub mod terminal;

pub use color::{Color, ColorSupport, NamedColor, Rgb};
pub use cursor::Position;
pub use error::{Error, ProtocolError, Result};
pub use input::Decoder;
pub use key::{Key, Modifiers, Sequence};
pub use source::ByteSource;
#[cfg(unix)]
pub use terminal::TerminalMode;
