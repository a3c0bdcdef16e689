// SPDX-License-Identifier: MIT
//
// Terminal input decoder.
//
// Pulls raw bytes from a `ByteSource` one at a time and turns them into
// `Key` values. Handles:
//
// - Control bytes (Ctrl+letter band, Enter, Tab, Backspace, NUL)
// - Legacy CSI sequences (arrows, editing keys, F5-F12, Ctrl+arrows)
// - SS3 sequences (F1-F4 and Home/End from application keypad mode)
// - Alt+letter, both as ESC prefix and as 8-bit meta sent as UTF-8
//
// # Design
//
// Each decode attempt reads exactly as many bytes as it needs and no
// more. The bytes consumed after the introducer go into a small inline
// `Sequence`; if the combination is not one we map, that buffer is handed
// back inside `Key::Unsupported` and the next call starts fresh. Nothing
// is carried between calls, so a garbled sequence can never poison the
// following keys.
//
// A lone ESC is told apart from an escape sequence by whether the next
// byte is already available. Terminals write a whole sequence in one go,
// so with a non-blocking source this is reliable in practice.

use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::key::{Key, Sequence};
use crate::source::ByteSource;
#[cfg(unix)]
use crate::terminal::{AttributeAccess, TerminalMode};

/// Escape (0x1B), the sequence introducer.
const ESC: u8 = 0x1B;

/// UTF-8 lead bytes used by terminals that send 8-bit meta as UTF-8.
const META_LETTER_LEAD: u8 = 0xC3;
const META_CONTROL_LEAD: u8 = 0xC2;

/// How long [`Decoder::read_key`] sleeps between empty polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

// ─── Decoder ────────────────────────────────────────────────────────────────

/// Byte-at-a-time key decoder.
///
/// # Example
///
/// ```
/// use ttycap_term::input::Decoder;
/// use ttycap_term::key::Key;
/// use ttycap_term::source::MemorySource;
///
/// let mut decoder = Decoder::new(MemorySource::closed_with(b"\x1b[A\x03"));
/// assert_eq!(decoder.try_read_key()?, Key::ArrowUp);
/// assert_eq!(decoder.try_read_key()?, Key::Ctrl(b'c'));
/// assert_eq!(decoder.try_read_key()?, Key::NoKey);
/// # Ok::<(), ttycap_term::Error>(())
/// ```
#[derive(Debug)]
pub struct Decoder<S> {
    source: S,
    poll_interval: Duration,
}

impl<S: ByteSource> Decoder<S> {
    /// Decoder over `source` with the default poll interval.
    pub const fn new(source: S) -> Self {
        Self {
            source,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Change how long blocking reads sleep between empty polls.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[inline]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// The underlying byte source.
    #[inline]
    pub const fn source(&self) -> &S {
        &self.source
    }

    #[inline]
    pub const fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Unwrap the byte source.
    pub fn into_source(self) -> S {
        self.source
    }

    /// Decode one key if input is available.
    ///
    /// Returns [`Key::NoKey`] when no byte is ready. Unmapped or cut-off
    /// escape sequences come back as [`Key::Unsupported`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Input`] if the byte source fails.
    pub fn try_read_key(&mut self) -> Result<Key> {
        let Some(byte) = self.next()? else {
            return Ok(Key::NoKey);
        };

        let key = match byte {
            ESC => self.decode_escape()?,
            META_LETTER_LEAD | META_CONTROL_LEAD => self.decode_meta(byte)?,
            _ => decode_byte(byte),
        };
        log::trace!("decoded {key:?}");
        Ok(key)
    }

    /// Wait for the next key.
    ///
    /// Polls [`try_read_key`](Self::try_read_key), sleeping for the poll
    /// interval between attempts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Input`] if the byte source fails, or with
    /// `UnexpectedEof` if it closes before a key arrives.
    pub fn read_key(&mut self) -> Result<Key> {
        loop {
            let key = self.try_read_key()?;
            if key.is_key() {
                return Ok(key);
            }
            if self.source.is_closed() {
                return Err(Error::input_closed());
            }
            thread::sleep(self.poll_interval);
        }
    }

    /// Like [`read_key`](Self::read_key), but switches the terminal to raw
    /// mode for the duration of the read if it is not raw already.
    ///
    /// If `mode` was enabled by the caller and something else switched the
    /// terminal back to cooked, raw mode is re-applied and left on
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TerminalUnavailable`] if raw mode cannot be
    /// entered, otherwise the same as [`read_key`](Self::read_key).
    #[cfg(unix)]
    pub fn read_key_raw<A: AttributeAccess>(
        &mut self,
        mode: &mut TerminalMode<A>,
    ) -> Result<Key> {
        if mode.is_enabled() || mode.reassert()? {
            return self.read_key();
        }
        let _raw = mode.raw()?;
        self.read_key()
    }

    // ── Sequence decoding ───────────────────────────────────────────

    fn next(&mut self) -> Result<Option<u8>> {
        self.source.try_read_one().map_err(Error::Input)
    }

    /// Read the next byte into `seq`.
    fn more(&mut self, seq: &mut Sequence) -> Result<Option<u8>> {
        let byte = self.next()?;
        if let Some(b) = byte {
            seq.push(b);
        }
        Ok(byte)
    }

    /// Decode what follows an ESC.
    fn decode_escape(&mut self) -> Result<Key> {
        let mut seq = Sequence::new();

        let Some(first) = self.more(&mut seq)? else {
            return Ok(Key::Esc);
        };
        let Some(second) = self.more(&mut seq)? else {
            return Ok(match first {
                b'a'..=b'z' => Key::Alt(first),
                b'\r' => Key::AltEnter,
                _ => Key::Unsupported(seq.truncate()),
            });
        };

        match first {
            b'[' => self.decode_csi(seq, second),
            b'O' => Ok(decode_ss3(seq, second)),
            _ => Ok(Key::Unsupported(seq)),
        }
    }

    /// Decode `CSI <first> ...`. `seq` already holds `[` and `first`.
    fn decode_csi(&mut self, mut seq: Sequence, first: u8) -> Result<Key> {
        if !first.is_ascii_digit() {
            return Ok(match first {
                b'A' => Key::ArrowUp,
                b'B' => Key::ArrowDown,
                b'C' => Key::ArrowRight,
                b'D' => Key::ArrowLeft,
                b'E' => Key::Numeric5,
                b'H' => Key::Home,
                b'F' => Key::End,
                _ => Key::Unsupported(seq),
            });
        }

        let Some(second) = self.more(&mut seq)? else {
            return Ok(Key::Unsupported(seq.truncate()));
        };

        match second {
            b'~' => Ok(match first {
                b'1' | b'7' => Key::Home,
                b'2' => Key::Insert,
                b'3' => Key::Delete,
                b'4' | b'8' => Key::End,
                b'5' => Key::PageUp,
                b'6' => Key::PageDown,
                _ => Key::Unsupported(seq),
            }),

            // CSI 1 ; <modifier> <letter>
            b';' if first == b'1' => {
                let Some(modifier) = self.more(&mut seq)? else {
                    return Ok(Key::Unsupported(seq.truncate()));
                };
                let Some(last) = self.more(&mut seq)? else {
                    return Ok(Key::Unsupported(seq.truncate()));
                };
                Ok(match (modifier, last) {
                    (b'5', b'A') => Key::CtrlUp,
                    (b'5', b'B') => Key::CtrlDown,
                    (b'5', b'C') => Key::CtrlRight,
                    (b'5', b'D') => Key::CtrlLeft,
                    _ => Key::Unsupported(seq),
                })
            }

            // CSI <digit> <digit> ~
            b'0'..=b'9' => {
                let Some(last) = self.more(&mut seq)? else {
                    return Ok(Key::Unsupported(seq.truncate()));
                };
                if last != b'~' {
                    return Ok(Key::Unsupported(seq));
                }
                Ok(function_key(first, second).unwrap_or(Key::Unsupported(seq)))
            }

            _ => Ok(Key::Unsupported(seq)),
        }
    }

    /// Decode a two-byte UTF-8 encoding of an 8-bit meta key.
    fn decode_meta(&mut self, lead: u8) -> Result<Key> {
        let mut seq = Sequence::new();
        let Some(cont) = self.more(&mut seq)? else {
            return Ok(Key::Unsupported(seq.truncate()));
        };

        Ok(match (lead, cont) {
            // U+00E1..=U+00FA: 'a'..='z' with the high bit set.
            (META_LETTER_LEAD, 0xA1..=0xBA) => Key::Alt(cont - 0xA1 + b'a'),
            // U+008D: CR with the high bit set.
            (META_CONTROL_LEAD, 0x8D) => Key::AltEnter,
            _ => Key::Unsupported(seq),
        })
    }
}

// ─── Stateless Decoding ─────────────────────────────────────────────────────

/// Map a single byte outside any sequence.
const fn decode_byte(byte: u8) -> Key {
    match byte {
        0x00 => Key::Null,
        0x08 | 0x7F => Key::Backspace,
        0x09 => Key::Tab,
        0x0A | 0x0D => Key::Enter,
        0x01..=0x1A => Key::Ctrl(b'a' + byte - 1),
        ESC => Key::Esc,
        0x1C => Key::Ctrl(b'\\'),
        0x1D => Key::Ctrl(b']'),
        0x1E => Key::Ctrl(b'^'),
        0x1F => Key::Ctrl(b'_'),
        0x20..=0x7E => Key::Char(byte),
        _ => Key::Byte(byte),
    }
}

/// `ESC O <byte>`. `seq` already holds `O` and `byte`.
const fn decode_ss3(seq: Sequence, byte: u8) -> Key {
    match byte {
        b'F' => Key::End,
        b'H' => Key::Home,
        b'P' => Key::F(1),
        b'Q' => Key::F(2),
        b'R' => Key::F(3),
        b'S' => Key::F(4),
        _ => Key::Unsupported(seq),
    }
}

/// `CSI <tens> <units> ~` function keys. The numbering skips 16 and 22.
const fn function_key(tens: u8, units: u8) -> Option<Key> {
    let n = match (tens, units) {
        (b'1', b'5') => 5,
        (b'1', b'7') => 6,
        (b'1', b'8') => 7,
        (b'1', b'9') => 8,
        (b'2', b'0') => 9,
        (b'2', b'1') => 10,
        (b'2', b'3') => 11,
        (b'2', b'4') => 12,
        _ => return None,
    };
    Some(Key::F(n))
}

// ─── Tests ──────────────────────────────────────────────────────────────────
