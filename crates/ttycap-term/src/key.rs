// SPDX-License-Identifier: MIT
//
// Logical key values produced by the input decoder.
//
// `Key` is a closed set: every byte sequence the decoder can see maps to
// exactly one variant. Control bytes get their own `Ctrl` band so callers
// can match on `Key::Ctrl(b'c')` instead of masking bytes, and the two
// non-keys (`NoKey`, `Unsupported`) are ordinary variants rather than
// magic negative numbers.

use std::fmt;

use bitflags::bitflags;

// ─── Key ─────────────────────────────────────────────────────────────────────

/// A decoded key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Nothing decodable yet (the byte source had no data).
    NoKey,
    /// An escape sequence that was recognized as one but is not mapped,
    /// or that ended before its terminator.
    Unsupported(Sequence),

    // ── ASCII ───────────────────────────────────────────────────
    /// Printable ASCII, space through tilde.
    Char(u8),
    /// NUL (Ctrl-@ / Ctrl-Space).
    Null,
    /// Ctrl + key. Holds the lowercase letter for bytes 1–26 and `\`,
    /// `]`, `^`, `_` for bytes 28–31.
    Ctrl(u8),
    Backspace,
    Tab,
    /// CR or LF.
    Enter,
    Esc,

    // ── Alt ─────────────────────────────────────────────────────
    /// Alt + lowercase letter.
    Alt(u8),
    AltEnter,

    // ── Navigation ──────────────────────────────────────────────
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    CtrlUp,
    CtrlDown,
    CtrlLeft,
    CtrlRight,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    /// Keypad center with Num Lock off (`CSI E`).
    Numeric5,

    // ── Function keys ───────────────────────────────────────────
    /// F1 through F12.
    F(u8),

    /// A byte outside ASCII, passed through as-is.
    Byte(u8),
}

impl Key {
    /// Ctrl + `letter` for a lowercase ASCII letter, e.g. `Key::ctrl(b'c')`.
    #[inline]
    #[must_use]
    pub const fn ctrl(letter: u8) -> Self {
        Self::Ctrl(letter.to_ascii_lowercase())
    }

    /// Whether a real key was decoded (anything but `NoKey`).
    #[inline]
    #[must_use]
    pub const fn is_key(self) -> bool {
        !matches!(self, Self::NoKey)
    }

    /// Whether this is an unmapped or truncated escape sequence.
    #[inline]
    #[must_use]
    pub const fn is_unsupported(self) -> bool {
        matches!(self, Self::Unsupported(_))
    }

    /// The ASCII byte this key produces, if it maps to one.
    ///
    /// `Enter` is reported as CR and `Backspace` as DEL (0x7F), matching
    /// what a terminal in raw mode sends for them.
    #[must_use]
    pub const fn as_ascii(self) -> Option<u8> {
        match self {
            Self::Char(b) => Some(b),
            Self::Null => Some(0x00),
            Self::Ctrl(b'\\') => Some(0x1C),
            Self::Ctrl(b']') => Some(0x1D),
            Self::Ctrl(b'^') => Some(0x1E),
            Self::Ctrl(b'_') => Some(0x1F),
            Self::Ctrl(letter @ b'a'..=b'z') => Some(letter - b'a' + 1),
            Self::Tab => Some(0x09),
            Self::Enter => Some(0x0D),
            Self::Esc => Some(0x1B),
            Self::Backspace => Some(0x7F),
            _ => None,
        }
    }

    /// Whether the key maps to a 7-bit ASCII byte.
    #[inline]
    #[must_use]
    pub const fn is_ascii(self) -> bool {
        self.as_ascii().is_some()
    }

    /// Modifier keys folded into this key.
    #[must_use]
    pub const fn modifiers(self) -> Modifiers {
        match self {
            Self::Null
            | Self::Ctrl(_)
            | Self::CtrlUp
            | Self::CtrlDown
            | Self::CtrlLeft
            | Self::CtrlRight => Modifiers::CTRL,
            Self::Alt(_) | Self::AltEnter => Modifiers::ALT,
            _ => Modifiers::empty(),
        }
    }

    /// Whether Ctrl was held.
    #[inline]
    #[must_use]
    pub const fn is_ctrl(self) -> bool {
        self.modifiers().contains(Modifiers::CTRL)
    }

    /// Whether Alt was held.
    #[inline]
    #[must_use]
    pub const fn is_alt(self) -> bool {
        self.modifiers().contains(Modifiers::ALT)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NoKey => f.write_str("<none>"),
            Self::Unsupported(seq) => write!(f, "<unsupported {seq}>"),
            Self::Char(b' ') => f.write_str("Space"),
            Self::Char(b) => write!(f, "{}", char::from(b)),
            Self::Null => f.write_str("Ctrl+@"),
            Self::Ctrl(b) => write!(f, "Ctrl+{}", char::from(b.to_ascii_uppercase())),
            Self::Backspace => f.write_str("Backspace"),
            Self::Tab => f.write_str("Tab"),
            Self::Enter => f.write_str("Enter"),
            Self::Esc => f.write_str("Esc"),
            Self::Alt(b) => write!(f, "Alt+{}", char::from(b)),
            Self::AltEnter => f.write_str("Alt+Enter"),
            Self::ArrowUp => f.write_str("Up"),
            Self::ArrowDown => f.write_str("Down"),
            Self::ArrowLeft => f.write_str("Left"),
            Self::ArrowRight => f.write_str("Right"),
            Self::CtrlUp => f.write_str("Ctrl+Up"),
            Self::CtrlDown => f.write_str("Ctrl+Down"),
            Self::CtrlLeft => f.write_str("Ctrl+Left"),
            Self::CtrlRight => f.write_str("Ctrl+Right"),
            Self::Home => f.write_str("Home"),
            Self::End => f.write_str("End"),
            Self::PageUp => f.write_str("PageUp"),
            Self::PageDown => f.write_str("PageDown"),
            Self::Insert => f.write_str("Insert"),
            Self::Delete => f.write_str("Delete"),
            Self::Numeric5 => f.write_str("Numpad5"),
            Self::F(n) => write!(f, "F{n}"),
            Self::Byte(b) => write!(f, "{b:#04x}"),
        }
    }
}

bitflags! {
    /// Modifier keys carried by a [`Key`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const CTRL = 0b0000_0001;
        const ALT  = 0b0000_0010;
    }
}

// ─── Sequence ────────────────────────────────────────────────────────────────

/// Scratch buffer for one escape-sequence decode.
///
/// Holds the bytes read after the introducer (ESC, or a UTF-8 lead byte
/// for meta keys). The longest mapped sequence, `ESC [ 1 ; 5 C`, needs five.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Sequence {
    buf: [u8; Self::CAPACITY],
    len: u8,
    truncated: bool,
}

impl Sequence {
    /// Maximum number of bytes a decode attempt reads after the introducer.
    pub const CAPACITY: usize = 5;

    /// An empty scratch buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buf: [0; Self::CAPACITY],
            len: 0,
            truncated: false,
        }
    }

    /// Append a byte. Bytes past [`CAPACITY`](Self::CAPACITY) are dropped.
    pub(crate) fn push(&mut self, byte: u8) {
        if let Some(slot) = self.buf.get_mut(usize::from(self.len)) {
            *slot = byte;
            self.len += 1;
        }
    }

    /// Mark that input ended before the sequence could complete.
    #[must_use]
    pub(crate) const fn truncate(mut self) -> Self {
        self.truncated = true;
        self
    }

    /// The bytes read so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..usize::from(self.len)]
    }

    /// Number of bytes read.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    /// Whether no bytes were read.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether input ran out before a terminator was seen.
    #[inline]
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sequence({self}")?;
        if self.truncated {
            f.write_str(", truncated")?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, &b) in self.as_bytes().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if b.is_ascii_graphic() {
                write!(f, "{}", char::from(b))?;
            } else {
                write!(f, "{b:#04x}")?;
            }
        }
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ctrl_constructor_lowercases() {
        assert_eq!(Key::ctrl(b'C'), Key::Ctrl(b'c'));
    }

    #[test]
    fn ascii_round_trip_for_ctrl_band() {
        for byte in 1u8..=26 {
            let key = Key::Ctrl(b'a' + byte - 1);
            assert_eq!(key.as_ascii(), Some(byte));
        }
        assert_eq!(Key::Ctrl(b'_').as_ascii(), Some(0x1F));
    }

    #[test]
    fn extended_keys_are_not_ascii() {
        assert!(!Key::ArrowUp.is_ascii());
        assert!(!Key::F(5).is_ascii());
        assert!(!Key::Byte(0xE9).is_ascii());
        assert!(Key::Enter.is_ascii());
    }

    #[test]
    fn modifiers() {
        assert!(Key::Ctrl(b'c').is_ctrl());
        assert!(Key::CtrlRight.is_ctrl());
        assert!(!Key::Ctrl(b'c').is_alt());
        assert!(Key::Alt(b'x').is_alt());
        assert!(Key::AltEnter.is_alt());
        assert_eq!(Key::Char(b'a').modifiers(), Modifiers::empty());
        assert_eq!(Key::Tab.modifiers(), Modifiers::empty());
    }

    #[test]
    fn no_key_is_not_a_key() {
        assert!(!Key::NoKey.is_key());
        assert!(Key::Unsupported(Sequence::new()).is_key());
        assert!(Key::Unsupported(Sequence::new()).is_unsupported());
    }

    #[test]
    fn display_names() {
        assert_eq!(Key::Char(b'A').to_string(), "A");
        assert_eq!(Key::Char(b' ').to_string(), "Space");
        assert_eq!(Key::Ctrl(b'c').to_string(), "Ctrl+C");
        assert_eq!(Key::Alt(b'x').to_string(), "Alt+x");
        assert_eq!(Key::F(11).to_string(), "F11");
        assert_eq!(Key::Byte(0xE9).to_string(), "0xe9");
    }

    // ── Sequence ──────────────────────────────────────────────────────

    #[test]
    fn sequence_push_and_read() {
        let mut seq = Sequence::new();
        assert!(seq.is_empty());
        seq.push(b'[');
        seq.push(b'9');
        assert_eq!(seq.as_bytes(), b"[9");
        assert_eq!(seq.len(), 2);
        assert!(!seq.is_truncated());
    }

    #[test]
    fn sequence_drops_overflow() {
        let mut seq = Sequence::new();
        for b in b"[1;5Cxx" {
            seq.push(*b);
        }
        assert_eq!(seq.as_bytes(), b"[1;5C");
    }

    #[test]
    fn sequence_truncate_flag() {
        let mut seq = Sequence::new();
        seq.push(b'[');
        let seq = seq.truncate();
        assert!(seq.is_truncated());
        assert_eq!(format!("{seq:?}"), "Sequence([, truncated)");
    }

    #[test]
    fn sequence_display_escapes_controls() {
        let mut seq = Sequence::new();
        seq.push(0x0D);
        seq.push(b'x');
        assert_eq!(seq.to_string(), "0x0d x");
    }
}
