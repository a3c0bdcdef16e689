// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No state,
// no decisions about when to emit; this module just knows the byte-level
// encoding of every terminal command the crate offers.
//
// Cursor coordinates are 1-based, the same as the terminal's own numbering
// and the `Position` a cursor query returns.
//
// All functions return `io::Result` propagated from the underlying writer.

use std::io::{self, Write};

use crate::color::{Color, ColorSupport, NamedColor};

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `(row, column)` (CUP). Both are 1-based.
#[inline]
pub fn cursor_move(w: &mut impl Write, row: u16, column: u16) -> io::Result<()> {
    write!(w, "\x1b[{row};{column}H")
}

/// Move the cursor to the top-left corner.
#[inline]
pub fn cursor_home(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[H")
}

/// Move the cursor up `n` rows (CUU).
#[inline]
pub fn cursor_up(w: &mut impl Write, n: u16) -> io::Result<()> {
    write!(w, "\x1b[{n}A")
}

/// Move the cursor down `n` rows (CUD).
#[inline]
pub fn cursor_down(w: &mut impl Write, n: u16) -> io::Result<()> {
    write!(w, "\x1b[{n}B")
}

/// Move the cursor right `n` columns (CUF).
#[inline]
pub fn cursor_right(w: &mut impl Write, n: u16) -> io::Result<()> {
    write!(w, "\x1b[{n}C")
}

/// Move the cursor left `n` columns (CUB).
#[inline]
pub fn cursor_left(w: &mut impl Write, n: u16) -> io::Result<()> {
    write!(w, "\x1b[{n}D")
}

/// Move the cursor to `column` on the current row (CHA). 1-based.
#[inline]
pub fn cursor_column(w: &mut impl Write, column: u16) -> io::Result<()> {
    write!(w, "\x1b[{column}G")
}

/// Hide the cursor (DECTCEM reset).
#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor (DECTCEM set).
#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

/// Ask the terminal to report the cursor position (DSR 6).
///
/// The reply arrives on input; see [`crate::cursor`].
#[inline]
pub fn request_position(w: &mut impl Write) -> io::Result<()> {
    w.write_all(crate::cursor::REPORT_REQUEST)
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2).
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// Clear the screen and the scrollback buffer (ED 3).
#[inline]
pub fn clear_scrollback(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[3J")
}

/// Clear from the cursor to the end of the line (EL 0).
#[inline]
pub fn clear_eol(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[K")
}

/// Enter the alternate screen buffer (DEC Private Mode 1049).
#[inline]
pub fn enter_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049h")
}

/// Exit the alternate screen buffer and restore original content.
#[inline]
pub fn exit_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049l")
}

/// Save the cursor (DECSC) and switch to the alternate screen.
///
/// Pair with [`screen_load`].
#[inline]
pub fn screen_save(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b7\x1b[?1049h")
}

/// Leave the alternate screen and restore the cursor saved by
/// [`screen_save`] (DECRC).
#[inline]
pub fn screen_load(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049l\x1b8")
}

/// Set the window title (OSC 0). Not every terminal honors it.
pub fn set_title(w: &mut impl Write, title: &str) -> io::Result<()> {
    write!(w, "\x1b]0;{title}\x07")
}

// ─── Colors ──────────────────────────────────────────────────────────────────

/// Set the foreground (text) color.
///
/// Named colors use the compact SGR codes (30–37, 90–97). Indexed colors
/// use `38;5;N` and RGB colors `38;2;R;G;B`. `Empty` and
/// `Named(Default)` reset to the terminal's default (SGR 39).
pub fn fg(w: &mut impl Write, color: Color) -> io::Result<()> {
    match color {
        Color::Empty | Color::Named(NamedColor::Default) => w.write_all(b"\x1b[39m"),
        Color::Named(named) => write!(w, "\x1b[{}m", 30 + u16::from(named.sgr_code())),
        Color::Indexed(idx) => write!(w, "\x1b[38;5;{idx}m"),
        Color::Rgb(rgb) => write!(w, "\x1b[38;2;{};{};{}m", rgb.r, rgb.g, rgb.b),
    }
}

/// Set the background color.
///
/// Same encoding strategy as [`fg`] with the background codes
/// (40–47, 100–107, `48;5;N`, `48;2;R;G;B`, 49).
pub fn bg(w: &mut impl Write, color: Color) -> io::Result<()> {
    match color {
        Color::Empty | Color::Named(NamedColor::Default) => w.write_all(b"\x1b[49m"),
        Color::Named(named) => write!(w, "\x1b[{}m", 40 + u16::from(named.sgr_code())),
        Color::Indexed(idx) => write!(w, "\x1b[48;5;{idx}m"),
        Color::Rgb(rgb) => write!(w, "\x1b[48;2;{};{};{}m", rgb.r, rgb.g, rgb.b),
    }
}

/// Set the foreground color, downconverting to the 256-color palette when
/// `support` lacks truecolor.
pub fn fg_auto(w: &mut impl Write, color: Color, support: ColorSupport) -> io::Result<()> {
    fg(w, support.downgrade(color))
}

/// Set the background color, downconverting to the 256-color palette when
/// `support` lacks truecolor.
pub fn bg_auto(w: &mut impl Write, color: Color, support: ColorSupport) -> io::Result<()> {
    bg(w, support.downgrade(color))
}

// ─── Styles ──────────────────────────────────────────────────────────────────

/// SGR text style. Discriminants are the SGR parameter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Style {
    Reset = 0,
    Bold = 1,
    Dim = 2,
    Italic = 3,
    Underline = 4,
    Blink = 5,
    BlinkRapid = 6,
    Reverse = 7,
    Conceal = 8,
    /// Strikethrough. Mostly supported.
    Crossed = 9,
    /// Barely supported.
    Overline = 53,
}

impl Style {
    /// The SGR parameter for this style.
    #[inline]
    #[must_use]
    pub const fn sgr(self) -> u8 {
        self as u8
    }
}

/// Apply one style.
#[inline]
pub fn style(w: &mut impl Write, style: Style) -> io::Result<()> {
    write!(w, "\x1b[{}m", style.sgr())
}

/// Apply several styles as a single CSI sequence, e.g. `\x1b[1;3m`.
///
/// Does nothing if `list` is empty.
pub fn styles(w: &mut impl Write, list: &[Style]) -> io::Result<()> {
    let Some((first, rest)) = list.split_first() else {
        return Ok(());
    };
    write!(w, "\x1b[{}", first.sgr())?;
    for s in rest {
        write!(w, ";{}", s.sgr())?;
    }
    w.write_all(b"m")
}

/// Reset all SGR attributes to terminal defaults (SGR 0).
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

// ─── Tests ───────────────────────────────────────────────────────────────────
