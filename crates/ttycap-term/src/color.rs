// SPDX-License-Identifier: MIT
//
// Color model: three terminal fidelities and lossy conversion between them.
//
// Single-character variable names (r, g, b) are the standard convention
// for color channels.
#![allow(clippy::many_single_char_names)]
//
// A terminal color comes in one of three flavors:
//
//   Named   → 16 colors + "default" (SGR 30–37, 90–97, 39)
//   Indexed → the 256-entry palette (SGR 38;5;n)
//   Rgb     → 24-bit truecolor (SGR 38;2;r;g;b)
//
// Everything resolves *up* to 24-bit by table lookup, and comes back *down*
// by nearest match under Manhattan distance. The reference palette below is
// the single source of truth for both directions, and its declaration order
// decides ties. That order is part of the output contract: two builds that
// disagree on it produce different escape codes for the same input.
//
// All functions here are pure, `const`-friendly where possible, and never
// touch the terminal.

use std::env;
use std::fmt;

// ─── Rgb ─────────────────────────────────────────────────────────────────────

/// A 24-bit color triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Create a triple from its channels.
    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Whether all three channels are equal (a pure gray).
    #[inline]
    #[must_use]
    pub const fn is_gray(self) -> bool {
        self.r == self.g && self.g == self.b
    }

    /// Manhattan distance between two triples.
    #[inline]
    #[must_use]
    pub const fn manhattan(self, other: Self) -> u16 {
        self.r.abs_diff(other.r) as u16
            + self.g.abs_diff(other.g) as u16
            + self.b.abs_diff(other.b) as u16
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

// ─── NamedColor ──────────────────────────────────────────────────────────────

/// The 16 named terminal colors plus the terminal's default color.
///
/// Discriminants are SGR offsets: foreground is `30 + code`, background is
/// `40 + code`. The bright variants therefore land on 90–97 / 100–107.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NamedColor {
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,
    /// The terminal's own default color (SGR 39 / 49).
    Default = 9,
    Gray = 60,
    BrightRed = 61,
    BrightGreen = 62,
    BrightYellow = 63,
    BrightBlue = 64,
    BrightMagenta = 65,
    BrightCyan = 66,
    BrightWhite = 67,
}

impl NamedColor {
    /// SGR offset for this color (`30 + code` sets the foreground).
    #[inline]
    #[must_use]
    pub const fn sgr_code(self) -> u8 {
        self as u8
    }

    /// Position in the reference palette (0–15), or `None` for `Default`.
    #[must_use]
    pub const fn palette_index(self) -> Option<u8> {
        match self {
            Self::Default => None,
            Self::Black => Some(0),
            Self::Red => Some(1),
            Self::Green => Some(2),
            Self::Yellow => Some(3),
            Self::Blue => Some(4),
            Self::Magenta => Some(5),
            Self::Cyan => Some(6),
            Self::White => Some(7),
            Self::Gray => Some(8),
            Self::BrightRed => Some(9),
            Self::BrightGreen => Some(10),
            Self::BrightYellow => Some(11),
            Self::BrightBlue => Some(12),
            Self::BrightMagenta => Some(13),
            Self::BrightCyan => Some(14),
            Self::BrightWhite => Some(15),
        }
    }

    /// Reference RGB value, or `None` for `Default`.
    #[must_use]
    pub const fn rgb(self) -> Option<Rgb> {
        match self.palette_index() {
            Some(idx) => Some(PALETTE[idx as usize].1),
            None => None,
        }
    }
}

// ─── Reference Palette ───────────────────────────────────────────────────────

/// The 16-entry reference palette, in tie-breaking order.
///
/// Used for Named → Rgb lookup, for indices 0–15 of the 256-color palette,
/// and as the candidate list for nearest-match downconversion. When two
/// entries are equally close, the one declared first wins.
pub const PALETTE: [(NamedColor, Rgb); 16] = [
    (NamedColor::Black, Rgb::new(0, 0, 0)),
    (NamedColor::Red, Rgb::new(151, 12, 40)),
    (NamedColor::Green, Rgb::new(1, 142, 66)),
    (NamedColor::Yellow, Rgb::new(238, 198, 67)),
    (NamedColor::Blue, Rgb::new(13, 33, 161)),
    (NamedColor::Magenta, Rgb::new(255, 0, 144)),
    (NamedColor::Cyan, Rgb::new(0, 159, 184)),
    (NamedColor::White, Rgb::new(240, 240, 240)),
    (NamedColor::Gray, Rgb::new(127, 127, 127)),
    (NamedColor::BrightRed, Rgb::new(241, 85, 116)),
    (NamedColor::BrightGreen, Rgb::new(52, 254, 146)),
    (NamedColor::BrightYellow, Rgb::new(243, 215, 124)),
    (NamedColor::BrightBlue, Rgb::new(63, 136, 197)),
    (NamedColor::BrightMagenta, Rgb::new(255, 92, 184)),
    (NamedColor::BrightCyan, Rgb::new(51, 228, 255)),
    (NamedColor::BrightWhite, Rgb::new(255, 255, 255)),
];

/// Channel levels of the 6×6×6 color cube (indices 16–231).
const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

// ─── Color ───────────────────────────────────────────────────────────────────

/// A terminal color at one of three fidelities, or no color at all.
///
/// `Empty` means "reset to whatever the terminal uses" and is not a color
/// value: it resolves to `Empty` at 24-bit, to [`NamedColor::Default`] at
/// 4-bit, and to index 0 at 8-bit.
///
/// # Examples
///
/// ```
/// use ttycap_term::color::{self, Color, NamedColor};
///
/// let orange = Color::rgb(255, 140, 0);
/// assert_eq!(color::to_8bit(orange), 208);
/// assert_eq!(color::to_4bit(orange), Color::Named(NamedColor::Yellow));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// No color: emit the terminal default.
    #[default]
    Empty,
    /// One of the 16 named colors (or the default sentinel).
    Named(NamedColor),
    /// An index into the 256-color palette.
    Indexed(u8),
    /// 24-bit truecolor.
    Rgb(Rgb),
}

impl Color {
    /// Shorthand for `Color::Rgb(Rgb::new(r, g, b))`.
    #[inline]
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::Rgb(Rgb::new(r, g, b))
    }

    /// Whether this is the "no color" state.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty | Self::Named(NamedColor::Default))
    }

    /// Resolve to a 24-bit triple, or `None` for `Empty` / `Default`.
    #[must_use]
    pub const fn resolve(self) -> Option<Rgb> {
        match self {
            Self::Empty => None,
            Self::Named(named) => named.rgb(),
            Self::Indexed(idx) => Some(bit8_to_rgb(idx)),
            Self::Rgb(rgb) => Some(rgb),
        }
    }
}

impl From<NamedColor> for Color {
    fn from(named: NamedColor) -> Self {
        Self::Named(named)
    }
}

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        Self::Rgb(rgb)
    }
}

// ─── Conversions ─────────────────────────────────────────────────────────────

/// Manhattan distance between two colors after resolving both to 24-bit.
///
/// `Empty` and `Default` count as `(0, 0, 0)` for the metric.
#[must_use]
pub fn distance(a: Color, b: Color) -> u16 {
    let a = a.resolve().unwrap_or_default();
    let b = b.resolve().unwrap_or_default();
    a.manhattan(b)
}

/// Resolve any color to its 24-bit form.
///
/// `Rgb` is returned unchanged; `Empty` and `Default` stay empty.
#[must_use]
pub const fn to_24bit(c: Color) -> Color {
    match c.resolve() {
        Some(rgb) => Color::Rgb(rgb),
        None => Color::Empty,
    }
}

/// Downconvert to the nearest of the 16 named colors.
///
/// A single arg-min over [`PALETTE`]; `min_by_key` keeps the first of equal
/// minima, so ties go to the entry declared earlier.
#[must_use]
pub fn to_4bit(c: Color) -> Color {
    let Some(rgb) = c.resolve() else {
        return Color::Named(NamedColor::Default);
    };

    PALETTE
        .iter()
        .min_by_key(|(_, reference)| rgb.manhattan(*reference))
        .map_or(Color::Named(NamedColor::Black), |&(named, _)| {
            Color::Named(named)
        })
}

/// Downconvert to a 256-color palette index.
///
/// Exact reference-palette hits map to 0–15. Pure grays use the ramp
/// formula `232 + r/32 + g/32 + b/32`, which is not a luminance mapping
/// and is kept exactly as is for compatibility. Everything else lands in
/// the cube at `16 + 36·(r/51) + 6·(g/51) + b/51`.
#[must_use]
pub fn to_8bit(c: Color) -> u8 {
    let Some(rgb) = c.resolve() else {
        return 0;
    };

    if let Some(idx) = PALETTE.iter().position(|(_, reference)| *reference == rgb) {
        // Position is < 16.
        #[allow(clippy::cast_possible_truncation)]
        return idx as u8;
    }

    let Rgb { r, g, b } = rgb;
    if rgb.is_gray() {
        return 232 + r / 32 + g / 32 + b / 32;
    }

    16 + 36 * (r / 51) + 6 * (g / 51) + b / 51
}

/// Resolve a 256-color palette index to 24-bit.
///
/// - 0–15: the reference palette
/// - 16–231: a 6×6×6 cube over [0, 95, 135, 175, 215, 255]
/// - 232–255: a 24-step gray ramp, `8 + n·32/3` for step `n`
///
/// The ramp spacing makes every grayscale index that [`to_8bit`] can
/// produce resolve back to a gray that maps to the same index.
#[must_use]
pub const fn bit8_to_rgb(idx: u8) -> Rgb {
    match idx {
        0..=15 => PALETTE[idx as usize].1,
        16..=231 => {
            let idx = idx - 16;
            Rgb::new(
                CUBE_LEVELS[(idx / 36) as usize],
                CUBE_LEVELS[((idx % 36) / 6) as usize],
                CUBE_LEVELS[(idx % 6) as usize],
            )
        }
        232..=255 => {
            // (23 * 32) / 3 + 8 = 253, fits in u8.
            let v = 8 + ((idx - 232) as u16 * 32 / 3) as u8;
            Rgb::new(v, v, v)
        }
    }
}

// ─── Truecolor Support ───────────────────────────────────────────────────────

/// Whether the environment advertises 24-bit color (`COLORTERM`).
#[must_use]
pub fn supports_truecolor() -> bool {
    ColorSupport::detect() == ColorSupport::TrueColor
}

/// The richest color fidelity the host terminal is known to accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSupport {
    /// 24-bit colors are passed through.
    TrueColor,
    /// Colors are downconverted to the 256-color palette.
    #[default]
    Indexed,
}

impl ColorSupport {
    /// Read `COLORTERM` from the process environment.
    #[must_use]
    pub fn detect() -> Self {
        Self::from_colorterm(env::var("COLORTERM").ok().as_deref())
    }

    /// Classify a `COLORTERM` value. Only `truecolor` and `24bit` count.
    #[must_use]
    pub fn from_colorterm(value: Option<&str>) -> Self {
        match value {
            Some("truecolor" | "24bit") => Self::TrueColor,
            _ => Self::Indexed,
        }
    }

    /// Pick the representation to emit for `c` under this support level.
    ///
    /// Truecolor passes everything through. Otherwise any resolvable color
    /// becomes `Indexed(to_8bit(c))`; `Empty` and `Default` stay as they are.
    #[must_use]
    pub fn downgrade(self, c: Color) -> Color {
        match self {
            Self::TrueColor => c,
            Self::Indexed if c.is_empty() => c,
            Self::Indexed => Color::Indexed(to_8bit(c)),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn named(c: NamedColor) -> Color {
        Color::Named(c)
    }

    // ── Distance ─────────────────────────────────────────────────────────

    #[test]
    fn distance_is_manhattan() {
        assert_eq!(distance(Color::rgb(10, 20, 30), Color::rgb(13, 16, 30)), 7);
    }

    #[test]
    fn distance_black_to_white_is_max() {
        assert_eq!(distance(named(NamedColor::Black), named(NamedColor::BrightWhite)), 765);
    }

    #[test]
    fn distance_across_fidelities() {
        // Index 9 is BrightRed in the reference palette.
        assert_eq!(distance(Color::Indexed(9), named(NamedColor::BrightRed)), 0);
        assert_eq!(distance(Color::rgb(151, 12, 40), named(NamedColor::Red)), 0);
    }

    #[test]
    fn distance_empty_counts_as_black() {
        assert_eq!(distance(Color::Empty, Color::rgb(1, 2, 3)), 6);
        assert_eq!(distance(named(NamedColor::Default), Color::Empty), 0);
    }

    // ── to_24bit ─────────────────────────────────────────────────────────

    #[test]
    fn to_24bit_named() {
        assert_eq!(to_24bit(named(NamedColor::Cyan)), Color::rgb(0, 159, 184));
    }

    #[test]
    fn to_24bit_identity() {
        assert_eq!(to_24bit(Color::rgb(1, 2, 3)), Color::rgb(1, 2, 3));
    }

    #[test]
    fn to_24bit_empty_and_default() {
        assert_eq!(to_24bit(Color::Empty), Color::Empty);
        assert_eq!(to_24bit(named(NamedColor::Default)), Color::Empty);
    }

    #[test]
    fn to_24bit_indexed() {
        assert_eq!(to_24bit(Color::Indexed(196)), Color::rgb(255, 0, 0));
    }

    // ── bit8_to_rgb ──────────────────────────────────────────────────────

    #[test]
    fn bit8_low_indices_use_reference_palette() {
        for (i, (_, rgb)) in PALETTE.iter().enumerate() {
            assert_eq!(bit8_to_rgb(i as u8), *rgb);
        }
    }

    #[test]
    fn bit8_cube_corners() {
        assert_eq!(bit8_to_rgb(16), Rgb::new(0, 0, 0));
        assert_eq!(bit8_to_rgb(21), Rgb::new(0, 0, 255));
        assert_eq!(bit8_to_rgb(196), Rgb::new(255, 0, 0));
        assert_eq!(bit8_to_rgb(231), Rgb::new(255, 255, 255));
    }

    #[test]
    fn bit8_gray_ramp_bounds() {
        assert_eq!(bit8_to_rgb(232), Rgb::new(8, 8, 8));
        assert_eq!(bit8_to_rgb(255), Rgb::new(253, 253, 253));
        for idx in 232..=255u8 {
            assert!(bit8_to_rgb(idx).is_gray());
        }
    }

    // ── to_4bit ──────────────────────────────────────────────────────────

    #[test]
    fn to_4bit_palette_members_are_fixed_points() {
        for (name, _) in PALETTE {
            assert_eq!(to_4bit(to_24bit(named(name))), named(name));
        }
    }

    #[test]
    fn to_4bit_empty_is_default_not_black() {
        assert_eq!(to_4bit(Color::Empty), named(NamedColor::Default));
        assert_eq!(to_4bit(named(NamedColor::Default)), named(NamedColor::Default));
    }

    #[test]
    fn to_4bit_nearest() {
        assert_eq!(to_4bit(Color::rgb(250, 0, 0)), named(NamedColor::Magenta));
        assert_eq!(to_4bit(Color::rgb(10, 10, 10)), named(NamedColor::Black));
        assert_eq!(to_4bit(Color::rgb(130, 125, 128)), named(NamedColor::Gray));
    }

    #[test]
    fn to_4bit_tie_prefers_earlier_entry() {
        // 153 from both Red and Green.
        assert_eq!(distance(Color::rgb(51, 48, 57), named(NamedColor::Red)), 153);
        assert_eq!(distance(Color::rgb(51, 48, 57), named(NamedColor::Green)), 153);
        assert_eq!(to_4bit(Color::rgb(51, 48, 57)), named(NamedColor::Red));

        // 108 from both Green and Blue.
        assert_eq!(to_4bit(Color::rgb(3, 39, 69)), named(NamedColor::Green));

        // 151 from both Red and Magenta.
        assert_eq!(to_4bit(Color::rgb(110, 0, 138)), named(NamedColor::Red));
    }

    #[test]
    fn to_4bit_from_indexed() {
        assert_eq!(to_4bit(Color::Indexed(12)), named(NamedColor::BrightBlue));
    }

    // ── to_8bit ──────────────────────────────────────────────────────────

    #[test]
    fn to_8bit_empty_is_zero() {
        assert_eq!(to_8bit(Color::Empty), 0);
    }

    #[test]
    fn to_8bit_exact_palette_hits() {
        for (i, (name, _)) in PALETTE.iter().enumerate() {
            assert_eq!(usize::from(to_8bit(named(*name))), i);
        }
        assert_eq!(to_8bit(Color::rgb(127, 127, 127)), 8);
    }

    #[test]
    fn to_8bit_grayscale_formula() {
        assert_eq!(to_8bit(Color::rgb(10, 10, 10)), 232);
        assert_eq!(to_8bit(Color::rgb(64, 64, 64)), 238);
        assert_eq!(to_8bit(Color::rgb(200, 200, 200)), 250);
        assert_eq!(to_8bit(Color::rgb(254, 254, 254)), 253);
    }

    #[test]
    fn to_8bit_cube_formula() {
        assert_eq!(to_8bit(Color::rgb(255, 0, 0)), 196);
        assert_eq!(to_8bit(Color::rgb(0, 255, 0)), 46);
        assert_eq!(to_8bit(Color::rgb(0, 0, 255)), 21);
        assert_eq!(to_8bit(Color::rgb(255, 140, 0)), 208);
    }

    // ── ColorSupport ─────────────────────────────────────────────────────

    #[test]
    fn colorterm_values() {
        assert_eq!(ColorSupport::from_colorterm(Some("truecolor")), ColorSupport::TrueColor);
        assert_eq!(ColorSupport::from_colorterm(Some("24bit")), ColorSupport::TrueColor);
        assert_eq!(ColorSupport::from_colorterm(Some("TRUECOLOR")), ColorSupport::Indexed);
        assert_eq!(ColorSupport::from_colorterm(Some("")), ColorSupport::Indexed);
        assert_eq!(ColorSupport::from_colorterm(None), ColorSupport::Indexed);
    }

    #[test]
    fn downgrade() {
        let c = Color::rgb(255, 0, 0);
        assert_eq!(ColorSupport::TrueColor.downgrade(c), c);
        assert_eq!(ColorSupport::Indexed.downgrade(c), Color::Indexed(196));
        assert_eq!(ColorSupport::Indexed.downgrade(Color::Empty), Color::Empty);
    }

    #[test]
    fn rgb_display_is_hex() {
        assert_eq!(Rgb::new(255, 8, 0).to_string(), "#ff0800");
    }

    // ── Properties ───────────────────────────────────────────────────────

    fn any_color() -> impl Strategy<Value = Color> {
        prop_oneof![
            Just(Color::Empty),
            (0..PALETTE.len()).prop_map(|i| Color::Named(PALETTE[i].0)),
            any::<u8>().prop_map(Color::Indexed),
            any::<(u8, u8, u8)>().prop_map(|(r, g, b)| Color::rgb(r, g, b)),
        ]
    }

    proptest! {
        #[test]
        fn distance_is_symmetric(a in any_color(), b in any_color()) {
            prop_assert_eq!(distance(a, b), distance(b, a));
        }

        #[test]
        fn distance_to_self_is_zero(a in any_color()) {
            prop_assert_eq!(distance(a, a), 0);
        }

        #[test]
        fn to_4bit_always_named(a in any_color()) {
            prop_assert!(matches!(to_4bit(a), Color::Named(_)));
        }

        // Off-diagonal cube colors and pure grays survive re-resolution.
        // (Non-gray colors whose channels share one cube level land on a
        // diagonal index that resolves to a gray, so they are excluded.)
        #[test]
        fn to_8bit_reresolves(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
            let rgb = Rgb::new(r, g, b);
            let diagonal = r / 51 == g / 51 && g / 51 == b / 51;
            prop_assume!(rgb.is_gray() || !diagonal);

            let idx = to_8bit(Color::Rgb(rgb));
            prop_assert_eq!(to_8bit(Color::Rgb(bit8_to_rgb(idx))), idx);
        }
    }
}
