// SPDX-License-Identifier: MIT
//
// ttycap: interactive tester for the terminal core.
//
//   ttycap [keys]   raw mode, print every decoded key until `q` or Ctrl-C
//   ttycap colors   reference palette and its 8-bit / 4-bit downconversions
//   ttycap cursor   ask the terminal where the cursor is
//
// Logs go to stderr and are controlled by RUST_LOG (default: warn), so
// `RUST_LOG=trace ttycap keys 2>keys.log` records every decode.

use std::env;
use std::io::{self, Write};
use std::process;

use ttycap_term::ansi;
use ttycap_term::color::{self, Color, ColorSupport, NamedColor, PALETTE, Rgb};
use ttycap_term::error::Result;

/// What the binary was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Keys,
    Colors,
    Cursor,
}

impl Mode {
    fn parse(arg: Option<&str>) -> Option<Self> {
        match arg {
            None | Some("keys") => Some(Self::Keys),
            Some("colors") => Some(Self::Colors),
            Some("cursor") => Some(Self::Cursor),
            Some(_) => None,
        }
    }
}

const USAGE: &str = "usage: ttycap [keys|colors|cursor]";

// ─── Keys ───────────────────────────────────────────────────────────────────

#[cfg(unix)]
fn run_keys() -> Result<()> {
    use ttycap_term::input::Decoder;
    use ttycap_term::key::Key;
    use ttycap_term::source::StdinSource;
    use ttycap_term::terminal::TerminalMode;

    let mut mode = TerminalMode::new();
    let mut decoder = Decoder::new(StdinSource::non_blocking());
    let mut out = io::stdout().lock();

    writeln!(out, "press keys, q or Ctrl-C to quit")?;
    out.flush()?;

    let _raw = mode.raw()?;
    loop {
        let key = decoder.read_key()?;
        writeln!(out, "{:<14} {key:?}", key.to_string())?;
        out.flush()?;
        if matches!(key, Key::Char(b'q') | Key::Ctrl(b'c')) {
            return Ok(());
        }
    }
}

// ─── Colors ─────────────────────────────────────────────────────────────────

/// One palette row: name, 24-bit value, and both downconversions.
fn palette_row(named: NamedColor, rgb: Rgb) -> String {
    let c = Color::Rgb(rgb);
    format!(
        "{:<14} {rgb}  8-bit {:>3}  4-bit {:?}",
        format!("{named:?}"),
        color::to_8bit(c),
        color::to_4bit(c),
    )
}

fn run_colors() -> Result<()> {
    let support = ColorSupport::detect();
    let mut out = io::stdout().lock();
    writeln!(out, "color support: {support:?}")?;

    for (named, rgb) in PALETTE {
        ansi::bg(&mut out, Color::Named(named))?;
        out.write_all(b"    ")?;
        ansi::bg_auto(&mut out, Color::Rgb(rgb), support)?;
        out.write_all(b"    ")?;
        ansi::reset(&mut out)?;
        writeln!(out, " {}", palette_row(named, rgb))?;
    }
    out.flush()?;
    Ok(())
}

// ─── Cursor ─────────────────────────────────────────────────────────────────

#[cfg(unix)]
fn run_cursor() -> Result<()> {
    use ttycap_term::cursor;
    use ttycap_term::source::StdinSource;
    use ttycap_term::terminal::TerminalMode;

    let mut mode = TerminalMode::new();
    let mut source = StdinSource::non_blocking();
    let pos = cursor::query_position(&mut mode, &mut source, &mut io::stdout())?;
    println!("cursor at {pos}");
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────────

#[cfg(unix)]
fn run(mode: Mode) -> Result<()> {
    use ttycap_term::terminal::is_tty;

    match mode {
        Mode::Colors => run_colors(),
        Mode::Keys | Mode::Cursor if !is_tty() => {
            eprintln!("ttycap: stdin is not a terminal");
            process::exit(1);
        }
        Mode::Keys => run_keys(),
        Mode::Cursor => run_cursor(),
    }
}

#[cfg(not(unix))]
fn run(mode: Mode) -> Result<()> {
    match mode {
        Mode::Colors => run_colors(),
        Mode::Keys | Mode::Cursor => {
            eprintln!("ttycap: {mode:?} needs a unix terminal");
            process::exit(1);
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let arg = env::args().nth(1);
    let Some(mode) = Mode::parse(arg.as_deref()) else {
        eprintln!("{USAGE}");
        process::exit(2);
    };
    log::debug!("mode {mode:?}");

    if let Err(e) = run(mode) {
        eprintln!("ttycap: {e}");
        process::exit(1);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
