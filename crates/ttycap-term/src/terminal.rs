// SPDX-License-Identifier: MIT
//
// Terminal mode control: raw mode, echo suspension, and RAII restore.
//
// Safety: This module uses `unsafe` for termios (tcgetattr, tcsetattr),
// ioctl (TIOCGWINSZ) and isatty. These are the POSIX interfaces for
// terminal control and have no safe counterpart in std. Each unsafe block
// wraps a single call.
#![allow(unsafe_code)]
//
// Raw-mode state lives in an owned `TerminalMode` value rather than a
// process global. Whoever owns it owns the terminal's line discipline:
// `enable()` snapshots the current attributes and switches to raw,
// `disable()` puts the snapshot back, and dropping the value restores
// anything still switched. Two scope guards cover the common patterns:
// `RawGuard` for "raw for this block" and `EchoGuard` for the short
// no-echo window the cursor position query needs.
//
// All attribute traffic goes through `AttributeAccess`, so the state
// machine can be exercised against a fake terminal in tests.

use std::fmt;
use std::io;
use std::ops::{Deref, DerefMut};
use std::os::unix::io::RawFd;

use crate::error::{Error, Result};

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

impl Size {
    /// Total number of cells (`cols × rows`).
    #[inline]
    #[must_use]
    pub const fn area(self) -> u32 {
        self.cols as u32 * self.rows as u32
    }
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the current terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal or the query fails.
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

/// Check whether stdin is connected to a terminal (TTY).
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

/// Check whether stdout is connected to a terminal (TTY).
#[must_use]
pub fn is_stdout_tty() -> bool {
    unsafe { libc::isatty(libc::STDOUT_FILENO) != 0 }
}

// ─── Attributes ─────────────────────────────────────────────────────────────

/// A snapshot of a terminal's line-discipline settings (`struct termios`).
#[derive(Clone, Copy)]
pub struct Attributes {
    termios: libc::termios,
}

impl Attributes {
    /// All flags clear, all control characters zero.
    #[must_use]
    pub fn zeroed() -> Self {
        Self {
            termios: unsafe { std::mem::zeroed() },
        }
    }

    /// Wrap a `termios` obtained elsewhere.
    #[inline]
    #[must_use]
    pub const fn from_termios(termios: libc::termios) -> Self {
        Self { termios }
    }

    /// The underlying `termios`.
    #[inline]
    #[must_use]
    pub const fn as_termios(&self) -> &libc::termios {
        &self.termios
    }

    /// Mutable access to the underlying `termios`.
    #[inline]
    pub const fn as_termios_mut(&mut self) -> &mut libc::termios {
        &mut self.termios
    }

    /// The raw-mode variant of these attributes.
    ///
    /// Turns off echo, canonical input, signal keys and extended input
    /// processing, plus break-to-SIGINT, CR-to-NL, parity checking,
    /// 8th-bit stripping and XON/XOFF. Forces 8-bit characters and
    /// byte-at-a-time reads (`VMIN = 1`, `VTIME = 0`). Output
    /// post-processing is left alone so `\n` still moves to column 0.
    #[must_use]
    pub fn to_raw(&self) -> Self {
        let mut raw = *self;
        let t = &mut raw.termios;
        t.c_lflag &= !(libc::ECHO | libc::ICANON | libc::ISIG | libc::IEXTEN);
        t.c_iflag &= !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);
        t.c_cflag |= libc::CS8;
        t.c_cc[libc::VMIN] = 1;
        t.c_cc[libc::VTIME] = 0;
        raw
    }

    /// Whether echo, canonical input and signal keys are all off.
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        self.termios.c_lflag & (libc::ECHO | libc::ICANON | libc::ISIG) == 0
    }

    /// Whether canonical input or echo is on.
    #[must_use]
    pub const fn echoes(&self) -> bool {
        self.termios.c_lflag & (libc::ICANON | libc::ECHO) != 0
    }

    /// These attributes with canonical input and echo turned off.
    #[must_use]
    pub fn without_echo(&self) -> Self {
        let mut quiet = *self;
        quiet.termios.c_lflag &= !(libc::ICANON | libc::ECHO);
        quiet
    }
}

impl From<libc::termios> for Attributes {
    fn from(termios: libc::termios) -> Self {
        Self::from_termios(termios)
    }
}

impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (&self.termios, &other.termios);
        a.c_iflag == b.c_iflag
            && a.c_oflag == b.c_oflag
            && a.c_cflag == b.c_cflag
            && a.c_lflag == b.c_lflag
            && a.c_cc == b.c_cc
    }
}

impl Eq for Attributes {}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = &self.termios;
        f.debug_struct("Attributes")
            .field("iflag", &format_args!("{:#o}", t.c_iflag))
            .field("oflag", &format_args!("{:#o}", t.c_oflag))
            .field("cflag", &format_args!("{:#o}", t.c_cflag))
            .field("lflag", &format_args!("{:#o}", t.c_lflag))
            .field("vmin", &t.c_cc[libc::VMIN])
            .field("vtime", &t.c_cc[libc::VTIME])
            .finish()
    }
}

// ─── Attribute Access ───────────────────────────────────────────────────────

/// When a new set of attributes takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Apply {
    /// Immediately (`TCSANOW`).
    Now,
    /// After pending output drains, discarding unread input (`TCSAFLUSH`).
    Flush,
}

/// Reads and writes terminal attributes.
pub trait AttributeAccess {
    /// Fetch the current attributes.
    ///
    /// # Errors
    ///
    /// Fails if the underlying descriptor is not a terminal.
    fn get(&self) -> io::Result<Attributes>;

    /// Apply `attrs`.
    ///
    /// # Errors
    ///
    /// Fails if the underlying descriptor is not a terminal.
    fn set(&self, attrs: &Attributes, when: Apply) -> io::Result<()>;
}

impl<A: AttributeAccess + ?Sized> AttributeAccess for &A {
    fn get(&self) -> io::Result<Attributes> {
        (**self).get()
    }

    fn set(&self, attrs: &Attributes, when: Apply) -> io::Result<()> {
        (**self).set(attrs, when)
    }
}

/// Attribute access over a terminal file descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tty {
    fd: RawFd,
}

impl Tty {
    /// The terminal behind `fd`. The descriptor is borrowed, not owned.
    #[must_use]
    pub const fn new(fd: RawFd) -> Self {
        Self { fd }
    }

    /// The terminal behind stdin.
    #[must_use]
    pub const fn stdin() -> Self {
        Self::new(libc::STDIN_FILENO)
    }

    #[inline]
    #[must_use]
    pub const fn fd(&self) -> RawFd {
        self.fd
    }
}

impl Default for Tty {
    fn default() -> Self {
        Self::stdin()
    }
}

impl AttributeAccess for Tty {
    fn get(&self) -> io::Result<Attributes> {
        let mut attrs = Attributes::zeroed();
        if unsafe { libc::tcgetattr(self.fd, &raw mut attrs.termios) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(attrs)
    }

    fn set(&self, attrs: &Attributes, when: Apply) -> io::Result<()> {
        let action = match when {
            Apply::Now => libc::TCSANOW,
            Apply::Flush => libc::TCSAFLUSH,
        };
        if unsafe { libc::tcsetattr(self.fd, action, &raw const attrs.termios) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

// ─── TerminalMode ───────────────────────────────────────────────────────────

/// Owner of a terminal's raw-mode state.
///
/// Restores the pre-raw attributes when dropped while still enabled.
///
/// # Example
///
/// ```no_run
/// use ttycap_term::terminal::TerminalMode;
///
/// let mut mode = TerminalMode::new();
/// {
///     let _raw = mode.raw()?;
///     // ... read keys byte by byte ...
/// } // cooked mode again
/// # Ok::<(), ttycap_term::Error>(())
/// ```
pub struct TerminalMode<A: AttributeAccess = Tty> {
    access: A,
    enabled: bool,
    saved: Option<Attributes>,
}

impl TerminalMode<Tty> {
    /// Mode manager for the terminal behind stdin. Does not touch the
    /// terminal until [`enable`](Self::enable) is called.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_access(Tty::stdin())
    }
}

impl Default for TerminalMode<Tty> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: AttributeAccess> TerminalMode<A> {
    /// Mode manager over a custom attribute accessor.
    pub const fn with_access(access: A) -> Self {
        Self {
            access,
            enabled: false,
            saved: None,
        }
    }

    /// The attribute accessor.
    #[inline]
    pub const fn access(&self) -> &A {
        &self.access
    }

    /// Attributes captured by the most recent [`enable`](Self::enable).
    ///
    /// Kept after [`disable`](Self::disable).
    #[inline]
    pub const fn saved(&self) -> Option<&Attributes> {
        self.saved.as_ref()
    }

    /// Switch the terminal to raw mode.
    ///
    /// No-op if already enabled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TerminalUnavailable`] if the attributes cannot be
    /// read or written. The manager stays disabled in that case.
    pub fn enable(&mut self) -> Result<()> {
        if self.enabled {
            return Ok(());
        }

        let original = self.access.get().map_err(Error::TerminalUnavailable)?;
        self.saved = Some(original);
        self.access
            .set(&original.to_raw(), Apply::Flush)
            .map_err(Error::TerminalUnavailable)?;

        self.enabled = true;
        log::debug!("raw mode enabled");
        Ok(())
    }

    /// Restore the attributes saved by [`enable`](Self::enable).
    ///
    /// No-op if not enabled. The manager is marked disabled even when the
    /// restore fails, so a second call will not retry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TerminalUnavailable`] if the restore fails.
    pub fn disable(&mut self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        self.enabled = false;

        if let Some(saved) = &self.saved {
            self.access
                .set(saved, Apply::Flush)
                .map_err(Error::TerminalUnavailable)?;
        }
        log::debug!("raw mode disabled");
        Ok(())
    }

    /// Whether raw mode is on, both by our own bookkeeping and by the
    /// terminal's live attributes.
    ///
    /// Returns `false` if something else switched echo, canonical input
    /// or signal keys back on since [`enable`](Self::enable).
    pub fn is_enabled(&self) -> bool {
        if !self.enabled {
            return false;
        }
        match self.access.get() {
            Ok(live) if live.is_raw() => true,
            Ok(live) => {
                log::warn!("raw mode was changed by another party: {live:?}");
                false
            }
            Err(e) => {
                log::warn!("cannot read terminal attributes: {e}");
                false
            }
        }
    }

    /// Put raw mode back if another party switched it off since
    /// [`enable`](Self::enable).
    ///
    /// Returns `false` without touching the terminal when raw mode is not
    /// enabled. The saved attributes are kept, so [`disable`](Self::disable)
    /// still restores the state from before `enable`. Pending input is not
    /// flushed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TerminalUnavailable`] if the attributes cannot be
    /// read or written.
    pub fn reassert(&mut self) -> Result<bool> {
        if !self.enabled {
            return Ok(false);
        }

        let live = self.access.get().map_err(Error::TerminalUnavailable)?;
        if live.is_raw() {
            return Ok(true);
        }

        let raw = self
            .saved
            .as_ref()
            .map_or_else(|| live.to_raw(), Attributes::to_raw);
        self.access
            .set(&raw, Apply::Now)
            .map_err(Error::TerminalUnavailable)?;
        log::debug!("raw mode re-applied");
        Ok(true)
    }

    /// Enable raw mode for the lifetime of the returned guard.
    ///
    /// The guard calls [`disable`](Self::disable) when dropped, even if
    /// raw mode was already on before this call.
    ///
    /// # Errors
    ///
    /// Same as [`enable`](Self::enable).
    pub fn raw(&mut self) -> Result<RawGuard<'_, A>> {
        self.enable()?;
        Ok(RawGuard { mode: self })
    }

    /// Turn off canonical input and echo until the returned guard drops.
    ///
    /// Only touches the terminal if either flag is on. The guard puts back
    /// exactly the attributes seen here, whatever raw-mode state they had.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TerminalUnavailable`] if the attributes cannot be
    /// read or written.
    pub fn suspend_echo(&mut self) -> Result<EchoGuard<'_, A>> {
        let prior = self.access.get().map_err(Error::TerminalUnavailable)?;
        if !prior.echoes() {
            return Ok(EchoGuard {
                access: &self.access,
                prior: None,
            });
        }

        self.access
            .set(&prior.without_echo(), Apply::Now)
            .map_err(Error::TerminalUnavailable)?;
        log::trace!("echo suspended");
        Ok(EchoGuard {
            access: &self.access,
            prior: Some(prior),
        })
    }
}

impl<A: AttributeAccess> Drop for TerminalMode<A> {
    fn drop(&mut self) {
        if self.enabled {
            if let Err(e) = self.disable() {
                log::warn!("failed to restore terminal on drop: {e}");
            }
        }
    }
}

impl<A: AttributeAccess> fmt::Debug for TerminalMode<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalMode")
            .field("enabled", &self.enabled)
            .field("saved", &self.saved)
            .finish_non_exhaustive()
    }
}

// ─── Guards ─────────────────────────────────────────────────────────────────

/// Keeps raw mode on; disables it when dropped.
///
/// Dereferences to the [`TerminalMode`] so the mode can still be used
/// (e.g. for a cursor query) while the guard is alive.
#[must_use = "raw mode is disabled as soon as the guard is dropped"]
pub struct RawGuard<'a, A: AttributeAccess = Tty> {
    mode: &'a mut TerminalMode<A>,
}

impl<A: AttributeAccess> Deref for RawGuard<'_, A> {
    type Target = TerminalMode<A>;

    fn deref(&self) -> &Self::Target {
        self.mode
    }
}

impl<A: AttributeAccess> DerefMut for RawGuard<'_, A> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.mode
    }
}

impl<A: AttributeAccess> Drop for RawGuard<'_, A> {
    fn drop(&mut self) {
        if let Err(e) = self.mode.disable() {
            log::warn!("failed to leave raw mode: {e}");
        }
    }
}

/// Keeps canonical input and echo off; restores the prior attributes
/// when dropped.
#[must_use = "echo is restored as soon as the guard is dropped"]
pub struct EchoGuard<'a, A: AttributeAccess = Tty> {
    access: &'a A,
    prior: Option<Attributes>,
}

impl<A: AttributeAccess> EchoGuard<'_, A> {
    /// Whether this guard changed anything (and will restore on drop).
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.prior.is_some()
    }
}

impl<A: AttributeAccess> Drop for EchoGuard<'_, A> {
    fn drop(&mut self) {
        if let Some(prior) = self.prior.take() {
            match self.access.set(&prior, Apply::Now) {
                Ok(()) => log::trace!("echo restored"),
                Err(e) => log::warn!("failed to restore echo: {e}"),
            }
        }
    }
}

// ─── Test Support ───────────────────────────────────────────────────────────

/// In-memory terminal used to drive the mode state machine in tests.
#[cfg(test)]
pub(crate) mod fake {
    use std::cell::{Cell, RefCell};
    use std::io;

    use super::{Apply, AttributeAccess, Attributes};

    /// Cooked-mode attributes as a fresh login shell would have them.
    pub fn cooked() -> Attributes {
        let mut attrs = Attributes::zeroed();
        let t = attrs.as_termios_mut();
        t.c_lflag = libc::ECHO | libc::ICANON | libc::ISIG | libc::IEXTEN;
        t.c_iflag = libc::ICRNL | libc::IXON | libc::BRKINT;
        t.c_oflag = libc::OPOST;
        t.c_cflag = libc::CS7;
        t.c_cc[libc::VMIN] = 0;
        t.c_cc[libc::VTIME] = 5;
        attrs
    }

    #[derive(Debug)]
    pub struct FakeTty {
        pub attrs: Cell<Attributes>,
        pub fail_get: Cell<bool>,
        pub fail_set: Cell<bool>,
        pub sets: RefCell<Vec<(Attributes, Apply)>>,
    }

    impl FakeTty {
        pub fn new(attrs: Attributes) -> Self {
            Self {
                attrs: Cell::new(attrs),
                fail_get: Cell::new(false),
                fail_set: Cell::new(false),
                sets: RefCell::new(Vec::new()),
            }
        }
    }

    impl Default for FakeTty {
        fn default() -> Self {
            Self::new(cooked())
        }
    }

    impl AttributeAccess for FakeTty {
        fn get(&self) -> io::Result<Attributes> {
            if self.fail_get.get() {
                return Err(io::Error::from_raw_os_error(libc::ENOTTY));
            }
            Ok(self.attrs.get())
        }

        fn set(&self, attrs: &Attributes, when: Apply) -> io::Result<()> {
            if self.fail_set.get() {
                return Err(io::Error::from_raw_os_error(libc::EIO));
            }
            self.sets.borrow_mut().push((*attrs, when));
            self.attrs.set(*attrs);
            Ok(())
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
