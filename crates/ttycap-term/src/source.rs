// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Byte sources for the input decoder.
//
// The decoder pulls one byte at a time and needs to tell three states
// apart: a byte arrived, nothing is available *yet*, and the stream is
// gone for good. `ByteSource` models exactly that. The stdin
// implementation polls the descriptor so a lone ESC can be told apart
// from the start of an escape sequence; the in-memory queue drives
// tests and hosts that already have the bytes.

use std::collections::VecDeque;
use std::io::{self, Read};
use std::thread;
use std::time::Duration;

/// End of Transmission (Ctrl-D).
pub const EOT: u8 = 0x04;

/// A source of raw input bytes.
pub trait ByteSource {
    /// Read one byte if one is available.
    ///
    /// Returns `Ok(None)` when no byte is ready, including after the
    /// source has closed; check [`is_closed`](Self::is_closed) to tell
    /// the two apart.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error on a hard read failure.
    fn try_read_one(&mut self) -> io::Result<Option<u8>>;

    /// Whether the source has reached end of input and no more bytes
    /// will ever arrive.
    fn is_closed(&self) -> bool;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn try_read_one(&mut self) -> io::Result<Option<u8>> {
        (**self).try_read_one()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn try_read_one(&mut self) -> io::Result<Option<u8>> {
        (**self).try_read_one()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Wait for the next byte, sleeping `interval` between empty polls.
///
/// Returns `Ok(None)` once the source is closed and drained.
///
/// # Errors
///
/// Propagates hard read failures from the source.
pub fn next_byte_blocking<S: ByteSource + ?Sized>(
    source: &mut S,
    interval: Duration,
) -> io::Result<Option<u8>> {
    loop {
        if let Some(byte) = source.try_read_one()? {
            return Ok(Some(byte));
        }
        if source.is_closed() {
            return Ok(None);
        }
        thread::sleep(interval);
    }
}

/// Collect input until an [`EOT`] byte or end of input.
///
/// The EOT byte itself is consumed but not returned. Useful for reading
/// piped or pasted text with the terminal in cooked mode, where Ctrl-D
/// ends the stream.
///
/// # Errors
///
/// Propagates hard read failures from the source.
pub fn read_until_eot<S: ByteSource + ?Sized>(
    source: &mut S,
    interval: Duration,
) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    while let Some(byte) = next_byte_blocking(source, interval)? {
        if byte == EOT {
            break;
        }
        out.push(byte);
    }
    Ok(out)
}

// ─── StdinSource ─────────────────────────────────────────────────────────────

/// Reads bytes straight from a terminal file descriptor (stdin by default).
///
/// In non-blocking mode each read is preceded by a zero-timeout `poll()`,
/// so [`try_read_one`](ByteSource::try_read_one) returns immediately when
/// no input is pending. In blocking mode the read waits for a byte, which
/// means a lone ESC press is only reported once the next key arrives.
#[cfg(unix)]
#[derive(Debug)]
pub struct StdinSource {
    fd: std::os::unix::io::RawFd,
    blocking: bool,
    closed: bool,
}

#[cfg(unix)]
impl StdinSource {
    /// Non-blocking source over stdin.
    #[must_use]
    pub const fn non_blocking() -> Self {
        Self {
            fd: libc::STDIN_FILENO,
            blocking: false,
            closed: false,
        }
    }

    /// Blocking source over stdin.
    #[must_use]
    pub const fn blocking() -> Self {
        Self {
            fd: libc::STDIN_FILENO,
            blocking: true,
            closed: false,
        }
    }

    /// Read from `fd` instead of stdin. The descriptor is borrowed, not
    /// closed on drop.
    #[must_use]
    pub const fn with_fd(mut self, fd: std::os::unix::io::RawFd) -> Self {
        self.fd = fd;
        self
    }

    /// Whether reads wait for input.
    #[inline]
    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        self.blocking
    }

    /// Number of input bytes waiting to be read, via `ioctl(FIONREAD)`.
    ///
    /// Never blocks. A closed source reports 0.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the descriptor does not support the query.
    pub fn pending(&self) -> io::Result<usize> {
        if self.closed {
            return Ok(0);
        }
        let mut n: libc::c_int = 0;
        let result = unsafe { libc::ioctl(self.fd, libc::FIONREAD, &raw mut n) };
        if result < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(usize::try_from(n).unwrap_or(0))
    }

    fn poll_ready(&self) -> io::Result<bool> {
        let mut pfd = libc::pollfd {
            fd: self.fd,
            events: libc::POLLIN,
            revents: 0,
        };
        let ready = unsafe { libc::poll(&raw mut pfd, 1, 0) };
        if ready < 0 {
            let err = io::Error::last_os_error();
            return if err.kind() == io::ErrorKind::Interrupted {
                Ok(false)
            } else {
                Err(err)
            };
        }
        // POLLHUP without POLLIN still needs a read() to observe EOF.
        Ok(ready > 0 && pfd.revents & (libc::POLLIN | libc::POLLHUP) != 0)
    }
}

#[cfg(unix)]
impl Default for StdinSource {
    fn default() -> Self {
        Self::non_blocking()
    }
}

#[cfg(unix)]
impl ByteSource for StdinSource {
    fn try_read_one(&mut self) -> io::Result<Option<u8>> {
        if self.closed {
            return Ok(None);
        }
        if !self.blocking && !self.poll_ready()? {
            return Ok(None);
        }

        let mut byte = 0u8;
        let n = unsafe { libc::read(self.fd, (&raw mut byte).cast(), 1) };
        match n {
            1 => Ok(Some(byte)),
            0 => {
                log::debug!("byte source on fd {} reached end of input", self.fd);
                self.closed = true;
                Ok(None)
            }
            _ => {
                let err = io::Error::last_os_error();
                match err.kind() {
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => Ok(None),
                    _ => Err(err),
                }
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

// ─── ReaderSource ────────────────────────────────────────────────────────────

/// Adapts any [`Read`] into a byte source.
///
/// Each call performs a one-byte read. `Ok(0)` marks the source closed;
/// `WouldBlock` and `Interrupted` count as "nothing yet".
#[derive(Debug)]
pub struct ReaderSource<R> {
    inner: R,
    closed: bool,
}

impl<R: Read> ReaderSource<R> {
    pub const fn new(inner: R) -> Self {
        Self {
            inner,
            closed: false,
        }
    }

    /// Unwrap the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn try_read_one(&mut self) -> io::Result<Option<u8>> {
        if self.closed {
            return Ok(None);
        }
        let mut buf = [0u8; 1];
        match self.inner.read(&mut buf) {
            Ok(0) => {
                self.closed = true;
                Ok(None)
            }
            Ok(_) => Ok(Some(buf[0])),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

// ─── MemorySource ────────────────────────────────────────────────────────────

/// An in-memory byte queue.
///
/// Stays open until [`close`](Self::close) is called, so an empty queue
/// reads as "nothing yet" rather than end of input.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    queue: VecDeque<u8>,
    closed: bool,
}

impl MemorySource {
    /// An empty, open queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A queue holding `bytes`, already closed: once drained, it reports
    /// end of input.
    #[must_use]
    pub fn closed_with(bytes: &[u8]) -> Self {
        Self {
            queue: bytes.iter().copied().collect(),
            closed: true,
        }
    }

    /// Append bytes to the queue.
    pub fn push(&mut self, bytes: &[u8]) {
        self.queue.extend(bytes);
    }

    /// Mark end of input. Bytes already queued are still delivered.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Bytes not yet read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl From<&[u8]> for MemorySource {
    fn from(bytes: &[u8]) -> Self {
        let mut source = Self::new();
        source.push(bytes);
        source
    }
}

impl ByteSource for MemorySource {
    fn try_read_one(&mut self) -> io::Result<Option<u8>> {
        Ok(self.queue.pop_front())
    }

    fn is_closed(&self) -> bool {
        self.closed && self.queue.is_empty()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
