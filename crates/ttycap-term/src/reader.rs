// SPDX-License-Identifier: MIT
//
// Background key reader: decodes keys on a dedicated thread.
//
// The decoder is single-threaded by construction, so a host that wants
// keys on another thread hands the whole decoder to a `KeyReader`. The
// reader thread owns the byte source, decodes keys, and sends them
// through a standard channel. Nobody else touches terminal input while
// it runs.
//
// Shutdown: between polls the thread checks an `AtomicBool` stop flag.
// With a non-blocking source (`StdinSource::non_blocking()`) `stop()`
// returns within one poll interval. A blocking source keeps the thread
// inside `read(2)`, so `stop()` and drop wait until the next byte or EOF
// arrives. The thread also exits on its own when the source closes, when decoding fails (the
// error is sent first), or when the receiver is dropped.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::error::Result;
use crate::input::Decoder;
use crate::key::Key;
use crate::source::ByteSource;

/// Background key reader thread.
///
/// # Example
///
/// ```no_run
/// use ttycap_term::input::Decoder;
/// use ttycap_term::reader::KeyReader;
/// use ttycap_term::source::StdinSource;
///
/// let (reader, rx) = KeyReader::spawn(Decoder::new(StdinSource::non_blocking()))?;
/// while let Ok(Ok(key)) = rx.recv() {
///     println!("{key}");
/// }
/// drop(reader);
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct KeyReader {
    /// The reader thread handle. `None` after `stop()` joins it.
    handle: Option<JoinHandle<()>>,
    /// Shared flag to signal the thread to exit.
    stop: Arc<AtomicBool>,
}

impl KeyReader {
    /// Move `decoder` onto a new thread and start decoding.
    ///
    /// Use a non-blocking source if the reader must be stoppable while no
    /// input arrives; see [`stop`](Self::stop).
    ///
    /// Returns the reader handle and the receiving end of the key channel.
    /// Each message is a decoded key (never [`Key::NoKey`]) or the error
    /// that ended the thread. The channel closes when the thread exits.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS cannot spawn a thread.
    pub fn spawn<S>(decoder: Decoder<S>) -> io::Result<(Self, Receiver<Result<Key>>)>
    where
        S: ByteSource + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("key-reader".into())
            .spawn(move || Self::reader_loop(decoder, &tx, &stop_flag))?;

        Ok((
            Self {
                handle: Some(handle),
                stop,
            },
            rx,
        ))
    }

    /// Whether the reader thread is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the reader thread to stop and wait for it to exit.
    ///
    /// Idempotent: calling `stop()` after the thread has already
    /// exited is a no-op.
    ///
    /// The flag is only seen between reads. A source whose
    /// `try_read_one` blocks delays the join until that read returns.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("key reader thread panicked");
            }
        }
    }

    fn reader_loop<S: ByteSource>(
        mut decoder: Decoder<S>,
        tx: &Sender<Result<Key>>,
        stop: &AtomicBool,
    ) {
        log::debug!("key reader started");
        while !stop.load(Ordering::Relaxed) {
            match decoder.try_read_key() {
                Ok(Key::NoKey) => {
                    if decoder.source().is_closed() {
                        log::debug!("key reader: input closed");
                        break;
                    }
                    thread::sleep(decoder.poll_interval());
                }
                Ok(key) => {
                    if tx.send(Ok(key)).is_err() {
                        // Receiver dropped: nobody's listening.
                        break;
                    }
                }
                Err(e) => {
                    log::debug!("key reader: {e}");
                    let _ = tx.send(Err(e));
                    break;
                }
            }
        }
        log::debug!("key reader stopped");
    }
}

impl Drop for KeyReader {
    fn drop(&mut self) {
        self.stop();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::source::{MemorySource, ReaderSource};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn fast<S: ByteSource>(source: S) -> Decoder<S> {
        Decoder::new(source).with_poll_interval(Duration::from_millis(1))
    }

    #[test]
    fn delivers_keys_then_closes() {
        let decoder = fast(MemorySource::closed_with(b"ab\x1b[A"));
        let (_reader, rx) = KeyReader::spawn(decoder).unwrap();

        let keys: Vec<Key> = rx.iter().map(Result::unwrap).collect();
        assert_eq!(keys, vec![Key::Char(b'a'), Key::Char(b'b'), Key::ArrowUp]);
    }

    #[test]
    fn forwards_input_error() {
        struct Broken;
        impl io::Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("device gone"))
            }
        }

        let (_reader, rx) = KeyReader::spawn(fast(ReaderSource::new(Broken))).unwrap();
        assert!(matches!(rx.recv().unwrap(), Err(Error::Input(_))));
        assert!(rx.recv().is_err());
    }

    #[test]
    fn spawn_and_stop() {
        let (mut reader, _rx) = KeyReader::spawn(fast(MemorySource::new())).unwrap();
        assert!(reader.handle.is_some());
        reader.stop();
        assert!(!reader.is_running());
    }

    #[test]
    fn stop_is_idempotent() {
        let (mut reader, _rx) = KeyReader::spawn(fast(MemorySource::new())).unwrap();
        reader.stop();
        reader.stop();
    }

    #[test]
    fn drop_stops_reader() {
        let (reader, rx) = KeyReader::spawn(fast(MemorySource::new())).unwrap();
        drop(reader);
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[cfg(unix)]
    #[test]
    #[allow(unsafe_code)]
    fn stop_returns_while_idle_on_non_blocking_stdin() {
        use crate::source::StdinSource;
        use std::time::Instant;

        let mut fds = [0; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        let [read_fd, write_fd] = fds;

        let source = StdinSource::non_blocking().with_fd(read_fd);
        let (mut reader, _rx) = KeyReader::spawn(fast(source)).unwrap();
        let started = Instant::now();
        reader.stop();
        assert!(!reader.is_running());
        assert!(started.elapsed() < Duration::from_secs(1));

        unsafe { libc::close(write_fd) };
        unsafe { libc::close(read_fd) };
    }

    #[test]
    fn dropped_receiver_ends_thread() {
        let (mut reader, rx) = KeyReader::spawn(fast(MemorySource::from(&b"xyz"[..]))).unwrap();
        drop(rx);
        reader.stop();
        assert!(!reader.is_running());
    }
}
