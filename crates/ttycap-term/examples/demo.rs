// SPDX-License-Identifier: MIT
//
// ttycap-term demo: keys decoded on a background thread.
//
// The reader thread owns stdin and the decoder; the main thread only
// receives finished keys over the channel, with a timeout so it can do
// other work in between. Ctrl-Q quits.
//
// Usage:
//   cargo run -p ttycap-term --example demo

#[cfg(unix)]
fn main() -> ttycap_term::Result<()> {
    use std::sync::mpsc::RecvTimeoutError;
    use std::time::{Duration, Instant};

    use ttycap_term::input::Decoder;
    use ttycap_term::key::Key;
    use ttycap_term::reader::KeyReader;
    use ttycap_term::source::StdinSource;
    use ttycap_term::terminal::TerminalMode;

    let mut mode = TerminalMode::new();
    let _raw = mode.raw()?;

    let (mut reader, rx) = KeyReader::spawn(Decoder::new(StdinSource::non_blocking()))?;
    let started = Instant::now();
    println!("background reader running, Ctrl-Q to quit");

    loop {
        match rx.recv_timeout(Duration::from_secs(1)) {
            Ok(Ok(Key::Ctrl(b'q'))) => break,
            Ok(Ok(key)) => println!("{:>6.1}s  {key}", started.elapsed().as_secs_f32()),
            Ok(Err(e)) => return Err(e),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    reader.stop();
    Ok(())
}

#[cfg(not(unix))]
fn main() {
    eprintln!("this demo needs a unix terminal");
}
