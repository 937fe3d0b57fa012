use crate::shell::interrupt::InterruptToken;
use anyhow::{Context, Result};
use log::debug;
use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use nix::unistd::read;
use std::os::fd::{AsFd, AsRawFd};

const LINE_BUFSIZE: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    Line(String),
    Eof,
    Interrupted,
}

/// Reads one line at a time from a raw descriptor, waking up early on interrupt.
///
/// Bytes are read one at a time so nothing past the newline is consumed; whatever is left
/// belongs to the next command (or to a child that inherits the descriptor).
pub struct LineReader<F: AsFd> {
    source: F,
    interrupt: InterruptToken,
    at_eof: bool,
}

impl<F: AsFd> LineReader<F> {
    pub fn new(source: F, interrupt: InterruptToken) -> Self {
        Self { source, interrupt, at_eof: false }
    }

    pub fn read_line(&mut self) -> Result<ReadOutcome> {
        if self.at_eof {
            return Ok(ReadOutcome::Eof);
        }

        let mut buf = Vec::with_capacity(LINE_BUFSIZE);
        loop {
            if !self.wait_for_input()? {
                debug!("Read interrupted, discarding {} buffered bytes", buf.len());
                return Ok(ReadOutcome::Interrupted);
            }

            let mut byte = [0u8; 1];
            match read(self.source.as_fd().as_raw_fd(), &mut byte) {
                Ok(0) => {
                    self.at_eof = true;
                    if buf.is_empty() {
                        return Ok(ReadOutcome::Eof);
                    }
                    return Ok(ReadOutcome::Line(String::from_utf8_lossy(&buf).into_owned()));
                }
                Ok(_) if byte[0] == b'\n' => {
                    return Ok(ReadOutcome::Line(String::from_utf8_lossy(&buf).into_owned()));
                }
                Ok(_) => buf.push(byte[0]),
                Err(Errno::EINTR) | Err(Errno::EAGAIN) => continue,
                Err(errno) => return Err(errno).context("Failed to read input"),
            }
        }
    }

    // false when the interrupt token fired before input arrived
    fn wait_for_input(&self) -> Result<bool> {
        loop {
            if self.interrupt.is_cancelled() {
                return Ok(false);
            }

            let mut fds = [
                PollFd::new(self.source.as_fd(), PollFlags::POLLIN),
                PollFd::new(self.interrupt.wake_fd(), PollFlags::POLLIN),
            ];
            match poll(&mut fds, PollTimeout::NONE) {
                Ok(_) => {}
                Err(Errno::EINTR) => continue,
                Err(errno) => return Err(errno).context("Failed to poll input"),
            }

            let woken = fds[1].revents().is_some_and(|r| r.contains(PollFlags::POLLIN));
            let readable = fds[0].revents().is_some_and(|r| !r.is_empty());

            if woken {
                if self.interrupt.is_cancelled() {
                    return Ok(false);
                }
                // Left over from an earlier iteration.
                self.interrupt.drain();
            }
            if readable {
                return Ok(true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd::{pipe2, write};
    use nix::fcntl::OFlag;
    use std::thread;
    use std::time::Duration;

    fn reader_with_input(input: &[u8]) -> (LineReader<std::os::fd::OwnedFd>, InterruptToken) {
        let (rx, tx) = pipe2(OFlag::O_CLOEXEC).unwrap();
        write(&tx, input).unwrap();
        drop(tx);
        let token = InterruptToken::new().unwrap();
        (LineReader::new(rx, token.clone()), token)
    }

    #[test]
    fn test_reads_lines_then_eof() {
        let (mut reader, _token) = reader_with_input(b"ls -l\n\ncd /tmp\n");
        assert_eq!(reader.read_line().unwrap(), ReadOutcome::Line("ls -l".to_string()));
        assert_eq!(reader.read_line().unwrap(), ReadOutcome::Line(String::new()));
        assert_eq!(reader.read_line().unwrap(), ReadOutcome::Line("cd /tmp".to_string()));
        assert_eq!(reader.read_line().unwrap(), ReadOutcome::Eof);
        assert_eq!(reader.read_line().unwrap(), ReadOutcome::Eof);
    }

    #[test]
    fn test_partial_line_before_eof() {
        let (mut reader, _token) = reader_with_input(b"exit");
        assert_eq!(reader.read_line().unwrap(), ReadOutcome::Line("exit".to_string()));
        assert_eq!(reader.read_line().unwrap(), ReadOutcome::Eof);
    }

    #[test]
    fn test_interrupt_discards_partial_line() {
        let (rx, tx) = pipe2(OFlag::O_CLOEXEC).unwrap();
        let token = InterruptToken::new().unwrap();
        let mut reader = LineReader::new(rx, token.clone());

        write(&tx, b"ec").unwrap();
        token.arm();
        let trigger = token.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            trigger.trigger()
        });

        assert_eq!(reader.read_line().unwrap(), ReadOutcome::Interrupted);
        assert!(handle.join().unwrap());
        assert!(token.disarm());

        token.arm();
        write(&tx, b"ho hi\n").unwrap();
        assert_eq!(reader.read_line().unwrap(), ReadOutcome::Line("ho hi".to_string()));
        assert!(!token.disarm());
    }

    #[test]
    fn test_unarmed_trigger_does_not_interrupt() {
        let (rx, tx) = pipe2(OFlag::O_CLOEXEC).unwrap();
        let token = InterruptToken::new().unwrap();
        let mut reader = LineReader::new(rx, token.clone());

        assert!(!token.trigger());
        write(&tx, b"help\n").unwrap();
        assert_eq!(reader.read_line().unwrap(), ReadOutcome::Line("help".to_string()));
    }
}
