use anyhow::{Context, Result};
use log::debug;
use nix::fcntl::OFlag;
use nix::unistd::{pipe2, read, write};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptState {
    Unarmed,
    Armed,
}

/// Cancellation token shared between the read-eval loop and the Ctrl-C handler.
///
/// The loop arms it while it prompts and reads. A trigger while armed marks the iteration as
/// cancelled and writes a byte to a self-pipe, which wakes a reader blocked in `poll`. A
/// trigger while unarmed does nothing, so a running child never cuts the parent's wait short.
#[derive(Clone)]
pub struct InterruptToken {
    inner: Arc<Inner>,
}

struct Inner {
    armed: AtomicBool,
    cancelled: AtomicBool,
    wake_rx: OwnedFd,
    wake_tx: OwnedFd,
}

impl InterruptToken {
    pub fn new() -> Result<Self> {
        let (wake_rx, wake_tx) = pipe2(OFlag::O_CLOEXEC | OFlag::O_NONBLOCK)
            .context("Failed to create interrupt pipe")?;
        Ok(Self {
            inner: Arc::new(Inner {
                armed: AtomicBool::new(false),
                cancelled: AtomicBool::new(false),
                wake_rx,
                wake_tx,
            }),
        })
    }

    /// Routes SIGINT to this token. Can only be done once per process.
    pub fn install(&self) -> Result<()> {
        let token = self.clone();
        ctrlc::set_handler(move || {
            token.trigger();
        })
        .context("Failed to install Ctrl-C handler")
    }

    pub fn state(&self) -> InterruptState {
        if self.inner.armed.load(Ordering::SeqCst) {
            InterruptState::Armed
        } else {
            InterruptState::Unarmed
        }
    }

    pub fn arm(&self) {
        self.drain();
        self.inner.cancelled.store(false, Ordering::SeqCst);
        self.inner.armed.store(true, Ordering::SeqCst);
    }

    /// Returns whether the iteration was cancelled since the last `arm`.
    pub fn disarm(&self) -> bool {
        self.inner.armed.store(false, Ordering::SeqCst);
        self.inner.cancelled.swap(false, Ordering::SeqCst)
    }

    pub fn trigger(&self) -> bool {
        if self.state() == InterruptState::Unarmed {
            debug!("Interrupt while unarmed, ignored");
            return false;
        }
        self.inner.cancelled.store(true, Ordering::SeqCst);
        // EAGAIN means a wake-up is already pending.
        let _ = write(&self.inner.wake_tx, b"!");
        debug!("Interrupt delivered, restarting the current iteration");
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    pub(crate) fn wake_fd(&self) -> BorrowedFd<'_> {
        self.inner.wake_rx.as_fd()
    }

    pub(crate) fn drain(&self) {
        let mut buf = [0u8; 64];
        while let Ok(n) = read(self.inner.wake_rx.as_raw_fd(), &mut buf) {
            if n == 0 {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_unarmed_is_noop() {
        let token = InterruptToken::new().unwrap();
        assert_eq!(token.state(), InterruptState::Unarmed);
        assert!(!token.trigger());
        assert!(!token.is_cancelled());
        assert!(!token.disarm());
    }

    #[test]
    fn test_trigger_armed_cancels_once() {
        let token = InterruptToken::new().unwrap();
        token.arm();
        assert_eq!(token.state(), InterruptState::Armed);
        assert!(token.trigger());
        assert!(token.is_cancelled());

        assert!(token.disarm());
        assert_eq!(token.state(), InterruptState::Unarmed);
        // Consumed by the first disarm.
        assert!(!token.disarm());
    }

    #[test]
    fn test_arm_clears_stale_wakeups() {
        let token = InterruptToken::new().unwrap();
        token.arm();
        token.trigger();
        token.trigger();
        token.disarm();

        token.arm();
        assert!(!token.is_cancelled());
        let mut buf = [0u8; 8];
        assert!(read(token.wake_fd().as_raw_fd(), &mut buf).is_err());
    }
}
