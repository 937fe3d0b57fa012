// Fork, descriptor rewiring, exec and wait.
//
// Everything a child needs is built before `fork`: the argv pointer table, the opened files,
// the pipe. Between `fork` and `exec` the child only calls async-signal-safe functions, since
// the Ctrl-C handler thread makes the parent multi-threaded.

use crate::shell::PROGRAM;
use anyhow::{Context, Result, bail};
use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::signal::{SigHandler, Signal, signal};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::fcntl::{FcntlArg, FdFlag, fcntl};
use nix::unistd::{ForkResult, Pid, close, dup2, fork, write};
use std::ffi::{CStr, CString};
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::os::raw::c_char;
use std::ptr;

/// Null-terminated argument vector, ready for `execvp`.
pub struct Argv {
    args: Vec<CString>,
    // Points into `args`; the last entry is always null.
    ptrs: Vec<*const c_char>,
}

impl Argv {
    pub fn new(tokens: &[String]) -> Result<Self> {
        if tokens.is_empty() {
            bail!("missing command");
        }
        let args = tokens
            .iter()
            .map(|t| CString::new(t.as_str()).with_context(|| format!("argument contains a NUL byte: {:?}", t)))
            .collect::<Result<Vec<_>>>()?;

        let mut ptrs: Vec<*const c_char> = args.iter().map(|a| a.as_ptr()).collect();
        ptrs.push(ptr::null());

        Ok(Self { args, ptrs })
    }

    pub fn program(&self) -> &CStr {
        &self.args[0]
    }

    // Only returns on failure.
    fn exec(&self) -> Errno {
        // SAFETY: `ptrs` is a null-terminated array of pointers into `args`, which outlives the call.
        unsafe { libc::execvp(self.ptrs[0], self.ptrs.as_ptr()) };
        Errno::last()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdStream {
    Stdin,
    Stdout,
}

impl StdStream {
    pub fn fd(self) -> RawFd {
        match self {
            StdStream::Stdin => libc::STDIN_FILENO,
            StdStream::Stdout => libc::STDOUT_FILENO,
        }
    }
}

/// One process to start: what to exec and which standard streams to rebind first.
pub struct Spawn {
    argv: Argv,
    remaps: Vec<(StdStream, OwnedFd)>,
}

impl Spawn {
    pub fn new(argv: Argv) -> Self {
        Self { argv, remaps: Vec::new() }
    }

    /// Binds `stream` to `source` in the child. A previous binding for the same stream is closed.
    pub fn redirect(&mut self, stream: StdStream, source: OwnedFd) {
        self.remaps.retain(|(s, _)| *s != stream);
        self.remaps.push((stream, source));
    }

    pub fn name(&self) -> String {
        self.argv.program().to_string_lossy().into_owned()
    }

    fn is_target(&self, fd: RawFd) -> bool {
        self.remaps.iter().any(|(stream, _)| stream.fd() == fd)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildExit {
    Exited(i32),
    Signaled(Signal),
}

impl ChildExit {
    pub fn code(self) -> i32 {
        match self {
            ChildExit::Exited(code) => code,
            ChildExit::Signaled(sig) => 128 + sig as i32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reaped {
    pub pid: Pid,
    pub exit: ChildExit,
}

/// Forks one child per spawn, in order, then waits for every child that was created.
///
/// The parent's copies of all planned descriptors are closed before the first wait, so a pipe
/// reader sees end-of-file once the writer exits. Nothing in the parent's own descriptor table
/// is touched.
pub fn launch(spawns: Vec<Spawn>) -> Result<Vec<Reaped>> {
    let mut pids = Vec::with_capacity(spawns.len());
    let mut fork_error = None;

    for index in 0..spawns.len() {
        // SAFETY: the child branch never returns and sticks to async-signal-safe calls.
        match unsafe { fork() } {
            Ok(ForkResult::Child) => run_child(&spawns, index),
            Ok(ForkResult::Parent { child }) => {
                debug!("Spawned '{}' as pid {}", spawns[index].name(), child);
                pids.push(child);
            }
            Err(errno) => {
                let name = spawns[index].name();
                fork_error = Some(anyhow::Error::new(errno).context(format!("fork failed for '{}'", name)));
                break;
            }
        }
    }

    drop(spawns);

    let mut reaped = Vec::with_capacity(pids.len());
    let mut wait_error = None;
    for pid in pids {
        match wait_for(pid) {
            Ok(exit) => {
                debug!("Reaped pid {}: {:?}", pid, exit);
                reaped.push(Reaped { pid, exit });
            }
            Err(e) => {
                warn!("{:#}", e);
                wait_error.get_or_insert(e);
            }
        }
    }

    match fork_error.or(wait_error) {
        Some(e) => Err(e),
        None => Ok(reaped),
    }
}

/// Blocks until `pid` exits or is killed. Stop reports are skipped so a suspended child is
/// not lost.
pub fn wait_for(pid: Pid) -> Result<ChildExit> {
    loop {
        match waitpid(pid, Some(WaitPidFlag::WUNTRACED)) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(ChildExit::Exited(code)),
            Ok(WaitStatus::Signaled(_, sig, _)) => return Ok(ChildExit::Signaled(sig)),
            Ok(status) => debug!("pid {} reported {:?}, still waiting", pid, status),
            Err(Errno::EINTR) => continue,
            Err(errno) => {
                return Err(anyhow::Error::new(errno).context(format!("waitpid failed for pid {}", pid)));
            }
        }
    }
}

fn run_child(spawns: &[Spawn], index: usize) -> ! {
    // The runtime ignores SIGPIPE and ignored dispositions survive exec.
    for sig in [Signal::SIGINT, Signal::SIGPIPE] {
        // SAFETY: changing a signal disposition is async-signal-safe.
        if let Err(errno) = unsafe { signal(sig, SigHandler::SigDfl) } {
            child_fail(b"signal", errno);
        }
    }

    let own = &spawns[index];
    for (stream, source) in &own.remaps {
        let fd = source.as_raw_fd();
        if fd != stream.fd() {
            if let Err(errno) = dup2(fd, stream.fd()) {
                child_fail(b"dup2", errno);
            }
        } else if let Err(errno) = fcntl(fd, FcntlArg::F_SETFD(FdFlag::empty())) {
            // Already in place, but opened close-on-exec.
            child_fail(b"fcntl", errno);
        }
    }

    // Originals of our own remaps plus every descriptor that belongs to the other stages.
    for spawn in spawns {
        for (_, source) in &spawn.remaps {
            let fd = source.as_raw_fd();
            if own.is_target(fd) {
                continue;
            }
            if let Err(errno) = close(fd) {
                child_fail(b"close", errno);
            }
        }
    }

    let errno = own.argv.exec();
    child_fail(own.argv.program().to_bytes(), errno)
}

fn child_fail(context: &[u8], errno: Errno) -> ! {
    let stderr = std::io::stderr();
    let parts: [&[u8]; 5] = [PROGRAM.as_bytes(), b": ", context, b": ", errno.desc().as_bytes()];
    for part in parts {
        let _ = write(&stderr, part);
    }
    let _ = write(&stderr, b"\n");
    // SAFETY: skips atexit handlers and buffered stdio that belong to the parent.
    unsafe { libc::_exit(1) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(tokens: &[&str]) -> Result<Argv> {
        let tokens: Vec<String> = tokens.iter().map(|s| s.to_string()).collect();
        Argv::new(&tokens)
    }

    #[test]
    fn test_argv_is_null_terminated() {
        let argv = argv(&["ls", "-l"]).unwrap();
        assert_eq!(argv.args.len(), 2);
        assert_eq!(argv.ptrs.len(), 3);
        assert!(argv.ptrs[2].is_null());
        assert_eq!(argv.program().to_str().unwrap(), "ls");
    }

    #[test]
    fn test_argv_rejects_empty_and_nul() {
        assert!(argv(&[]).is_err());
        assert!(argv(&["ec\0ho"]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ChildExit::Exited(3).code(), 3);
        assert_eq!(ChildExit::Signaled(Signal::SIGINT).code(), 130);
    }

    #[test]
    fn test_redirect_replaces_binding() {
        let (r1, _w1) = nix::unistd::pipe().unwrap();
        let (r2, _w2) = nix::unistd::pipe().unwrap();
        let raw = r2.as_raw_fd();
        let mut spawn = Spawn::new(argv(&["cat"]).unwrap());
        spawn.redirect(StdStream::Stdin, r1);
        spawn.redirect(StdStream::Stdin, r2);
        assert_eq!(spawn.remaps.len(), 1);
        assert_eq!(spawn.remaps[0].1.as_raw_fd(), raw);
    }

    #[test]
    fn test_launch_reaps_exit_status() {
        let reaped = launch(vec![Spawn::new(argv(&["false"]).unwrap())]).unwrap();
        assert_eq!(reaped.len(), 1);
        assert_eq!(reaped[0].exit, ChildExit::Exited(1));
    }

    #[test]
    fn test_wait_for_signaled_child() {
        let child = std::process::Command::new("sleep").arg("5").spawn().unwrap();
        let pid = Pid::from_raw(child.id() as i32);
        nix::sys::signal::kill(pid, Signal::SIGINT).unwrap();
        assert_eq!(wait_for(pid).unwrap(), ChildExit::Signaled(Signal::SIGINT));
    }
}
