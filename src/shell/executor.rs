use crate::shell::PROGRAM;
use crate::shell::ast::{CommandLine, Launch, RedirectMode};
use crate::shell::commands::Flow;
use crate::shell::context::ShellContext;
use crate::shell::parser::split_line;
use crate::shell::process::{Argv, Spawn, StdStream};
use anyhow::{Context, Result};
use colored::*;
use log::debug;
use nix::fcntl::OFlag;
use nix::unistd::pipe2;
use std::fs::OpenOptions;
use std::io::Write;
use std::os::fd::OwnedFd;
use std::os::unix::fs::OpenOptionsExt;

// rw-r--r--, before umask
const OUTPUT_MODE: u32 = 0o644;

pub fn run_command_line(line: &str, ctx: &mut ShellContext, out: &mut dyn Write) -> Flow {
    let line = split_line(line);
    dispatch(&line, ctx, out)
}

/// Runs one command line and tells the loop whether to keep going.
///
/// Builtins are looked up by exact name first; anything else goes to the external launcher.
/// Errors from either side are reported here and never stop the loop.
pub fn dispatch(line: &CommandLine, ctx: &mut ShellContext, out: &mut dyn Write) -> Flow {
    let Some(name) = line.first() else {
        return Flow::Continue;
    };

    let registry = ctx.registry.clone();
    let result = if let Some(cmd) = registry.get(name) {
        debug!("Dispatching builtin '{}'", name);
        cmd.execute(&line.tokens, ctx, out)
    } else {
        debug!("Dispatching external '{}'", name);
        let external = ctx.external.clone();
        // An external command never ends the session.
        external.execute(&line.tokens, ctx, out).map(|_| Flow::Continue)
    };

    match result {
        Ok(flow) => flow,
        Err(e) => {
            report(&e);
            Flow::Continue
        }
    }
}

pub fn report(err: &anyhow::Error) {
    eprintln!("{}: {:#}", PROGRAM.red().bold(), err);
}

/// Opens redirection targets and pipes, producing one `Spawn` per process to start.
///
/// Nothing is forked yet: if a file cannot be opened, no process is created and every
/// descriptor opened so far is closed on drop.
pub fn prepare(launch: Launch) -> Result<Vec<Spawn>> {
    match launch {
        Launch::Direct(argv) => Ok(vec![Spawn::new(Argv::new(&argv)?)]),
        Launch::Redirect { argv, mode, target } => {
            let mut spawn = Spawn::new(Argv::new(&argv)?);
            let mut open_opts = OpenOptions::new();
            let stream = match mode {
                RedirectMode::Input => {
                    open_opts.read(true);
                    StdStream::Stdin
                }
                RedirectMode::Overwrite => {
                    open_opts.write(true).create(true).truncate(true).mode(OUTPUT_MODE);
                    StdStream::Stdout
                }
            };
            let file = open_opts.open(&target).with_context(|| target.clone())?;
            spawn.redirect(stream, OwnedFd::from(file));
            Ok(vec![spawn])
        }
        Launch::Pipeline { left, right } => {
            let mut left = Spawn::new(Argv::new(&left)?);
            let mut right = Spawn::new(Argv::new(&right)?);
            let (reader, writer) = pipe2(OFlag::O_CLOEXEC).context("Failed to create pipe")?;
            left.redirect(StdStream::Stdout, writer);
            right.redirect(StdStream::Stdin, reader);
            Ok(vec![left, right])
        }
    }
}
