// System command

use crate::shell::commands::{Executable, Flow};
use crate::shell::context::ShellContext;
use crate::shell::executor::prepare;
use crate::shell::parser::parse_launch;
use crate::shell::process::{self, ChildExit};
use anyhow::Result;
use log::debug;
use nix::sys::signal::Signal;
use std::io::Write;

/// Runs anything that is not a builtin as one process, or two for a pipeline, and waits for it.
pub struct SystemCommand;

impl Executable for SystemCommand {
    fn execute(&self, args: &[String], ctx: &mut ShellContext, out: &mut dyn Write) -> Result<Flow> {
        let plan = parse_launch(args)?;
        debug!("Launching {:?}", plan);
        let spawns = prepare(plan)?;

        // Our own buffered output has to land before the child starts writing.
        out.flush()?;

        let reaped = process::launch(spawns)?;

        if let Some(last) = reaped.last() {
            ctx.last_status = last.exit.code();
            debug!("Last status: {}", ctx.last_status);
        }

        // The terminal echoed ^C without a newline.
        if reaped.iter().any(|r| r.exit == ChildExit::Signaled(Signal::SIGINT)) {
            writeln!(out)?;
        }

        Ok(Flow::Continue)
    }
}
