// Cd command

use crate::shell::commands::{Executable, Flow};
use crate::shell::context::ShellContext;
use anyhow::{Context, Result, bail};
use log::debug;
use std::env;
use std::io::Write;

pub struct CdCommand;

impl Executable for CdCommand {
    fn execute(&self, args: &[String], _ctx: &mut ShellContext, _out: &mut dyn Write) -> Result<Flow> {
        // args[0] is "cd". args[1] is path.
        let Some(dir) = args.get(1) else {
            bail!("expected argument to \"cd\"");
        };

        // Children inherit the working directory, so it has to be the real one.
        env::set_current_dir(dir).with_context(|| format!("cd: {}", dir))?;
        debug!("Working directory is now {}", dir);
        Ok(Flow::Continue)
    }
}
