// Exit command

use crate::shell::commands::{Executable, Flow};
use crate::shell::context::ShellContext;
use anyhow::Result;
use std::io::Write;

pub struct ExitCommand;

impl Executable for ExitCommand {
    fn execute(&self, _args: &[String], _ctx: &mut ShellContext, _out: &mut dyn Write) -> Result<Flow> {
        // The loop winds down on its own; the session always ends with status 0.
        Ok(Flow::Stop)
    }
}
