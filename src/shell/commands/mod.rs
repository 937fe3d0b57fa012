pub mod builtins;
pub mod system;

use crate::shell::context::ShellContext;
use anyhow::Result;
use std::io::Write;

/// Whether the read-eval loop should keep going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub trait Executable: Send + Sync {
    fn execute(&self, args: &[String], ctx: &mut ShellContext, out: &mut dyn Write) -> Result<Flow>;
}
