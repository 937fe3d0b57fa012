// Help command

use crate::shell::commands::{Executable, Flow};
use crate::shell::context::ShellContext;
use anyhow::{Context, Result};
use colored::*;
use std::io::Write;

pub struct HelpCommand;

impl Executable for HelpCommand {
    fn execute(&self, args: &[String], ctx: &mut ShellContext, out: &mut dyn Write) -> Result<Flow> {
        if let Some(name) = args.get(1) {
            describe(name, ctx, out)?;
            return Ok(Flow::Continue);
        }

        writeln!(out, "{}", ctx.config.title.as_str().bold())?;
        writeln!(out, "Type program names and arguments, and hit enter.")?;
        writeln!(out, "Use '<' or '>' to redirect, or '|' to connect two programs.")?;
        writeln!(out, "The following are built in:")?;
        for name in ctx.registry.names() {
            writeln!(out, "  {}", name)?;
        }
        writeln!(out, "Use the man command for information on other programs.")?;
        Ok(Flow::Continue)
    }
}

fn describe(name: &str, ctx: &ShellContext, out: &mut dyn Write) -> Result<()> {
    if ctx.registry.get(name).is_some() {
        writeln!(out, "{} is a shell builtin", name.cyan())?;
        return Ok(());
    }
    let path = which::which(name).with_context(|| format!("help: {}: not found", name))?;
    writeln!(out, "{} is {}", name.cyan(), path.display())?;
    Ok(())
}
