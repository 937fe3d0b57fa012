use crate::shell::commands::Flow;
use crate::shell::context::ShellContext;
use crate::shell::executor::run_command_line;
use crate::shell::interrupt::InterruptToken;
use crate::shell::reader::{LineReader, ReadOutcome};
use anyhow::Result;
use colored::*;
use log::{debug, info};
use std::io::{self, Write};
use std::os::fd::AsFd;

pub fn run(ctx: &mut ShellContext, interrupt: &InterruptToken) -> Result<()> {
    run_with(ctx, interrupt, io::stdin(), &mut io::stdout())
}

/// The read-eval loop. Returns once a builtin asks to stop or the input is exhausted.
pub fn run_with<F: AsFd>(
    ctx: &mut ShellContext,
    interrupt: &InterruptToken,
    input: F,
    out: &mut dyn Write,
) -> Result<()> {
    let mut reader = LineReader::new(input, interrupt.clone());

    loop {
        // Resumption point: an interrupted iteration starts over from here.
        interrupt.arm();

        write!(out, "{}", ctx.config.prompt.as_str().bold())?;
        out.flush()?;

        let outcome = reader.read_line();
        let cancelled = interrupt.disarm();

        let line = match outcome? {
            _ if cancelled => {
                writeln!(out)?;
                continue;
            }
            ReadOutcome::Interrupted => {
                writeln!(out)?;
                continue;
            }
            ReadOutcome::Eof => {
                writeln!(out)?;
                info!("End of input, leaving");
                return Ok(());
            }
            ReadOutcome::Line(line) => line,
        };

        debug!("Read line: {:?}", line);
        if run_command_line(&line, ctx, out) == Flow::Stop {
            info!("Exit requested, leaving");
            return Ok(());
        }
    }
}
