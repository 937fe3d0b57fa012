mod cli;
mod config;
mod shell;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use shell::context::ShellContext;
use shell::interrupt::InterruptToken;

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = config::load_config(cli.config.as_deref())?;
    cli.apply(&mut config);
    if !config.color {
        colored::control::set_override(false);
    }

    let interrupt = InterruptToken::new()?;
    interrupt.install()?;

    let mut ctx = ShellContext::new(config);
    shell::repl::run(&mut ctx, &interrupt)
}
