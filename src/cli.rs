use crate::config::ShellConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lsh", version, about = "LSH: a small interactive shell")]
pub struct Cli {
    /// Config file (defaults to $LSH_CONFIG, then ~/.lsh.toml)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Prompt printed before each command
    #[arg(short = 'p', long = "prompt")]
    pub prompt: Option<String>,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,
}

impl Cli {
    /// Command-line flags win over the config file.
    pub fn apply(&self, config: &mut ShellConfig) {
        if let Some(prompt) = &self.prompt {
            config.prompt = prompt.clone();
        }
        if self.no_color {
            config.color = false;
        }
    }
}
