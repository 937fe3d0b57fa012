use crate::shell::ast::{CommandLine, Launch, RedirectMode};
use anyhow::{Result, bail};

// No quoting or escaping: these are the only separators.
const DELIMITERS: &[char] = &[' ', '\t', '\r', '\n', '\x07'];

pub fn split_line(line: &str) -> CommandLine {
    let tokens = line
        .split(DELIMITERS)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect();
    CommandLine { tokens }
}

/// Finds the first `<`, `>` or `|` and splits the tokens around it.
///
/// Only the first operator counts. For redirections everything after the target file is
/// dropped; for pipelines the right half is passed through untouched, so a later `<` there is
/// just another argument.
pub fn parse_launch(tokens: &[String]) -> Result<Launch> {
    let Some(pos) = tokens
        .iter()
        .position(|t| t == "<" || t == ">" || t == "|")
    else {
        if tokens.is_empty() {
            bail!("missing command");
        }
        return Ok(Launch::Direct(tokens.to_vec()));
    };

    let before = tokens[..pos].to_vec();

    if tokens[pos] == "|" {
        let after = tokens[pos + 1..].to_vec();
        if before.is_empty() || after.is_empty() {
            bail!("syntax error: '|' needs a command on both sides");
        }
        return Ok(Launch::Pipeline { left: before, right: after });
    }

    let mode = if tokens[pos] == "<" {
        RedirectMode::Input
    } else {
        RedirectMode::Overwrite
    };

    let Some(target) = tokens.get(pos + 1) else {
        bail!("syntax error: expected a file name after '{}'", mode.operator());
    };
    if before.is_empty() {
        bail!("missing command before '{}'", mode.operator());
    }

    Ok(Launch::Redirect {
        argv: before,
        mode,
        target: target.clone(),
    })
}
