pub mod cd;
pub mod exit;
pub mod help;

use crate::shell::context::ShellContext;

/// Helper to register all built-in commands at once. `help` lists them in this order.
pub fn register_all_builtins(ctx: &mut ShellContext) {
    ctx.register_command("cd", Box::new(cd::CdCommand));
    ctx.register_command("help", Box::new(help::HelpCommand));
    ctx.register_command("exit", Box::new(exit::ExitCommand));
}
