pub mod ast;
pub mod commands;
pub mod context;
pub mod executor;
pub mod interrupt;
pub mod parser;
pub mod process;
pub mod reader;
pub mod repl;

/// Prefix for every message on stderr.
pub const PROGRAM: &str = "lsh";
