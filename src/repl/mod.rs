mod cli;
mod commands;
mod completer;
mod config;
mod helper;
mod parsing;
#[allow(clippy::module_inception)]
mod repl;

pub use cli::{Cli, Command};
pub use commands::{execute, HELP};
pub use parsing::{parse_line, split_line, Action, WalletAction};
pub use repl::Repl;
