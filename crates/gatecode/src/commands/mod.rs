//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod check;
pub mod codes;
pub mod config_cmd;
pub mod edit;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a command to the appropriate handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Revoke(args) => codes::handle(codes::Operation::Revoke, args, global).await,
        Command::Set(args) => codes::handle(codes::Operation::Set, args, global).await,
        Command::Check(args) => check::handle(args, global),
        Command::Edit(args) => edit::handle(args, global).await,
        Command::Config(args) => config_cmd::handle(args, global),
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = crate::cli::Cli::command();
            generate(args.shell, &mut cmd, "gatecode", &mut std::io::stdout());
            Ok(())
        }
    }
}
