use anyhow::Result;
use clap::Parser;

use ideapulse::{
    config::Config,
    logging,
    repl::{execute, Action, Cli, Command, Repl},
    session::Session,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(&cli.log_level, cli.json_logs)?;

    let config = Config::from_cli(&cli);
    let mut session = Session::open(config).await?;

    match cli.command.clone().unwrap_or(Command::Repl) {
        Command::Repl => {
            let mut repl = Repl::create(session, &cli)?;
            repl.run().await;
        }
        command => {
            let action = Action::try_from(command)?;
            if let Some(output) = execute(&mut session, action).await? {
                println!("{}", output);
            }
        }
    }

    Ok(())
}
