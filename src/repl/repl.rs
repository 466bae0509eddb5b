use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use rustyline::{error::ReadlineError, history::FileHistory, Editor};

use super::{
    commands::execute,
    config::history_file,
    helper::{create_editor, MyHelper},
    parsing::{parse_line, Action},
    Cli,
};
use crate::{
    invoker::{Notification, Notifier},
    session::Session,
};

/// Prints invoker notifications in the shell.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::TransactionSubmitted { .. } => {
                println!("\x1b[32m{}\x1b[0m", notification)
            }
            _ => println!("\x1b[33m{}\x1b[0m", notification),
        }
    }
}

pub struct Repl {
    rl: Editor<MyHelper, FileHistory>,
    session: Session,
    history_file: Option<PathBuf>,
}

impl Repl {
    pub fn create(session: Session, cli: &Cli) -> Result<Self> {
        let rl = create_editor(session.index())?;
        let history_file = cli.history_file.clone().or(history_file());
        Ok(Repl {
            rl,
            session: session.with_notifier(Arc::new(ConsoleNotifier)),
            history_file,
        })
    }

    pub async fn run(&mut self) {
        if let Some(history_file) = &self.history_file {
            let _ = self.rl.load_history(history_file);
        }

        println!(
            "Connected to {}, type help for the list of commands",
            self.session.network()
        );
        self.run_repl().await;

        if let Some(history_file) = &self.history_file {
            if let Err(e) = self.rl.save_history(history_file) {
                tracing::warn!(file = %history_file.display(), error = %e, "could not save history");
            }
        }
    }

    async fn run_repl(&mut self) {
        loop {
            let p = ">> ";
            if let Some(helper) = self.rl.helper_mut() {
                helper.set_prompt(&format!("\x1b[1;32m{p}\x1b[0m"));
            }
            let readline = self.rl.readline(p);
            match readline {
                Ok(line) => {
                    if !self.process_line(line.trim()).await {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    println!("Error: {:?}", err);
                    break;
                }
            }
        }
    }

    /// Returns false once the user asked to leave.
    async fn process_line(&mut self, line: &str) -> bool {
        let action = match parse_line(line) {
            Ok(Some(action)) => action,
            Ok(None) => return true,
            Err(e) => {
                println!("Error: {}", e);
                return true;
            }
        };
        if action == Action::Exit {
            return false;
        }
        match execute(&mut self.session, action).await {
            Ok(Some(output)) => println!("{}", output),
            Ok(None) => (),
            Err(e) => println!("Error: {:#}", e),
        }
        true
    }
}
