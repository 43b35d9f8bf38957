use std::{
    io::{self, IsTerminal},
    process::ExitCode,
};

use clap::Parser;
use lumbung::{config::Config, repl::Repl, storage::bplus_tree::Table, types::error::Result};
use rustyline::DefaultEditor;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn run(config: &Config) -> Result<()> {
    let table = match Table::open(&config.db_path) {
        Ok(table) => table,
        Err(e) => {
            println!("{e}");
            return Err(e);
        }
    };
    let repl = Repl::new(table);
    let mut stdout = io::stdout().lock();

    if !io::stdin().is_terminal() {
        return repl.run_script(io::stdin().lock(), &mut stdout);
    }

    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            tracing::warn!("line editor unavailable, reading plain stdin: {e}");
            return repl.run_script(io::stdin().lock(), &mut stdout);
        }
    };
    if let Some(history) = &config.history {
        if let Err(e) = editor.load_history(history) {
            tracing::debug!("no history loaded from {}: {e}", history.display());
        }
    }
    let result = repl.run_interactive(&mut editor, &mut stdout);
    if let Some(history) = &config.history {
        if let Err(e) = editor.save_history(history) {
            tracing::warn!("failed to save history to {}: {e}", history.display());
        }
    }
    result
}

fn main() -> ExitCode {
    let config = Config::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&config.log_filter)
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("terminating: {e}");
            ExitCode::FAILURE
        }
    }
}
