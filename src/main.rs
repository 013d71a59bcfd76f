//! ObinsKit Macro Editor CLI
//!
//! Edits one macro from an ObinsKit SQLite database in an external editor.

use anyhow::Context;
use clap::Parser;
use obinskit_macro::keycode_index;
use obinskit_macro_edit::{
    CommandEditor, EditConfig, EditSession, SessionOptions, SessionOutcome, SqliteStore,
    WorkingCopy,
};
use tracing::{error, info};

// CLI definitions
mod cli;
use cli::Cli;

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(EditConfig::default_path);
    let mut config = EditConfig::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    if cli.editor.is_some() {
        config.editor = cli.editor.clone();
    }
    config.in_place |= cli.in_place;

    let working_copy = if config.in_place {
        None
    } else {
        Some(WorkingCopy::create(&cli.db_path).with_context(|| {
            format!("Failed to copy {} to a working copy", cli.db_path.display())
        })?)
    };
    let db_path = working_copy
        .as_ref()
        .map_or(cli.db_path.as_path(), WorkingCopy::db_path);

    let mut store = SqliteStore::open(db_path, config.store.clone())
        .with_context(|| format!("Failed to open SQLite db at {}", db_path.display()))?;
    let editor = CommandEditor::resolve(config.editor.as_deref())?;

    let mut session = EditSession::new(
        &cli.macro_name,
        SessionOptions {
            dry_run: cli.dry_run,
            document_dir: None,
        },
    );
    let outcome = session.run(&mut store, &editor, keycode_index())?;

    match outcome {
        SessionOutcome::Unchanged => {
            println!("Macro \"{}\" not changed, nothing to update.", cli.macro_name);
        }
        SessionOutcome::DryRun { diff, raw } => {
            print!("{}", diff.unified());
            println!("Dry run: macro \"{}\" would be set to {raw}", cli.macro_name);
        }
        SessionOutcome::Persisted { diff, raw } => {
            print!("{}", diff.unified());
            println!("Macro \"{}\" set to {raw}", cli.macro_name);
            match &working_copy {
                Some(copy) => {
                    println!("Updated working copy: {}", copy.db_path().display());
                    println!(
                        "Copy it over {} (with ObinsKit closed) to install the change.",
                        copy.source().display()
                    );
                }
                None => info!("Updated {} in place", cli.db_path.display()),
            }
        }
    }

    Ok(())
}
