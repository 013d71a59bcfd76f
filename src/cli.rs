// CLI definitions using clap

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "obinskit-macro-edit")]
#[command(author, version, about = "Edit an ObinsKit keyboard macro in your $EDITOR")]
#[command(
    long_about = "Edit an ObinsKit keyboard macro in your $EDITOR.\n\n\
    The macro_value of the named macro is rendered as one KEY_DOWN / KEY_UP / WAIT \
    event per line. After the editor exits, the file is validated and written back. \
    By default a copy of the database is edited; its path is printed at the end."
)]
pub struct Cli {
    /// Path to the ObinsKit SQLite database (e.g. .../ObinsKit/Run.core)
    #[arg(long, value_name = "PATH")]
    pub db_path: PathBuf,

    /// Name of the macro to edit
    #[arg(long, value_name = "NAME")]
    pub macro_name: String,

    /// Validate and show the diff, but don't write to the database
    #[arg(long)]
    pub dry_run: bool,

    /// Edit the database file itself instead of a temporary copy
    #[arg(long)]
    pub in_place: bool,

    /// Editor command (default: $VISUAL, then $EDITOR, then vi)
    #[arg(long, value_name = "CMD")]
    pub editor: Option<String>,

    /// Config file path (default: ~/.config/obinskit/macro-edit.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
