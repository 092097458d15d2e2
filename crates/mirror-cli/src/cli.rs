//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use mirror_core::Category;

/// Tree Mirror - keep a backup tree in line with its source
#[derive(Parser, Debug)]
#[command(name = "mirror")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (defaults to config.toml in the state directory)
    #[arg(long, global = true, env = "MIRROR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding settings and the remembered roots
    #[arg(long, global = true, env = "MIRROR_STATE_DIR", hide = true)]
    pub state_dir: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Compare the source tree with the target tree
    ///
    /// Roots default to the last pair used; roots given here are remembered.
    ///
    /// Examples:
    ///   mirror scan ~/Music /mnt/backup/Music
    ///   mirror scan --json
    Scan {
        /// Source tree (the authoritative side)
        source: Option<PathBuf>,

        /// Target tree (the backup)
        target: Option<PathBuf>,

        /// Compare file contents byte by byte instead of size and mtime
        #[arg(long)]
        deep: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Scan, then reconcile one category (or all of them)
    ///
    /// Examples:
    ///   mirror apply moved
    ///   mirror apply added --only new_album
    ///   mirror apply all ~/Music /mnt/backup/Music
    Apply {
        /// Category to reconcile
        #[arg(value_enum)]
        category: ApplyCategory,

        /// Source tree (the authoritative side)
        source: Option<PathBuf>,

        /// Target tree (the backup)
        target: Option<PathBuf>,

        /// Only reconcile these relative paths (repeatable)
        #[arg(long = "only", value_name = "PATH")]
        only: Vec<String>,

        /// Compare file contents byte by byte instead of size and mtime
        #[arg(long)]
        deep: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show the remembered source and target roots
    Roots,
}

/// Category argument for `apply`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyCategory {
    /// Copy new source entries to the target
    Added,
    /// Send target-only entries to the trash
    Removed,
    /// Overwrite changed target files
    Mismatched,
    /// Move target entries to mirror source-side moves
    Moved,
    /// Moves, then added, removed and mismatched
    All,
}

impl ApplyCategory {
    /// The single report category, or `None` for `all`.
    pub fn category(self) -> Option<Category> {
        match self {
            ApplyCategory::Added => Some(Category::Added),
            ApplyCategory::Removed => Some(Category::Removed),
            ApplyCategory::Mismatched => Some(Category::Mismatched),
            ApplyCategory::Moved => Some(Category::Moved),
            ApplyCategory::All => None,
        }
    }
}
