//! Tree Mirror CLI
//!
//! Scans a source tree against its backup and reconciles the differences.

mod cli;
mod commands;
mod context;
mod error;
mod settings;
mod state;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Commands};
use context::Context;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            eprintln!("{}: tracing subscriber already set", "warning".yellow().bold());
        }
        tracing::debug!("Verbose mode enabled");
    }

    let Some(cmd) = cli.command else {
        println!("{} Tree Mirror CLI", "mirror".green().bold());
        println!();
        println!("Run {} for available commands.", "mirror --help".cyan());
        return Ok(());
    };

    let ctx = Context::load(cli.state_dir, cli.config)?;
    execute_command(&ctx, cmd)
}

fn execute_command(ctx: &Context, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Scan {
            source,
            target,
            deep,
            json,
        } => commands::run_scan(ctx, source.as_deref(), target.as_deref(), deep, json),
        Commands::Apply {
            category,
            source,
            target,
            only,
            deep,
            json,
        } => commands::run_apply(
            ctx,
            category,
            source.as_deref(),
            target.as_deref(),
            &only,
            deep,
            json,
        ),
        Commands::Roots => commands::run_roots(ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_test_utils::TreePair;
    use tempfile::TempDir;

    fn context(state: &TempDir, pair: &TreePair) -> Context {
        let config = state.path().join("config.toml");
        std::fs::write(
            &config,
            format!("trash = {:?}\n", pair.trash_dir().to_string_lossy()),
        )
        .unwrap();
        Context::load(Some(state.path().to_path_buf()), None).unwrap()
    }

    #[test]
    fn test_scan_remembers_roots() {
        let state = TempDir::new().unwrap();
        let pair = TreePair::standard();
        let ctx = context(&state, &pair);

        execute_command(
            &ctx,
            Commands::Scan {
                source: Some(pair.source()),
                target: Some(pair.target()),
                deep: false,
                json: false,
            },
        )
        .unwrap();

        let canonical = |path: std::path::PathBuf| std::fs::canonicalize(path).unwrap();
        assert_eq!(
            ctx.last_roots.load().unwrap(),
            Some((canonical(pair.source()), canonical(pair.target())))
        );
    }

    #[test]
    fn test_apply_uses_remembered_roots() {
        let state = TempDir::new().unwrap();
        let pair = TreePair::standard();
        pair.write_source("new_file.txt", "this is an added file");
        let ctx = context(&state, &pair);
        ctx.remember(&pair.source(), &pair.target()).unwrap();

        execute_command(
            &ctx,
            Commands::Apply {
                category: cli::ApplyCategory::Added,
                source: None,
                target: None,
                only: Vec::new(),
                deep: false,
                json: false,
            },
        )
        .unwrap();

        pair.assert_target_exists("new_file.txt");
    }

    #[test]
    fn test_only_with_all_is_rejected() {
        let state = TempDir::new().unwrap();
        let pair = TreePair::standard();
        let ctx = context(&state, &pair);

        let result = execute_command(
            &ctx,
            Commands::Apply {
                category: cli::ApplyCategory::All,
                source: Some(pair.source()),
                target: Some(pair.target()),
                only: vec!["file1.txt".to_string()],
                deep: false,
                json: false,
            },
        );

        assert!(matches!(result, Err(error::CliError::User { .. })));
    }

    #[test]
    fn test_cli_error_user() {
        let error = error::CliError::user("test error");
        assert_eq!(format!("{}", error), "test error");
    }
}
