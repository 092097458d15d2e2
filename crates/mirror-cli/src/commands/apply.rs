//! The apply command
//!
//! Always scans first, so the applied report is never stale.

use std::path::Path;

use colored::Colorize;
use mirror_core::ApplySummary;
use mirror_fs::RelativePath;
use serde_json::json;

use crate::cli::ApplyCategory;
use crate::context::Context;
use crate::error::{CliError, Result};

use super::{print_failures, print_report};

/// Scan the roots and reconcile `category`.
///
/// Failed items are printed and do not make the command fail.
pub fn run_apply(
    ctx: &Context,
    category: ApplyCategory,
    source: Option<&Path>,
    target: Option<&Path>,
    only: &[String],
    deep: bool,
    json: bool,
) -> Result<()> {
    let (source, target) = ctx.resolve_roots(source, target)?;
    let mut manager = ctx.manager(deep)?;
    manager.scan(source.as_path(), target.as_path())?;
    ctx.remember(&source, &target)?;

    let Some(single) = category.category() else {
        if !only.is_empty() {
            return Err(CliError::user("--only cannot be combined with `apply all`"));
        }
        let summary = manager.reconcile_all()?;
        return if json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        } else {
            print_summary(&summary);
            Ok(())
        };
    };

    let subset: Vec<RelativePath> = only.iter().map(RelativePath::new).collect();
    let pending = if subset.is_empty() {
        manager.report().map_or(0, |report| report.count(single))
    } else {
        subset.len()
    };
    let failed = manager.reconcile(single, (!subset.is_empty()).then_some(subset.as_slice()))?;
    let applied = pending.saturating_sub(failed.len());

    if json {
        let output = json!({
            "category": single,
            "applied": applied,
            "failed": failed,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} Applied {} {} item(s)",
        "OK".green().bold(),
        applied,
        single
    );
    print_failures(&failed);
    if let Some(report) = manager.report()
        && !report.is_in_sync()
    {
        println!("{}", "Still pending:".bold());
        print_report(report);
    }
    Ok(())
}

fn print_summary(summary: &ApplySummary) {
    println!("{} Applied {} item(s)", "OK".green().bold(), summary.applied);
    if summary.is_complete() {
        return;
    }
    if !summary.failed_moves.is_empty() {
        println!("{}", "These moves failed (check manually!):".red().bold());
        for pair in &summary.failed_moves {
            println!("   {} {}", "!".dimmed(), pair);
        }
        println!();
    }
    let failed: Vec<RelativePath> = summary
        .failed_added
        .iter()
        .chain(&summary.failed_removed)
        .chain(&summary.failed_mismatched)
        .cloned()
        .collect();
    print_failures(&failed);
}
