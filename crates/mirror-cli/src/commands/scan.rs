//! The scan command

use std::path::Path;

use colored::Colorize;

use crate::context::Context;
use crate::error::Result;

use super::print_report;

/// Compare the roots and print the report.
///
/// Explicit roots are remembered once the scan succeeds.
pub fn run_scan(
    ctx: &Context,
    source: Option<&Path>,
    target: Option<&Path>,
    deep: bool,
    json: bool,
) -> Result<()> {
    let (source, target) = ctx.resolve_roots(source, target)?;
    if !json {
        println!(
            "{} Comparing {} with {}",
            "=>".blue().bold(),
            source.display().to_string().cyan(),
            target.display().to_string().cyan()
        );
    }

    let mut manager = ctx.manager(deep)?;
    let report = manager.scan(source.as_path(), target.as_path())?;
    ctx.remember(&source, &target)?;

    if json {
        println!("{}", report.to_json_pretty()?);
    } else {
        print_report(report);
        let summary = report.summary();
        println!(
            "{} matched, {} moved, {} changed, {} new, {} deleted, {} errors",
            summary.matched,
            summary.moved,
            summary.mismatched,
            summary.added,
            summary.removed,
            summary.errors
        );
    }
    Ok(())
}
