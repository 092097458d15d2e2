//! Command implementations for mirror-cli

pub mod apply;
pub mod roots;
pub mod scan;

pub use apply::run_apply;
pub use roots::run_roots;
pub use scan::run_scan;

use colored::Colorize;
use mirror_core::Report;
use mirror_fs::RelativePath;

/// Print a report grouped by category, moves first.
pub fn print_report(report: &Report) {
    if report.is_in_sync() {
        println!("{} No Changes Detected!", "OK".green().bold());
        return;
    }

    if !report.moved.is_empty() {
        println!("{}", "These files have moved:".blue().bold());
        for pair in &report.moved {
            println!("   {}", pair);
        }
        println!();
    }
    print_section("These files have changed:", &report.mismatched, "~");
    print_section("These files are new or moved:", &report.added, "+");
    print_section("These files have been deleted or moved:", &report.removed, "-");
    print_section("These files had errors (check manually!):", &report.errors, "!");
}

/// Print failed items after an apply.
pub fn print_failures(items: &[RelativePath]) {
    print_section("These files had errors (check manually!):", items, "!");
}

fn print_section(heading: &str, items: &[RelativePath], marker: &str) {
    if items.is_empty() {
        return;
    }
    let heading = match marker {
        "+" => heading.green().bold(),
        "-" | "!" => heading.red().bold(),
        _ => heading.yellow().bold(),
    };
    println!("{}", heading);
    for item in items {
        println!("   {} {}", marker.dimmed(), item.as_str().cyan());
    }
    println!();
}
