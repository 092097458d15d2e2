//! The roots command

use colored::Colorize;

use crate::context::Context;
use crate::error::Result;

pub fn run_roots(ctx: &Context) -> Result<()> {
    match ctx.last_roots.load()? {
        Some((source, target)) => {
            println!("{} {}", "source:".bold(), source.display());
            println!("{} {}", "target:".bold(), target.display());
        }
        None => {
            println!("No roots remembered yet.");
            println!("Run {} to set them.", "mirror scan SOURCE TARGET".cyan());
        }
    }
    Ok(())
}
