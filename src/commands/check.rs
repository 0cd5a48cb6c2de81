use anyhow::Result;
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::sync::atomic::AtomicBool;

use crate::batch;
use crate::commands::{run::render_report, to_paths};
use crate::config;

/// Dry run: transform in memory and print what `run` would change.
pub fn execute(paths: &[String]) -> Result<()> {
    let config = config::load_or_default()?;
    let selection = to_paths(paths);

    let (files, kotlin_count) = batch::collect_sources(&selection, &config)?;
    if files.is_empty() {
        println!("{}", "   No Java files found in the selection".yellow());
        return Ok(());
    }

    let cancel = AtomicBool::new(false);
    let report = batch::execute_batch(&files, &config, &cancel, true, |_, _, _| {})?;

    for diff in &report.diffs {
        println!("{}", format!("--- {}", diff.path.display()).bold());
        let text_diff = TextDiff::from_lines(&diff.old, &diff.new);
        for change in text_diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Delete => print!("{}", format!("-{}", change).red()),
                ChangeTag::Insert => print!("{}", format!("+{}", change).green()),
                ChangeTag::Equal => {}
            }
        }
        println!();
    }
    if report.diffs.is_empty() {
        println!("   Nothing to change");
    }

    render_report(&report, kotlin_count);
    Ok(())
}
