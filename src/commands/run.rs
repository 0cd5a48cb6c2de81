use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::batch;
use crate::commands::to_paths;
use crate::config;

pub fn execute(paths: &[String], yes: bool) -> Result<()> {
    let config = config::load_or_default()?;
    let selection = to_paths(paths);

    let (files, kotlin_count) = batch::collect_sources(&selection, &config)?;
    if files.is_empty() {
        println!("{}", "   No Java files found in the selection".yellow());
        return Ok(());
    }

    // Batches touch files in place; multi-file runs get a confirmation
    // prompt first, like the original's pre-batch dialog.
    if files.len() > 1 && !yes && !confirm(files.len())? {
        println!("   Aborted");
        return Ok(());
    }

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            cancel.store(true, Ordering::SeqCst);
        })
        .context("Failed to install the Ctrl-C handler")?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:32} [{bar:40}] {pos:>4}/{len:4}")
            .unwrap()
            .progress_chars("=> "),
    );

    let report = batch::execute_batch(&files, &config, &cancel, false, |path, index, _total| {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("<file>");
        pb.set_message(format!("'{}'", name));
        pb.set_position(index as u64 - 1);
    })?;
    pb.finish_and_clear();

    render_report(&report, kotlin_count);
    Ok(())
}

fn confirm(count: usize) -> Result<bool> {
    print!("About to rewrite {} Java files in place. Continue? [y/N] ", count);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

pub(crate) fn render_report(report: &batch::BatchReport, kotlin_count: usize) {
    for notice in &report.notices {
        eprintln!("{} {}", "warning:".yellow().bold(), notice);
    }
    for (path, message) in &report.failures {
        eprintln!(
            "{} {} - {}",
            "error:".red().bold(),
            path.display(),
            message
        );
    }
    for line in &report.summary {
        println!("   {}", line);
    }
    if report.cancelled {
        println!(
            "{}",
            format!(
                "   Cancelled after {} of {} file(s); completed files keep their changes",
                report.processed, report.total
            )
            .yellow()
        );
    }
    println!(
        "{}",
        format!(
            "   Finished: {} file(s) processed, {} used the library, {} failed",
            report.processed,
            report.eligible,
            report.failures.len()
        )
        .green()
        .bold()
    );
    if kotlin_count > 0 {
        println!(
            "   {} Kotlin file(s) detected and left unchanged",
            kotlin_count
        );
    }
}
