/// Traversal and batch driver
///
/// Expands the user's selection into eligible source files, pre-scans them
/// into the class registry, then runs the transformation per file inside a
/// cancellable loop. Cancellation is checked between files only: files
/// already written stay written, the rest of the queue is dropped.
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use walkdir::WalkDir;

use crate::config::Config;
use crate::engine;
use crate::java;
use crate::registry::ClassRegistry;
use crate::report::BatchContext;

#[derive(Debug)]
pub struct BatchReport {
    pub total: usize,
    pub processed: usize,
    /// Files whose import list referenced the library.
    pub eligible: usize,
    pub failures: Vec<(PathBuf, String)>,
    pub notices: Vec<String>,
    pub summary: Vec<String>,
    pub cancelled: bool,
    /// Dry-run only: per-file before/after pairs.
    pub diffs: Vec<FileDiff>,
}

#[derive(Debug)]
pub struct FileDiff {
    pub path: PathBuf,
    pub old: String,
    pub new: String,
}

/// Expand files and directories into the Java files to process. Kotlin
/// companion sources are detected but deliberately not transformed; their
/// count is returned so the caller can mention the passthrough.
pub fn collect_sources(paths: &[PathBuf], config: &Config) -> Result<(Vec<PathBuf>, usize)> {
    let ignore = &config.traversal.ignore_dirs;
    let mut java_files = Vec::new();
    let mut kotlin_count = 0usize;

    for path in paths {
        if !path.exists() {
            anyhow::bail!("No such file or directory: {}", path.display());
        }
        if path.is_file() {
            classify_file(path, &mut java_files, &mut kotlin_count);
            continue;
        }
        let walker = WalkDir::new(path).follow_links(false).into_iter();
        for entry in walker
            .filter_entry(|e| !is_ignored_dir(e, ignore))
            .filter_map(|e| e.ok())
        {
            if entry.file_type().is_file() {
                classify_file(entry.path(), &mut java_files, &mut kotlin_count);
            }
        }
    }

    java_files.sort();
    java_files.dedup();
    Ok((java_files, kotlin_count))
}

fn classify_file(path: &Path, java_files: &mut Vec<PathBuf>, kotlin_count: &mut usize) {
    match path.extension().and_then(|s| s.to_str()) {
        Some("java") => java_files.push(path.to_path_buf()),
        Some("kt") => *kotlin_count += 1,
        _ => {}
    }
}

fn is_ignored_dir(entry: &walkdir::DirEntry, ignore: &[String]) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| ignore.iter().any(|d| d == name))
            .unwrap_or(false)
}

/// Run the transformation over `files`. The progress callback fires once per
/// file with (path, 1-based index, total) before the file is processed.
pub fn execute_batch(
    files: &[PathBuf],
    config: &Config,
    cancel: &AtomicBool,
    dry_run: bool,
    mut progress: impl FnMut(&Path, usize, usize),
) -> Result<BatchReport> {
    let total = files.len();
    let mut report = BatchReport {
        total,
        processed: 0,
        eligible: 0,
        failures: Vec::new(),
        notices: Vec::new(),
        summary: Vec::new(),
        cancelled: false,
        diffs: Vec::new(),
    };

    // Pre-scan the whole selection so superclass hooks resolve across files.
    let mut registry = ClassRegistry::new();
    for file in files {
        if cancel.load(Ordering::SeqCst) {
            report.cancelled = true;
            return Ok(report);
        }
        if let Ok(source) = fs::read_to_string(file) {
            if let Ok(unit) = java::parse_source(&source) {
                registry.scan_unit(&unit, &config.anchors.custom_hooks);
            }
        }
    }

    let mut ctx = BatchContext::new();
    for (index, file) in files.iter().enumerate() {
        if cancel.load(Ordering::SeqCst) {
            report.cancelled = true;
            break;
        }
        progress(file, index + 1, total);
        report.processed += 1;

        match process_file(file, &registry, &mut ctx, config, dry_run) {
            Ok(outcome) => {
                if outcome.eligible {
                    report.eligible += 1;
                }
                if let Some(diff) = outcome.diff {
                    report.diffs.push(diff);
                }
            }
            Err(message) => {
                report.failures.push((file.clone(), message));
            }
        }
    }

    report.notices = ctx.take_notices();
    report.summary = ctx.summary();
    Ok(report)
}

struct FileOutcome {
    eligible: bool,
    diff: Option<FileDiff>,
}

fn process_file(
    path: &Path,
    registry: &ClassRegistry,
    ctx: &mut BatchContext,
    config: &Config,
    dry_run: bool,
) -> std::result::Result<FileOutcome, String> {
    let source = fs::read_to_string(path).map_err(|e| format!("read failed: {}", e))?;
    let mut unit = java::parse_source(&source)?;
    let before = unit.clone();

    let eligible = java::edit::transact(&mut unit, "remove-view-binding", |u| {
        engine::transform_unit(u, registry, ctx, config)
    })?;

    let mut diff = None;
    if eligible && unit != before {
        let rendered = java::printer::render(&unit);
        if dry_run {
            diff = Some(FileDiff {
                path: path.to_path_buf(),
                old: source,
                new: rendered,
            });
        } else {
            fs::write(path, rendered).map_err(|e| format!("write failed: {}", e))?;
        }
    }
    Ok(FileOutcome { eligible, diff })
}
