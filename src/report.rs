use crate::{process::ProcessingResult, util::{now_rfc3339, write_text}};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub processed: Vec<ProcessingResult>,
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub output_folder: PathBuf,
    pub max_workers: usize,
    pub sample_size: usize,
    pub started: String,
    pub finished: String,
}

impl BatchResult {
    /// Counts come from `processed`; callers never tally them.
    pub fn new(
        mut processed: Vec<ProcessingResult>,
        total: usize,
        output_folder: &Path,
        max_workers: usize,
        sample_size: usize,
        started: String,
        finished: String,
    ) -> Self {
        processed.sort_by(|a, b| a.original_name.cmp(&b.original_name));
        let success = processed.iter().filter(|r| r.is_success()).count();
        let failed = processed.len() - success;
        Self {
            processed,
            total,
            success,
            failed,
            output_folder: output_folder.to_path_buf(),
            max_workers,
            sample_size,
            started,
            finished,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &ProcessingResult> {
        self.processed.iter().filter(|r| !r.is_success())
    }
}

pub fn summary_lines(batch: &BatchResult) -> Vec<String> {
    let mut lines = vec![
        "PROCESSING SUMMARY".to_string(),
        format!("Total PDFs found: {}", batch.total),
        format!("Successfully converted: {}", batch.success),
        format!("Failed conversions: {}", batch.failed),
        format!("Output folder: {}", batch.output_folder.display()),
        format!("Worker threads used: {}", batch.max_workers),
    ];

    if batch.failed > 0 {
        lines.push(String::new());
        lines.push("Failed conversions:".to_string());
        for r in batch.failures() {
            match r.error() {
                Some(err) => lines.push(format!("  - {} - {err}", r.original_name)),
                None => lines.push(format!("  - {}", r.original_name)),
            }
        }
    }

    lines
}

pub fn write_results(path: &Path, batch: &BatchResult) -> Result<()> {
    let json = serde_json::to_string_pretty(batch).with_context(|| "serializing batch result")?;
    write_text(path, &json)
}

/// Human-readable listing of every processed item.
pub fn write_index(path: &Path, batch: &BatchResult) -> Result<()> {
    let mut s = String::new();
    let _ = writeln!(s, "# PDF Documents Index\n");
    let _ = writeln!(s, "Generated on: {}\n", now_rfc3339());
    let _ = writeln!(s, "## Processed Documents\n");
    for r in &batch.processed {
        let md = r
            .output_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        let status = if r.is_success() { "success" } else { "failed" };
        let _ = writeln!(s, "### {}\n", r.original_name);
        let _ = writeln!(s, "- **Original PDF**: `{}`", r.source_path.display());
        let _ = writeln!(s, "- **Markdown File**: `{md}`");
        let _ = writeln!(s, "- **Status**: {status}");
        let _ = writeln!(s, "- **Size**: {} bytes\n", r.size);
    }
    write_text(path, &s)
}
