use crate::{
    engine::{convert_document, Conversion, Engine},
    postprocess::Cleaner,
    sample::InputFile,
    util::markdown_file_name,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Per-item outcome. Serialized flat, with `status` as the discriminant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub original_name: String,
    pub source_path: PathBuf,
    pub size: u64,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success {
        output_path: PathBuf,
    },
    Failed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl ProcessingResult {
    pub fn success(input: &InputFile, output_path: PathBuf) -> Self {
        Self {
            original_name: input.name.clone(),
            source_path: input.path.clone(),
            size: input.size,
            outcome: Outcome::Success { output_path },
        }
    }

    pub fn failed(input: &InputFile, error: Option<String>) -> Self {
        Self {
            original_name: input.name.clone(),
            source_path: input.path.clone(),
            size: input.size,
            outcome: Outcome::Failed { error },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }

    pub fn output_path(&self) -> Option<&Path> {
        match &self.outcome {
            Outcome::Success { output_path } => Some(output_path),
            Outcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Failed { error } => error.as_deref(),
            Outcome::Success { .. } => None,
        }
    }
}

/// One sampled input paired with the file name its markdown is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub input: InputFile,
    pub output_name: String,
}

/// Assigns every input a distinct markdown file name before any worker
/// starts. Names are compared case-insensitively and must not hit
/// `reserved` (the batch's own artifacts). Clashes get `-2`, `-3`, ...
/// in original-name order, so the result does not depend on sampling order.
pub fn plan_outputs(inputs: &[InputFile], reserved: &[&str]) -> Vec<WorkItem> {
    let mut taken: HashSet<String> = reserved.iter().map(|r| r.to_lowercase()).collect();

    let mut order: Vec<usize> = (0..inputs.len()).collect();
    order.sort_by(|&a, &b| inputs[a].name.cmp(&inputs[b].name));

    let mut names = vec![String::new(); inputs.len()];
    for i in order {
        let base = markdown_file_name(&inputs[i].name);
        let mut candidate = base.clone();
        let mut n = 2;
        while taken.contains(&candidate.to_lowercase()) {
            let stem = base.strip_suffix(".md").unwrap_or(&base);
            candidate = format!("{stem}-{n}.md");
            n += 1;
        }
        if candidate != base {
            warn!("{} would overwrite {base}; writing {candidate}", inputs[i].name);
        }
        taken.insert(candidate.to_lowercase());
        names[i] = candidate;
    }

    inputs
        .iter()
        .cloned()
        .zip(names)
        .map(|(input, output_name)| WorkItem { input, output_name })
        .collect()
}

/// Converts one file and writes `out_dir/{output_name}`. Every failure ends
/// in an `Outcome::Failed` result.
pub fn process_file(
    engine: &dyn Engine,
    cleaner: &Cleaner,
    item: &WorkItem,
    out_dir: &Path,
) -> ProcessingResult {
    let input = &item.input;
    let markdown = match convert_document(engine, &input.path) {
        Conversion::Content(md) => cleaner.clean(&md),
        Conversion::NoContent { reason } => {
            warn!("✗ failed to convert: {}", input.name);
            return ProcessingResult::failed(input, Some(reason));
        }
    };

    if markdown.is_empty() {
        warn!("✗ nothing left after cleanup: {}", input.name);
        return ProcessingResult::failed(
            input,
            Some("markdown was empty after cleanup".to_string()),
        );
    }

    let path = out_dir.join(&item.output_name);
    match persist(&path, &markdown) {
        Ok(()) => {
            info!("✓ converted: {} -> {}", input.name, path.display());
            ProcessingResult::success(input, path)
        }
        Err(err) => {
            warn!("✗ error processing {}: {err:#}", input.name);
            ProcessingResult::failed(input, Some(format!("{err:#}")))
        }
    }
}

fn persist(path: &Path, markdown: &str) -> Result<()> {
    std::fs::write(path, markdown)
        .with_context(|| format!("writing markdown: {}", path.display()))
}
