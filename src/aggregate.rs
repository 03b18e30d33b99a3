//! Combined markdown document and training-example export.
//!
//! Both artifacts are rebuilt from scratch on every run and overwrite
//! whatever a previous run left in the output folder.

use crate::{config::Config, process::ProcessingResult, util::write_text};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombinedDocument {
    pub content: String,
    /// Names included, in order.
    pub included: Vec<String>,
    /// Successful items whose output could not be re-read.
    pub skipped: Vec<String>,
}

/// One `## name` / content / `---` block per successful result, in the
/// order given.
pub fn build_combined(results: &[ProcessingResult]) -> CombinedDocument {
    let mut doc = CombinedDocument::default();

    for r in results {
        let Some(path) = r.output_path() else {
            continue;
        };
        match std::fs::read_to_string(path) {
            Ok(body) => {
                doc.content.push_str(&combined_block(&r.original_name, &body));
                doc.included.push(r.original_name.clone());
            }
            Err(err) => {
                warn!("error reading {}: {err}; skipping from combined document", path.display());
                doc.skipped.push(r.original_name.clone());
            }
        }
    }

    doc
}

pub fn combined_block(name: &str, body: &str) -> String {
    format!("## {name}\n\n{body}\n\n---\n")
}

pub fn write_combined(path: &Path, doc: &CombinedDocument) -> Result<()> {
    write_text(path, &doc.content)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub messages: Vec<Message>,
}

pub fn escape_backslashes(s: &str) -> String {
    s.replace('\\', "\\\\")
}

pub fn unescape_backslashes(s: &str) -> String {
    s.replace("\\\\", "\\")
}

pub fn training_example(cfg: &Config, combined: &str) -> TrainingExample {
    let escaped = escape_backslashes(combined);
    TrainingExample {
        messages: vec![
            Message {
                role: "system".to_string(),
                content: cfg.training.system_prompt.clone(),
            },
            Message {
                role: "user".to_string(),
                content: format!(
                    "{}\n\nSupporting documents in markdown:\n\n{escaped}",
                    cfg.training.query
                ),
            },
        ],
    }
}

/// Reads the combined document back from `combined_path` and writes the
/// training example to `out_path`. An unreadable combined document embeds
/// empty content.
pub fn write_training_example(
    cfg: &Config,
    combined_path: &Path,
    out_path: &Path,
) -> Result<TrainingExample> {
    let combined = std::fs::read_to_string(combined_path).unwrap_or_else(|err| {
        warn!("error reading combined markdown {}: {err}", combined_path.display());
        String::new()
    });
    let example = training_example(cfg, &combined);
    let json = serde_json::to_string_pretty(&example)
        .with_context(|| "serializing training example")?;
    write_text(out_path, &json)?;
    Ok(example)
}
