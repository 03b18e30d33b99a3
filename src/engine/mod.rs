pub mod python;
pub mod types;

use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

pub use types::{ConvertIn, ConvertOptions, ConvertOut, DocDiag};

/// A document-to-markdown backend. Shared by every worker thread of a batch.
pub trait Engine: Send + Sync {
    fn doctor(&self) -> Result<DocDiag>;
    fn to_markdown(&self, input: &Path) -> Result<String>;
}

/// Outcome of one conversion attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    Content(String),
    NoContent { reason: String },
}

/// Single attempt, no retry. Every failure is logged and folded into
/// [`Conversion::NoContent`]; nothing propagates to the caller.
pub fn convert_document(engine: &dyn Engine, input: &Path) -> Conversion {
    let name = display_name(input);
    info!("converting: {name}");

    match engine.to_markdown(input) {
        Ok(md) if md.is_empty() => {
            warn!("no markdown produced for {name}");
            Conversion::NoContent {
                reason: "converter returned empty content".to_string(),
            }
        }
        Ok(md) => Conversion::Content(md),
        Err(err) => {
            warn!("error converting {name}: {err:#}");
            Conversion::NoContent {
                reason: format!("{err:#}"),
            }
        }
    }
}

fn display_name(p: &Path) -> String {
    p.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| p.display().to_string())
}
