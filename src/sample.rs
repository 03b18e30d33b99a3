use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A discovered source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFile {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Lists files directly under `dir` whose extension matches
/// `discovery.extension`. Order follows the filesystem.
pub fn discover_inputs(cfg: &Config, dir: &Path) -> Result<Vec<InputFile>> {
    if !dir.is_dir() {
        return Err(anyhow!("input folder is not a directory: {}", dir.display()));
    }

    let wanted = cfg.discovery.extension.trim_start_matches('.');
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("read_dir {}", dir.display()))? {
        let entry = entry.with_context(|| format!("read_dir entry in {}", dir.display()))?;
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let matches = if cfg.discovery.case_insensitive {
            ext.eq_ignore_ascii_case(wanted)
        } else {
            ext == wanted
        };
        if !matches {
            continue;
        }
        let meta = entry
            .metadata()
            .with_context(|| format!("stat {}", path.display()))?;
        if !meta.is_file() {
            continue;
        }
        out.push(InputFile {
            name: entry.file_name().to_string_lossy().into_owned(),
            path,
            size: meta.len(),
        });
    }
    debug!("discovered {} inputs in {}", out.len(), dir.display());
    Ok(out)
}

/// Uniform selection of `count` distinct files. When fewer than `count`
/// exist, every file is selected.
pub fn choose_sample<R: Rng + ?Sized>(
    files: &[InputFile],
    count: usize,
    rng: &mut R,
) -> Vec<InputFile> {
    files.choose_multiple(rng, count).cloned().collect()
}

/// Discovery plus sampling. Returns `(discovered_count, selection)`; an
/// empty folder yields `(0, [])`.
pub fn select_inputs(cfg: &Config, dir: &Path) -> Result<(usize, Vec<InputFile>)> {
    let files = discover_inputs(cfg, dir)?;
    if files.is_empty() {
        return Ok((0, Vec::new()));
    }
    let wanted = cfg.batch.sample_size;
    if files.len() < wanted {
        warn!(
            "only {} files available, fewer than sample_size={wanted}; selecting all",
            files.len()
        );
    }
    let mut rng = make_rng(cfg.batch.seed);
    Ok((files.len(), choose_sample(&files, wanted, &mut rng)))
}

pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}
