use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub batch: Batch,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub discovery: Discovery,
    #[serde(default)]
    pub converter: Converter,
    #[serde(default)]
    pub postprocess: Postprocess,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub training: Training,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub security: Security,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    /// Explicit path wins, then `./pdf-harvest.toml`, then built-in defaults.
    pub fn resolve(user: Option<&Path>) -> Result<Self> {
        if let Some(p) = user {
            return Self::load(p);
        }
        let default = PathBuf::from("pdf-harvest.toml");
        if default.exists() {
            Self::load(&default)
        } else {
            Ok(Self::default())
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch: Default::default(),
            paths: Default::default(),
            discovery: Default::default(),
            converter: Default::default(),
            postprocess: Default::default(),
            output: Default::default(),
            training: Default::default(),
            logging: Default::default(),
            security: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Batch {
    pub sample_size: usize,
    /// `0` picks `min(max_workers_ceiling, available_parallelism)`.
    pub max_workers: usize,
    pub max_workers_ceiling: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub print_summary: bool,
}
impl Default for Batch {
    fn default() -> Self {
        Self {
            sample_size: 5,
            max_workers: 1,
            max_workers_ceiling: 32,
            seed: None,
            print_summary: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub out_dir: String,
    pub scripts_dir: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            out_dir: "markdown_output".into(),
            scripts_dir: "scripts".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Discovery {
    pub extension: String,
    pub case_insensitive: bool,
}
impl Default for Discovery {
    fn default() -> Self {
        Self {
            extension: "pdf".into(),
            case_insensitive: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Converter {
    pub python_exe: String,
    pub timeout_seconds: u64,
    pub ignore_images: bool,
    /// Empty disables table detection.
    pub table_strategy: String,
    pub keep_python_stderr: bool,
    pub env: BTreeMap<String, String>,
}
impl Default for Converter {
    fn default() -> Self {
        Self {
            python_exe: "auto".into(),
            timeout_seconds: 600,
            ignore_images: true,
            table_strategy: "".into(),
            keep_python_stderr: false,
            env: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Postprocess {
    pub normalize_newlines: bool,
    pub normalize_unicode: bool,
    pub trim_trailing_whitespace: bool,
    pub control_chars_to_sanitize: Vec<u8>,
    pub remove_by_regex: bool,
    pub regex: PostprocessRegex,
}
impl Default for Postprocess {
    fn default() -> Self {
        Self {
            normalize_newlines: true,
            normalize_unicode: false,
            trim_trailing_whitespace: false,
            control_chars_to_sanitize: Vec::new(),
            remove_by_regex: false,
            regex: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostprocessRegex {
    pub patterns: Vec<String>,
}
impl Default for PostprocessRegex {
    fn default() -> Self {
        Self {
            patterns: vec!["(?i)^(page\\s+\\d+|\\d+\\s*/\\s*\\d+)$".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Output {
    pub combined_filename: String,
    pub training_filename: String,
    pub results_filename: String,
    pub write_index: bool,
    pub index_filename: String,
    pub dump_effective_config: bool,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            combined_filename: "all_documents.md".into(),
            training_filename: "features.json".into(),
            results_filename: "processing_results.json".into(),
            write_index: false,
            index_filename: "index.md".into(),
            dump_effective_config: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Training {
    pub system_prompt: String,
    pub query: String,
}
impl Default for Training {
    fn default() -> Self {
        Self {
            system_prompt: "You are a helpful assistant that can answer questions about IT \
                            support based on the documents provided in markdown."
                .into(),
            query: "How do I clear paper jams in the copier?".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Security {
    pub pin_scripts_dir: bool,
}
impl Default for Security {
    fn default() -> Self {
        Self {
            pin_scripts_dir: false,
        }
    }
}
