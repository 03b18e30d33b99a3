use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocDiag {
    pub python_exe: String,
    pub python_version: String,
    pub pymupdf4llm_version: Option<String>,
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertOptions {
    pub ignore_images: bool,
    pub page_chunks: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_strategy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertIn {
    pub input_pdf: String,
    pub options: ConvertOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertOut {
    pub ok: bool,
    #[serde(default)]
    pub markdown: String,
    #[serde(default)]
    pub error: Option<String>,
}
