use anyhow::{Context, Result};
use std::path::Path;
use time::format_description::well_known::Rfc3339;

pub fn ensure_dir(p: &Path) -> Result<()> {
    std::fs::create_dir_all(p).with_context(|| format!("create_dir_all {}", p.display()))
}

pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}

/// File stem with spaces replaced by underscores, plus `.md`.
pub fn markdown_file_name(original_name: &str) -> String {
    let stem = Path::new(original_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| original_name.to_string());
    format!("{}.md", stem.replace(' ', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_name_strips_extension_and_spaces() {
        assert_eq!(markdown_file_name("Copier Manual v2.pdf"), "Copier_Manual_v2.md");
        assert_eq!(markdown_file_name("a.pdf"), "a.md");
        assert_eq!(markdown_file_name("archive.tar.pdf"), "archive.tar.md");
    }
}
