use crate::config::Config;
use anyhow::{Context, Result};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Markdown cleanup applied to each converted document before it is written.
/// Patterns are compiled once per batch so a bad pattern fails at startup.
#[derive(Debug, Clone)]
pub struct Cleaner {
    normalize_newlines: bool,
    normalize_unicode: bool,
    trim_trailing_whitespace: bool,
    control_mask: [bool; 128],
    patterns: Vec<Regex>,
}

impl Cleaner {
    pub fn new(cfg: &Config) -> Result<Self> {
        let pp = &cfg.postprocess;

        let mut control_mask = [false; 128];
        for &code in &pp.control_chars_to_sanitize {
            if (code as usize) < control_mask.len() {
                control_mask[code as usize] = true;
            }
        }

        let patterns = if pp.remove_by_regex {
            pp.regex
                .patterns
                .iter()
                .map(|p| Regex::new(p).with_context(|| format!("invalid postprocess regex: {p}")))
                .collect::<Result<Vec<_>>>()?
        } else {
            Vec::new()
        };

        Ok(Self {
            normalize_newlines: pp.normalize_newlines,
            normalize_unicode: pp.normalize_unicode,
            trim_trailing_whitespace: pp.trim_trailing_whitespace,
            control_mask,
            patterns,
        })
    }

    /// A cleaner that leaves content untouched.
    pub fn passthrough() -> Self {
        Self {
            normalize_newlines: false,
            normalize_unicode: false,
            trim_trailing_whitespace: false,
            control_mask: [false; 128],
            patterns: Vec::new(),
        }
    }

    pub fn clean(&self, md: &str) -> String {
        let mut out = md.to_string();

        if self.normalize_newlines {
            out = out.replace("\r\n", "\n");
        }

        if self.normalize_unicode {
            out = out.nfkc().collect::<String>();
        }

        out = self.sanitize_control_chars(&out);

        if self.trim_trailing_whitespace {
            out = out
                .lines()
                .map(str::trim_end)
                .collect::<Vec<_>>()
                .join("\n");
        }

        if !self.patterns.is_empty() {
            out = out
                .lines()
                .filter(|line| !self.patterns.iter().any(|r| r.is_match(line.trim())))
                .collect::<Vec<_>>()
                .join("\n");
        }

        out
    }

    fn sanitize_control_chars(&self, s: &str) -> String {
        if !self.control_mask.iter().any(|&m| m) {
            return s.to_string();
        }
        s.chars()
            .filter(|&ch| {
                // Structural whitespace always survives.
                if ch == '\n' || ch == '\r' || ch == '\t' {
                    return true;
                }
                let cp = ch as u32;
                cp >= 128 || !self.control_mask[cp as usize]
            })
            .collect()
    }
}
