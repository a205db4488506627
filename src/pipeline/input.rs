//! Input descriptors: one uploaded part, named and measured.
//!
//! Upload names come straight from the client and may carry directory
//! components, spaces or shell metacharacters. They are sanitised once, here,
//! so every later stage (scratch files, error payloads, archive entries) can
//! use the name verbatim.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Name used when an upload carries no usable file name.
pub const FALLBACK_NAME: &str = "input.docx";

/// Extension of every rendered output.
pub const OUTPUT_EXTENSION: &str = "pdf";

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("valid regex"));

/// One uploaded document. Immutable once read.
#[derive(Clone, PartialEq, Eq)]
pub struct InputDescriptor {
    name: String,
    raw_bytes: Vec<u8>,
}

impl InputDescriptor {
    /// Build a descriptor from an uploaded part, sanitising its name.
    pub fn new(upload_name: Option<&str>, raw_bytes: Vec<u8>) -> Self {
        Self {
            name: sanitize_file_name(upload_name.unwrap_or_default()),
            raw_bytes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw_bytes
    }

    pub fn size_bytes(&self) -> u64 {
        self.raw_bytes.len() as u64
    }
}

impl std::fmt::Debug for InputDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputDescriptor")
            .field("name", &self.name)
            .field("size_bytes", &self.size_bytes())
            .finish()
    }
}

/// Reduce a client-supplied file name to a safe, flat ASCII name.
///
/// Directory components are dropped, whitespace runs become `_`, anything
/// outside `[A-Za-z0-9_.-]` is removed and leading/trailing `.`/`_` are
/// trimmed. An empty result falls back to [`FALLBACK_NAME`].
pub fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default();
    let joined = WHITESPACE.replace_all(base.trim(), "_");
    let cleaned = DISALLOWED.replace_all(&joined, "");
    let trimmed = cleaned.trim_matches(|c: char| c == '.' || c == '_');
    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Archive entry name for a converted file: the source extension replaced by
/// `.pdf` (`report.docx` → `report.pdf`, `notes` → `notes.pdf`).
pub fn output_name(source_name: &str) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(source_name);
    format!("{stem}.{OUTPUT_EXTENSION}")
}
