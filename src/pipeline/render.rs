//! Format conversion: one `.docx` in, one PDF out.
//!
//! [`FormatConverter`] is the seam; [`SofficeConverter`] is the production
//! implementation, driving LibreOffice headless as a subprocess.
//!
//! ## Why a private profile per call?
//!
//! LibreOffice keeps a user profile and refuses to start a second instance
//! against a profile that is already in use. Requests run concurrently, so
//! every call points `-env:UserInstallation` at its own directory inside the
//! request's scratch area. The profile disappears together with the scratch
//! area.
//!
//! ## Cancellation
//!
//! The child is spawned with `kill_on_drop(true)`: when the pipeline's
//! per-call timeout fires, or the whole request future is dropped because the
//! client went away, the converter process is killed rather than left running.

use crate::error::ItemError;
use crate::pipeline::input::{output_name, InputDescriptor, OUTPUT_EXTENSION};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Magic bytes every PDF starts with.
pub const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Renders a source document into PDF bytes.
///
/// `scratch` is a directory owned by the current pipeline invocation; the
/// implementation may create files in it and need not clean them up.
#[async_trait]
pub trait FormatConverter: Send + Sync {
    async fn convert(&self, source: &InputDescriptor, scratch: &Path) -> Result<Vec<u8>, ItemError>;
}

/// LibreOffice headless converter (`soffice --convert-to pdf`).
#[derive(Debug, Clone)]
pub struct SofficeConverter {
    program: PathBuf,
}

impl Default for SofficeConverter {
    fn default() -> Self {
        Self::new("soffice")
    }
}

impl SofficeConverter {
    /// Use the given `soffice` executable (bare name or absolute path).
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait]
impl FormatConverter for SofficeConverter {
    async fn convert(&self, source: &InputDescriptor, scratch: &Path) -> Result<Vec<u8>, ItemError> {
        let work = tempfile::Builder::new()
            .prefix("item_")
            .tempdir_in(scratch)
            .map_err(|e| converter_error(format!("could not create work directory: {e}")))?;

        // Upload names are client-chosen; keep them out of the directory that
        // holds the fixed `out` and `profile` entries.
        let in_dir = work.path().join("in");
        let out_dir = work.path().join("out");
        let profile_dir = work.path().join("profile");
        let input_path = in_dir.join(source.name());

        for dir in [&in_dir, &out_dir] {
            tokio::fs::create_dir(dir).await.map_err(|e| {
                converter_error(format!("could not create {}: {e}", dir.display()))
            })?;
        }
        tokio::fs::write(&input_path, source.raw_bytes())
            .await
            .map_err(|e| converter_error(format!("could not stage upload: {e}")))?;

        debug!(
            "Converting {} ({} bytes) with {}",
            source.name(),
            source.size_bytes(),
            self.program.display()
        );

        let output = Command::new(&self.program)
            .arg("--headless")
            .arg("--norestore")
            .arg("--nolockcheck")
            .arg(format!("-env:UserInstallation={}", file_url(&profile_dir)))
            .arg("--convert-to")
            .arg(OUTPUT_EXTENSION)
            .arg("--outdir")
            .arg(&out_dir)
            .arg(&input_path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    converter_error(format!(
                        "converter '{}' is not installed",
                        self.program.display()
                    ))
                } else {
                    converter_error(format!("could not start converter: {e}"))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("{}: converter exited with {}", source.name(), output.status);
            return Err(converter_error(format!(
                "converter exited with {}: {}",
                output.status,
                last_line(&stderr)
            )));
        }

        // soffice exits 0 even when it silently skips an unreadable input;
        // the missing output file is the only signal.
        let pdf_path = out_dir.join(output_name(source.name()));
        match tokio::fs::read(&pdf_path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(converter_error(
                "no PDF was produced; the file may be damaged or not a Word document".into(),
            )),
            Err(e) => Err(converter_error(format!("could not read converted PDF: {e}"))),
        }
    }
}

/// Reject converter output that cannot be a PDF.
pub fn check_pdf_output(bytes: &[u8]) -> Result<(), ItemError> {
    if bytes.is_empty() {
        return Err(converter_error("converter produced an empty file".into()));
    }
    if !bytes.starts_with(PDF_MAGIC) {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(converter_error(format!(
            "converter output is not a PDF (first bytes: {magic:?})"
        )));
    }
    Ok(())
}

fn converter_error(detail: String) -> ItemError {
    ItemError::Converter { detail }
}

fn file_url(path: &Path) -> String {
    let s = path.to_string_lossy().replace('\\', "/");
    if s.starts_with('/') {
        format!("file://{s}")
    } else {
        format!("file:///{s}")
    }
}

fn last_line(s: &str) -> &str {
    s.lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("no diagnostic output")
}
