//! Page counting of rendered PDFs via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and parses synchronously. `tokio::task::spawn_blocking` moves the
//! work onto the blocking pool so request handlers on the Tokio workers never
//! stall behind a large document.

use crate::error::{Doc2PdfError, ItemError};
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Counts the pages of a rendered output document.
#[async_trait]
pub trait PageCounter: Send + Sync {
    async fn count_pages(&self, pdf: &[u8]) -> Result<usize, ItemError>;
}

/// pdfium-backed page counter.
///
/// Binds to `library_path` when given (a full path to `libpdfium.so`,
/// `libpdfium.dylib` or `pdfium.dll`), otherwise to the system library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumPageCounter {
    library_path: Option<PathBuf>,
}

impl PdfiumPageCounter {
    pub fn new(library_path: Option<PathBuf>) -> Self {
        Self { library_path }
    }

    /// Bind once to verify the library is loadable. Call at startup so a
    /// missing pdfium fails the process instead of every request.
    pub async fn probe(&self) -> Result<(), Doc2PdfError> {
        let path = self.library_path.clone();
        tokio::task::spawn_blocking(move || bind_pdfium(path.as_deref()).map(|_| ()))
            .await
            .map_err(|e| Doc2PdfError::Internal(format!("pdfium probe task panicked: {e}")))?
            .map_err(|detail| {
                Doc2PdfError::InvalidConfig(format!(
                    "Failed to bind to pdfium library: {detail}\n\
                     Set PDFIUM_LIB_PATH=/path/to/libpdfium to use a specific copy."
                ))
            })
    }
}

#[async_trait]
impl PageCounter for PdfiumPageCounter {
    async fn count_pages(&self, pdf: &[u8]) -> Result<usize, ItemError> {
        let bytes = pdf.to_vec();
        let path = self.library_path.clone();

        tokio::task::spawn_blocking(move || count_pages_blocking(path.as_deref(), &bytes))
            .await
            .map_err(|e| ItemError::PageCount {
                detail: format!("page-count task panicked: {e}"),
            })?
    }
}

fn bind_pdfium(library_path: Option<&Path>) -> Result<Pdfium, String> {
    let bindings = match library_path {
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| format!("{e:?}"))?;
    Ok(Pdfium::new(bindings))
}

/// Blocking implementation of page counting.
fn count_pages_blocking(library_path: Option<&Path>, pdf: &[u8]) -> Result<usize, ItemError> {
    let pdfium = bind_pdfium(library_path).map_err(|detail| ItemError::PageCount {
        detail: format!("pdfium unavailable: {detail}"),
    })?;

    let document = pdfium
        .load_pdf_from_byte_slice(pdf, None)
        .map_err(|e| ItemError::PageCount {
            detail: format!("{e:?}"),
        })?;

    let pages = document.pages().len() as usize;
    debug!("Counted {} pages in {} bytes of PDF", pages, pdf.len());

    if pages == 0 {
        return Err(ItemError::PageCount {
            detail: "converted PDF has no pages".into(),
        });
    }
    Ok(pages)
}
