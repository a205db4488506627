//! Error types for the doc2pdf-gate library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Doc2PdfError`] — **Fatal**: the request cannot complete at all
//!   (nothing uploaded, order service down, archive could not be written).
//!   Returned as `Err(Doc2PdfError)` from [`crate::BatchPipeline::run`].
//!
//! * [`ItemError`] — **Non-fatal**: a single uploaded file failed (locked
//!   document, converter crash, unreadable output) but its siblings are still
//!   attempted. Stored inside [`crate::ConversionResult::Failure`] and
//!   surfaced to the caller together with every other failure of the batch.
//!
//! A gate violation is neither: it is the normal
//! [`crate::PipelineOutcome::PaymentRequired`] outcome.

use thiserror::Error;

/// All fatal errors returned by the doc2pdf-gate library.
///
/// Per-file failures use [`ItemError`] and never escalate into this type.
#[derive(Debug, Error)]
pub enum Doc2PdfError {
    // ── Client errors ─────────────────────────────────────────────────────
    /// The request carried no documents; no gating was evaluated.
    #[error("No documents uploaded. Attach at least one .docx file.")]
    NoInput,

    // ── Service errors ────────────────────────────────────────────────────
    /// Payment is required but no order could be created.
    ///
    /// Covers the disabled state (credentials not configured), network
    /// failures, timeouts and malformed provider responses. Never retried.
    #[error("Order service unavailable: {reason}")]
    OrderServiceUnavailable { reason: String },

    /// The archive could not be finalised.
    #[error("Failed to package converted documents: {detail}")]
    Packaging { detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (scratch directory, task join, …).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Pipeline stage that ran out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Conversion,
    PageCount,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Conversion => f.write_str("conversion"),
            Stage::PageCount => f.write_str("page counting"),
        }
    }
}

/// A non-fatal error for a single uploaded file.
///
/// The file name is carried by the surrounding
/// [`crate::ConversionResult::Failure`], not repeated here.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ItemError {
    /// The lock detector found an encryption/protection marker.
    #[error("document appears to be password-protected or encrypted; unlock it and upload again")]
    Locked,

    /// The format converter failed or produced unusable output.
    #[error("conversion failed: {detail}")]
    Converter { detail: String },

    /// The rendered output could not be opened to count its pages.
    #[error("could not count pages of the converted PDF: {detail}")]
    PageCount { detail: String },

    /// A converter or page-counter call exceeded its time budget.
    #[error("{stage} timed out after {secs}s")]
    Timeout { stage: Stage, secs: u64 },
}
