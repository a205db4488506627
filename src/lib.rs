//! # doc2pdf-gate
//!
//! Convert batches of word-processing documents to PDF behind a free-tier
//! gate, and hand back one zip archive.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (N documents [+ payment proof])
//!  │
//!  ├─ 1. Pre-check  file count / per-file size vs. free tier
//!  ├─ 2. Convert    lock sniff → soffice → PDF sanity → page count
//!  ├─ 3. Errors     any failure → per-item report, nothing packaged
//!  ├─ 4. Post-check largest page count vs. free tier
//!  └─ 5. Package    deterministic zip of every PDF, in upload order
//! ```
//!
//! A closed gate without payment proof yields a payable order instead of
//! output; with proof, both gates are bypassed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use doc2pdf_gate::{
//!     BatchPipeline, InputDescriptor, PdfiumPageCounter, PipelineConfig,
//!     PipelineOutcome, SofficeConverter,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = BatchPipeline::new(
//!         PipelineConfig::default(),
//!         Arc::new(SofficeConverter::default()),
//!         Arc::new(PdfiumPageCounter::default()),
//!     );
//!     let doc = InputDescriptor::new(Some("letter.docx"), std::fs::read("letter.docx")?);
//!     if let PipelineOutcome::Ready(bundle) = pipeline.run(vec![doc], None).await? {
//!         std::fs::write("converted_pdfs.zip", bundle.archive)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | HTTP transport and the `doc2pdf` binary (axum + clap + tracing-subscriber) |
//!
//! Disable `server` when embedding only the pipeline:
//! ```toml
//! doc2pdf-gate = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod error;
pub mod gate;
pub mod order;
pub mod output;
pub mod pipeline;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::BatchPipeline;
pub use config::{
    FreeTierLimits, OrderCredentials, OrderServiceConfig, PipelineConfig, PipelineConfigBuilder,
};
pub use error::{Doc2PdfError, ItemError, Stage};
pub use gate::{evaluate_post_check, evaluate_pre_check, GateDecision};
pub use order::{HttpOrderService, Order, OrderService, PaymentProof};
pub use output::{
    Bundle, BundleEntry, ConversionResult, ItemFailure, PaymentRequired, PipelineOutcome,
};
pub use pipeline::input::InputDescriptor;
pub use pipeline::lock::is_locked;
pub use pipeline::package::pack;
pub use pipeline::pages::{PageCounter, PdfiumPageCounter};
pub use pipeline::render::{FormatConverter, SofficeConverter};
