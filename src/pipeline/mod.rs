//! Per-item stages of the conversion pipeline.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the external tools behind [`render`] and [`pages`] can be swapped
//! for fakes.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ lock ──▶ render ──▶ pages ──▶ package
//! (upload)  (sniff)  (soffice)  (pdfium)   (zip)
//! ```
//!
//! 1. [`input`]   — name sanitisation and the in-memory upload descriptor
//! 2. [`lock`]    — detect password-protected / rights-managed documents
//!    before any process is spawned
//! 3. [`render`]  — headless office conversion to PDF in a scratch directory
//! 4. [`pages`]   — count pages of the rendered PDF; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 5. [`package`] — deterministic zip of the successful outputs

pub mod input;
pub mod lock;
pub mod package;
pub mod pages;
pub mod render;
