//! Result types produced by the batch pipeline.

use crate::error::ItemError;
use serde::{Deserialize, Serialize};

/// Outcome of converting one uploaded file. One per input, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionResult {
    Success {
        name: String,
        output_bytes: Vec<u8>,
        page_count: usize,
    },
    Failure {
        name: String,
        error: ItemError,
    },
}

impl ConversionResult {
    pub fn name(&self) -> &str {
        match self {
            ConversionResult::Success { name, .. } | ConversionResult::Failure { name, .. } => name,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ConversionResult::Success { .. })
    }
}

/// User-visible description of one failed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub name: String,
    pub message: String,
}

/// Everything the caller needs to run an external payment and resubmit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequired {
    pub order_id: String,
    /// Amount in the currency's minor unit.
    pub amount: u64,
    pub currency: String,
    /// Which free-tier limit the batch exceeded.
    pub reason: String,
}

/// One file inside the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleEntry {
    /// Archive entry name (`report.pdf`).
    pub name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// The packaged result of a successful batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    /// Entries in input order.
    pub entries: Vec<BundleEntry>,
    /// The zip archive holding every entry.
    pub archive: Vec<u8>,
}

impl Bundle {
    /// Download name of the archive.
    pub const FILE_NAME: &'static str = "converted_pdfs.zip";

    pub fn total_pages(&self) -> usize {
        self.entries.iter().map(|e| e.page_count).sum()
    }
}

/// Final outcome of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// A free-tier limit was exceeded and no payment proof was supplied.
    PaymentRequired(PaymentRequired),
    /// At least one file failed; nothing was packaged.
    ConversionErrors(Vec<ItemFailure>),
    /// Every file converted; the bundle is ready for download.
    Ready(Bundle),
}
