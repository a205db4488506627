//! Free-tier gate: pure pass/fail decisions.
//!
//! The pipeline consults the gate twice. The pre-check runs on the upload
//! alone (file count, per-file size) so an oversized batch is priced before
//! any conversion work happens. The post-check runs on rendered outputs
//! because page counts are only known after conversion.
//!
//! Both checks are pure functions of their inputs and the limits. Payment
//! proof is not an input; the pipeline decides what a failed gate means.

use crate::config::FreeTierLimits;
use crate::output::ConversionResult;
use crate::pipeline::input::InputDescriptor;
use serde::{Deserialize, Serialize};

/// Result of one gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateDecision {
    pub allowed: bool,
    /// Why the gate closed; `None` when allowed.
    pub reason: Option<String>,
}

impl GateDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Count and size check over the raw upload.
///
/// Count is checked first; otherwise the first file (in upload order) over the
/// size limit is reported.
pub fn evaluate_pre_check(descriptors: &[InputDescriptor], limits: &FreeTierLimits) -> GateDecision {
    if descriptors.len() > limits.max_files {
        return GateDecision::deny(format!(
            "{} files uploaded; the free tier allows up to {}",
            descriptors.len(),
            limits.max_files
        ));
    }

    if let Some(big) = descriptors
        .iter()
        .find(|d| d.size_bytes() > limits.max_file_size_bytes)
    {
        return GateDecision::deny(format!(
            "{} is larger than the free limit of {} MB",
            big.name(),
            limits.max_file_size_mb()
        ));
    }

    GateDecision::allow()
}

/// Page check over the rendered outputs.
///
/// Closes when any single output exceeds the page limit; pages are not summed
/// across files. Failures carry no page count and are ignored.
pub fn evaluate_post_check(results: &[ConversionResult], limits: &FreeTierLimits) -> GateDecision {
    let over = results.iter().find_map(|r| match r {
        ConversionResult::Success {
            name, page_count, ..
        } if *page_count > limits.max_pages => Some((name, *page_count)),
        _ => None,
    });

    match over {
        Some((name, pages)) => GateDecision::deny(format!(
            "{name} has {pages} pages; the free tier allows up to {} per file",
            limits.max_pages
        )),
        None => GateDecision::allow(),
    }
}
