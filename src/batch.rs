//! Batch pipeline: upload → gate → convert → gate → bundle.
//!
//! ## Order of checks
//!
//! The cheap gate runs first. File count and size are known from the upload,
//! so an over-limit batch is priced before a single converter process is
//! started. Page counts only exist after conversion, so the page gate runs
//! second, and only when every file converted: a batch with failures is
//! reported as failures, never as payable.
//!
//! ## Scratch area
//!
//! Each [`BatchPipeline::run`] owns one [`TempDir`] for the converter's
//! staging files. It is removed when `run` returns, when a stage panics, and
//! when the caller drops the future mid-batch.

use crate::config::PipelineConfig;
use crate::error::{Doc2PdfError, ItemError, Stage};
use crate::gate::{evaluate_post_check, evaluate_pre_check};
use crate::order::{OrderService, PaymentProof};
use crate::output::{
    Bundle, BundleEntry, ConversionResult, ItemFailure, PaymentRequired, PipelineOutcome,
};
use crate::pipeline::input::InputDescriptor;
use crate::pipeline::lock::is_locked;
use crate::pipeline::package::{entry_names, pack};
use crate::pipeline::pages::PageCounter;
use crate::pipeline::render::{check_pdf_output, FormatConverter};
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Prefix of every per-request scratch directory.
pub const SCRATCH_PREFIX: &str = "doc2pdf_";

/// The gated conversion pipeline. Immutable; share it behind an `Arc`.
#[derive(Clone)]
pub struct BatchPipeline {
    config: PipelineConfig,
    converter: Arc<dyn FormatConverter>,
    counter: Arc<dyn PageCounter>,
    orders: Option<Arc<dyn OrderService>>,
}

impl fmt::Debug for BatchPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchPipeline")
            .field("config", &self.config)
            .field("converter", &"<dyn FormatConverter>")
            .field("counter", &"<dyn PageCounter>")
            .field("orders", &self.orders.as_ref().map(|_| "<dyn OrderService>"))
            .finish()
    }
}

impl BatchPipeline {
    /// Pipeline with the paid flow disabled.
    pub fn new(
        config: PipelineConfig,
        converter: Arc<dyn FormatConverter>,
        counter: Arc<dyn PageCounter>,
    ) -> Self {
        Self {
            config,
            converter,
            counter,
            orders: None,
        }
    }

    /// Enable the paid flow.
    pub fn with_order_service(mut self, orders: Arc<dyn OrderService>) -> Self {
        self.orders = Some(orders);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn payments_enabled(&self) -> bool {
        self.orders.is_some()
    }

    /// Run one batch to its outcome.
    ///
    /// # Errors
    /// - [`Doc2PdfError::NoInput`] when `descriptors` is empty
    /// - [`Doc2PdfError::OrderServiceUnavailable`] when a gate closes, no proof
    ///   was given and no order could be created
    /// - [`Doc2PdfError::Packaging`] / [`Doc2PdfError::Internal`] for
    ///   failures of the scratch area or archive
    pub async fn run(
        &self,
        descriptors: Vec<InputDescriptor>,
        proof: Option<&PaymentProof>,
    ) -> Result<PipelineOutcome, Doc2PdfError> {
        let total_start = Instant::now();

        // ── Step 1: Reject empty batches ─────────────────────────────────────
        if descriptors.is_empty() {
            return Err(Doc2PdfError::NoInput);
        }
        info!(
            "Starting batch: {} files, {} bytes, proof={}",
            descriptors.len(),
            descriptors.iter().map(|d| d.size_bytes()).sum::<u64>(),
            proof.is_some()
        );

        // ── Step 2: Pre-check (count, size) ──────────────────────────────────
        let pre = evaluate_pre_check(&descriptors, &self.config.limits);
        if !pre.allowed {
            match proof {
                None => return self.payment_required(pre.reason).await,
                Some(p) => info!("Pre-check bypassed by payment {}", p.payment_id),
            }
        }

        // ── Step 3: Convert every item ───────────────────────────────────────
        let scratch = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir()
            .map_err(|e| Doc2PdfError::Internal(format!("scratch directory: {e}")))?;

        let results = self.convert_all(&descriptors, &scratch).await;

        // ── Step 4: All-or-nothing on failures ───────────────────────────────
        if !results.iter().all(ConversionResult::is_success) {
            let failures: Vec<ItemFailure> = results
                .iter()
                .filter_map(|r| match r {
                    ConversionResult::Failure { name, error } => Some(ItemFailure {
                        name: name.clone(),
                        message: error.to_string(),
                    }),
                    ConversionResult::Success { .. } => None,
                })
                .collect();
            warn!("{}/{} files failed; nothing packaged", failures.len(), results.len());
            return Ok(PipelineOutcome::ConversionErrors(failures));
        }

        // ── Step 5: Post-check (pages) ───────────────────────────────────────
        let post = evaluate_post_check(&results, &self.config.limits);
        if !post.allowed {
            match proof {
                None => return self.payment_required(post.reason).await,
                Some(p) => info!("Page check bypassed by payment {}", p.payment_id),
            }
        }

        // ── Step 6: Package ──────────────────────────────────────────────────
        let bundle = build_bundle(results)?;
        drop(scratch);

        info!(
            "Batch complete: {} files, {} pages, {} byte archive, {}ms",
            bundle.entries.len(),
            bundle.total_pages(),
            bundle.archive.len(),
            total_start.elapsed().as_millis()
        );
        Ok(PipelineOutcome::Ready(bundle))
    }

    /// Convert items one at a time, in input order. Never short-circuits.
    async fn convert_all(
        &self,
        descriptors: &[InputDescriptor],
        scratch: &TempDir,
    ) -> Vec<ConversionResult> {
        let mut results = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let start = Instant::now();
            let result = match self.convert_one(descriptor, scratch.path()).await {
                Ok((output_bytes, page_count)) => {
                    debug!(
                        "{}: {} pages, {} bytes in {}ms",
                        descriptor.name(),
                        page_count,
                        output_bytes.len(),
                        start.elapsed().as_millis()
                    );
                    ConversionResult::Success {
                        name: descriptor.name().to_string(),
                        output_bytes,
                        page_count,
                    }
                }
                Err(error) => {
                    warn!("{}: {}", descriptor.name(), error);
                    ConversionResult::Failure {
                        name: descriptor.name().to_string(),
                        error,
                    }
                }
            };
            results.push(result);
        }
        results
    }

    async fn convert_one(
        &self,
        descriptor: &InputDescriptor,
        scratch: &Path,
    ) -> Result<(Vec<u8>, usize), ItemError> {
        if is_locked(descriptor.raw_bytes()) {
            return Err(ItemError::Locked);
        }

        let output = self
            .bounded(Stage::Conversion, self.converter.convert(descriptor, scratch))
            .await?;
        check_pdf_output(&output)?;

        let pages = self
            .bounded(Stage::PageCount, self.counter.count_pages(&output))
            .await?;
        Ok((output, pages))
    }

    /// Apply the per-call time budget to one external call.
    async fn bounded<T>(
        &self,
        stage: Stage,
        call: impl Future<Output = Result<T, ItemError>>,
    ) -> Result<T, ItemError> {
        let secs = self.config.conversion_timeout_secs;
        tokio::time::timeout(Duration::from_secs(secs), call)
            .await
            .map_err(|_| ItemError::Timeout { stage, secs })?
    }

    async fn payment_required(
        &self,
        reason: Option<String>,
    ) -> Result<PipelineOutcome, Doc2PdfError> {
        let reason = reason.unwrap_or_else(|| "free tier limit exceeded".to_string());
        let orders = self
            .orders
            .as_ref()
            .ok_or_else(|| Doc2PdfError::OrderServiceUnavailable {
                reason: format!("payment required ({reason}) but payments are not configured"),
            })?;

        let order = orders
            .create_order(self.config.unit_price_minor_units, &self.config.currency)
            .await?;
        info!("Payment required: {} (order {})", reason, order.order_id);

        Ok(PipelineOutcome::PaymentRequired(PaymentRequired {
            order_id: order.order_id,
            amount: order.amount,
            currency: order.currency,
            reason,
        }))
    }
}

/// Turn an all-success result list into a packaged bundle.
fn build_bundle(results: Vec<ConversionResult>) -> Result<Bundle, Doc2PdfError> {
    let names = entry_names(results.iter().map(ConversionResult::name));
    let entries = results
        .into_iter()
        .zip(names)
        .map(|(result, name)| match result {
            ConversionResult::Success {
                output_bytes,
                page_count,
                ..
            } => Ok(BundleEntry {
                name,
                bytes: output_bytes,
                page_count,
            }),
            ConversionResult::Failure { name, .. } => Err(Doc2PdfError::Packaging {
                detail: format!("'{name}' failed and cannot be packaged"),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let archive = pack(&entries)?;
    Ok(Bundle { entries, archive })
}
