//! Fakes shared by the integration tests.
//!
//! Documents are plain text. The fake converter turns `body` into
//! `%PDF-fake:body`; the fake page counter reads a `pages=N` marker from the
//! rendered bytes (1 page when absent).

#![allow(dead_code)]

use async_trait::async_trait;
use doc2pdf_gate::{
    BatchPipeline, Doc2PdfError, FormatConverter, InputDescriptor, ItemError, Order, OrderService,
    PageCounter, PipelineConfig,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Converter that never spawns a process. Inputs containing `corrupt` fail,
/// inputs containing `hang` sleep for an hour.
#[derive(Debug, Default)]
pub struct FakeConverter {
    pub calls: AtomicUsize,
    pub scratch_dirs: Mutex<Vec<PathBuf>>,
}

impl FakeConverter {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Scratch directories seen so far, one per converted item.
    pub fn scratch_dirs(&self) -> Vec<PathBuf> {
        self.scratch_dirs.lock().unwrap().clone()
    }
}

#[async_trait]
impl FormatConverter for FakeConverter {
    async fn convert(&self, source: &InputDescriptor, scratch: &Path) -> Result<Vec<u8>, ItemError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(scratch.is_dir(), "scratch directory must exist during conversion");
        self.scratch_dirs.lock().unwrap().push(scratch.to_path_buf());

        let body = source.raw_bytes();
        if contains(body, b"corrupt") {
            return Err(ItemError::Converter {
                detail: "source document is damaged".into(),
            });
        }
        if contains(body, b"hang") {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if contains(body, b"empty-output") {
            return Ok(Vec::new());
        }

        let mut pdf = b"%PDF-fake:".to_vec();
        pdf.extend_from_slice(body);
        Ok(pdf)
    }
}

/// Page counter reading `pages=N` from the rendered bytes.
#[derive(Debug, Default)]
pub struct FakePageCounter;

#[async_trait]
impl PageCounter for FakePageCounter {
    async fn count_pages(&self, pdf: &[u8]) -> Result<usize, ItemError> {
        let text = String::from_utf8_lossy(pdf);
        let Some(at) = text.find("pages=") else {
            return Ok(1);
        };
        let digits: String = text[at + "pages=".len()..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse::<usize>().map_err(|e| ItemError::PageCount {
            detail: e.to_string(),
        })
    }
}

/// Order service handing out `order_1`, `order_2`, …
#[derive(Debug, Default)]
pub struct FakeOrderService {
    pub created: AtomicUsize,
}

impl FakeOrderService {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderService for FakeOrderService {
    async fn create_order(&self, amount_minor_units: u64, currency: &str) -> Result<Order, Doc2PdfError> {
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Order {
            order_id: format!("order_{n}"),
            amount: amount_minor_units,
            currency: currency.to_string(),
        })
    }
}

/// Order service whose provider is always down.
#[derive(Debug, Default)]
pub struct DownOrderService;

#[async_trait]
impl OrderService for DownOrderService {
    async fn create_order(&self, _amount: u64, _currency: &str) -> Result<Order, Doc2PdfError> {
        Err(Doc2PdfError::OrderServiceUnavailable {
            reason: "provider unreachable".into(),
        })
    }
}

/// Everything a test may want to inspect after a run.
pub struct Harness {
    pub pipeline: BatchPipeline,
    pub converter: Arc<FakeConverter>,
    pub orders: Arc<FakeOrderService>,
}

/// Pipeline with default limits (2 files, 10 MB, 25 pages), price 1000 INR.
pub fn harness() -> Harness {
    harness_with(PipelineConfig::default())
}

pub fn harness_with(config: PipelineConfig) -> Harness {
    let converter = Arc::new(FakeConverter::default());
    let orders = Arc::new(FakeOrderService::default());
    let pipeline = BatchPipeline::new(config, converter.clone(), Arc::new(FakePageCounter))
        .with_order_service(orders.clone());
    Harness {
        pipeline,
        converter,
        orders,
    }
}

pub fn doc(name: &str, body: &str) -> InputDescriptor {
    InputDescriptor::new(Some(name), body.as_bytes().to_vec())
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
