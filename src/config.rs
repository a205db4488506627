//! Configuration types for the gated conversion pipeline.
//!
//! Every pipeline knob lives in [`PipelineConfig`], built via its
//! [`PipelineConfigBuilder`]. The order-service client has its own
//! [`OrderServiceConfig`] because it is optional: without credentials the
//! paid flow is disabled and the pipeline runs with no order service at all.

use crate::error::Doc2PdfError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Free-tier allowance. A batch inside all three limits needs no payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeTierLimits {
    /// Maximum number of files in one free batch. Default: 2.
    pub max_files: usize,

    /// Maximum size of any single uploaded file, in bytes. Default: 10 MiB.
    pub max_file_size_bytes: u64,

    /// Maximum page count of any single rendered PDF. Default: 25.
    ///
    /// Checked per file against the largest output, not against the sum.
    pub max_pages: usize,
}

impl Default for FreeTierLimits {
    fn default() -> Self {
        Self {
            max_files: 2,
            max_file_size_bytes: 10 * 1024 * 1024,
            max_pages: 25,
        }
    }
}

impl FreeTierLimits {
    /// Per-file size limit in whole MiB, for user-facing messages.
    pub fn max_file_size_mb(&self) -> u64 {
        self.max_file_size_bytes / (1024 * 1024)
    }
}

/// Configuration for a [`crate::BatchPipeline`].
///
/// # Example
/// ```rust
/// use doc2pdf_gate::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .brand_name("Corner Print Shop")
///     .max_free_files(3)
///     .max_free_pages(40)
///     .unit_price_minor_units(1500)
///     .build()
///     .unwrap();
/// assert_eq!(config.limits.max_files, 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Display label shown by the service-info endpoint.
    pub brand_name: String,

    /// Free-tier allowance.
    pub limits: FreeTierLimits,

    /// Price of one paid batch in the currency's minor unit (paise, cents).
    /// Default: 1000.
    pub unit_price_minor_units: u64,

    /// ISO-4217 currency code sent with every order. Default: "INR".
    pub currency: String,

    /// Time budget for one converter call and one page-count call, in
    /// seconds. Default: 120. Expiry becomes a per-file failure.
    pub conversion_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            brand_name: "doc2pdf".to_string(),
            limits: FreeTierLimits::default(),
            unit_price_minor_units: 1000,
            currency: "INR".to_string(),
            conversion_timeout_secs: 120,
        }
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn brand_name(mut self, name: impl Into<String>) -> Self {
        self.config.brand_name = name.into();
        self
    }

    pub fn limits(mut self, limits: FreeTierLimits) -> Self {
        self.config.limits = limits;
        self
    }

    pub fn max_free_files(mut self, n: usize) -> Self {
        self.config.limits.max_files = n;
        self
    }

    pub fn max_free_file_size_bytes(mut self, bytes: u64) -> Self {
        self.config.limits.max_file_size_bytes = bytes;
        self
    }

    pub fn max_free_file_size_mb(mut self, mb: u64) -> Self {
        self.config.limits.max_file_size_bytes = mb.saturating_mul(1024 * 1024);
        self
    }

    pub fn max_free_pages(mut self, n: usize) -> Self {
        self.config.limits.max_pages = n;
        self
    }

    pub fn unit_price_minor_units(mut self, amount: u64) -> Self {
        self.config.unit_price_minor_units = amount;
        self
    }

    pub fn currency(mut self, code: impl Into<String>) -> Self {
        self.config.currency = code.into().to_uppercase();
        self
    }

    pub fn conversion_timeout_secs(mut self, secs: u64) -> Self {
        self.config.conversion_timeout_secs = secs.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, Doc2PdfError> {
        let c = &self.config;
        if c.unit_price_minor_units == 0 {
            return Err(Doc2PdfError::InvalidConfig(
                "Unit price must be greater than zero".into(),
            ));
        }
        if c.currency.len() != 3 || !c.currency.chars().all(|ch| ch.is_ascii_alphabetic()) {
            return Err(Doc2PdfError::InvalidConfig(format!(
                "Currency must be a three-letter ISO code, got '{}'",
                c.currency
            )));
        }
        Ok(self.config)
    }
}

// ── Order service ────────────────────────────────────────────────────────

/// API key pair for the order provider.
#[derive(Clone, PartialEq, Eq)]
pub struct OrderCredentials {
    /// Public key id; also handed to the checkout widget.
    pub key_id: String,
    pub key_secret: String,
}

impl OrderCredentials {
    /// Both halves must be present and non-empty, otherwise the paid flow
    /// stays disabled.
    pub fn from_parts(key_id: Option<String>, key_secret: Option<String>) -> Option<Self> {
        match (key_id, key_secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Some(Self {
                key_id: id,
                key_secret: secret,
            }),
            _ => None,
        }
    }
}

impl fmt::Debug for OrderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderCredentials")
            .field("key_id", &self.key_id)
            .field("key_secret", &"<redacted>")
            .finish()
    }
}

/// Configuration for [`crate::order::HttpOrderService`].
#[derive(Debug, Clone)]
pub struct OrderServiceConfig {
    pub credentials: OrderCredentials,

    /// Provider API root. Default: `https://api.razorpay.com`.
    pub base_url: String,

    /// Whole-request timeout in seconds. Default: 15.
    pub timeout_secs: u64,
}

impl OrderServiceConfig {
    pub fn new(credentials: OrderCredentials) -> Self {
        Self {
            credentials,
            base_url: "https://api.razorpay.com".to_string(),
            timeout_secs: 15,
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs.max(1);
        self
    }
}
