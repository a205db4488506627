//! HTTP server binary for doc2pdf-gate.
//!
//! A thin shim over the library crate that maps flags and environment
//! variables to `PipelineConfig`, wires the real converter, page counter and
//! order client, and serves the router.

use anyhow::{Context, Result};
use clap::Parser;
use doc2pdf_gate::server::{self, AppState};
use doc2pdf_gate::{
    BatchPipeline, HttpOrderService, OrderCredentials, OrderServiceConfig, PdfiumPageCounter,
    PipelineConfig, SofficeConverter,
};
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"ENDPOINTS:
  GET  /          service info (brand, free tier, price)
  GET  /healthz   liveness probe
  POST /convert   multipart: docs=<file> [docs=<file> ...] [payment_id, order_id]

EXAMPLES:
  # Local run with defaults (free tier only, payments disabled)
  doc2pdf

  # Enable the paid flow
  RAZORPAY_KEY_ID=rzp_test_xxx RAZORPAY_KEY_SECRET=... doc2pdf --port 8080

  # Convert two documents
  curl -F docs=@a.docx -F docs=@b.docx -o converted_pdfs.zip localhost:5000/convert

SETUP:
  LibreOffice must be installed (`soffice` on PATH or --soffice-path).
  libpdfium must be loadable from the system search path or PDFIUM_LIB_PATH.
"#;

/// Convert Word documents to PDF behind a free-tier gate.
#[derive(Parser, Debug)]
#[command(
    name = "doc2pdf",
    version,
    about = "Convert Word documents to PDF behind a free-tier gate",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to bind (IPv4 or IPv6, e.g. `0.0.0.0` or `::`).
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// Display name shown by `GET /`.
    #[arg(long, env = "APP_BRAND", default_value = "doc2pdf")]
    brand: String,

    /// Free tier: maximum files per request.
    #[arg(long, env = "FREE_MAX_FILES", default_value_t = 2)]
    free_max_files: usize,

    /// Free tier: maximum size per file, in MB.
    #[arg(long, env = "FREE_MAX_MB", default_value_t = 10)]
    free_max_mb: u64,

    /// Free tier: maximum pages per converted file.
    #[arg(long, env = "FREE_MAX_PAGES", default_value_t = 25)]
    free_max_pages: usize,

    /// Price of a paid request in the currency's minor unit (e.g. paise).
    #[arg(long, env = "UNIT_PRICE_MINOR", default_value_t = 1000)]
    unit_price_minor: u64,

    /// ISO 4217 currency code for orders.
    #[arg(long, env = "PRICE_CURRENCY", default_value = "INR")]
    currency: String,

    /// Order provider key id. Payments are disabled unless both key id and
    /// secret are set.
    #[arg(long, env = "RAZORPAY_KEY_ID")]
    razorpay_key_id: Option<String>,

    /// Order provider key secret.
    #[arg(long, env = "RAZORPAY_KEY_SECRET", hide_env_values = true)]
    razorpay_key_secret: Option<String>,

    /// Order provider base URL.
    #[arg(long, env = "RAZORPAY_BASE_URL", default_value = "https://api.razorpay.com")]
    razorpay_base_url: String,

    /// Order creation timeout in seconds.
    #[arg(long, env = "ORDER_TIMEOUT_SECS", default_value_t = 15)]
    order_timeout: u64,

    /// Per-file conversion (and page count) timeout in seconds.
    #[arg(long, env = "CONVERT_TIMEOUT_SECS", default_value_t = 120)]
    convert_timeout: u64,

    /// LibreOffice executable.
    #[arg(long, env = "SOFFICE_PATH", default_value = "soffice")]
    soffice_path: PathBuf,

    /// Path to libpdfium; system search path when unset.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,

    /// Maximum request body, in MB.
    #[arg(long, env = "MAX_UPLOAD_MB", default_value_t = 100)]
    max_upload_mb: usize,

    /// Emit JSON log lines.
    #[arg(long, env = "DOC2PDF_LOG_JSON")]
    log_json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC2PDF_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let default_filter = if cli.verbose {
        "doc2pdf_gate=debug,tower_http=debug,info"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }

    // ── Build pipeline ───────────────────────────────────────────────────
    let config = build_config(&cli)?;

    let counter = PdfiumPageCounter::new(cli.pdfium_lib_path.clone());
    counter
        .probe()
        .await
        .context("PDFium library is not loadable; set PDFIUM_LIB_PATH")?;

    let mut pipeline = BatchPipeline::new(
        config,
        Arc::new(SofficeConverter::new(&cli.soffice_path)),
        Arc::new(counter),
    );

    let mut checkout_key_id = None;
    match OrderCredentials::from_parts(cli.razorpay_key_id.clone(), cli.razorpay_key_secret.clone()) {
        Some(credentials) => {
            let orders = HttpOrderService::new(
                OrderServiceConfig::new(credentials)
                    .base_url(&cli.razorpay_base_url)
                    .timeout_secs(cli.order_timeout),
            )
            .context("Failed to build order client")?;
            checkout_key_id = Some(orders.key_id().to_string());
            pipeline = pipeline.with_order_service(Arc::new(orders));
            info!("Payments enabled");
        }
        None => warn!("RAZORPAY_KEY_ID / RAZORPAY_KEY_SECRET not set; payments disabled"),
    }

    let mut state = AppState::new(pipeline);
    if let Some(key_id) = checkout_key_id {
        state = state.with_checkout_key_id(key_id);
    }

    // ── Serve ────────────────────────────────────────────────────────────
    let addr = bind_addr(&cli);
    let max_upload_bytes = cli.max_upload_mb.saturating_mul(1024 * 1024);

    server::serve(addr, server::router(state, max_upload_bytes))
        .await
        .context("Server error")?;
    Ok(())
}

fn bind_addr(cli: &Cli) -> SocketAddr {
    SocketAddr::new(cli.host, cli.port)
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    PipelineConfig::builder()
        .brand_name(cli.brand.as_str())
        .max_free_files(cli.free_max_files)
        .max_free_file_size_mb(cli.free_max_mb)
        .max_free_pages(cli.free_max_pages)
        .unit_price_minor_units(cli.unit_price_minor)
        .currency(cli.currency.as_str())
        .conversion_timeout_secs(cli.convert_timeout)
        .build()
        .context("Invalid configuration")
}
