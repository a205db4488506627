//! HTTP transport: a thin axum layer over [`BatchPipeline`].
//!
//! | Route           | Purpose                                        |
//! |-----------------|------------------------------------------------|
//! | `GET /`         | service info: brand, free tier, price          |
//! | `GET /healthz`  | liveness probe, always `200 OK`                |
//! | `POST /convert` | multipart upload → zip / 402 / 400             |
//!
//! `POST /convert` expects `multipart/form-data` with one or more `docs`
//! file parts and, on resubmission after payment, `payment_id` and
//! `order_id` text parts.

use crate::batch::BatchPipeline;
use crate::error::Doc2PdfError;
use crate::order::PaymentProof;
use crate::output::{Bundle, ItemFailure, PaymentRequired, PipelineOutcome};
use crate::pipeline::input::InputDescriptor;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// Multipart field carrying the documents.
pub const DOCS_FIELD: &str = "docs";

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub pipeline: Arc<BatchPipeline>,
    /// Public checkout key, echoed by `GET /` when payments are enabled.
    pub checkout_key_id: Option<String>,
}

impl AppState {
    pub fn new(pipeline: BatchPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            checkout_key_id: None,
        }
    }

    pub fn with_checkout_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.checkout_key_id = Some(key_id.into());
        self
    }
}

/// Build the router.
///
/// `max_upload_bytes` caps the whole request body; the free-tier size limit
/// is a gate decision, not a transport limit, so paid users can go past it.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/healthz", get(health_check))
        .route("/convert", post(convert))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Serve until Ctrl+C or SIGTERM.
pub async fn serve(addr: SocketAddr, app: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "OK"
}

async fn service_info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = state.pipeline.config();
    Json(json!({
        "brand": config.brand_name,
        "version": env!("CARGO_PKG_VERSION"),
        "free_tier": {
            "max_files": config.limits.max_files,
            "max_file_size_mb": config.limits.max_file_size_mb(),
            "max_pages": config.limits.max_pages,
        },
        "price": {
            "amount": config.unit_price_minor_units,
            "currency": config.currency,
        },
        "payments_enabled": state.pipeline.payments_enabled(),
        "checkout_key_id": state.checkout_key_id,
    }))
}

async fn convert(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = read_upload(multipart).await?;
    debug!(
        "Upload: {} documents, proof={}",
        upload.documents.len(),
        upload.proof.is_some()
    );

    let outcome = state
        .pipeline
        .run(upload.documents, upload.proof.as_ref())
        .await?;

    Ok(match outcome {
        PipelineOutcome::PaymentRequired(p) => {
            (StatusCode::PAYMENT_REQUIRED, Json(PaymentRequiredBody::from(p))).into_response()
        }
        PipelineOutcome::ConversionErrors(errors) => (
            StatusCode::BAD_REQUEST,
            Json(ConversionErrorsBody {
                status: "conversion_errors",
                errors,
            }),
        )
            .into_response(),
        PipelineOutcome::Ready(bundle) => zip_response(bundle),
    })
}

// ── Upload parsing ───────────────────────────────────────────────────────

struct Upload {
    documents: Vec<InputDescriptor>,
    proof: Option<PaymentProof>,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    let mut documents = Vec::new();
    let mut payment_id = None;
    let mut order_id = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some(DOCS_FIELD) => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await?;
                // Browsers send an empty part when no file was chosen.
                if file_name.as_deref().unwrap_or_default().is_empty() && bytes.is_empty() {
                    continue;
                }
                documents.push(InputDescriptor::new(file_name.as_deref(), bytes.to_vec()));
            }
            Some("payment_id") => payment_id = Some(field.text().await?),
            Some("order_id") => order_id = Some(field.text().await?),
            _ => {}
        }
    }

    Ok(Upload {
        documents,
        proof: PaymentProof::from_parts(payment_id, order_id),
    })
}

// ── Response bodies ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct PaymentRequiredBody {
    status: &'static str,
    order_id: String,
    amount: u64,
    currency: String,
    reason: String,
}

impl From<PaymentRequired> for PaymentRequiredBody {
    fn from(p: PaymentRequired) -> Self {
        Self {
            status: "payment_required",
            order_id: p.order_id,
            amount: p.amount,
            currency: p.currency,
            reason: p.reason,
        }
    }
}

#[derive(Debug, Serialize)]
struct ConversionErrorsBody {
    status: &'static str,
    errors: Vec<ItemFailure>,
}

fn zip_response(bundle: Bundle) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", Bundle::FILE_NAME);
    let mut response = bundle.archive.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/zip"));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

// ── Errors ───────────────────────────────────────────────────────────────

/// Fatal request errors rendered as `{"error":{"code","message"}}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Pipeline(#[from] Doc2PdfError),

    #[error("Malformed upload: {0}")]
    Upload(#[from] MultipartError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Upload(e) => e.status(),
            ApiError::Pipeline(e) => match e {
                Doc2PdfError::NoInput => StatusCode::BAD_REQUEST,
                Doc2PdfError::OrderServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                Doc2PdfError::Packaging { .. }
                | Doc2PdfError::InvalidConfig(_)
                | Doc2PdfError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::Upload(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                "PAYLOAD_TOO_LARGE"
            }
            ApiError::Upload(_) => "BAD_REQUEST",
            ApiError::Pipeline(e) => match e {
                Doc2PdfError::NoInput => "NO_INPUT",
                Doc2PdfError::OrderServiceUnavailable { .. } => "ORDER_SERVICE_UNAVAILABLE",
                Doc2PdfError::Packaging { .. } => "PACKAGING_ERROR",
                Doc2PdfError::InvalidConfig(_) => "CONFIG_ERROR",
                Doc2PdfError::Internal(_) => "INTERNAL_ERROR",
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }
        let body = Json(json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_and_statuses() {
        let e = ApiError::from(Doc2PdfError::NoInput);
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(e.error_code(), "NO_INPUT");

        let e = ApiError::from(Doc2PdfError::OrderServiceUnavailable {
            reason: "down".into(),
        });
        assert_eq!(e.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let e = ApiError::from(Doc2PdfError::Packaging {
            detail: "x".into(),
        });
        assert_eq!(e.error_code(), "PACKAGING_ERROR");
    }

    #[test]
    fn payment_body_shape() {
        let body = PaymentRequiredBody::from(PaymentRequired {
            order_id: "order_1".into(),
            amount: 1000,
            currency: "INR".into(),
            reason: "3 files uploaded".into(),
        });
        let v = serde_json::to_value(body).unwrap();
        assert_eq!(v["status"], "payment_required");
        assert_eq!(v["order_id"], "order_1");
        assert_eq!(v["amount"], 1000);
    }
}
