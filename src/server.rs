use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::Engine;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{TrustSealError, TrustSealResult};
use crate::notarization::{
    ErrorResponse, NotarizationOutcome, NotarizationRequest, NotarizationService,
    TransactionStatusResponse,
};

/// Name reported by the health endpoint
pub const SERVICE_NAME: &str = "TrustSeal Notary Service";

/// Default request body limit: a 10 MiB document plus base64 overhead
pub const DEFAULT_BODY_LIMIT: usize = 15 * 1024 * 1024;

/// Server state
#[derive(Clone)]
pub struct AppState {
    pub service: NotarizationService,

    /// Largest accepted request body in bytes
    pub body_limit: usize,
}

impl AppState {
    pub fn new(service: NotarizationService) -> Self {
        Self {
            service,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

/// Create the HTTP router
///
/// Bodies over `body_limit` are answered with a `PayloadTooLarge` failure body.
pub fn create_router(state: AppState, body_limit: usize) -> Router {
    let state = AppState { body_limit, ..state };

    Router::new()
        .route("/api/notarize", post(notarize))
        .route("/api/health", get(health))
        .route("/api/transactions/:tx_id", get(transaction_status))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind the listening socket
pub async fn bind(host: &str, port: u16) -> TrustSealResult<TcpListener> {
    let listener = TcpListener::bind((host, port)).await.map_err(|e| {
        error!(host = %host, port = port, error = %e, "Failed to bind");
        TrustSealError::Io(e)
    })?;

    if let Ok(addr) = listener.local_addr() {
        info!(address = %addr, "Notary server bound");
    }
    Ok(listener)
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> TrustSealResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Notary server stopped gracefully");
    Ok(())
}

/// Resolves on Ctrl-C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

// ============================================================================
// Errors
// ============================================================================

impl IntoResponse for TrustSealError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(kind = self.error_kind(), error = %self, "Request failed");
        } else {
            debug!(kind = self.error_kind(), error = %self, "Request rejected");
        }

        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

// ============================================================================
// POST /api/notarize
// ============================================================================

/// Request body for `POST /api/notarize`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotarizeBody {
    pub file_hash: Option<String>,

    /// Base64-encoded document content
    pub content: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub email: Option<String>,
    pub service_type: Option<String>,
    pub client_info: Option<String>,
}

impl NotarizeBody {
    /// Convert to a service request; `user_agent` fills in a missing `clientInfo`
    pub fn into_request(self, user_agent: Option<String>) -> TrustSealResult<NotarizationRequest> {
        let mut request = match (self.file_hash, self.content) {
            (Some(hash), None) => NotarizationRequest::from_digest(hash),
            (None, Some(content)) => {
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(content.as_bytes())
                    .map_err(|e| {
                        TrustSealError::InvalidRequest(format!("content is not valid base64: {}", e))
                    })?;
                NotarizationRequest::from_content(bytes)
            }
            (Some(_), Some(_)) => {
                return Err(TrustSealError::InvalidRequest(
                    "provide either fileHash or content, not both".to_string(),
                ))
            }
            (None, None) => {
                return Err(TrustSealError::InvalidRequest(
                    "one of fileHash or content is required".to_string(),
                ))
            }
        };

        request.file_name = self.file_name;
        request.file_size = self.file_size;
        request.submitter_email = self.email;
        request.service_type = self.service_type;
        request.client_info = self.client_info.or(user_agent);
        Ok(request)
    }
}

#[tracing::instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
async fn notarize(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<NotarizeBody>, JsonRejection>,
) -> Result<Json<NotarizationOutcome>, TrustSealError> {
    let Json(body) = body.map_err(|e| body_rejection(e, state.body_limit))?;

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let request = body.into_request(user_agent)?;
    let outcome = state.service.process(request).await?;

    if outcome.is_pending() {
        warn!(tx_id = %outcome.tx_id(), "Answering with pending notarization");
    }
    Ok(Json(outcome))
}

fn body_rejection(rejection: JsonRejection, limit: usize) -> TrustSealError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        TrustSealError::RequestBodyTooLarge { limit }
    } else {
        TrustSealError::InvalidRequest(rejection.body_text())
    }
}

// ============================================================================
// GET /api/health
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub service: String,
    pub ledger_connected: bool,
    pub network: String,
    pub pending_transactions: usize,
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let ledger_connected = state.service.ledger_connected().await;
    let pending_transactions = match state.service.pending_transactions() {
        Ok(records) => records.len(),
        Err(e) => {
            warn!(error = %e, "Pending store unreadable during health check");
            0
        }
    };

    let (status, label) = if ledger_connected {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            service: SERVICE_NAME.to_string(),
            ledger_connected,
            network: state.service.network_name().to_string(),
            pending_transactions,
        }),
    )
}

// ============================================================================
// GET /api/transactions/:tx_id
// ============================================================================

async fn transaction_status(
    State(state): State<AppState>,
    Path(tx_id): Path<String>,
) -> Result<Json<TransactionStatusResponse>, TrustSealError> {
    let status = state.service.confirmation_status(&tx_id).await?;
    let tx_id = tx_id.to_lowercase();
    let reference = state.service.verification_reference(&tx_id);
    Ok(Json(TransactionStatusResponse::new(tx_id, &status, reference)))
}
