use axum::http::StatusCode;
use thiserror::Error;

/// Central error type for the TrustSeal notary service
#[derive(Error, Debug)]
pub enum TrustSealError {
    // ============================================================================
    // Caller Errors
    // ============================================================================
    #[error("Invalid digest format: {0}")]
    InvalidDigestFormat(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid transaction id: {0}")]
    InvalidTransactionId(String),

    #[error("Metadata payload is {size} bytes, exceeding the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Request body exceeds the {limit} byte limit")]
    RequestBodyTooLarge { limit: usize },

    // ============================================================================
    // Ledger Errors
    // ============================================================================
    #[error("Ledger network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Ledger unreachable after {attempts} attempts: {last_error}")]
    LedgerUnreachable { attempts: u32, last_error: String },

    #[error("Transaction rejected by the ledger: {0}")]
    SubmissionRejected(String),

    #[error("Transaction {tx_id} was submitted but not confirmed before the timeout")]
    ConfirmationTimeout { tx_id: String },

    #[error("Failed to sign transaction: {0}")]
    SigningFailed(String),

    #[error("Blockchain not configured: {0}")]
    BlockchainNotConfigured(String),

    #[error("Wallet error: {0}")]
    WalletError(String),

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Storage error: {0}")]
    StorageError(String),

    // ============================================================================
    // Generic/System Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TrustSealError {
    /// Stable, machine-readable error kind callers can branch on
    pub fn error_kind(&self) -> &'static str {
        match self {
            TrustSealError::InvalidDigestFormat(_) => "InvalidDigestFormat",
            TrustSealError::InvalidRequest(_) => "InvalidRequest",
            TrustSealError::InvalidTransactionId(_) => "InvalidTransactionId",
            TrustSealError::PayloadTooLarge { .. } | TrustSealError::RequestBodyTooLarge { .. } => {
                "PayloadTooLarge"
            }
            TrustSealError::NetworkUnavailable(_) => "NetworkUnavailable",
            TrustSealError::LedgerUnreachable { .. } => "LedgerUnreachable",
            TrustSealError::SubmissionRejected(_) => "SubmissionRejected",
            TrustSealError::ConfirmationTimeout { .. } => "ConfirmationTimeout",
            TrustSealError::SigningFailed(_) => "SigningFailed",
            TrustSealError::BlockchainNotConfigured(_) => "BlockchainNotConfigured",
            TrustSealError::WalletError(_) => "WalletError",
            TrustSealError::StorageError(_) => "StorageError",
            TrustSealError::Io(_) => "IoError",
            TrustSealError::Json(_) => "JsonError",
            TrustSealError::ConfigError(_) => "ConfigError",
            TrustSealError::Internal(_) => "InternalError",
        }
    }

    /// HTTP status class for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            TrustSealError::InvalidDigestFormat(_)
            | TrustSealError::InvalidRequest(_)
            | TrustSealError::InvalidTransactionId(_) => StatusCode::BAD_REQUEST,
            TrustSealError::PayloadTooLarge { .. } | TrustSealError::RequestBodyTooLarge { .. } => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            TrustSealError::SubmissionRejected(_) => StatusCode::BAD_GATEWAY,
            TrustSealError::NetworkUnavailable(_) | TrustSealError::LedgerUnreachable { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            TrustSealError::ConfirmationTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the failure is transient and worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, TrustSealError::NetworkUnavailable(_))
    }

    /// Whether the failure was caused by the caller's input
    pub fn is_caller_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

// Helper type alias for Results
pub type TrustSealResult<T> = Result<T, TrustSealError>;
