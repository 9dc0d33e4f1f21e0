//! Notarization pipeline
//!
//! `NotarizationService` turns a request into a ledger transaction:
//! digest → metadata → estimate → build → sign → submit → confirm.
//! Ledger calls go through `RetryPolicy`; unresolved transactions are kept in a
//! `PendingTransactionRepository` until `reconcile_pending` settles them.

pub mod request;
pub mod response;
pub mod retry;
pub mod service;

pub use request::{DocumentSource, NotarizationRequest};
pub use response::{
    ErrorResponse, NotarizationOutcome, NotarizationReceipt, PendingNotarization,
    ReconcileReport, TransactionStatusResponse,
};
pub use retry::RetryPolicy;
pub use service::{NotarizationService, ServiceSettings};
