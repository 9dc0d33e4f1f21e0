//! TrustSeal notary service
//!
//! Anchors the SHA-256 digest of a document, together with descriptive
//! metadata, on an EVM ledger and returns the transaction as proof of existence.
//!
//! - [`evidence`] - digests, metadata and the ledger clients
//! - [`state_machine`] - typestate model of one notarization attempt
//! - [`notarization`] - the service that drives the pipeline
//! - [`repository`] - storage for unconfirmed transactions
//! - [`server`] - HTTP surface

pub mod error;
pub mod evidence;
pub mod logger;
pub mod notarization;
pub mod repository;
pub mod server;
pub mod state_machine;

pub use error::{TrustSealError, TrustSealResult};
