//! Repository Pattern Implementation
//!
//! Storage for transactions that were broadcast but not yet confirmed. The
//! service records a transaction id as soon as it is signed so that a timeout,
//! a crash or a dropped connection never loses track of it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │     PendingTransactionRepository         │
//! │  (Abstract interface for data access)    │
//! └──────────────┬───────────────────────────┘
//!                │
//!        ┌───────┴──────────┐
//!        │                  │
//! ┌──────▼───────────┐ ┌────▼─────────────┐
//! │InMemoryPending   │ │FilePending       │
//! │                  │ │                  │
//! │- Tests, mock     │ │- JSON file       │
//! │- Lost on restart │ │- Survives restart│
//! └──────────────────┘ └──────────────────┘
//! ```

pub mod file;
pub mod memory;
pub mod traits;

// Re-export main types
pub use file::FilePendingRepository;
pub use memory::InMemoryPendingRepository;
pub use traits::{PendingRecord, PendingTransactionRepository};
