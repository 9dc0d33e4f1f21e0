/// State Machine Pattern for Notarization Attempts
///
/// This module implements a type-safe state machine that enforces valid state transitions
/// at compile time. A transaction cannot be submitted before it is signed, and a
/// rejected attempt cannot be confirmed.
///
/// # States
///
/// - `Built` - Transaction constructed, cost and nonce fixed
/// - `Signed` - Signed locally, transaction id known
/// - `Submitted` - Broadcast to the ledger, awaiting inclusion
/// - `Confirmed` - Included in a block (terminal)
/// - `TimedOut` - Broadcast but not confirmed in time; may still resolve
/// - `Rejected` - Refused by the signer, the node or the contract (terminal)
///
/// # Example
///
/// ```ignore
/// let attempt = NotarizationAttempt::new(digest, file_name, cost, unsigned);
/// let attempt = attempt.sign(ledger.sign(attempt.state.transaction.clone())?);
/// let attempt = attempt.submit(ledger.submit(&attempt.state.transaction).await?);
/// let attempt = attempt.confirm(receipt);
/// ```
pub mod states;
pub mod transitions;

pub use states::*;

use crate::evidence::Digest;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One notarization attempt with type-safe state
///
/// The generic parameter `S` represents the current state of the attempt.
/// Only operations valid for that state are callable.
#[derive(Debug, Clone)]
pub struct NotarizationAttempt<S> {
    /// Unique attempt identifier (correlates log lines)
    pub attempt_id: Uuid,

    /// Current state (type parameter ensures type safety)
    pub state: S,

    /// Data available in all states
    pub context: AttemptContext,
}

/// What is being notarized
#[derive(Debug, Clone)]
pub struct AttemptContext {
    pub digest: Digest,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
}

impl<S> NotarizationAttempt<S> {
    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    pub fn digest(&self) -> &Digest {
        &self.context.digest
    }

    pub fn file_name(&self) -> &str {
        &self.context.file_name
    }

    fn transition<T>(self, state: T) -> NotarizationAttempt<T> {
        NotarizationAttempt {
            attempt_id: self.attempt_id,
            state,
            context: self.context,
        }
    }
}
