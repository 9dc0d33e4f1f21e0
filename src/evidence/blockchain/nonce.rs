use crate::error::TrustSealResult;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// Hands out account nonces to concurrent notarizations
///
/// The next nonce is fetched from the node on first use and after every
/// `mark_stale()`; in between, reservations are served locally under a mutex so
/// two in-flight transactions never share a nonce.
#[derive(Debug, Default)]
pub struct NonceManager {
    next: Mutex<Option<u64>>,
    stale: AtomicBool,
}

impl NonceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next nonce, consulting `fetch` when the local counter is cold
    pub async fn reserve<F, Fut>(&self, fetch: F) -> TrustSealResult<u64>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = TrustSealResult<u64>>,
    {
        let mut next = self.next.lock().await;

        if self.stale.swap(false, Ordering::AcqRel) {
            *next = None;
        }

        let nonce = match *next {
            Some(nonce) => nonce,
            None => fetch().await?,
        };
        *next = Some(nonce + 1);

        Ok(nonce)
    }

    /// Force a refetch on the next reservation
    ///
    /// Safe to call from synchronous code, e.g. after a local signing failure
    /// left a gap in the sequence.
    pub fn mark_stale(&self) {
        self.stale.store(true, Ordering::Release);
    }
}
