//! Single-owner in-flight request tracking.
//!
//! Each fetch family (artwork, poem, narration, analysis) owns one
//! `RequestSlot`. Starting a request through `begin()` cancels whatever the
//! slot was tracking before, so at most one request per family is live.
//! Results come back tagged with their generation; `finish()` only accepts
//! the generation the slot is currently tracking, which keeps a late result
//! from a superseded request from overwriting newer state.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::{FetchError, FetchResult};

/// Handed to the task performing a request.
#[derive(Debug, Clone)]
pub struct RequestTicket {
    pub generation: u64,
    pub token: CancellationToken,
}

#[derive(Debug, Default)]
pub struct RequestSlot {
    generation: u64,
    active: Option<CancellationToken>,
}

impl RequestSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the previous request (if any) and start tracking a new one.
    pub fn begin(&mut self) -> RequestTicket {
        self.cancel();
        self.generation += 1;
        let token = CancellationToken::new();
        self.active = Some(token.clone());
        RequestTicket {
            generation: self.generation,
            token,
        }
    }

    /// Mark `generation` as complete. Returns `false` when the result is stale
    /// and must be discarded.
    pub fn finish(&mut self, generation: u64) -> bool {
        if self.is_current(generation) {
            self.active = None;
            true
        } else {
            false
        }
    }

    /// True while `generation` is the live request of this slot.
    pub fn is_current(&self, generation: u64) -> bool {
        self.active.is_some() && self.generation == generation
    }

    /// Cancel the tracked request, if any. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(token) = self.active.take() {
            token.cancel();
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for RequestSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Race `fut` against `token`. Cancellation wins and maps to
/// `FetchError::Cancelled`.
pub async fn cancellable<T, F>(token: &CancellationToken, fut: F) -> FetchResult<T>
where
    F: Future<Output = FetchResult<T>>,
{
    if token.is_cancelled() {
        return Err(FetchError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(FetchError::Cancelled),
        res = fut => res,
    }
}
