//! murmur-store — Vector persistence for transcript utterances.
//!
//! Exposes the [`UtteranceStore`] capability: embed a batch of utterances
//! and idempotently upsert them, keyed by their dedup identity. Two
//! backends: Qdrant for production, an in-memory map for mock mode and
//! tests. The embedding function is injected (see [`embedding::Embedder`])
//! so a real model can replace the stub without touching callers.

pub mod embedding;
pub mod error;
pub mod memory;
pub mod qdrant;

use async_trait::async_trait;

use murmur_common::{TranscriptUtterance, UtteranceId};

use crate::error::StoreError;

/// Outcome of an [`UtteranceStore::upsert_batch`] call.
///
/// Identities in `stored` are durably persisted; identities in `failed`
/// were rejected (a sub-batch failure) and should be retried by the caller.
/// Batching amortizes round-trips only — a batch of one behaves identically
/// to folding a larger batch one item at a time.
#[derive(Debug, Clone, Default)]
pub struct UpsertReport {
    pub stored: Vec<UtteranceId>,
    pub failed: Vec<UtteranceId>,
}

impl UpsertReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Capability: embed and idempotently persist utterances.
///
/// Upserts are keyed by [`TranscriptUtterance::dedup_id`]; re-upserting the
/// same identity overwrites the stored record, never duplicates it. The
/// client must tolerate concurrent use when shared across pipelines.
#[async_trait]
pub trait UtteranceStore: Send + Sync {
    /// Returns `Err` only on total failure; partial failures are reported
    /// per identity so the caller can retry just the failed subset.
    async fn upsert_batch(
        &self,
        batch: &[TranscriptUtterance],
    ) -> Result<UpsertReport, StoreError>;
}
