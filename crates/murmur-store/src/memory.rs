//! In-memory utterance store.
//!
//! Backs the offline `mock` mode and the pipeline tests. Same upsert
//! semantics as the Qdrant store: keyed by dedup identity, overwrite on
//! re-upsert. Tracks overwrites so idempotency is observable in tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use murmur_common::{TranscriptUtterance, UtteranceId};

use crate::error::Result;
use crate::{UpsertReport, UtteranceStore};

#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub utterance: TranscriptUtterance,
    pub ingested_at: DateTime<Utc>,
    /// Number of times this identity was re-upserted after the first write.
    pub overwrites: u32,
}

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<UtteranceId, StoredRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &UtteranceId) -> Option<StoredRecord> {
        self.records.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl UtteranceStore for MemoryStore {
    async fn upsert_batch(&self, batch: &[TranscriptUtterance]) -> Result<UpsertReport> {
        let mut report = UpsertReport::default();
        let mut records = self.records.lock().unwrap();

        for utterance in batch {
            let id = utterance.dedup_id();
            records
                .entry(id)
                .and_modify(|existing| {
                    existing.utterance = utterance.clone();
                    existing.overwrites += 1;
                })
                .or_insert_with(|| StoredRecord {
                    utterance: utterance.clone(),
                    ingested_at: Utc::now(),
                    overwrites: 0,
                });
            report.stored.push(id);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utterance(seq: u64, text: &str) -> TranscriptUtterance {
        TranscriptUtterance {
            meeting_id: "meet-1".to_string(),
            speaker: Some("Alice".to_string()),
            text: text.to_string(),
            start_time: seq as f64,
            end_time: None,
            sequence: Some(seq),
            source: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_upsert_same_identity_overwrites() {
        let store = MemoryStore::new();
        let first = utterance(3, "draft wording");
        let second = utterance(3, "final wording");

        store.upsert_batch(&[first]).await.unwrap();
        store.upsert_batch(&[second.clone()]).await.unwrap();

        assert_eq!(store.len(), 1);
        let record = store.get(&second.dedup_id()).unwrap();
        assert_eq!(record.utterance.text, "final wording");
        assert_eq!(record.overwrites, 1);
    }

    #[tokio::test]
    async fn test_batch_of_one_equals_folded_batch() {
        let folded = MemoryStore::new();
        let batched = MemoryStore::new();
        let items: Vec<_> = (0..4).map(|i| utterance(i, "line")).collect();

        batched.upsert_batch(&items).await.unwrap();
        for item in &items {
            folded.upsert_batch(std::slice::from_ref(item)).await.unwrap();
        }

        assert_eq!(folded.len(), batched.len());
        for item in &items {
            let id = item.dedup_id();
            assert_eq!(
                folded.get(&id).unwrap().utterance,
                batched.get(&id).unwrap().utterance
            );
        }
    }
}
