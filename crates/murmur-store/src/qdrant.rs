//! Qdrant-backed utterance store.
//!
//! Collection bootstrap is schema-on-boot: check for the collection, create
//! it with Cosine distance and the embedder's dimension when missing.
//! Points are keyed by the utterance dedup identity, so re-upserting the
//! same identity overwrites in place and store-level idempotency holds even
//! across process restarts.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointStruct,
    UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use tracing::{debug, info, instrument, warn};

use murmur_common::{TranscriptUtterance, UtteranceId};

use crate::embedding::Embedder;
use crate::error::{Result, StoreError};
use crate::{UpsertReport, UtteranceStore};

pub const DEFAULT_COLLECTION: &str = "meeting_transcripts";

/// Points per upsert call. Amortizes round-trips; also the failure
/// granularity reported back to the pipeline.
const UPSERT_SUB_BATCH: usize = 64;

pub struct QdrantStore {
    client: Qdrant,
    collection: String,
    embedder: Arc<dyn Embedder>,
}

impl QdrantStore {
    /// Connect to a Qdrant instance and ensure the collection exists.
    ///
    /// `port` is the gRPC port (6334 on a default install).
    pub async fn connect(
        host: &str,
        port: u16,
        collection: &str,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let url = format!("http://{host}:{port}");
        info!(%url, collection, "Connecting to Qdrant");

        let client = Qdrant::from_url(&url)
            .build()
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        client
            .health_check()
            .await
            .map_err(|e| StoreError::Connection(format!("health check failed: {e}")))?;

        let store = Self {
            client,
            collection: collection.to_string(),
            embedder,
        };
        store.ensure_collection().await?;
        Ok(store)
    }

    async fn ensure_collection(&self) -> Result<()> {
        if self.client.collection_info(&self.collection).await.is_ok() {
            debug!(collection = %self.collection, "Using existing collection");
            return Ok(());
        }

        let dim = self.embedder.dim() as u64;
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(dim, Distance::Cosine)),
            )
            .await
            .map_err(|e| StoreError::Bootstrap(e.to_string()))?;

        info!(collection = %self.collection, dim, "Created collection");
        Ok(())
    }

    fn to_point(&self, utterance: &TranscriptUtterance, vector: Vec<f32>) -> Result<PointStruct> {
        let mut value = serde_json::to_value(utterance)
            .map_err(|e| StoreError::Upsert(format!("payload serialization: {e}")))?;
        value["ingested_at"] = serde_json::Value::String(Utc::now().to_rfc3339());

        let payload = Payload::try_from(value)
            .map_err(|e| StoreError::Upsert(format!("payload conversion: {e}")))?;
        Ok(PointStruct::new(
            utterance.dedup_id().to_string(),
            vector,
            payload,
        ))
    }

    /// Total points in the collection.
    pub async fn count(&self) -> Result<u64> {
        let info = self.client.collection_info(&self.collection).await?;
        Ok(info.result.and_then(|r| r.points_count).unwrap_or(0))
    }

    /// Delete every utterance belonging to one meeting.
    pub async fn delete_meeting(&self, meeting_id: &str) -> Result<()> {
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(Filter::must([Condition::matches(
                        "meeting_id",
                        meeting_id.to_string(),
                    )]))
                    .wait(true),
            )
            .await?;
        info!(meeting_id, "Deleted meeting utterances");
        Ok(())
    }
}

#[async_trait]
impl UtteranceStore for QdrantStore {
    #[instrument(skip(self, batch), fields(n = batch.len(), collection = %self.collection))]
    async fn upsert_batch(&self, batch: &[TranscriptUtterance]) -> Result<UpsertReport> {
        let mut report = UpsertReport::default();
        if batch.is_empty() {
            return Ok(report);
        }

        for chunk in batch.chunks(UPSERT_SUB_BATCH) {
            let ids: Vec<UtteranceId> = chunk.iter().map(|u| u.dedup_id()).collect();
            let texts: Vec<String> = chunk.iter().map(|u| u.text.clone()).collect();

            let vectors = match self.embedder.embed_batch(&texts).await {
                Ok(v) => v,
                Err(e) => {
                    warn!(error = %e, n = chunk.len(), "Embedding failed, sub-batch deferred");
                    report.failed.extend(ids);
                    continue;
                }
            };
            if vectors.len() != chunk.len() {
                warn!(
                    expected = chunk.len(),
                    got = vectors.len(),
                    "Embedder returned wrong count, sub-batch deferred"
                );
                report.failed.extend(ids);
                continue;
            }
            if let Some(bad) = vectors.iter().find(|v| v.len() != self.embedder.dim()) {
                let err = StoreError::InvalidDimension {
                    expected: self.embedder.dim(),
                    actual: bad.len(),
                };
                warn!(error = %err, "Sub-batch deferred");
                report.failed.extend(ids);
                continue;
            }

            let points = match chunk
                .iter()
                .zip(vectors)
                .map(|(u, v)| self.to_point(u, v))
                .collect::<Result<Vec<_>>>()
            {
                Ok(points) => points,
                Err(e) => {
                    warn!(error = %e, "Point construction failed, sub-batch deferred");
                    report.failed.extend(ids);
                    continue;
                }
            };

            match self
                .client
                .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
                .await
            {
                Ok(_) => {
                    debug!(n = chunk.len(), "Upserted points");
                    report.stored.extend(ids);
                }
                Err(e) => {
                    warn!(error = %e, n = chunk.len(), "Qdrant upsert failed, sub-batch deferred");
                    report.failed.extend(ids);
                }
            }
        }

        if report.stored.is_empty() && !report.failed.is_empty() {
            return Err(StoreError::Upsert(format!(
                "no points stored out of {}",
                batch.len()
            )));
        }
        Ok(report)
    }
}
