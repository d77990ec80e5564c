//! Live Qdrant round-trip.
//!
//! Requires a running Qdrant instance. Run with:
//! ```bash
//! docker run -p 6334:6334 qdrant/qdrant
//! cargo test --package murmur-store --test qdrant_live -- --ignored --nocapture
//! ```

use std::sync::Arc;

use murmur_common::TranscriptUtterance;
use murmur_store::embedding::StubEmbedder;
use murmur_store::qdrant::QdrantStore;
use murmur_store::UtteranceStore;

fn utterance(seq: u64, text: &str) -> TranscriptUtterance {
    TranscriptUtterance {
        meeting_id: "live-test-meeting".to_string(),
        speaker: Some("Alice".to_string()),
        text: text.to_string(),
        start_time: seq as f64 * 5.0,
        end_time: Some(seq as f64 * 5.0 + 4.0),
        sequence: Some(seq),
        source: "test".to_string(),
    }
}

#[tokio::test(flavor = "multi_thread")]
#[ignore] // Requires a running Qdrant instance
async fn test_upsert_is_idempotent_against_live_qdrant() {
    let host = std::env::var("MURMUR_STORE_HOST").unwrap_or_else(|_| "localhost".to_string());

    let embedder = Arc::new(StubEmbedder::default());
    let store = QdrantStore::connect(&host, 6334, "murmur_live_test", embedder)
        .await
        .expect("Failed to connect to Qdrant");

    store
        .delete_meeting("live-test-meeting")
        .await
        .expect("cleanup failed");

    let batch = vec![utterance(0, "first line"), utterance(1, "second line")];
    let report = store.upsert_batch(&batch).await.expect("upsert failed");
    assert_eq!(report.stored.len(), 2);
    assert!(report.is_complete());

    // Re-upsert the same identities with changed content: still two points.
    let before = store.count().await.expect("count failed");
    let changed = vec![utterance(0, "first line, corrected")];
    store.upsert_batch(&changed).await.expect("re-upsert failed");
    let after = store.count().await.expect("count failed");
    assert_eq!(before, after, "re-upsert must overwrite, not duplicate");

    store
        .delete_meeting("live-test-meeting")
        .await
        .expect("cleanup failed");
}
