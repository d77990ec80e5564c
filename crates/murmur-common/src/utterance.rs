//! Canonical transcript data model.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Normalized transcript utterance in canonical format.
///
/// This is the standard record used throughout the pipeline regardless of
/// the upstream source. Never mutated after creation: sources build it,
/// the pipeline filters it, the store serializes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptUtterance {
    pub meeting_id: String,
    /// Speaker name or identifier; may be unknown.
    pub speaker: Option<String>,
    pub text: String,
    /// Epoch seconds.
    pub start_time: f64,
    /// Epoch seconds; `>= start_time` when present.
    pub end_time: Option<f64>,
    /// Stable ordinal assigned by the source, when it provides one.
    pub sequence: Option<u64>,
    /// Upstream source tag.
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_source() -> String {
    "bot-api".to_string()
}

/// Stable dedup identity of one utterance.
///
/// Rendered as a deterministic UUID so it doubles as the vector store point
/// ID: re-upserting the same identity overwrites in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UtteranceId(Uuid);

impl UtteranceId {
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TranscriptUtterance {
    /// Compute the dedup identity for this utterance.
    ///
    /// Primary key: (meeting_id, sequence ordinal). Content alone is never
    /// the key — the source may legitimately repeat text from different
    /// speakers or times. When the source provides no ordinal, falls back to
    /// the (meeting_id, start_time, speaker, text) composite.
    pub fn dedup_id(&self) -> UtteranceId {
        let key = match self.sequence {
            Some(seq) => format!("{}:seq:{}", self.meeting_id, seq),
            None => format!(
                "{}:{}:{}:{}",
                self.meeting_id,
                self.start_time,
                self.speaker.as_deref().unwrap_or("unknown"),
                self.text,
            ),
        };
        let digest = Sha256::digest(key.as_bytes());
        UtteranceId(Uuid::new_v5(&Uuid::NAMESPACE_OID, &digest))
    }

    /// Records considered for storage must carry actual spoken content.
    pub fn is_storable(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utterance(sequence: Option<u64>, speaker: &str, text: &str) -> TranscriptUtterance {
        TranscriptUtterance {
            meeting_id: "meet-1".to_string(),
            speaker: Some(speaker.to_string()),
            text: text.to_string(),
            start_time: 100.0,
            end_time: Some(103.5),
            sequence,
            source: "bot-api".to_string(),
        }
    }

    #[test]
    fn test_same_sequence_same_id() {
        let a = utterance(Some(7), "Alice", "hello");
        let b = utterance(Some(7), "Alice", "hello");
        assert_eq!(a.dedup_id(), b.dedup_id());
    }

    #[test]
    fn test_sequence_dominates_content() {
        // Re-delivery with corrected text keeps the same identity.
        let a = utterance(Some(7), "Alice", "hello");
        let b = utterance(Some(7), "Alice", "hello there");
        assert_eq!(a.dedup_id(), b.dedup_id());
        assert_ne!(a.dedup_id(), utterance(Some(8), "Alice", "hello").dedup_id());
    }

    #[test]
    fn test_composite_fallback_distinguishes_speakers() {
        // Without an ordinal, the same words from different speakers must
        // still be two utterances.
        let a = utterance(None, "Alice", "agreed");
        let b = utterance(None, "Bob", "agreed");
        assert_ne!(a.dedup_id(), b.dedup_id());
    }

    #[test]
    fn test_composite_fallback_distinguishes_meetings() {
        let a = utterance(None, "Alice", "agreed");
        let mut b = a.clone();
        b.meeting_id = "meet-2".to_string();
        assert_ne!(a.dedup_id(), b.dedup_id());
    }

    #[test]
    fn test_blank_text_is_not_storable() {
        assert!(!utterance(Some(0), "Alice", "   ").is_storable());
        assert!(utterance(Some(0), "Alice", "ok").is_storable());
    }
}
