//! Transcript source clients.

pub mod mock;
pub mod remote;

use async_trait::async_trait;

use murmur_common::{SourceError, TranscriptUtterance};

/// One poll's worth of transcript.
#[derive(Debug, Clone, Default)]
pub struct TranscriptPage {
    /// Utterances in source-emission order. Successive polls may overlap.
    pub utterances: Vec<TranscriptUtterance>,
    /// True once the meeting has ended and the transcript is complete.
    pub finalized: bool,
}

/// Common interface for transcript sources.
///
/// Implementations must return utterances in emission order, and must keep
/// returning an utterance on subsequent polls until the transcript is
/// finalized — that overlap is the pipeline's only backstop against a
/// missed poll, so dropping items between polls silently loses data.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the currently available transcript for a meeting.
    async fn fetch(&self, meeting_id: &str) -> Result<TranscriptPage, SourceError>;
}
