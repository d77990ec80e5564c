//! Deterministic offline transcript source.
//!
//! Replays a scripted meeting: each poll reveals a few more utterances and
//! returns the full prefix, so successive pages overlap exactly the way the
//! live API's do. Finalizes once the script is exhausted.

use std::sync::Mutex;

use async_trait::async_trait;

use murmur_common::{SourceError, TranscriptUtterance};

use super::{TranscriptPage, TranscriptSource};

const SCRIPT: &[(&str, &str)] = &[
    ("Alice", "I think we should walk through the quarterly numbers first."),
    ("Bob", "Agreed, though I want to flag the hiring plan before we wrap."),
    ("Alice", "The revenue line came in eight percent over forecast."),
    ("Charlie", "Do we know how much of that was the enterprise renewals?"),
    ("Bob", "Most of it. Self-serve was flat quarter over quarter."),
    ("Alice", "Then let's keep the self-serve experiments funded."),
    ("Charlie", "I'll send the breakdown after this meeting."),
    ("Bob", "Last thing: we need two more backend hires approved."),
];

pub struct MockTranscriptSource {
    lines: Vec<(Option<String>, String)>,
    per_poll: usize,
    revealed: Mutex<usize>,
}

impl MockTranscriptSource {
    pub fn new() -> Self {
        let lines = SCRIPT
            .iter()
            .map(|(speaker, text)| (Some(speaker.to_string()), text.to_string()))
            .collect();
        Self::with_script(lines, 2)
    }

    /// `per_poll` new utterances become visible on each fetch.
    pub fn with_script(lines: Vec<(Option<String>, String)>, per_poll: usize) -> Self {
        Self {
            lines,
            per_poll: per_poll.max(1),
            revealed: Mutex::new(0),
        }
    }
}

impl Default for MockTranscriptSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptSource for MockTranscriptSource {
    async fn fetch(&self, meeting_id: &str) -> Result<TranscriptPage, SourceError> {
        let mut revealed = self.revealed.lock().unwrap();
        *revealed = (*revealed + self.per_poll).min(self.lines.len());

        let utterances = self.lines[..*revealed]
            .iter()
            .enumerate()
            .map(|(i, (speaker, text))| TranscriptUtterance {
                meeting_id: meeting_id.to_string(),
                speaker: speaker.clone(),
                text: text.clone(),
                start_time: i as f64 * 5.0,
                end_time: Some(i as f64 * 5.0 + 4.0),
                sequence: Some(i as u64),
                source: "mock".to_string(),
            })
            .collect();

        Ok(TranscriptPage {
            utterances,
            finalized: *revealed == self.lines.len(),
        })
    }
}
