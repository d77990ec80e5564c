//! Meeting-bot API client.
//!
//! Fetches live transcript segments over REST with a bearer credential.
//! Endpoints:
//!   GET {base}/meetings/{meeting_id}/transcript
//!   GET {base}/meetings/{meeting_id}/status
//!
//! The transcript endpoint returns the full transcript accumulated so far,
//! so array positions are stable ordinals and successive polls overlap.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use murmur_common::{SourceError, TranscriptUtterance};

use super::{TranscriptPage, TranscriptSource};

pub const DEFAULT_BASE_URL: &str = "https://api.murmur.dev/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct BotApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl BotApiClient {
    pub fn new(api_key: SecretString, base_url: Option<String>) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SourceError::Transport(format!("failed to build HTTP client: {e}")))?;
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Whether the meeting is still running. On probe failure the meeting is
    /// assumed active; `fetch` surfaces any real error.
    async fn meeting_active(&self, meeting_id: &str) -> bool {
        let url = format!("{}/meetings/{}/status", self.base_url, meeting_id);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await;
        match resp {
            Ok(r) if r.status().is_success() => match r.json::<Value>().await {
                Ok(body) => body["status"].as_str() != Some("ended"),
                Err(_) => true,
            },
            _ => true,
        }
    }

    fn normalize(&self, body: &Value, meeting_id: &str) -> Result<Vec<TranscriptUtterance>, SourceError> {
        let items = body["transcript"].as_array().ok_or_else(|| {
            SourceError::Malformed("response is missing a `transcript` array".to_string())
        })?;

        let mut utterances = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            let Some(text) = item["text"].as_str() else {
                warn!(index = idx, "Transcript item has no text, skipping");
                continue;
            };
            if text.trim().is_empty() {
                continue;
            }
            let Some(start_time) = item["start_time"].as_f64() else {
                warn!(index = idx, "Transcript item has no start_time, skipping");
                continue;
            };
            // An end before the start is source noise; drop the span rather
            // than letting an inverted interval into the store.
            let end_time = item["end_time"].as_f64().filter(|e| *e >= start_time);

            utterances.push(TranscriptUtterance {
                meeting_id: meeting_id.to_string(),
                speaker: item["speaker"].as_str().map(String::from),
                text: text.to_string(),
                start_time,
                end_time,
                sequence: item["sequence"].as_u64().or(Some(idx as u64)),
                source: "bot-api".to_string(),
            });
        }
        Ok(utterances)
    }
}

#[async_trait]
impl TranscriptSource for BotApiClient {
    #[instrument(skip(self))]
    async fn fetch(&self, meeting_id: &str) -> Result<TranscriptPage, SourceError> {
        let url = format!("{}/meetings/{}/transcript", self.base_url, meeting_id);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await
            .map_err(SourceError::from)?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SourceError::Auth(format!(
                "bot API rejected credential: HTTP {status}"
            )));
        }
        if !status.is_success() {
            return Err(SourceError::Transport(format!(
                "bot API returned HTTP {status}"
            )));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| SourceError::Malformed(format!("invalid JSON body: {e}")))?;

        let utterances = self.normalize(&body, meeting_id)?;
        debug!(count = utterances.len(), "Fetched transcript page");

        // Completion comes from the body when present, else the status probe.
        let finalized = match body["finalized"].as_bool() {
            Some(f) => f,
            None => !self.meeting_active(meeting_id).await,
        };

        Ok(TranscriptPage {
            utterances,
            finalized,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> BotApiClient {
        BotApiClient::new(SecretString::from("test-key".to_string()), None).unwrap()
    }

    #[test]
    fn test_normalize_skips_bad_items() {
        let body = json!({
            "transcript": [
                {"speaker": "Alice", "text": "hello", "start_time": 1.0, "end_time": 2.0},
                {"speaker": "Bob"},
                {"speaker": "Bob", "text": "   ", "start_time": 3.0},
                {"speaker": "Bob", "text": "world", "start_time": 4.0},
            ]
        });
        let utterances = client().normalize(&body, "meet-1").unwrap();
        assert_eq!(utterances.len(), 2);
        assert_eq!(utterances[0].text, "hello");
        assert_eq!(utterances[1].text, "world");
        // Positions are stable ordinals, including skipped slots.
        assert_eq!(utterances[0].sequence, Some(0));
        assert_eq!(utterances[1].sequence, Some(3));
    }

    #[test]
    fn test_normalize_rejects_missing_transcript() {
        let body = json!({"error": "nope"});
        let err = client().normalize(&body, "meet-1").unwrap_err();
        assert!(matches!(err, SourceError::Malformed(_)));
    }

    #[test]
    fn test_normalize_drops_inverted_spans() {
        let body = json!({
            "transcript": [
                {"speaker": "Alice", "text": "hello", "start_time": 5.0, "end_time": 1.0},
            ]
        });
        let utterances = client().normalize(&body, "meet-1").unwrap();
        assert_eq!(utterances[0].end_time, None);
    }

    #[test]
    fn test_source_sequence_wins_over_position() {
        let body = json!({
            "transcript": [
                {"text": "hello", "start_time": 1.0, "sequence": 41},
            ]
        });
        let utterances = client().normalize(&body, "meet-1").unwrap();
        assert_eq!(utterances[0].sequence, Some(41));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = BotApiClient::new(
            SecretString::from("k".to_string()),
            Some("https://bots.example/v2/".to_string()),
        )
        .unwrap();
        assert_eq!(client.base_url, "https://bots.example/v2");
    }
}
