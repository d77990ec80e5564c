//! Transcript ingestion pipeline.
//!
//! Drives the poll cadence for one meeting and enforces dedup:
//!   1. Fetch the current transcript page from the source
//!   2. Filter out identities already stored or in flight
//!   3. Notify the observer hook for each genuinely new utterance, in order
//!   4. Upsert the new batch; only confirmed identities become "seen"
//!   5. Sleep until the next cycle, or stop on shutdown/finalized transcript
//!
//! Everything except an authentication rejection is contained within a
//! single cycle: the source's overlap contract makes a skipped cycle safe,
//! and a failed store releases its identities for retry on the next poll.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use murmur_common::{SourceError, TranscriptUtterance, UtteranceId};
use murmur_store::UtteranceStore;

use crate::dedup::SeenSet;
use crate::sources::TranscriptSource;

/// Observer hook invoked synchronously for each new utterance, in emission
/// order, before storage. Runs on the pipeline task: implementations should
/// return well under the poll interval (soft budget ~100 ms) and offload
/// anything slower onto their own bounded queue. The hook point exists for
/// downstream processing such as decision-moment detection.
pub type UtteranceObserver = Box<dyn Fn(&TranscriptUtterance) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub meeting_id: String,
    /// Delay between poll cycles.
    pub poll_interval: Duration,
    /// Stop after this many cycles. None runs until shutdown or the
    /// transcript finalizes.
    pub max_cycles: Option<u64>,
}

impl PipelineConfig {
    pub fn new(meeting_id: impl Into<String>) -> Self {
        Self {
            meeting_id: meeting_id.into(),
            poll_interval: Duration::from_secs(2),
            max_cycles: None,
        }
    }
}

/// Counters for one pipeline run.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct PipelineStats {
    pub polls: u64,
    pub ingested: u64,
    pub duplicates_skipped: u64,
    /// Store re-submissions of identities the hook had already seen.
    pub retried: u64,
    pub errors: u64,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),
}

enum CycleOutcome {
    Continue,
    Finalized,
    Shutdown,
}

pub struct IngestionPipeline {
    source: Arc<dyn TranscriptSource>,
    store: Arc<dyn UtteranceStore>,
    config: PipelineConfig,
    observer: Option<UtteranceObserver>,
    seen: SeenSet,
    stats: PipelineStats,
}

impl IngestionPipeline {
    pub fn new(
        source: Arc<dyn TranscriptSource>,
        store: Arc<dyn UtteranceStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            store,
            config,
            observer: None,
            seen: SeenSet::new(),
            stats: PipelineStats::default(),
        }
    }

    pub fn with_observer(mut self, observer: UtteranceObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Run until shutdown, a finalized transcript, the cycle limit, or a
    /// fatal source error. Returns the run's counters.
    ///
    /// Shutdown interrupts an in-flight fetch and the inter-cycle sleep
    /// immediately; a cycle whose page already landed is drained (notified
    /// and stored) before exit.
    #[instrument(skip_all, fields(meeting_id = %self.config.meeting_id))]
    pub async fn run(
        mut self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<PipelineStats, PipelineError> {
        info!(
            poll_interval = ?self.config.poll_interval,
            "Ingestion pipeline starting"
        );

        let mut cycle: u64 = 0;
        loop {
            if *shutdown.borrow() {
                break;
            }
            cycle += 1;

            match self.poll_cycle(cycle, &mut shutdown).await? {
                CycleOutcome::Continue => {}
                CycleOutcome::Finalized => {
                    info!(cycle, "Transcript finalized, stopping");
                    break;
                }
                CycleOutcome::Shutdown => {
                    info!(cycle, "Shutdown during poll, stopping");
                    break;
                }
            }

            if let Some(max) = self.config.max_cycles {
                if cycle >= max {
                    debug!(cycle, "Cycle limit reached");
                    break;
                }
            }

            tokio::select! {
                _ = sleep(self.config.poll_interval) => {}
                _ = shutdown.changed() => {
                    info!("Shutdown during sleep, stopping");
                    break;
                }
            }
        }

        info!(
            polls = self.stats.polls,
            ingested = self.stats.ingested,
            duplicates_skipped = self.stats.duplicates_skipped,
            retried = self.stats.retried,
            errors = self.stats.errors,
            "Ingestion pipeline stopped"
        );
        Ok(self.stats)
    }

    /// One poll cycle: fetch → filter → notify → store.
    async fn poll_cycle(
        &mut self,
        cycle: u64,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<CycleOutcome, PipelineError> {
        self.stats.polls += 1;

        let fetched = tokio::select! {
            fetched = self.source.fetch(&self.config.meeting_id) => fetched,
            _ = shutdown.changed() => return Ok(CycleOutcome::Shutdown),
        };

        let page = match fetched {
            Ok(page) => page,
            Err(err) if err.is_fatal() => {
                warn!(cycle, error = %err, "Fatal source error, stopping pipeline");
                return Err(err.into());
            }
            Err(err) => {
                self.stats.errors += 1;
                warn!(cycle, kind = err.kind(), error = %err, "Poll failed, skipping cycle");
                return Ok(CycleOutcome::Continue);
            }
        };
        let finalized = page.finalized;

        // Filter. Identity lookup, never positional comparison: the source
        // may re-deliver utterances in a different order than a prior poll.
        let mut batch: Vec<(UtteranceId, TranscriptUtterance)> = Vec::new();
        for utterance in page.utterances {
            if !utterance.is_storable() {
                continue;
            }
            let id = utterance.dedup_id();
            if self.seen.is_pending_or_stored(&id)
                || batch.iter().any(|(queued, _)| *queued == id)
            {
                self.stats.duplicates_skipped += 1;
                continue;
            }
            batch.push((id, utterance));
        }

        if batch.is_empty() {
            debug!(cycle, "No new utterances");
            return Ok(self.cycle_outcome(finalized));
        }

        // Notify: exactly once per identity, in emission order, before
        // storage. Identities re-batched after a store failure skip this.
        for (id, utterance) in &batch {
            if self.seen.was_notified(id) {
                self.stats.retried += 1;
                continue;
            }
            if let Some(ref observer) = self.observer {
                observer(utterance);
            }
            self.seen.mark_notified(*id);
        }

        // Store. Identities become "seen" per the store's confirmation,
        // never at filter time: a failed upsert releases them for retry.
        let ids: Vec<UtteranceId> = batch.iter().map(|(id, _)| *id).collect();
        let utterances: Vec<TranscriptUtterance> =
            batch.into_iter().map(|(_, u)| u).collect();
        self.seen.begin_store(&ids);

        match self.store.upsert_batch(&utterances).await {
            Ok(report) => {
                self.seen.commit(&report.stored);
                self.stats.ingested += report.stored.len() as u64;
                if !report.failed.is_empty() {
                    self.stats.errors += 1;
                    self.seen.release(&report.failed);
                    warn!(
                        cycle,
                        failed = report.failed.len(),
                        "Partial store failure, deferring to next cycle"
                    );
                }
                for (id, utterance) in ids.iter().zip(&utterances) {
                    if report.stored.contains(id) {
                        info!(
                            speaker = utterance.speaker.as_deref().unwrap_or("unknown"),
                            text = %truncate(&utterance.text, 60),
                            "Utterance ingested"
                        );
                    }
                }
            }
            Err(err) => {
                self.stats.errors += 1;
                self.seen.release(&ids);
                warn!(cycle, error = %err, "Store failed, batch deferred to next cycle");
            }
        }

        Ok(self.cycle_outcome(finalized))
    }

    fn cycle_outcome(&self, finalized: bool) -> CycleOutcome {
        if finalized {
            CycleOutcome::Finalized
        } else {
            CycleOutcome::Continue
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 60), "short");
        let long = "é".repeat(80);
        let cut = truncate(&long, 60);
        assert_eq!(cut.chars().count(), 61); // 60 chars + ellipsis
    }
}
