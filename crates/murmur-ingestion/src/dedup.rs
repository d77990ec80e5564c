//! Seen-set dedup state for the ingestion pipeline.
//!
//! Two-phase marking: an identity only becomes durably "seen" after the
//! store confirms it. Identities whose store attempt failed are released
//! for retry on a later cycle. The separate `notified` set keeps the
//! observer hook at exactly-once per identity no matter how many store
//! attempts the identity needs.
//!
//! Owned by one pipeline instance and scoped to one meeting. Grows
//! monotonically with meeting length; cleared only on process restart,
//! where the store's idempotent upsert is the second line of defense.

use std::collections::HashSet;

use murmur_common::UtteranceId;

#[derive(Debug, Default)]
pub struct SeenSet {
    notified: HashSet<UtteranceId>,
    in_flight: HashSet<UtteranceId>,
    stored: HashSet<UtteranceId>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity is already stored, or a store attempt is outstanding.
    /// Such identities are filtered out of the cycle's new batch.
    pub fn is_pending_or_stored(&self, id: &UtteranceId) -> bool {
        self.stored.contains(id) || self.in_flight.contains(id)
    }

    pub fn was_notified(&self, id: &UtteranceId) -> bool {
        self.notified.contains(id)
    }

    pub fn mark_notified(&mut self, id: UtteranceId) {
        self.notified.insert(id);
    }

    /// Move a batch into the in-flight state ahead of a store attempt.
    pub fn begin_store(&mut self, ids: &[UtteranceId]) {
        self.in_flight.extend(ids.iter().copied());
    }

    /// Confirm identities durably stored. Terminal.
    pub fn commit(&mut self, ids: &[UtteranceId]) {
        for id in ids {
            self.in_flight.remove(id);
            self.stored.insert(*id);
        }
    }

    /// Release identities whose store failed so a later cycle retries them.
    /// Leaves `notified` untouched.
    pub fn release(&mut self, ids: &[UtteranceId]) {
        for id in ids {
            self.in_flight.remove(id);
        }
    }

    pub fn stored_count(&self) -> usize {
        self.stored.len()
    }
}
