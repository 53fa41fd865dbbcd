//! Saved-job set mirrored from the server, with a pending sub-state for
//! toggles that are still in flight.

use std::collections::{HashMap, HashSet};

use crate::error::JobError;
use crate::jobs::model::JobId;

/// The current applicant's bookmarked jobs.
///
/// `confirmed` mirrors what the server last acknowledged. `pending` holds the
/// target membership of a toggle whose response has not arrived yet; at most
/// one toggle per job may be in flight.
#[derive(Debug, Clone, Default)]
pub struct SavedJobIds {
    confirmed: HashSet<JobId>,
    pending: HashMap<JobId, bool>,
}

impl SavedJobIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the confirmed set with a fresh server snapshot.
    /// In-flight toggles are kept.
    pub fn replace<I: IntoIterator<Item = JobId>>(&mut self, ids: I) {
        self.confirmed = ids.into_iter().collect();
    }

    /// Server-acknowledged membership.
    pub fn is_saved(&self, id: JobId) -> bool {
        self.confirmed.contains(&id)
    }

    /// Membership to display: the pending target if a toggle is in flight.
    pub fn displayed(&self, id: JobId) -> bool {
        self.pending
            .get(&id)
            .copied()
            .unwrap_or_else(|| self.is_saved(id))
    }

    pub fn is_pending(&self, id: JobId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Start a toggle. Returns the target membership (true = save).
    pub fn begin_toggle(&mut self, id: JobId) -> Result<bool, JobError> {
        if self.pending.contains_key(&id) {
            return Err(JobError::ActionInFlight {
                id,
                action: "save toggle".into(),
            });
        }
        let target = !self.is_saved(id);
        self.pending.insert(id, target);
        Ok(target)
    }

    /// The server confirmed the toggle.
    pub fn commit(&mut self, id: JobId) {
        if let Some(target) = self.pending.remove(&id) {
            if target {
                self.confirmed.insert(id);
            } else {
                self.confirmed.remove(&id);
            }
        }
    }

    /// The toggle failed; membership stays as it was.
    pub fn rollback(&mut self, id: JobId) {
        self.pending.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.confirmed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.confirmed.is_empty()
    }

    /// Confirmed ids in ascending order.
    pub fn ids(&self) -> Vec<JobId> {
        let mut ids: Vec<JobId> = self.confirmed.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}
