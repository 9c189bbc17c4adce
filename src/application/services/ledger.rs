//! Append-only mark history ledger
//!
//! Every mark transition produces exactly one history row; rows are never
//! updated or deleted. The ledger answers "was this outcome ever earned by
//! this user" across all courses, which is what keeps site-level credit
//! alive after a mark or mapping disappears.

use std::sync::Arc;

use tracing::debug;

use crate::application::ApplicationResult;
use crate::domain::{HistoryAction, Mark, MarkHistory, MarkResult, OutcomeId, UserId};
use crate::infrastructure::traits::OutcomeStore;

/// Service for the append-only mark history.
pub struct LedgerService {
    store: Arc<dyn OutcomeStore>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn OutcomeStore>) -> Self {
        Self { store }
    }

    /// Append one row snapshotting the mark's resulting state (for Delete,
    /// the last known state).
    pub fn record(&self, action: HistoryAction, mark: &Mark) -> ApplicationResult<MarkHistory> {
        debug!(
            "record: {:?} mark={} outcome={} user={} result={:?}",
            action, mark.id, mark.outcome_id, mark.user_id, mark.result
        );
        Ok(self
            .store
            .append_history(MarkHistory::snapshot(action, mark))?)
    }

    /// Chronological history for (outcome, user) across every course.
    pub fn history(&self, outcome: OutcomeId, user: UserId) -> Vec<MarkHistory> {
        self.store.history_for(outcome, user)
    }

    /// True if any history row, in any course, shows the outcome as earned.
    /// Holds even when the mark itself has since been deleted.
    pub fn ever_earned(&self, outcome: OutcomeId, user: UserId) -> bool {
        self.store
            .history_for(outcome, user)
            .iter()
            .any(|row| row.result == MarkResult::Earned)
    }
}
