//! Mastery engine
//!
//! Captures external grade events as attempts and converts caller-supplied
//! earning decisions into marks, with one history row per actual state
//! transition. The engine holds its collaborators explicitly and a small
//! last-grade-item cache as instance state scoped to one sync batch.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::application::services::{AreaService, LedgerService};
use crate::application::ApplicationResult;
use crate::domain::{
    Area, Attempt, CourseId, DomainError, GradeEvent, GradeItemId, HistoryAction, Mark,
    MarkResult, Outcome, OutcomeId, UserId,
};
use crate::infrastructure::traits::{GradeSource, OutcomeStore};

/// Service computing earned/not-earned state from grade signals.
pub struct MasteryService {
    store: Arc<dyn OutcomeStore>,
    areas: Arc<AreaService>,
    ledger: Arc<LedgerService>,
    grades: Arc<dyn GradeSource>,
    /// Memo for the most recently resolved grade item. Batches usually
    /// deliver many grades for the same activity in a row; the cache is
    /// invalidated as soon as a different item id arrives.
    last_item: Option<(GradeItemId, Option<Area>)>,
}

impl MasteryService {
    pub fn new(
        store: Arc<dyn OutcomeStore>,
        areas: Arc<AreaService>,
        ledger: Arc<LedgerService>,
        grades: Arc<dyn GradeSource>,
    ) -> Self {
        Self {
            store,
            areas,
            ledger,
            grades,
            last_item: None,
        }
    }

    /// Capture one grade event.
    ///
    /// Resolves the grade item to its area; unmapped items and
    /// non-assessable outcomes are ignored. A present grade upserts the
    /// attempt per mapped outcome; an absent grade deletes it. Marks are
    /// never touched here: once earned, site-level credit survives grade
    /// deletion until explicitly revoked.
    pub fn process_grade(&mut self, event: &GradeEvent) -> ApplicationResult<()> {
        let Some(area) = self.resolve_area(event.item_id) else {
            debug!("process_grade: item {} not mapped, ignored", event.item_id);
            return Ok(());
        };
        debug!(
            "process_grade: item={} user={} area={} ({})",
            event.item_id,
            event.user_id,
            area.id,
            self.areas.describe(&area).item_name()
        );
        for usage in self.areas.usages_for_area(area.id) {
            let assessable = self
                .store
                .outcome_by_id(usage.outcome_id)
                .map(|o| o.assessable && !o.deleted)
                .unwrap_or(false);
            if !assessable {
                continue;
            }
            match event.percent() {
                Some(percent) => {
                    self.store.upsert_attempt(Attempt {
                        id: 0,
                        usage_id: usage.id,
                        user_id: event.user_id,
                        rawgrade: event.rawgrade.unwrap_or_default(),
                        mingrade: event.mingrade,
                        maxgrade: event.maxgrade,
                        percentgrade: percent,
                        time_created: Utc::now(),
                        time_modified: Utc::now(),
                    })?;
                }
                None => {
                    self.store.delete_attempt(usage.id, event.user_id)?;
                }
            }
        }
        Ok(())
    }

    /// Bulk-update marks for a set of candidate outcomes.
    ///
    /// `earned` is the subset of `candidates` now considered earned, as
    /// computed by the caller's grading policy. Idempotent: only outcomes
    /// whose stored result actually changes get a write and a history row;
    /// the grader is stamped only on changed rows. Returns the number of
    /// changed marks.
    pub fn update_mark_earned(
        &self,
        course: CourseId,
        user: UserId,
        grader: UserId,
        candidates: &[OutcomeId],
        earned: &HashSet<OutcomeId>,
    ) -> ApplicationResult<usize> {
        let mut changed = 0;
        for &outcome_id in candidates {
            let outcome = self
                .store
                .outcome_by_id(outcome_id)
                .ok_or(DomainError::OutcomeNotFound(outcome_id))?;
            let desired = if earned.contains(&outcome_id) {
                MarkResult::Earned
            } else {
                MarkResult::NotEarned
            };
            match self.store.mark_for(course, outcome_id, user) {
                Some(mark) if mark.result == desired => {
                    // Unchanged: skip, no history row.
                }
                Some(mut mark) => {
                    mark.result = desired;
                    mark.grader_id = grader;
                    self.store.update_mark(&mark)?;
                    self.ledger.record(HistoryAction::Update, &mark)?;
                    changed += 1;
                }
                None => {
                    if !outcome.assessable {
                        return Err(DomainError::NotAssessable {
                            idnumber: outcome.idnumber,
                        }
                        .into());
                    }
                    let mark = self.store.insert_mark(Mark::new(
                        course, outcome_id, user, desired, grader,
                    ))?;
                    self.ledger.record(HistoryAction::Create, &mark)?;
                    changed += 1;
                }
            }
        }
        debug!(
            "update_mark_earned: course={} user={} candidates={} changed={}",
            course,
            user,
            candidates.len(),
            changed
        );
        Ok(changed)
    }

    /// Mark a single outcome as earned.
    ///
    /// Fails before any write when the outcome is not assessable; that
    /// indicates an upstream mapping bug, not a condition to swallow.
    pub fn mark_outcome_as_earned(
        &self,
        course: CourseId,
        user: UserId,
        grader: UserId,
        outcome: &Outcome,
    ) -> ApplicationResult<Mark> {
        if !outcome.assessable {
            return Err(DomainError::NotAssessable {
                idnumber: outcome.idnumber.clone(),
            }
            .into());
        }
        match self.store.mark_for(course, outcome.id, user) {
            Some(mark) if mark.result == MarkResult::Earned => Ok(mark),
            Some(mut mark) => {
                mark.result = MarkResult::Earned;
                mark.grader_id = grader;
                self.store.update_mark(&mark)?;
                self.ledger.record(HistoryAction::Update, &mark)?;
                Ok(mark)
            }
            None => {
                let mark = self.store.insert_mark(Mark::new(
                    course,
                    outcome.id,
                    user,
                    MarkResult::Earned,
                    grader,
                ))?;
                self.ledger.record(HistoryAction::Create, &mark)?;
                Ok(mark)
            }
        }
    }

    /// Explicitly revoke a mark (caller policy). Deletes the mark and
    /// appends a Delete history row with its last known state. Returns
    /// whether a mark existed.
    pub fn revoke_mark(
        &self,
        course: CourseId,
        outcome: OutcomeId,
        user: UserId,
        grader: UserId,
    ) -> ApplicationResult<bool> {
        match self.store.mark_for(course, outcome, user) {
            Some(mut mark) => {
                self.store.delete_mark(mark.id)?;
                mark.grader_id = grader;
                self.ledger.record(HistoryAction::Delete, &mark)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Resolve a grade item to its area via the grade source and the
    /// mapping service, memoizing the most recent item.
    fn resolve_area(&mut self, item: GradeItemId) -> Option<Area> {
        if let Some((cached_item, area)) = &self.last_item {
            if *cached_item == item {
                return area.clone();
            }
        }
        let area = self
            .grades
            .module_for_item(item)
            .and_then(|cmid| self.areas.area_for_module(cmid));
        self.last_item = Some((item, area.clone()));
        area
    }
}
