//! In-memory reference implementation of the storage boundary
//!
//! Tables live behind a single RwLock; ids are assigned monotonically per
//! table starting at 1. Uniqueness constraints (set/outcome idnumber, area
//! key, one attempt per usage+user, one mark per course+outcome+user) are
//! enforced at write time, mirroring what a relational backend would do
//! with unique indexes.

use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::Utc;

use crate::domain::{
    Area, AreaId, Attempt, CourseId, DomainError, DomainResult, Mark, MarkHistory, MarkId,
    ModuleId, Outcome, OutcomeId, OutcomeSet, OutcomeUsage, SetId, UsageId, UserId,
};
use crate::infrastructure::traits::OutcomeStore;

#[derive(Debug, Default)]
struct Tables {
    sets: BTreeMap<SetId, OutcomeSet>,
    outcomes: BTreeMap<OutcomeId, Outcome>,
    areas: BTreeMap<AreaId, Area>,
    usages: BTreeMap<UsageId, OutcomeUsage>,
    area_modules: Vec<(AreaId, ModuleId)>,
    attempts: BTreeMap<i64, Attempt>,
    marks: BTreeMap<MarkId, Mark>,
    history: BTreeMap<i64, MarkHistory>,
    next_set: SetId,
    next_outcome: OutcomeId,
    next_area: AreaId,
    next_usage: UsageId,
    next_attempt: i64,
    next_mark: MarkId,
    next_history: i64,
}

impl Tables {
    fn new() -> Self {
        Self {
            next_set: 1,
            next_outcome: 1,
            next_area: 1,
            next_usage: 1,
            next_attempt: 1,
            next_mark: 1,
            next_history: 1,
            ..Default::default()
        }
    }
}

/// In-memory `OutcomeStore`.
#[derive(Debug)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::new()),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn ordered(mut outcomes: Vec<Outcome>) -> Vec<Outcome> {
    outcomes.sort_by_key(|o| (o.sortorder, o.id));
    outcomes
}

impl OutcomeStore for MemoryStore {
    fn insert_set(&self, mut set: OutcomeSet) -> DomainResult<OutcomeSet> {
        let mut t = self.write();
        if t.sets.values().any(|s| s.idnumber == set.idnumber) {
            return Err(DomainError::DuplicateSetIdnumber(set.idnumber));
        }
        set.id = t.next_set;
        t.next_set += 1;
        set.time_created = Utc::now();
        set.time_modified = set.time_created;
        t.sets.insert(set.id, set.clone());
        Ok(set)
    }

    fn update_set(&self, set: &OutcomeSet) -> DomainResult<()> {
        let mut t = self.write();
        if !t.sets.contains_key(&set.id) {
            return Err(DomainError::SetNotFound(set.id));
        }
        let mut row = set.clone();
        row.time_modified = Utc::now();
        t.sets.insert(row.id, row);
        Ok(())
    }

    fn set_by_id(&self, id: SetId) -> Option<OutcomeSet> {
        self.read().sets.get(&id).cloned()
    }

    fn set_by_idnumber(&self, idnumber: &str) -> Option<OutcomeSet> {
        self.read()
            .sets
            .values()
            .find(|s| s.idnumber == idnumber)
            .cloned()
    }

    fn sets(&self) -> Vec<OutcomeSet> {
        self.read().sets.values().cloned().collect()
    }

    fn insert_outcome(&self, mut outcome: Outcome) -> DomainResult<Outcome> {
        let mut t = self.write();
        if t.outcomes.values().any(|o| o.idnumber == outcome.idnumber) {
            return Err(DomainError::DuplicateIdnumber(outcome.idnumber));
        }
        if !t.sets.contains_key(&outcome.outcomeset_id) {
            return Err(DomainError::SetNotFound(outcome.outcomeset_id));
        }
        outcome.id = t.next_outcome;
        t.next_outcome += 1;
        outcome.time_created = Utc::now();
        outcome.time_modified = outcome.time_created;
        t.outcomes.insert(outcome.id, outcome.clone());
        Ok(outcome)
    }

    fn update_outcome(&self, outcome: &Outcome) -> DomainResult<()> {
        self.update_outcomes(std::slice::from_ref(outcome))
    }

    fn update_outcomes(&self, outcomes: &[Outcome]) -> DomainResult<()> {
        let mut t = self.write();
        // Validate the whole batch before writing any row.
        for outcome in outcomes {
            if !t.outcomes.contains_key(&outcome.id) {
                return Err(DomainError::OutcomeNotFound(outcome.id));
            }
        }
        let now = Utc::now();
        for outcome in outcomes {
            let mut row = outcome.clone();
            row.time_modified = now;
            t.outcomes.insert(row.id, row);
        }
        Ok(())
    }

    fn outcome_by_id(&self, id: OutcomeId) -> Option<Outcome> {
        self.read().outcomes.get(&id).cloned()
    }

    fn outcome_by_idnumber(&self, idnumber: &str) -> Option<Outcome> {
        self.read()
            .outcomes
            .values()
            .find(|o| o.idnumber == idnumber)
            .cloned()
    }

    fn children(
        &self,
        set: SetId,
        parent: Option<OutcomeId>,
        include_deleted: bool,
    ) -> Vec<Outcome> {
        let t = self.read();
        ordered(
            t.outcomes
                .values()
                .filter(|o| {
                    o.outcomeset_id == set
                        && o.parent_id == parent
                        && (include_deleted || !o.deleted)
                })
                .cloned()
                .collect(),
        )
    }

    fn outcomes_in_set(&self, set: SetId, include_deleted: bool) -> Vec<Outcome> {
        let t = self.read();
        let mut rows: Vec<Outcome> = t
            .outcomes
            .values()
            .filter(|o| o.outcomeset_id == set && (include_deleted || !o.deleted))
            .cloned()
            .collect();
        rows.sort_by_key(|o| (o.parent_id, o.sortorder, o.id));
        rows
    }

    fn insert_area(&self, mut area: Area) -> DomainResult<Area> {
        let mut t = self.write();
        debug_assert!(
            !t.areas.values().any(|a| {
                a.component == area.component && a.area == area.area && a.item_id == area.item_id
            }),
            "area key must be unique; use area_by_key before insert"
        );
        area.id = t.next_area;
        t.next_area += 1;
        t.areas.insert(area.id, area.clone());
        Ok(area)
    }

    fn area_by_id(&self, id: AreaId) -> Option<Area> {
        self.read().areas.get(&id).cloned()
    }

    fn area_by_key(&self, component: &str, area: &str, item_id: i64) -> Option<Area> {
        self.read()
            .areas
            .values()
            .find(|a| a.component == component && a.area == area && a.item_id == item_id)
            .cloned()
    }

    fn insert_usage(&self, mut usage: OutcomeUsage) -> DomainResult<OutcomeUsage> {
        let mut t = self.write();
        usage.id = t.next_usage;
        t.next_usage += 1;
        t.usages.insert(usage.id, usage.clone());
        Ok(usage)
    }

    fn delete_usage(&self, id: UsageId) -> DomainResult<()> {
        self.write().usages.remove(&id);
        Ok(())
    }

    fn usages_for_area(&self, area: AreaId) -> Vec<OutcomeUsage> {
        self.read()
            .usages
            .values()
            .filter(|u| u.area_id == area)
            .cloned()
            .collect()
    }

    fn register_module(&self, area: AreaId, cmid: ModuleId) -> DomainResult<()> {
        let mut t = self.write();
        if !t.area_modules.contains(&(area, cmid)) {
            t.area_modules.push((area, cmid));
        }
        Ok(())
    }

    fn area_for_module(&self, cmid: ModuleId) -> Option<Area> {
        let t = self.read();
        let area_id = t
            .area_modules
            .iter()
            .find(|(_, m)| *m == cmid)
            .map(|(a, _)| *a)?;
        t.areas.get(&area_id).cloned()
    }

    fn upsert_attempt(&self, mut attempt: Attempt) -> DomainResult<Attempt> {
        let mut t = self.write();
        let existing = t
            .attempts
            .values()
            .find(|a| a.usage_id == attempt.usage_id && a.user_id == attempt.user_id)
            .map(|a| (a.id, a.time_created));
        match existing {
            Some((id, created)) => {
                attempt.id = id;
                attempt.time_created = created;
                attempt.time_modified = Utc::now();
            }
            None => {
                attempt.id = t.next_attempt;
                t.next_attempt += 1;
                attempt.time_created = Utc::now();
                attempt.time_modified = attempt.time_created;
            }
        }
        t.attempts.insert(attempt.id, attempt.clone());
        Ok(attempt)
    }

    fn delete_attempt(&self, usage: UsageId, user: UserId) -> DomainResult<bool> {
        let mut t = self.write();
        let id = t
            .attempts
            .values()
            .find(|a| a.usage_id == usage && a.user_id == user)
            .map(|a| a.id);
        match id {
            Some(id) => {
                t.attempts.remove(&id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn attempt_for(&self, usage: UsageId, user: UserId) -> Option<Attempt> {
        self.read()
            .attempts
            .values()
            .find(|a| a.usage_id == usage && a.user_id == user)
            .cloned()
    }

    fn insert_mark(&self, mut mark: Mark) -> DomainResult<Mark> {
        let mut t = self.write();
        mark.id = t.next_mark;
        t.next_mark += 1;
        mark.time_created = Utc::now();
        mark.time_modified = mark.time_created;
        t.marks.insert(mark.id, mark.clone());
        Ok(mark)
    }

    fn update_mark(&self, mark: &Mark) -> DomainResult<()> {
        let mut t = self.write();
        let mut row = mark.clone();
        row.time_modified = Utc::now();
        t.marks.insert(row.id, row);
        Ok(())
    }

    fn delete_mark(&self, id: MarkId) -> DomainResult<()> {
        self.write().marks.remove(&id);
        Ok(())
    }

    fn mark_for(&self, course: CourseId, outcome: OutcomeId, user: UserId) -> Option<Mark> {
        self.read()
            .marks
            .values()
            .find(|m| m.course_id == course && m.outcome_id == outcome && m.user_id == user)
            .cloned()
    }

    fn append_history(&self, mut row: MarkHistory) -> DomainResult<MarkHistory> {
        let mut t = self.write();
        row.id = t.next_history;
        t.next_history += 1;
        row.time_created = Utc::now();
        t.history.insert(row.id, row.clone());
        Ok(row)
    }

    fn history_for(&self, outcome: OutcomeId, user: UserId) -> Vec<MarkHistory> {
        self.read()
            .history
            .values()
            .filter(|h| h.outcome_id == outcome && h.user_id == user)
            .cloned()
            .collect()
    }
}
