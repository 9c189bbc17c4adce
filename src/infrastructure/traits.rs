//! Persistence and grade-source boundary traits
//!
//! These traits abstract the relational store and the external gradebook,
//! allowing services to be tested with in-memory implementations.

use crate::domain::{
    Area, AreaId, Attempt, CourseId, DomainResult, GradeItemId, Mark, MarkHistory, MarkId,
    ModuleId, Outcome, OutcomeId, OutcomeSet, OutcomeUsage, SetId, UsageId, UserId,
};

/// Relational store abstraction for outcomes and mastery data.
///
/// Implementations must enforce idnumber uniqueness at write time
/// (optimistic: the losing writer gets a validation error) and must apply
/// each method atomically. Services validate before mutating, so a failed
/// public operation never leaves a partial renumber or half-applied move
/// behind.
pub trait OutcomeStore: Send + Sync {
    // ---- outcome sets ----

    /// Insert a set, assigning id and timestamps. Fails on duplicate idnumber.
    fn insert_set(&self, set: OutcomeSet) -> DomainResult<OutcomeSet>;

    /// Update an existing set by id, bumping time_modified.
    fn update_set(&self, set: &OutcomeSet) -> DomainResult<()>;

    fn set_by_id(&self, id: SetId) -> Option<OutcomeSet>;

    fn set_by_idnumber(&self, idnumber: &str) -> Option<OutcomeSet>;

    /// All sets, deleted included, ordered by id.
    fn sets(&self) -> Vec<OutcomeSet>;

    // ---- outcomes ----

    /// Insert an outcome, assigning id and timestamps.
    /// Fails on system-wide duplicate idnumber.
    fn insert_outcome(&self, outcome: Outcome) -> DomainResult<Outcome>;

    /// Update an existing outcome by id, bumping time_modified.
    fn update_outcome(&self, outcome: &Outcome) -> DomainResult<()>;

    /// Update a batch of outcomes. All rows are validated for existence
    /// before any is written.
    fn update_outcomes(&self, outcomes: &[Outcome]) -> DomainResult<()>;

    fn outcome_by_id(&self, id: OutcomeId) -> Option<Outcome>;

    fn outcome_by_idnumber(&self, idnumber: &str) -> Option<Outcome>;

    /// Children of `parent` within `set`, ordered by sortorder ascending
    /// (ties broken by id). `parent = None` selects the set's roots.
    fn children(
        &self,
        set: SetId,
        parent: Option<OutcomeId>,
        include_deleted: bool,
    ) -> Vec<Outcome>;

    /// Every outcome in a set, ordered by sortorder within parent groups.
    fn outcomes_in_set(&self, set: SetId, include_deleted: bool) -> Vec<Outcome>;

    // ---- areas and outcome usages ----

    /// Insert an area, assigning id. Fails if (component, area, item_id)
    /// already exists.
    fn insert_area(&self, area: Area) -> DomainResult<Area>;

    fn area_by_id(&self, id: AreaId) -> Option<Area>;

    fn area_by_key(&self, component: &str, area: &str, item_id: i64) -> Option<Area>;

    fn insert_usage(&self, usage: OutcomeUsage) -> DomainResult<OutcomeUsage>;

    fn delete_usage(&self, id: UsageId) -> DomainResult<()>;

    fn usages_for_area(&self, area: AreaId) -> Vec<OutcomeUsage>;

    /// Register a course-module as a user of an area. One area can be
    /// shared by several modules (e.g. shared question banks).
    fn register_module(&self, area: AreaId, cmid: ModuleId) -> DomainResult<()>;

    fn area_for_module(&self, cmid: ModuleId) -> Option<Area>;

    // ---- attempts ----

    /// Insert or replace the attempt for (usage, user).
    fn upsert_attempt(&self, attempt: Attempt) -> DomainResult<Attempt>;

    /// Delete the attempt for (usage, user). Returns whether a row existed.
    fn delete_attempt(&self, usage: UsageId, user: UserId) -> DomainResult<bool>;

    fn attempt_for(&self, usage: UsageId, user: UserId) -> Option<Attempt>;

    // ---- marks ----

    fn insert_mark(&self, mark: Mark) -> DomainResult<Mark>;

    fn update_mark(&self, mark: &Mark) -> DomainResult<()>;

    fn delete_mark(&self, id: MarkId) -> DomainResult<()>;

    fn mark_for(&self, course: CourseId, outcome: OutcomeId, user: UserId) -> Option<Mark>;

    // ---- mark history (append-only) ----

    /// Append a history row, assigning id. History is never updated or
    /// deleted; no such methods exist on this trait.
    fn append_history(&self, row: MarkHistory) -> DomainResult<MarkHistory>;

    /// All history rows for (outcome, user) across every course,
    /// chronological.
    fn history_for(&self, outcome: OutcomeId, user: UserId) -> Vec<MarkHistory>;
}

/// External gradebook callback: resolve a grade-item to the content module
/// that owns it. The mastery engine consumes grade events and only calls
/// back for this resolution.
pub trait GradeSource: Send + Sync {
    fn module_for_item(&self, item: GradeItemId) -> Option<ModuleId>;
}
