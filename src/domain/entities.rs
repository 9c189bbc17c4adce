//! Domain entities: core data structures

use chrono::{DateTime, Utc};

pub type SetId = i64;
pub type OutcomeId = i64;
pub type AreaId = i64;
pub type UsageId = i64;
pub type AttemptId = i64;
pub type MarkId = i64;
pub type HistoryId = i64;
pub type UserId = i64;
pub type CourseId = i64;
pub type ModuleId = i64;
pub type GradeItemId = i64;

/// A named, versioned collection of outcomes, usually from one
/// external standards body.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeSet {
    pub id: SetId,
    /// Globally unique business key
    pub idnumber: String,
    pub name: String,
    pub description: String,
    pub provider: Option<String>,
    pub revision: Option<String>,
    pub region: Option<String>,
    pub deleted: bool,
    pub time_created: DateTime<Utc>,
    pub time_modified: DateTime<Utc>,
}

impl OutcomeSet {
    /// Create an unsaved set; the store assigns id and timestamps on insert.
    pub fn new(idnumber: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: 0,
            idnumber: idnumber.into(),
            name: name.into(),
            description: String::new(),
            provider: None,
            revision: None,
            region: None,
            deleted: false,
            time_created: Utc::now(),
            time_modified: Utc::now(),
        }
    }
}

/// A single competency/standard statement node in a hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub id: OutcomeId,
    /// Owning set (required)
    pub outcomeset_id: SetId,
    /// None means root of its set
    pub parent_id: Option<OutcomeId>,
    /// Unique across the whole system, not just the set
    pub idnumber: String,
    /// Human document numbering, e.g. "1.2.a"
    pub docnum: Option<String>,
    pub description: String,
    /// Only assessable outcomes can be earned
    pub assessable: bool,
    pub deleted: bool,
    /// Dense, gapless among live siblings (0..n-1)
    pub sortorder: i64,
    pub subjects: Vec<String>,
    pub edulevels: Vec<String>,
    pub time_created: DateTime<Utc>,
    pub time_modified: DateTime<Utc>,
}

impl Outcome {
    /// Create an unsaved outcome; the store assigns id and timestamps on insert.
    pub fn new(
        outcomeset_id: SetId,
        parent_id: Option<OutcomeId>,
        idnumber: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            outcomeset_id,
            parent_id,
            idnumber: idnumber.into(),
            docnum: None,
            description: description.into(),
            assessable: false,
            deleted: false,
            sortorder: 0,
            subjects: Vec::new(),
            edulevels: Vec::new(),
            time_created: Utc::now(),
            time_modified: Utc::now(),
        }
    }
}

/// Where a move lands relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Same parent as target, immediately before it
    Before,
    /// Same parent as target, immediately after it (and its subtree)
    After,
    /// Last child of the target
    ChildOf,
}

/// A location in external content where outcomes are mapped.
/// (component, area, item_id) is unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Area {
    pub id: AreaId,
    pub component: String,
    pub area: String,
    pub item_id: i64,
}

/// Join row: an area uses an outcome. Attempts hang off this row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeUsage {
    pub id: UsageId,
    pub area_id: AreaId,
    pub outcome_id: OutcomeId,
}

/// Display capability for the known area kinds.
///
/// Closed variant set instead of one class per area type; callers match
/// or use the name accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AreaContext {
    /// An activity module instance
    Activity { module: String, instance: String },
    /// A question in a (possibly shared) question bank
    Question { bank: String, question: String },
    /// A rubric criterion in an advanced grading form
    Rubric { criterion: String },
    /// Unrecognized component/area combination
    Generic { component: String, area: String },
}

impl AreaContext {
    pub fn area_name(&self) -> &str {
        match self {
            AreaContext::Activity { .. } => "activity",
            AreaContext::Question { .. } => "question",
            AreaContext::Rubric { .. } => "rubric",
            AreaContext::Generic { area, .. } => area,
        }
    }

    pub fn item_name(&self) -> String {
        match self {
            AreaContext::Activity { module, instance } => format!("{module}: {instance}"),
            AreaContext::Question { bank, question } => format!("{bank}: {question}"),
            AreaContext::Rubric { criterion } => criterion.clone(),
            AreaContext::Generic { component, area } => format!("{component}/{area}"),
        }
    }
}

/// External numeric grade signal consumed by the mastery engine.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeEvent {
    pub item_id: GradeItemId,
    pub user_id: UserId,
    /// None means the grade was deleted or never finalized
    pub rawgrade: Option<f64>,
    pub mingrade: f64,
    pub maxgrade: f64,
}

impl GradeEvent {
    /// Normalized percentage for the raw grade, 0..=100.
    ///
    /// Degenerate ranges (min == max) normalize to 0 rather than erroring.
    pub fn percent(&self) -> Option<f64> {
        let raw = self.rawgrade?;
        let span = self.maxgrade - self.mingrade;
        if span <= f64::EPSILON {
            return Some(0.0);
        }
        Some(((raw - self.mingrade) / span * 100.0).clamp(0.0, 100.0))
    }
}

/// Raw per-user measurement against an outcome-mapped area.
/// At most one live row per (usage, user).
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub id: AttemptId,
    pub usage_id: UsageId,
    pub user_id: UserId,
    pub rawgrade: f64,
    pub mingrade: f64,
    pub maxgrade: f64,
    pub percentgrade: f64,
    pub time_created: DateTime<Utc>,
    pub time_modified: DateTime<Utc>,
}

/// Earned/not-earned judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkResult {
    NotEarned,
    Earned,
}

/// Current judgment for a user/outcome/course.
/// At most one live row per (course, outcome, user).
#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    pub id: MarkId,
    pub course_id: CourseId,
    pub outcome_id: OutcomeId,
    pub user_id: UserId,
    pub result: MarkResult,
    /// Who/what last changed this mark
    pub grader_id: UserId,
    pub time_created: DateTime<Utc>,
    pub time_modified: DateTime<Utc>,
}

impl Mark {
    pub fn new(
        course_id: CourseId,
        outcome_id: OutcomeId,
        user_id: UserId,
        result: MarkResult,
        grader_id: UserId,
    ) -> Self {
        Self {
            id: 0,
            course_id,
            outcome_id,
            user_id,
            result,
            grader_id,
            time_created: Utc::now(),
            time_modified: Utc::now(),
        }
    }
}

/// State transition kind recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Create,
    Update,
    Delete,
}

/// Append-only audit row: one per mark state transition, capturing the
/// resulting state (for Delete, the last known state).
#[derive(Debug, Clone, PartialEq)]
pub struct MarkHistory {
    pub id: HistoryId,
    pub mark_id: MarkId,
    pub action: HistoryAction,
    pub course_id: CourseId,
    pub outcome_id: OutcomeId,
    pub user_id: UserId,
    pub result: MarkResult,
    pub grader_id: UserId,
    pub time_created: DateTime<Utc>,
}

impl MarkHistory {
    /// Snapshot a mark into an unsaved history row.
    pub fn snapshot(action: HistoryAction, mark: &Mark) -> Self {
        Self {
            id: 0,
            mark_id: mark.id,
            action,
            course_id: mark.course_id,
            outcome_id: mark.outcome_id,
            user_id: mark.user_id,
            result: mark.result,
            grader_id: mark.grader_id,
            time_created: Utc::now(),
        }
    }
}
