//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::entities::{OutcomeId, SetId};

/// Domain errors represent business rule violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("outcome description must not be empty (idnumber: {idnumber})")]
    EmptyDescription { idnumber: String },

    #[error("idnumber must not be empty")]
    EmptyIdnumber,

    #[error("duplicate outcome idnumber: {0}")]
    DuplicateIdnumber(String),

    #[error("duplicate outcome set idnumber: {0}")]
    DuplicateSetIdnumber(String),

    #[error("outcome not found: {0}")]
    OutcomeNotFound(OutcomeId),

    #[error("outcome set not found: {0}")]
    SetNotFound(SetId),

    #[error("invalid move: target {target} is outcome {node} or one of its descendants")]
    MoveIntoOwnSubtree { node: OutcomeId, target: OutcomeId },

    #[error("invalid move: target outcome not found: {0}")]
    MoveTargetNotFound(OutcomeId),

    #[error("invalid move: outcome {node} and target {target} belong to different sets")]
    MoveAcrossSets { node: OutcomeId, target: OutcomeId },

    #[error("hierarchy too deep at outcome {0} (possible parent cycle)")]
    HierarchyTooDeep(OutcomeId),

    #[error("outcome '{idnumber}' is not assessable and cannot be marked")]
    NotAssessable { idnumber: String },
}

/// Result type for domain layer operations.
pub type DomainResult<T> = Result<T, DomainError>;
