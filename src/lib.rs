//! rsoutcome: outcome hierarchy manager
//!
//! Tracks educational outcomes (competency/standard statements) in strict
//! hierarchies, imports external XML standards vocabularies, maps outcomes
//! onto content areas, and records per-user mastery with an append-only
//! audit history.
//!
//! Layers, innermost first:
//! - `domain`: entities and domain errors, no dependencies on other layers
//! - `application`: tree/area/mastery/ledger services and the import engine
//! - `infrastructure`: storage boundary, in-memory store, DI container
//! - `cli`: argument parsing, dispatch, terminal output

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
