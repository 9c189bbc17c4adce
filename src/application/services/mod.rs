//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on the storage boundary trait (OutcomeStore) but are
//! themselves concrete structs, not traits.

mod ledger;
mod mapping;
mod mastery;
mod tree;

pub use ledger::LedgerService;
pub use mapping::AreaService;
pub use mastery::MasteryService;
pub use tree::TreeService;
