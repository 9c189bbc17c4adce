//! Infrastructure layer: storage implementations and DI wiring

pub mod di;
pub mod error;
pub mod memory;
pub mod traits;

pub use error::{InfraError, InfraResult};
pub use memory::MemoryStore;
pub use traits::{GradeSource, OutcomeStore};
