//! Application layer: services, import/export engines, and their errors

pub mod error;
pub mod import;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
