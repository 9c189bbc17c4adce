//! Service container for dependency injection
//!
//! Wires up services with their dependencies. Engines never reach for
//! ambient globals; every collaborator is passed in explicitly.

use std::sync::Arc;

use crate::application::services::{AreaService, LedgerService, TreeService};
use crate::config::Settings;
use crate::infrastructure::memory::MemoryStore;
use crate::infrastructure::traits::OutcomeStore;

/// Container holding the shared store and the core services.
///
/// The mastery engine is not held here: it carries per-batch cache state
/// and is constructed by the caller for each sync run (see
/// `MasteryService::new`).
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Storage abstraction
    pub store: Arc<dyn OutcomeStore>,

    /// Outcome tree store operations
    pub tree: Arc<TreeService>,

    /// Area/mapping service
    pub areas: Arc<AreaService>,

    /// Append-only mark history ledger
    pub ledger: Arc<LedgerService>,
}

impl ServiceContainer {
    /// Create a container backed by the in-memory store.
    pub fn new(settings: Settings) -> Self {
        Self::with_store(settings, Arc::new(MemoryStore::new()))
    }

    /// Create a container with a custom store (for testing or a real backend).
    pub fn with_store(settings: Settings, store: Arc<dyn OutcomeStore>) -> Self {
        let settings = Arc::new(settings);
        let tree = Arc::new(TreeService::new(Arc::clone(&store)));
        let areas = Arc::new(AreaService::new(Arc::clone(&store)));
        let ledger = Arc::new(LedgerService::new(Arc::clone(&store)));

        Self {
            settings,
            store,
            tree,
            areas,
            ledger,
        }
    }
}
