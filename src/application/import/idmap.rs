//! Identifier map: scratch table for one import run
//!
//! Maps an import source's local identifiers (uid attributes, rdf:about
//! URIs, exported numeric ids) to the outcome ids assigned by the store.
//! Keys must be unique within one run; re-declaring a key means the same
//! outcome would be created twice, and a lookup miss means a dangling
//! reference in the document. Both are integrity errors, never silently
//! repaired.

use std::collections::HashMap;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::OutcomeId;

#[derive(Debug, Default)]
pub struct IdentifierMap {
    map: HashMap<String, OutcomeId>,
}

impl IdentifierMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly assigned outcome id under the source-local key.
    pub fn insert(&mut self, key: impl Into<String>, id: OutcomeId) -> ApplicationResult<()> {
        let key = key.into();
        if self.map.contains_key(&key) {
            return Err(ApplicationError::import_integrity(format!(
                "identifier '{key}' declared twice in one import run"
            )));
        }
        self.map.insert(key, id);
        Ok(())
    }

    /// Resolve a back-reference to an already-seen identifier.
    pub fn resolve(&self, key: &str) -> ApplicationResult<OutcomeId> {
        self.map.get(key).copied().ok_or_else(|| {
            ApplicationError::import_integrity(format!(
                "reference to unknown identifier '{key}' (dangling or out of document order)"
            ))
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
