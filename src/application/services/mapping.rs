//! Area/mapping service
//!
//! Associates outcomes with areas (locations in external content) and
//! resolves course-modules back to their owning area. Implements the
//! Area Resolver contract consumed by the mastery engine.

use std::sync::Arc;

use tracing::debug;

use crate::application::ApplicationResult;
use crate::domain::{Area, AreaContext, AreaId, ModuleId, Outcome, OutcomeId, OutcomeUsage};
use crate::infrastructure::traits::OutcomeStore;

/// Service for area records and outcome-to-area mappings.
pub struct AreaService {
    store: Arc<dyn OutcomeStore>,
}

impl AreaService {
    pub fn new(store: Arc<dyn OutcomeStore>) -> Self {
        Self { store }
    }

    /// Look up or create the area for (component, area, item_id).
    pub fn get_or_create(
        &self,
        component: &str,
        area: &str,
        item_id: i64,
    ) -> ApplicationResult<Area> {
        if let Some(existing) = self.store.area_by_key(component, area, item_id) {
            return Ok(existing);
        }
        debug!("get_or_create: new area {}/{}/{}", component, area, item_id);
        Ok(self.store.insert_area(Area {
            id: 0,
            component: component.to_string(),
            area: area.to_string(),
            item_id,
        })?)
    }

    /// Map an outcome onto an area. Idempotent: an existing mapping is
    /// returned unchanged.
    pub fn map_outcome(&self, area: AreaId, outcome: OutcomeId) -> ApplicationResult<OutcomeUsage> {
        if let Some(existing) = self
            .store
            .usages_for_area(area)
            .into_iter()
            .find(|u| u.outcome_id == outcome)
        {
            return Ok(existing);
        }
        Ok(self.store.insert_usage(OutcomeUsage {
            id: 0,
            area_id: area,
            outcome_id: outcome,
        })?)
    }

    /// Remove the mapping of an outcome from an area. Returns whether a
    /// mapping existed.
    pub fn unmap_outcome(&self, area: AreaId, outcome: OutcomeId) -> ApplicationResult<bool> {
        let usage = self
            .store
            .usages_for_area(area)
            .into_iter()
            .find(|u| u.outcome_id == outcome);
        match usage {
            Some(u) => {
                self.store.delete_usage(u.id)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn usages_for_area(&self, area: AreaId) -> Vec<OutcomeUsage> {
        self.store.usages_for_area(area)
    }

    /// The outcomes mapped onto an area, skipping dangling usages.
    pub fn outcomes_for_area(&self, area: AreaId) -> Vec<Outcome> {
        self.store
            .usages_for_area(area)
            .into_iter()
            .filter_map(|u| self.store.outcome_by_id(u.outcome_id))
            .filter(|o| !o.deleted)
            .collect()
    }

    /// Register a course-module as a user of an area (one area can be
    /// reused by multiple modules).
    pub fn register_module(&self, area: AreaId, cmid: ModuleId) -> ApplicationResult<()> {
        Ok(self.store.register_module(area, cmid)?)
    }

    pub fn area_for_module(&self, cmid: ModuleId) -> Option<Area> {
        self.store.area_for_module(cmid)
    }

    /// Classify an area into its display context.
    pub fn describe(&self, area: &Area) -> AreaContext {
        match (area.component.as_str(), area.area.as_str()) {
            (component, "activity") => AreaContext::Activity {
                module: component.to_string(),
                instance: format!("item {}", area.item_id),
            },
            (component, "question") => AreaContext::Question {
                bank: component.to_string(),
                question: format!("question {}", area.item_id),
            },
            (_, "criterion") => AreaContext::Rubric {
                criterion: format!("criterion {}", area.item_id),
            },
            (component, other) => AreaContext::Generic {
                component: component.to_string(),
                area: other.to_string(),
            },
        }
    }
}
