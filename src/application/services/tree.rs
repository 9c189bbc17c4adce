//! Outcome tree store service
//!
//! Hierarchy-aware operations over the storage boundary: create, move,
//! soft delete, branch queries, and the global sort-order repair pass.
//! Every public mutation validates fully before writing, so a rejected
//! operation leaves the tree untouched.

use std::sync::Arc;

use itertools::Itertools;
use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    DomainError, Outcome, OutcomeId, OutcomeSet, Placement, SetId,
};
use crate::infrastructure::traits::OutcomeStore;

/// Upward parent walks are capped here; a legitimate vocabulary is far
/// shallower, so exceeding the cap means a corrupt parent chain.
const MAX_DEPTH: usize = 64;

/// Service for outcome set and outcome hierarchy operations.
pub struct TreeService {
    store: Arc<dyn OutcomeStore>,
}

impl TreeService {
    pub fn new(store: Arc<dyn OutcomeStore>) -> Self {
        Self { store }
    }

    // ---- outcome sets ----

    /// Create an outcome set. Fails on empty or duplicate idnumber.
    pub fn create_set(&self, set: OutcomeSet) -> ApplicationResult<OutcomeSet> {
        debug!("create_set: idnumber={}", set.idnumber);
        if set.idnumber.trim().is_empty() {
            return Err(DomainError::EmptyIdnumber.into());
        }
        Ok(self.store.insert_set(set)?)
    }

    pub fn find_set(&self, id: SetId) -> Option<OutcomeSet> {
        self.store.set_by_id(id)
    }

    pub fn find_set_by_idnumber(&self, idnumber: &str) -> Option<OutcomeSet> {
        self.store.set_by_idnumber(idnumber)
    }

    pub fn sets(&self) -> Vec<OutcomeSet> {
        self.store.sets()
    }

    /// Soft-delete a set and every outcome it owns.
    pub fn delete_set(&self, id: SetId) -> ApplicationResult<()> {
        debug!("delete_set: id={}", id);
        let mut set = self
            .store
            .set_by_id(id)
            .ok_or(DomainError::SetNotFound(id))?;
        let mut outcomes = self.store.outcomes_in_set(id, false);
        for outcome in &mut outcomes {
            outcome.deleted = true;
        }
        self.store.update_outcomes(&outcomes)?;
        set.deleted = true;
        self.store.update_set(&set)?;
        Ok(())
    }

    // ---- outcomes ----

    /// Create an outcome, appended to the end of its sibling group.
    ///
    /// Validates idnumber and description non-empty; the store enforces
    /// system-wide idnumber uniqueness at write time.
    pub fn create(&self, mut outcome: Outcome) -> ApplicationResult<Outcome> {
        debug!(
            "create: idnumber={} set={} parent={:?}",
            outcome.idnumber, outcome.outcomeset_id, outcome.parent_id
        );
        if outcome.idnumber.trim().is_empty() {
            return Err(DomainError::EmptyIdnumber.into());
        }
        if outcome.description.trim().is_empty() {
            return Err(DomainError::EmptyDescription {
                idnumber: outcome.idnumber,
            }
            .into());
        }
        let set = self
            .store
            .set_by_id(outcome.outcomeset_id)
            .filter(|s| !s.deleted)
            .ok_or(DomainError::SetNotFound(outcome.outcomeset_id))?;
        if let Some(parent_id) = outcome.parent_id {
            let parent = self
                .store
                .outcome_by_id(parent_id)
                .filter(|p| !p.deleted)
                .ok_or(DomainError::OutcomeNotFound(parent_id))?;
            if parent.outcomeset_id != set.id {
                return Err(DomainError::OutcomeNotFound(parent_id).into());
            }
        }
        outcome.sortorder = self
            .store
            .children(set.id, outcome.parent_id, false)
            .len() as i64;
        Ok(self.store.insert_outcome(outcome)?)
    }

    pub fn find(&self, id: OutcomeId) -> Option<Outcome> {
        self.store.outcome_by_id(id)
    }

    pub fn find_by_idnumber(&self, idnumber: &str) -> Option<Outcome> {
        self.store.outcome_by_idnumber(idnumber)
    }

    /// Live children of `parent` within `set`, ordered by sortorder.
    pub fn children(&self, set: SetId, parent: Option<OutcomeId>) -> Vec<Outcome> {
        self.store.children(set, parent, false)
    }

    /// Count of ancestors, walking parent ids up to the root.
    pub fn depth(&self, id: OutcomeId) -> ApplicationResult<usize> {
        let outcome = self
            .store
            .outcome_by_id(id)
            .ok_or(DomainError::OutcomeNotFound(id))?;
        let mut depth = 0;
        let mut current = outcome.parent_id;
        while let Some(parent_id) = current {
            depth += 1;
            if depth > MAX_DEPTH {
                return Err(DomainError::HierarchyTooDeep(id).into());
            }
            current = self
                .store
                .outcome_by_id(parent_id)
                .ok_or(DomainError::OutcomeNotFound(parent_id))?
                .parent_id;
        }
        Ok(depth)
    }

    /// The node plus all transitive live descendants, pre-order.
    pub fn branch(&self, id: OutcomeId) -> ApplicationResult<Vec<Outcome>> {
        let root = self
            .store
            .outcome_by_id(id)
            .ok_or(DomainError::OutcomeNotFound(id))?;
        let set = root.outcomeset_id;
        let mut result = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            let children = self.store.children(set, Some(node.id), false);
            result.push(node);
            // Reverse so the leftmost child is popped first.
            stack.extend(children.into_iter().rev());
        }
        Ok(result)
    }

    /// Move an outcome (with its whole subtree) relative to a target.
    ///
    /// Rejects moves onto the node itself or any of its descendants; the
    /// tree is unchanged when an error is returned.
    pub fn move_outcome(
        &self,
        id: OutcomeId,
        target_id: OutcomeId,
        placement: Placement,
    ) -> ApplicationResult<()> {
        debug!("move_outcome: id={} target={} {:?}", id, target_id, placement);
        let mut node = self
            .store
            .outcome_by_id(id)
            .filter(|o| !o.deleted)
            .ok_or(DomainError::OutcomeNotFound(id))?;
        let target = self
            .store
            .outcome_by_id(target_id)
            .filter(|o| !o.deleted)
            .ok_or(DomainError::MoveTargetNotFound(target_id))?;
        if node.outcomeset_id != target.outcomeset_id {
            return Err(DomainError::MoveAcrossSets {
                node: id,
                target: target_id,
            }
            .into());
        }
        if id == target_id || self.is_descendant(target_id, id)? {
            return Err(DomainError::MoveIntoOwnSubtree {
                node: id,
                target: target_id,
            }
            .into());
        }

        let set = node.outcomeset_id;
        let new_parent = match placement {
            Placement::Before | Placement::After => target.parent_id,
            Placement::ChildOf => Some(target.id),
        };

        // Destination sibling list without the moving node; the subtree
        // below the node travels with it untouched (its sibling group is
        // keyed by the node's id, which does not change).
        let mut siblings: Vec<OutcomeId> = self
            .store
            .children(set, new_parent, false)
            .into_iter()
            .map(|o| o.id)
            .filter(|&s| s != id)
            .collect();
        let pos = match placement {
            Placement::Before => siblings
                .iter()
                .position(|&s| s == target_id)
                .unwrap_or(siblings.len()),
            Placement::After => siblings
                .iter()
                .position(|&s| s == target_id)
                .map(|p| p + 1)
                .unwrap_or(siblings.len()),
            Placement::ChildOf => siblings.len(),
        };
        siblings.insert(pos, id);

        // Stage every row before writing: re-homed node plus renumbered
        // destination siblings.
        let mut updates = Vec::new();
        node.parent_id = new_parent;
        node.sortorder = pos as i64;
        updates.push(node);
        for (index, &sibling_id) in siblings.iter().enumerate() {
            if sibling_id == id {
                continue;
            }
            let mut sibling = self
                .store
                .outcome_by_id(sibling_id)
                .ok_or(DomainError::OutcomeNotFound(sibling_id))?;
            if sibling.sortorder != index as i64 {
                sibling.sortorder = index as i64;
                updates.push(sibling);
            }
        }
        self.store.update_outcomes(&updates)?;

        // Repair pass closes the gap left in the old sibling group and
        // keeps every live group dense from 0.
        self.repair_sortorder(set)?;
        Ok(())
    }

    /// Soft-delete a node and, transitively, all descendants, then repair
    /// ordering among the surviving siblings.
    pub fn delete(&self, id: OutcomeId) -> ApplicationResult<usize> {
        debug!("delete: id={}", id);
        let mut branch = self.branch(id)?;
        let set = branch[0].outcomeset_id;
        for outcome in &mut branch {
            outcome.deleted = true;
        }
        let count = branch.len();
        self.store.update_outcomes(&branch)?;
        self.repair_sortorder(set)?;
        Ok(count)
    }

    /// Renumber every live sibling group in the set to be dense starting
    /// at 0. Returns the number of rows that changed.
    pub fn repair_sortorder(&self, set: SetId) -> ApplicationResult<usize> {
        let all = self.store.outcomes_in_set(set, false);
        let mut updates = Vec::new();
        for (_parent, group) in &all.into_iter().chunk_by(|o| o.parent_id) {
            for (index, mut outcome) in group.enumerate() {
                if outcome.sortorder != index as i64 {
                    outcome.sortorder = index as i64;
                    updates.push(outcome);
                }
            }
        }
        let changed = updates.len();
        if changed > 0 {
            debug!("repair_sortorder: set={} changed={}", set, changed);
            self.store.update_outcomes(&updates)?;
        }
        Ok(changed)
    }

    /// True if `candidate` sits somewhere below `ancestor`.
    fn is_descendant(&self, candidate: OutcomeId, ancestor: OutcomeId) -> ApplicationResult<bool> {
        let mut current = self
            .store
            .outcome_by_id(candidate)
            .ok_or(DomainError::OutcomeNotFound(candidate))?
            .parent_id;
        let mut steps = 0;
        while let Some(parent_id) = current {
            if parent_id == ancestor {
                return Ok(true);
            }
            steps += 1;
            if steps > MAX_DEPTH {
                return Err(ApplicationError::from(DomainError::HierarchyTooDeep(
                    candidate,
                )));
            }
            current = self
                .store
                .outcome_by_id(parent_id)
                .ok_or(DomainError::OutcomeNotFound(parent_id))?
                .parent_id;
        }
        Ok(false)
    }
}
