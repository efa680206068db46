//! Division hierarchy service
//!
//! Runs every structural query and mutation of the division forest against
//! the store. Mutations execute inside one store transaction each.

use std::sync::Arc;

use tracing::{debug, info};

use crate::application::services::integrity::ReferenceGuard;
use crate::application::ApplicationResult;
use crate::domain::{CustomerId, Division, DivisionId, DomainError, EntityKind};
use crate::infrastructure::Store;

/// Result of deleting a division subtree.
#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    /// Removed divisions, the deleted node first
    pub removed: Vec<Division>,
    /// Customers whose division reference was cleared
    pub detached_customers: Vec<CustomerId>,
}

/// Service for querying and mutating the division forest.
pub struct DivisionService {
    store: Arc<Store>,
}

impl DivisionService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn get(&self, id: DivisionId) -> ApplicationResult<Division> {
        Ok(self.store.read(|s| s.divisions.get(id))??)
    }

    /// Look a division up by its unique name.
    pub fn find(&self, name: &str) -> ApplicationResult<Division> {
        let found = self.store.read(|s| s.divisions.find_by_name(name))?;
        found.ok_or_else(|| {
            DomainError::NameNotFound {
                kind: EntityKind::Division,
                name: name.to_string(),
            }
            .into()
        })
    }

    pub fn path(&self, id: DivisionId) -> ApplicationResult<Vec<Division>> {
        Ok(self.store.read(|s| s.divisions.path(id))??)
    }

    pub fn display_path(&self, id: DivisionId) -> ApplicationResult<String> {
        Ok(self.store.read(|s| s.divisions.display_path(id))??)
    }

    pub fn children(&self, id: DivisionId) -> ApplicationResult<Vec<Division>> {
        Ok(self.store.read(|s| s.divisions.children(id))??)
    }

    pub fn roots(&self) -> ApplicationResult<Vec<Division>> {
        self.store.read(|s| s.divisions.roots())
    }

    pub fn descendants(&self, id: DivisionId) -> ApplicationResult<Vec<Division>> {
        Ok(self.store.read(|s| s.divisions.descendants(id))??)
    }

    pub fn is_descendant_of(
        &self,
        candidate: DivisionId,
        ancestor: DivisionId,
    ) -> ApplicationResult<bool> {
        Ok(self
            .store
            .read(|s| s.divisions.is_descendant_of(candidate, ancestor))??)
    }

    /// Every division in display order.
    pub fn list(&self) -> ApplicationResult<Vec<Division>> {
        self.store.read(|s| s.divisions.iter().collect())
    }

    pub fn insert(&self, name: &str, parent: Option<DivisionId>) -> ApplicationResult<Division> {
        debug!("insert: name={:?}, parent={:?}", name, parent);
        let division = self
            .store
            .transaction(|s| Ok(s.divisions.insert(name, parent)?))?;
        info!("created division {} ({})", division.name, division.id);
        Ok(division)
    }

    pub fn move_to(
        &self,
        id: DivisionId,
        new_parent: Option<DivisionId>,
    ) -> ApplicationResult<Division> {
        debug!("move_to: id={}, new_parent={:?}", id, new_parent);
        let division = self.store.transaction(|s| {
            let moved = s.divisions.move_to(id, new_parent)?;
            ReferenceGuard::on_move(id);
            Ok(moved)
        })?;
        info!(
            "moved division {} under {:?} (depth {})",
            division.name,
            division.parent_id,
            division.depth()
        );
        Ok(division)
    }

    pub fn rename(&self, id: DivisionId, new_name: &str) -> ApplicationResult<Division> {
        debug!("rename: id={}, new_name={:?}", id, new_name);
        let division = self
            .store
            .transaction(|s| Ok(s.divisions.rename(id, new_name)?))?;
        info!("renamed division {} to {}", id, division.name);
        Ok(division)
    }

    /// Delete a division and everything below it. Customers attached anywhere
    /// in the subtree are detached, never deleted.
    pub fn delete(&self, id: DivisionId) -> ApplicationResult<DeleteOutcome> {
        debug!("delete: id={}", id);
        let outcome = self.store.transaction(|s| {
            let mut subtree = vec![id];
            subtree.extend(s.divisions.descendants(id)?.into_iter().map(|d| d.id));

            let detached_customers = ReferenceGuard::on_delete(&mut s.customers, &subtree)?;
            let removed = s.divisions.remove(id)?;
            Ok(DeleteOutcome {
                removed,
                detached_customers,
            })
        })?;
        info!(
            "deleted division {}: {} divisions removed, {} customers detached",
            id,
            outcome.removed.len(),
            outcome.detached_customers.len()
        );
        Ok(outcome)
    }
}
