//! Transactional store holding the division forest and the record tables.
//!
//! Readers share a read lock. A writer takes the write lock, applies its
//! change to a working copy, persists the copy and only then publishes it.
//! Any failure drops the copy, so no partial update is ever visible.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{
    Customer, DivisionForest, DivisionRecord, DomainError, DomainResult, EntityKind, Product,
    Vendor,
};
use crate::infrastructure::tables::{Catalog, CustomerTable};
use crate::infrastructure::traits::{MemoryStorage, SnapshotStorage};
use crate::infrastructure::{InfraError, InfraResult};

/// Current snapshot format.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Highest id handed out per table, so deleted ids stay retired across reloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdCounters {
    pub division: u64,
    pub customer: u64,
    pub vendor: u64,
    pub product: u64,
}

/// Serialized form of the whole store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    /// Absent in older files; rows alone then bound the counters.
    #[serde(default)]
    pub last_ids: IdCounters,
    #[serde(default)]
    pub divisions: Vec<DivisionRecord>,
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub vendors: Vec<Vendor>,
    #[serde(default)]
    pub products: Vec<Product>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            last_ids: IdCounters::default(),
            divisions: Vec::new(),
            customers: Vec::new(),
            vendors: Vec::new(),
            products: Vec::new(),
        }
    }
}

/// Everything a transaction can touch.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub divisions: DivisionForest,
    pub customers: CustomerTable,
    pub catalog: Catalog,
}

impl StoreState {
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            last_ids: IdCounters {
                division: self.divisions.last_id(),
                customer: self.customers.last_id(),
                vendor: self.catalog.last_vendor_id(),
                product: self.catalog.last_product_id(),
            },
            divisions: self.divisions.records(),
            customers: self.customers.rows().cloned().collect(),
            vendors: self.catalog.vendors().into_iter().rev().collect(),
            products: self.catalog.products().into_iter().rev().collect(),
        }
    }

    pub fn from_snapshot(snapshot: Snapshot) -> DomainResult<Self> {
        let last_ids = snapshot.last_ids;
        let mut divisions = DivisionForest::from_records(snapshot.divisions)?;
        divisions.reserve_ids_through(last_ids.division);
        let mut catalog = Catalog::from_rows(snapshot.vendors, snapshot.products)?;
        catalog.reserve_ids_through(last_ids.vendor, last_ids.product);
        for customer in &snapshot.customers {
            if let Some(division) = customer.division_id {
                if !divisions.contains(division) {
                    return Err(DomainError::not_found(EntityKind::Division, division));
                }
            }
            for &product in &customer.products {
                catalog.product(product)?;
            }
        }
        let mut customers = CustomerTable::from_rows(snapshot.customers)?;
        customers.reserve_ids_through(last_ids.customer);
        Ok(Self {
            divisions,
            customers,
            catalog,
        })
    }
}

pub struct Store {
    state: RwLock<StoreState>,
    storage: Arc<dyn SnapshotStorage>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("storage", &self.storage.describe())
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Open a store, loading the last snapshot from `storage` if there is one.
    pub fn open(storage: Arc<dyn SnapshotStorage>) -> InfraResult<Self> {
        let location = storage.describe();
        let state = match storage
            .load()
            .map_err(|e| InfraError::io(format!("load snapshot from {location}"), e))?
        {
            Some(snapshot) => {
                if snapshot.version != SNAPSHOT_VERSION {
                    warn!(
                        "snapshot {} has version {}, expected {}",
                        location, snapshot.version, SNAPSHOT_VERSION
                    );
                }
                StoreState::from_snapshot(snapshot).map_err(ApplicationError::from)?
            }
            None => StoreState::default(),
        };
        info!(
            "opened store {}: {} divisions, {} customers",
            location,
            state.divisions.len(),
            state.customers.len()
        );
        Ok(Self {
            state: RwLock::new(state),
            storage,
        })
    }

    /// Empty store that keeps its snapshot in memory.
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            storage: Arc::new(MemoryStorage::new()),
        }
    }

    /// Run `f` against a consistent view of the state.
    pub fn read<T>(&self, f: impl FnOnce(&StoreState) -> T) -> ApplicationResult<T> {
        let guard = self
            .state
            .read()
            .map_err(|_| ApplicationError::LockPoisoned)?;
        Ok(f(&guard))
    }

    /// Apply `f` atomically: either all of its changes are persisted and
    /// published, or none are.
    pub fn transaction<T>(
        &self,
        f: impl FnOnce(&mut StoreState) -> ApplicationResult<T>,
    ) -> ApplicationResult<T> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| ApplicationError::LockPoisoned)?;
        let mut working = guard.clone();
        let out = f(&mut working)?;

        self.storage
            .save(&working.to_snapshot())
            .with_context(|| format!("persist snapshot to {}", self.storage.describe()))?;
        *guard = working;
        debug!("transaction committed");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_transaction_leaves_state_untouched() {
        let store = Store::in_memory();
        store
            .transaction(|s| Ok(s.divisions.insert("China", None)?))
            .unwrap();

        let result: ApplicationResult<()> = store.transaction(|s| {
            s.divisions.insert("Japan", None)?;
            s.divisions.insert("China", None)?;
            Ok(())
        });

        assert!(result.is_err());
        let names = store
            .read(|s| s.divisions.roots().into_iter().map(|d| d.name).collect::<Vec<_>>())
            .unwrap();
        assert_eq!(names, vec!["China"]);
    }

    #[test]
    fn test_snapshot_rejects_customer_with_unknown_division() {
        let mut state = StoreState::default();
        let china = state.divisions.insert("China", None).unwrap().id;
        state.customers.insert("Acme", Some(china), None).unwrap();
        let mut snapshot = state.to_snapshot();
        snapshot.divisions.clear();

        let err = StoreState::from_snapshot(snapshot).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_snapshot_without_counters_falls_back_to_row_ids() {
        let mut state = StoreState::default();
        state.divisions.insert("China", None).unwrap();
        let japan = state.divisions.insert("Japan", None).unwrap().id;
        let mut snapshot = state.to_snapshot();
        snapshot.last_ids = IdCounters::default();

        let mut restored = StoreState::from_snapshot(snapshot).unwrap();

        assert_eq!(restored.divisions.last_id(), japan.0);
        let next = restored.divisions.insert("Korea", None).unwrap().id;
        assert!(next.0 > japan.0);
    }
}
