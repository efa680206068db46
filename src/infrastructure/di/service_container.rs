//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{
    CatalogService, CustomerService, DivisionService, PresentationService,
};
use crate::config::Settings;
use crate::infrastructure::traits::JsonFileStorage;
use crate::infrastructure::{InfraResult, Store};

/// Container holding all application services.
///
/// Every service shares the same store.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    pub store: Arc<Store>,

    pub divisions: DivisionService,
    pub presentation: PresentationService,
    pub customers: CustomerService,
    pub catalog: CatalogService,
}

impl ServiceContainer {
    /// Create a container backed by the JSON snapshot at `settings.data_file`.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        let storage = Arc::new(JsonFileStorage::new(settings.data_file.clone()));
        let store = Arc::new(Store::open(storage)?);
        Ok(Self::with_store(settings, store))
    }

    /// Create a service container around an existing store (for testing).
    pub fn with_store(settings: Settings, store: Arc<Store>) -> Self {
        Self {
            settings: Arc::new(settings),
            divisions: DivisionService::new(Arc::clone(&store)),
            presentation: PresentationService::new(Arc::clone(&store)),
            customers: CustomerService::new(Arc::clone(&store)),
            catalog: CatalogService::new(Arc::clone(&store)),
            store,
        }
    }
}
