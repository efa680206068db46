//! Infrastructure layer: storage, record tables and DI container
//!
//! This layer implements the boundary traits and wires up services.

pub mod di;
pub mod error;
pub mod store;
pub mod tables;
pub mod traits;

pub use error::{InfraError, InfraResult};
pub use store::{IdCounters, Snapshot, Store, StoreState};
pub use tables::{Catalog, CustomerTable};
