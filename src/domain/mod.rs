//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod entities;
pub mod error;

pub use arena::{DepthFirst, DivisionForest};
pub use entities::*;
pub use error::{DomainError, DomainResult, EntityKind};
