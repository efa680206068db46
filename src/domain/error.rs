//! Domain-level errors (no external dependencies)

use std::fmt;

use thiserror::Error;

/// Kind of record a lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Division,
    Customer,
    Product,
    Vendor,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Division => "division",
            EntityKind::Customer => "customer",
            EntityKind::Product => "product",
            EntityKind::Vendor => "vendor",
        };
        f.write_str(s)
    }
}

/// Domain errors represent business rule violations.
/// These are independent of storage and transport concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: u64 },

    #[error("{kind} not found: {name:?}")]
    NameNotFound { kind: EntityKind, name: String },

    #[error("{kind} id already in use: {id}")]
    DuplicateId { kind: EntityKind, id: u64 },

    #[error("division name already exists: {0}")]
    DuplicateName(String),

    #[error("cannot move division {node} under {target}: would create a cycle")]
    CycleDetected { node: u64, target: u64 },

    #[error("customer {name} already exists in this division")]
    DuplicateCustomer { name: String, division: Option<u64> },

    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },
}

impl DomainError {
    pub fn not_found(kind: EntityKind, id: impl Into<u64>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::NotFound { .. } | DomainError::NameNotFound { .. }
        )
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
