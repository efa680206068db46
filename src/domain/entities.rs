//! Domain entities: core data structures

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, DomainResult};

/// Maximum length of a division name.
pub const DIVISION_NAME_MAX: usize = 100;
/// Maximum length of a customer name.
pub const CUSTOMER_NAME_MAX: usize = 200;
/// Maximum length of product, vendor, component and model names.
pub const CATALOG_NAME_MAX: usize = 100;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> u64 {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map($name)
                    .map_err(|e| format!("invalid id {s:?}: {e}"))
            }
        }
    };
}

numeric_id!(
    /// Identifier of an administrative division.
    DivisionId
);
numeric_id!(
    /// Identifier of a customer record.
    CustomerId
);
numeric_id!(
    /// Identifier of a product.
    ProductId
);
numeric_id!(
    /// Identifier of a vendor.
    VendorId
);

/// Trim a user supplied name and check it against a length limit.
pub fn validate_name(name: &str, max: usize) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidName {
            name: name.to_string(),
            reason: "name must not be empty".to_string(),
        });
    }
    if trimmed.chars().count() > max {
        return Err(DomainError::InvalidName {
            name: name.to_string(),
            reason: format!("name longer than {max} characters"),
        });
    }
    Ok(trimmed.to_string())
}

/// Nested-set position of a division inside its tree.
///
/// `tree` is the id of the root the division hangs under. Within one tree,
/// `lft`/`rgt` are the entry and exit counters of a name-ordered pre-order walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubtreeBounds {
    pub tree: DivisionId,
    pub lft: u32,
    pub rgt: u32,
}

impl SubtreeBounds {
    /// True if `other` lies strictly inside `self`.
    pub fn strictly_contains(&self, other: &SubtreeBounds) -> bool {
        self.tree == other.tree && self.lft < other.lft && other.rgt < self.rgt
    }

    /// Number of divisions below the owner of these bounds.
    pub fn descendant_count(&self) -> u32 {
        (self.rgt - self.lft - 1) / 2
    }
}

/// Read-only snapshot of a division handed out by the forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Division {
    pub id: DivisionId,
    pub name: String,
    pub parent_id: Option<DivisionId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub(crate) depth: u32,
    pub(crate) bounds: SubtreeBounds,
}

impl Division {
    /// Distance to the root of the tree; roots are at depth 0.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn bounds(&self) -> SubtreeBounds {
        self.bounds
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.bounds.rgt == self.bounds.lft + 1
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Flat row used to persist a division; structure is rebuilt on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivisionRecord {
    pub id: DivisionId,
    pub name: String,
    pub parent_id: Option<DivisionId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Division> for DivisionRecord {
    fn from(d: &Division) -> Self {
        Self {
            id: d.id,
            name: d.name.clone(),
            parent_id: d.parent_id,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

/// A customer organisation, attached to at most one division.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub division_id: Option<DivisionId>,
    #[serde(default)]
    pub intro: Option<String>,
    #[serde(default)]
    pub products: BTreeSet<ProductId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    PlatformSoftware,
    PcTerminalSoftware,
    Hardware,
    StandaloneSoftware,
    MobileApp,
}

impl ProductType {
    pub fn label(&self) -> &'static str {
        match self {
            ProductType::PlatformSoftware => "Platform software",
            ProductType::PcTerminalSoftware => "PC terminal software",
            ProductType::Hardware => "Hardware",
            ProductType::StandaloneSoftware => "Standalone board software",
            ProductType::MobileApp => "Mobile app",
        }
    }
}

impl FromStr for ProductType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "PLATFORM_SOFTWARE" => Ok(ProductType::PlatformSoftware),
            "PC_TERMINAL_SOFTWARE" => Ok(ProductType::PcTerminalSoftware),
            "HARDWARE" => Ok(ProductType::Hardware),
            "STANDALONE_SOFTWARE" => Ok(ProductType::StandaloneSoftware),
            "MOBILE_APP" => Ok(ProductType::MobileApp),
            other => Err(format!("unknown product type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentType {
    SoftwareModule,
    Hardware,
}

impl FromStr for ComponentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "SOFTWARE_MODULE" => Ok(ComponentType::SoftwareModule),
            "HARDWARE" => Ok(ComponentType::Hardware),
            other => Err(format!("unknown component type: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    pub name: String,
    #[serde(default)]
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A part of a product, edited together with the product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductComponent {
    pub name: String,
    pub component_type: ComponentType,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A concrete model number of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductModel {
    pub name: String,
    #[serde(default)]
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub product_type: ProductType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub vendor_id: Option<VendorId>,
    #[serde(default)]
    pub components: Vec<ProductComponent>,
    #[serde(default)]
    pub models: Vec<ProductModel>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
