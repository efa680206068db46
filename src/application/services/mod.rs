//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services run their work against the shared store (reads under the shared
//! lock, mutations as transactions) but are themselves concrete structs, not traits.

mod catalog;
mod customer;
mod division;
pub mod integrity;
pub mod presentation;

pub use catalog::CatalogService;
pub use customer::{
    customer_label, CustomerDetail, CustomerFilter, CustomerInfo, CustomerService, ProductSummary,
};
pub use division::{DeleteOutcome, DivisionService};
pub use integrity::ReferenceGuard;
pub use presentation::{
    indented_label, nested_tree, option_parent_hint, select_options, CustomerLeaf, DivisionTree,
    PresentationService, SelectOption, TreeEntry, DEPTH_MARKER,
};
