//! compass: back-office administration of customers, products and the
//! administrative-division hierarchy they are located in.
//!
//! Layers, innermost first: `domain` (forest engine, records, errors),
//! `application` (services), `infrastructure` (store, storage, DI),
//! then the outer surfaces `api` and `cli`.

pub mod api;
pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
