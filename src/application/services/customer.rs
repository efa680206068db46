//! Customer records service
//!
//! Customers hang off the division forest as leaf decorations. This service
//! validates their division references and assembles the customer detail
//! payload served by the API.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::application::ApplicationResult;
use crate::domain::{
    Customer, CustomerId, DivisionForest, DivisionId, DomainResult, ProductId, ProductType,
};
use crate::infrastructure::{Catalog, Store};

/// Filters of the customer list, mirroring the admin list filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CustomerFilter {
    /// Depth of the customer's division
    pub level: Option<u32>,
    /// Parent of the customer's division
    pub parent: Option<DivisionId>,
}

impl CustomerFilter {
    fn matches(&self, forest: &DivisionForest, customer: &Customer) -> bool {
        if self.level.is_none() && self.parent.is_none() {
            return true;
        }
        let Some(division) = customer.division_id.and_then(|d| forest.get(d).ok()) else {
            return false;
        };
        self.level.map_or(true, |l| division.depth() == l)
            && self.parent.map_or(true, |p| division.parent_id == Some(p))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerInfo {
    pub id: CustomerId,
    pub name: String,
    pub display: String,
    pub division_id: Option<DivisionId>,
    pub division_path: Option<String>,
    pub intro: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub product_type: ProductType,
    pub description: Option<String>,
    pub vendor: Option<String>,
    pub models: Vec<String>,
    pub components: Vec<String>,
}

/// Payload of `GET /api/customer/{id}/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerDetail {
    pub basic_info: CustomerInfo,
    pub products: Vec<ProductSummary>,
}

/// `Acme（China/Zhejiang）`, or `Acme（unassigned）` without a division.
pub fn customer_label(forest: &DivisionForest, customer: &Customer) -> String {
    let location = customer
        .division_id
        .and_then(|d| forest.display_path(d).ok())
        .unwrap_or_else(|| "unassigned".to_string());
    format!("{}（{}）", customer.name, location)
}

fn build_detail(
    forest: &DivisionForest,
    catalog: &Catalog,
    customer: &Customer,
) -> DomainResult<CustomerDetail> {
    let division_path = customer
        .division_id
        .map(|d| forest.display_path(d))
        .transpose()?;
    let basic_info = CustomerInfo {
        id: customer.id,
        name: customer.name.clone(),
        display: customer_label(forest, customer),
        division_id: customer.division_id,
        division_path,
        intro: customer.intro.clone(),
        created_at: customer.created_at,
        updated_at: customer.updated_at,
    };

    let mut products = Vec::with_capacity(customer.products.len());
    for &id in &customer.products {
        let product = catalog.product(id)?;
        let vendor = product
            .vendor_id
            .map(|v| catalog.vendor(v).map(|v| v.name.clone()))
            .transpose()?;
        products.push(ProductSummary {
            id: product.id,
            name: product.name.clone(),
            product_type: product.product_type,
            description: product.description.clone(),
            vendor,
            models: product.models.iter().map(|m| m.name.clone()).collect(),
            components: product.components.iter().map(|c| c.name.clone()).collect(),
        });
    }
    Ok(CustomerDetail {
        basic_info,
        products,
    })
}

/// Service for customer records.
pub struct CustomerService {
    store: Arc<Store>,
}

impl CustomerService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn create(
        &self,
        name: &str,
        division: Option<DivisionId>,
        intro: Option<String>,
    ) -> ApplicationResult<Customer> {
        debug!("create: name={:?}, division={:?}", name, division);
        let customer = self.store.transaction(|s| {
            if let Some(d) = division {
                s.divisions.get(d)?;
            }
            Ok(s.customers.insert(name, division, intro)?)
        })?;
        info!("created customer {} ({})", customer.name, customer.id);
        Ok(customer)
    }

    /// Move a customer to another division, or detach it with `None`.
    pub fn assign(
        &self,
        id: CustomerId,
        division: Option<DivisionId>,
    ) -> ApplicationResult<Customer> {
        debug!("assign: id={}, division={:?}", id, division);
        self.store.transaction(|s| {
            if let Some(d) = division {
                s.divisions.get(d)?;
            }
            Ok(s.customers.assign(id, division)?)
        })
    }

    pub fn link_product(&self, id: CustomerId, product: ProductId) -> ApplicationResult<Customer> {
        debug!("link_product: id={}, product={}", id, product);
        self.store.transaction(|s| {
            s.catalog.product(product)?;
            Ok(s.customers.link_product(id, product)?)
        })
    }

    pub fn get(&self, id: CustomerId) -> ApplicationResult<Customer> {
        Ok(self.store.read(|s| s.customers.get(id).cloned())??)
    }

    /// All customers ordered by name.
    pub fn list(&self) -> ApplicationResult<Vec<Customer>> {
        self.store.read(|s| s.customers.list())
    }

    pub fn list_filtered(&self, filter: CustomerFilter) -> ApplicationResult<Vec<Customer>> {
        self.store.read(|s| {
            s.customers
                .list()
                .into_iter()
                .filter(|c| filter.matches(&s.divisions, c))
                .collect()
        })
    }

    pub fn label(&self, id: CustomerId) -> ApplicationResult<String> {
        Ok(self
            .store
            .read(|s| s.customers.get(id).map(|c| customer_label(&s.divisions, c)))??)
    }

    pub fn detail(&self, id: CustomerId) -> ApplicationResult<CustomerDetail> {
        Ok(self.store.read(|s| -> DomainResult<CustomerDetail> {
            let customer = s.customers.get(id)?;
            build_detail(&s.divisions, &s.catalog, customer)
        })??)
    }
}
