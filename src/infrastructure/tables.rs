//! In-store record tables for customers and the product catalog.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use itertools::Itertools;
use tracing::debug;

use crate::domain::{
    validate_name, ComponentType, Customer, CustomerId, DivisionId, DomainError, DomainResult,
    EntityKind, Product, ProductComponent, ProductId, ProductModel, ProductType, Vendor,
    VendorId, CATALOG_NAME_MAX, CUSTOMER_NAME_MAX,
};
use crate::infrastructure::traits::CustomerRepository;

fn clean_text(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// Customer rows keyed by id.
///
/// `(name, division)` is unique among customers that have a division.
#[derive(Debug, Clone, Default)]
pub struct CustomerTable {
    rows: BTreeMap<CustomerId, Customer>,
    last_id: u64,
}

impl CustomerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<Customer>) -> DomainResult<Self> {
        let mut table = Self::new();
        for row in rows {
            if table.rows.contains_key(&row.id) {
                return Err(DomainError::DuplicateId {
                    kind: EntityKind::Customer,
                    id: row.id.0,
                });
            }
            table.ensure_unique(&row.name, row.division_id, None)?;
            table.last_id = table.last_id.max(row.id.0);
            table.rows.insert(row.id, row);
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn last_id(&self) -> u64 {
        self.last_id
    }

    pub fn reserve_ids_through(&mut self, floor: u64) {
        self.last_id = self.last_id.max(floor);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: CustomerId) -> DomainResult<&Customer> {
        self.rows
            .get(&id)
            .ok_or_else(|| DomainError::not_found(EntityKind::Customer, id))
    }

    /// All customers ordered by name, then id.
    pub fn list(&self) -> Vec<Customer> {
        self.rows
            .values()
            .sorted_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)))
            .cloned()
            .collect()
    }

    pub fn insert(
        &mut self,
        name: &str,
        division: Option<DivisionId>,
        intro: Option<String>,
    ) -> DomainResult<Customer> {
        let name = validate_name(name, CUSTOMER_NAME_MAX)?;
        self.ensure_unique(&name, division, None)?;

        self.last_id += 1;
        let now = Utc::now();
        let customer = Customer {
            id: CustomerId(self.last_id),
            name,
            division_id: division,
            intro: clean_text(intro),
            products: Default::default(),
            created_at: now,
            updated_at: now,
        };
        self.rows.insert(customer.id, customer.clone());
        Ok(customer)
    }

    /// Point a customer at another division (or none).
    pub fn assign(
        &mut self,
        id: CustomerId,
        division: Option<DivisionId>,
    ) -> DomainResult<Customer> {
        let name = self.get(id)?.name.clone();
        self.ensure_unique(&name, division, Some(id))?;
        let row = self.row_mut(id)?;
        row.division_id = division;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    pub fn link_product(&mut self, id: CustomerId, product: ProductId) -> DomainResult<Customer> {
        let row = self.row_mut(id)?;
        if row.products.insert(product) {
            row.updated_at = Utc::now();
        }
        Ok(row.clone())
    }

    pub fn rows(&self) -> impl Iterator<Item = &Customer> {
        self.rows.values()
    }

    fn row_mut(&mut self, id: CustomerId) -> DomainResult<&mut Customer> {
        self.rows
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(EntityKind::Customer, id))
    }

    fn ensure_unique(
        &self,
        name: &str,
        division: Option<DivisionId>,
        except: Option<CustomerId>,
    ) -> DomainResult<()> {
        // Customers without a division never collide
        let Some(division) = division else {
            return Ok(());
        };
        let clash = self.rows.values().any(|c| {
            Some(c.id) != except && c.division_id == Some(division) && c.name == name
        });
        if clash {
            return Err(DomainError::DuplicateCustomer {
                name: name.to_string(),
                division: Some(division.0),
            });
        }
        Ok(())
    }
}

impl CustomerRepository for CustomerTable {
    fn list_by_division(&self, division: DivisionId) -> Vec<Customer> {
        self.rows
            .values()
            .filter(|c| c.division_id == Some(division))
            .sorted_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)))
            .cloned()
            .collect()
    }

    fn group_by_division(&self) -> HashMap<DivisionId, Vec<Customer>> {
        self.rows
            .values()
            .filter_map(|c| c.division_id.map(|d| (d, c)))
            .sorted_by(|(_, a), (_, b)| a.name.cmp(&b.name).then(a.id.cmp(&b.id)))
            .map(|(d, c)| (d, c.clone()))
            .into_group_map()
    }

    fn clear_division_ref(&mut self, customer: CustomerId) -> DomainResult<()> {
        let row = self.row_mut(customer)?;
        if let Some(previous) = row.division_id.take() {
            row.updated_at = Utc::now();
            debug!(
                "clear_division_ref: customer {} detached from division {}",
                customer, previous
            );
        }
        Ok(())
    }
}

/// Vendors and products with their inline components and models.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    vendors: BTreeMap<VendorId, Vendor>,
    products: BTreeMap<ProductId, Product>,
    last_vendor: u64,
    last_product: u64,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(vendors: Vec<Vendor>, products: Vec<Product>) -> DomainResult<Self> {
        let mut catalog = Self::new();
        for vendor in vendors {
            if catalog.vendors.contains_key(&vendor.id) {
                return Err(DomainError::DuplicateId {
                    kind: EntityKind::Vendor,
                    id: vendor.id.0,
                });
            }
            catalog.last_vendor = catalog.last_vendor.max(vendor.id.0);
            catalog.vendors.insert(vendor.id, vendor);
        }
        for product in products {
            if catalog.products.contains_key(&product.id) {
                return Err(DomainError::DuplicateId {
                    kind: EntityKind::Product,
                    id: product.id.0,
                });
            }
            if let Some(vendor) = product.vendor_id {
                catalog.vendor(vendor)?;
            }
            catalog.last_product = catalog.last_product.max(product.id.0);
            catalog.products.insert(product.id, product);
        }
        Ok(catalog)
    }

    pub fn last_vendor_id(&self) -> u64 {
        self.last_vendor
    }

    pub fn last_product_id(&self) -> u64 {
        self.last_product
    }

    /// Never hand out vendor or product ids at or below the given floors.
    pub fn reserve_ids_through(&mut self, vendor: u64, product: u64) {
        self.last_vendor = self.last_vendor.max(vendor);
        self.last_product = self.last_product.max(product);
    }

    pub fn vendor(&self, id: VendorId) -> DomainResult<&Vendor> {
        self.vendors
            .get(&id)
            .ok_or_else(|| DomainError::not_found(EntityKind::Vendor, id))
    }

    pub fn product(&self, id: ProductId) -> DomainResult<&Product> {
        self.products
            .get(&id)
            .ok_or_else(|| DomainError::not_found(EntityKind::Product, id))
    }

    /// Vendors, newest first.
    pub fn vendors(&self) -> Vec<Vendor> {
        self.vendors.values().rev().cloned().collect()
    }

    /// Products, newest first.
    pub fn products(&self) -> Vec<Product> {
        self.products.values().rev().cloned().collect()
    }

    pub fn add_vendor(&mut self, name: &str, remark: Option<String>) -> DomainResult<Vendor> {
        let name = validate_name(name, CATALOG_NAME_MAX)?;
        self.last_vendor += 1;
        let now = Utc::now();
        let vendor = Vendor {
            id: VendorId(self.last_vendor),
            name,
            remark: clean_text(remark),
            created_at: now,
            updated_at: now,
        };
        self.vendors.insert(vendor.id, vendor.clone());
        Ok(vendor)
    }

    pub fn add_product(
        &mut self,
        name: &str,
        product_type: ProductType,
        description: Option<String>,
        vendor: Option<VendorId>,
    ) -> DomainResult<Product> {
        let name = validate_name(name, CATALOG_NAME_MAX)?;
        if let Some(vendor) = vendor {
            self.vendor(vendor)?;
        }
        self.last_product += 1;
        let now = Utc::now();
        let product = Product {
            id: ProductId(self.last_product),
            name,
            product_type,
            description: clean_text(description),
            vendor_id: vendor,
            components: Vec::new(),
            models: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.products.insert(product.id, product.clone());
        Ok(product)
    }

    pub fn add_component(
        &mut self,
        product: ProductId,
        name: &str,
        component_type: ComponentType,
        description: Option<String>,
    ) -> DomainResult<Product> {
        let name = validate_name(name, CATALOG_NAME_MAX)?;
        let row = self.product_mut(product)?;
        let now = Utc::now();
        row.components.push(ProductComponent {
            name,
            component_type,
            description: clean_text(description),
            created_at: now,
        });
        row.updated_at = now;
        Ok(row.clone())
    }

    pub fn add_model(
        &mut self,
        product: ProductId,
        name: &str,
        remark: Option<String>,
    ) -> DomainResult<Product> {
        let name = validate_name(name, CATALOG_NAME_MAX)?;
        let row = self.product_mut(product)?;
        let now = Utc::now();
        row.models.push(ProductModel {
            name,
            remark: clean_text(remark),
            created_at: now,
        });
        row.updated_at = now;
        Ok(row.clone())
    }

    fn product_mut(&mut self, id: ProductId) -> DomainResult<&mut Product> {
        self.products
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(EntityKind::Product, id))
    }
}
