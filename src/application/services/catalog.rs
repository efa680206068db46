//! Product catalog service: vendors, products and their inline parts.

use std::sync::Arc;

use tracing::info;

use crate::application::ApplicationResult;
use crate::domain::{ComponentType, Product, ProductId, ProductType, Vendor, VendorId};
use crate::infrastructure::Store;

pub struct CatalogService {
    store: Arc<Store>,
}

impl CatalogService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn add_vendor(&self, name: &str, remark: Option<String>) -> ApplicationResult<Vendor> {
        let vendor = self
            .store
            .transaction(|s| Ok(s.catalog.add_vendor(name, remark)?))?;
        info!("created vendor {} ({})", vendor.name, vendor.id);
        Ok(vendor)
    }

    pub fn add_product(
        &self,
        name: &str,
        product_type: ProductType,
        description: Option<String>,
        vendor: Option<VendorId>,
    ) -> ApplicationResult<Product> {
        let product = self.store.transaction(|s| {
            Ok(s.catalog
                .add_product(name, product_type, description, vendor)?)
        })?;
        info!("created product {} ({})", product.name, product.id);
        Ok(product)
    }

    pub fn add_component(
        &self,
        product: ProductId,
        name: &str,
        component_type: ComponentType,
        description: Option<String>,
    ) -> ApplicationResult<Product> {
        self.store.transaction(|s| {
            Ok(s.catalog
                .add_component(product, name, component_type, description)?)
        })
    }

    pub fn add_model(
        &self,
        product: ProductId,
        name: &str,
        remark: Option<String>,
    ) -> ApplicationResult<Product> {
        self.store
            .transaction(|s| Ok(s.catalog.add_model(product, name, remark)?))
    }

    pub fn product(&self, id: ProductId) -> ApplicationResult<Product> {
        Ok(self.store.read(|s| s.catalog.product(id).cloned())??)
    }

    /// Products, newest first.
    pub fn products(&self) -> ApplicationResult<Vec<Product>> {
        self.store.read(|s| s.catalog.products())
    }

    /// Vendors, newest first.
    pub fn vendors(&self) -> ApplicationResult<Vec<Vendor>> {
        self.store.read(|s| s.catalog.vendors())
    }
}
