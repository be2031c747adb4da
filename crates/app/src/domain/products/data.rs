//! Products Data

use crate::domain::products::records::{CustomizationPrices, ProductUuid, SizePrices};

/// New Product Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub uuid: ProductUuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub base_price: u64,
    pub sizes: SizePrices,
    pub customizations: CustomizationPrices,
    pub available: bool,
    pub stock: u64,
}

/// Product Update Data
#[derive(Debug, Clone, PartialEq)]
pub struct ProductUpdate {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub base_price: u64,
    pub sizes: SizePrices,
    pub customizations: CustomizationPrices,
    pub available: bool,
    pub stock: u64,
}
