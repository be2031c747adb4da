//! Cart Data

use smallvec::SmallVec;

use crate::domain::products::records::{ProductUuid, Size};

/// Names of the extras requested for a line. Prices come from the product catalog.
pub type CustomizationNames = SmallVec<[String; 4]>;

/// New Cart Item Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewCartItem {
    pub product_uuid: ProductUuid,
    pub quantity: u32,
    pub size: Size,
    pub customizations: CustomizationNames,
    pub notes: Option<String>,
}
