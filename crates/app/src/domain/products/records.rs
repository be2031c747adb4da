//! Product Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::uuids::TypedUuid;

/// Product UUID
pub type ProductUuid = TypedUuid<ProductRecord>;

/// Size variant a product can be ordered in.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    Small,
    #[default]
    Medium,
    Large,
}

impl Size {
    pub const ALL: [Self; 3] = [Self::Small, Self::Medium, Self::Large];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown size \"{0}\"")]
pub struct UnknownSize(pub String);

impl FromStr for Size {
    type Err = UnknownSize;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|size| size.as_str() == value)
            .ok_or_else(|| UnknownSize(value.to_string()))
    }
}

/// Per-size price table. Missing or zero entries fall back to the base price.
pub type SizePrices = FxHashMap<Size, u64>;

/// Extras a product can be ordered with, keyed by name.
pub type CustomizationPrices = FxHashMap<String, u64>;

/// Product Record
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub uuid: ProductUuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub base_price: u64,
    pub sizes: SizePrices,
    pub customizations: CustomizationPrices,
    pub available: bool,
    pub stock: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl ProductRecord {
    /// Unit price for the given size.
    #[must_use]
    pub fn price_for(&self, size: Size) -> u64 {
        match self.sizes.get(&size) {
            Some(&price) if price > 0 => price,
            _ => self.base_price,
        }
    }

    /// Catalog price of the named extra, or `None` when the product does not offer it.
    #[must_use]
    pub fn customization_price(&self, name: &str) -> Option<u64> {
        self.customizations.get(name.trim()).copied()
    }

    /// Whether `quantity` units could be sold right now.
    #[must_use]
    pub fn can_supply(&self, quantity: u64) -> bool {
        self.available && self.deleted_at.is_none() && self.stock >= quantity
    }
}
