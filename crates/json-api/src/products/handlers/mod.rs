//! Product Handlers

use rust_decimal::Decimal;
use salvo::{oapi::ToSchema, prelude::StatusError};
use serde::{Deserialize, Serialize};

use pizzeria_app::domain::products::records::{CustomizationPrices, Size, SizePrices};

use crate::money::minor_or_422;

pub(crate) mod create;
pub(crate) mod delete;
pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod update;

/// Price of one size variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub(crate) struct SizePrice {
    /// `small`, `medium` or `large`
    pub size: String,

    /// Price for this size. Zero falls back to the base price.
    #[serde(with = "rust_decimal::serde::float")]
    #[salvo(schema(value_type = f64))]
    pub price: Decimal,
}

/// Validate a size price table from a request payload.
pub(crate) fn parse_sizes(sizes: &[SizePrice]) -> Result<SizePrices, StatusError> {
    sizes
        .iter()
        .map(|entry| {
            let size = entry
                .size
                .parse::<Size>()
                .map_err(|error| StatusError::unprocessable_entity().brief(error.to_string()))?;

            Ok((size, minor_or_422(entry.price, "size price")?))
        })
        .collect()
}

/// An extra offered on a product, with its catalog price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub(crate) struct CustomizationPrice {
    pub name: String,

    #[serde(with = "rust_decimal::serde::float")]
    #[salvo(schema(value_type = f64))]
    pub price: Decimal,
}

/// Validate a customization option table from a request payload.
pub(crate) fn parse_customizations(
    customizations: &[CustomizationPrice],
) -> Result<CustomizationPrices, StatusError> {
    let mut parsed = CustomizationPrices::default();

    for entry in customizations {
        let name = required_text(&entry.name, "customization name")?;
        let price = minor_or_422(entry.price, "customization price")?;

        if parsed.insert(name, price).is_some() {
            return Err(StatusError::unprocessable_entity()
                .brief(format!("customization \"{}\" is listed twice", entry.name.trim())));
        }
    }

    Ok(parsed)
}

/// Validate a required, non-blank text field.
pub(crate) fn required_text(value: &str, field: &str) -> Result<String, StatusError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(StatusError::unprocessable_entity().brief(format!("{field} must not be blank")));
    }

    Ok(value.to_string())
}
