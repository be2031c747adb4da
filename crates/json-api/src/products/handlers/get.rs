//! Get Product Handler

use std::{string::ToString, sync::Arc};

use rust_decimal::Decimal;
use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pizzeria_app::domain::products::records::{ProductRecord, Size};

use crate::{
    extensions::*,
    money::to_decimal,
    products::{
        errors::into_status_error,
        handlers::{CustomizationPrice, SizePrice},
    },
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ProductResponse {
    /// The unique identifier of the product
    pub uuid: Uuid,

    pub name: String,

    pub description: Option<String>,

    pub category: String,

    /// Base price, used for any size without its own price
    #[serde(with = "rust_decimal::serde::float")]
    #[salvo(schema(value_type = f64))]
    pub price: Decimal,

    /// Effective price of every size
    pub sizes: Vec<SizePrice>,

    /// Extras that can be added, sorted by name
    pub customizations: Vec<CustomizationPrice>,

    pub available: bool,

    pub stock: u64,

    /// The date and time the product was created
    pub created_at: String,

    /// The date and time the product was last updated
    pub updated_at: String,
}

impl From<ProductRecord> for ProductResponse {
    fn from(product: ProductRecord) -> Self {
        let sizes = Size::ALL
            .into_iter()
            .map(|size| SizePrice {
                size: size.to_string(),
                price: to_decimal(product.price_for(size)),
            })
            .collect();

        let mut customizations: Vec<_> = product
            .customizations
            .iter()
            .map(|(name, &price)| CustomizationPrice {
                name: name.clone(),
                price: to_decimal(price),
            })
            .collect();
        customizations.sort_unstable_by(|a, b| a.name.cmp(&b.name));

        ProductResponse {
            uuid: product.uuid.into(),
            name: product.name,
            description: product.description,
            category: product.category,
            price: to_decimal(product.base_price),
            sizes,
            customizations,
            available: product.available,
            stock: product.stock,
            created_at: product.created_at.to_string(),
            updated_at: product.updated_at.to_string(),
        }
    }
}

/// Get Product Handler
///
/// Returns a product.
#[endpoint(
    tags("products"),
    summary = "Get Product",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Product found"),
        (status_code = StatusCode::NOT_FOUND, description = "Product not found"),
    ),
)]
pub(crate) async fn handler(
    product: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<ProductResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let product = state
        .app
        .products
        .get_product(product.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(product.into()))
}
