//! Create Product Handler

use std::sync::Arc;

use rust_decimal::Decimal;
use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use pizzeria_app::domain::products::{data::NewProduct, records::ProductUuid};

use crate::{
    extensions::*,
    money::minor_or_422,
    products::{
        errors::into_status_error,
        get::ProductResponse,
        handlers::{
            CustomizationPrice, SizePrice, parse_customizations, parse_sizes, required_text,
        },
    },
    state::State,
};

const fn default_available() -> bool {
    true
}

/// Create Product Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateProductRequest {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    pub category: String,

    #[serde(with = "rust_decimal::serde::float")]
    #[salvo(schema(value_type = f64))]
    pub price: Decimal,

    #[serde(default)]
    pub sizes: Vec<SizePrice>,

    /// Extras customers may add, with their prices
    #[serde(default)]
    pub customizations: Vec<CustomizationPrice>,

    #[serde(default = "default_available")]
    pub available: bool,

    #[serde(default)]
    pub stock: u64,
}

impl CreateProductRequest {
    fn into_new_product(self, uuid: ProductUuid) -> Result<NewProduct, StatusError> {
        Ok(NewProduct {
            uuid,
            name: required_text(&self.name, "name")?,
            description: self.description,
            category: required_text(&self.category, "category")?,
            base_price: minor_or_422(self.price, "price")?,
            sizes: parse_sizes(&self.sizes)?,
            customizations: parse_customizations(&self.customizations)?,
            available: self.available,
            stock: self.stock,
        })
    }
}

/// Create Product Handler
#[endpoint(
    tags("products"),
    summary = "Create Product",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Product created"),
        (status_code = StatusCode::FORBIDDEN, description = "Admin access required"),
        (status_code = StatusCode::CONFLICT, description = "Product already exists"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid product payload"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(name = "products.create", skip(json, depot, res), err)]
pub(crate) async fn handler(
    json: JsonBody<CreateProductRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<ProductResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    depot.admin_or_403()?;

    let product = json.into_inner().into_new_product(ProductUuid::new())?;

    let product = state
        .app
        .products
        .create_product(product)
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/products/{}", product.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    tracing::info!(product_uuid = %product.uuid, name = %product.name, "created product");

    Ok(Json(product.into()))
}
