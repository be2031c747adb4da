//! Merge Cart Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use pizzeria_app::domain::identity::GuestSession;

use crate::{
    carts::{errors::into_status_error, handlers::CartResponse},
    extensions::*,
    state::State,
};

/// Merge Cart Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct MergeCartRequest {
    /// Session id the guest cart was built under
    pub session_id: String,
}

/// Merge Cart Handler
///
/// Folds a guest cart into the signed-in user's cart after login.
#[endpoint(
    tags("carts"),
    summary = "Merge Guest Cart",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Carts merged"),
        (status_code = StatusCode::FORBIDDEN, description = "Guests cannot merge carts"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid session id"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(name = "carts.merge", skip(json, depot), fields(user_uuid = tracing::field::Empty), err)]
pub(crate) async fn handler(
    json: JsonBody<MergeCartRequest>,
    depot: &mut Depot,
) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_or_403()?;

    tracing::Span::current().record("user_uuid", tracing::field::display(user));

    let guest = GuestSession::parse(&json.into_inner().session_id).map_err(|error| {
        StatusError::unprocessable_entity().brief(format!("Invalid session id: {error}"))
    })?;

    let cart = state
        .app
        .carts
        .merge_carts(user, guest)
        .await
        .map_err(into_status_error)?;

    tracing::info!(items = cart.items.len(), "merged guest cart");

    Ok(Json(cart.into()))
}
