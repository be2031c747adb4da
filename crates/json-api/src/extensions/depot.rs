//! Depot helper extensions.

use std::any::Any;

use pizzeria_app::{
    auth::UserUuid,
    domain::identity::{Actor, Identity},
};
use salvo::prelude::{Depot, StatusError};

/// Helpers for mapping depot extraction failures to HTTP errors.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError>;

    /// Store the identity resolved for this request.
    fn insert_actor(&mut self, actor: Actor);

    fn actor_or_401(&self) -> Result<&Actor, StatusError>;

    fn identity_or_401(&self) -> Result<&Identity, StatusError> {
        self.actor_or_401().map(|actor| &actor.identity)
    }

    /// The request actor, provided it has the admin role.
    fn admin_or_403(&self) -> Result<&Actor, StatusError> {
        let actor = self.actor_or_401()?;

        if actor.is_admin() {
            Ok(actor)
        } else {
            Err(StatusError::forbidden().brief("Admin access required"))
        }
    }

    /// The authenticated user behind the request. Guests are refused.
    fn user_or_403(&self) -> Result<UserUuid, StatusError> {
        self.identity_or_401()?
            .user()
            .ok_or_else(|| StatusError::forbidden().brief("Sign in required"))
    }
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError> {
        self.obtain::<T>()
            .map_err(|_ignored| StatusError::internal_server_error())
    }

    fn insert_actor(&mut self, actor: Actor) {
        self.inject(actor);
    }

    fn actor_or_401(&self) -> Result<&Actor, StatusError> {
        self.obtain::<Actor>()
            .map_err(|_ignored| StatusError::unauthorized())
    }
}
