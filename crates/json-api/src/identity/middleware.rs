//! Identity middleware.
//!
//! A bearer token identifies a registered user. Without one, an `X-Session-Id`
//! header identifies a guest. Requests carrying neither are rejected.

use std::sync::Arc;

use pizzeria_app::{
    auth::AuthServiceError,
    domain::identity::{Actor, GuestSession},
};
use salvo::{http::header::AUTHORIZATION, prelude::*};
use tracing::error;

use crate::{extensions::*, identity::SESSION_ID_HEADER, state::State};

#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    match resolve_actor(req, depot).await {
        Ok(actor) => {
            depot.insert_actor(actor);

            ctrl.call_next(req, depot, res).await;
        }
        Err(status) => {
            res.render(status);

            ctrl.skip_rest();
        }
    }
}

async fn resolve_actor(req: &Request, depot: &Depot) -> Result<Actor, StatusError> {
    if req.headers().contains_key(AUTHORIZATION) {
        let token = extract_bearer_token(req).ok_or_else(|| {
            StatusError::unauthorized().brief("Missing or invalid Authorization header")
        })?;

        return authenticate(depot, token).await;
    }

    let Some(session) = req.header::<String>(SESSION_ID_HEADER) else {
        return Err(StatusError::unauthorized().brief("Missing credentials or session id"));
    };

    GuestSession::parse(&session)
        .map(Actor::guest)
        .map_err(|error| StatusError::unauthorized().brief(format!("Invalid session id: {error}")))
}

async fn authenticate(depot: &Depot, token: &str) -> Result<Actor, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    match state.app.auth.authenticate_bearer(token).await {
        Ok(user) => Ok(Actor::user(user.uuid, user.role)),
        Err(AuthServiceError::NotFound) => {
            Err(StatusError::unauthorized().brief("Invalid API token"))
        }
        Err(source) => {
            error!("failed to authenticate api token: {source}");

            Err(StatusError::internal_server_error())
        }
    }
}

fn extract_bearer_token(req: &Request) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }

    Some(token)
}

#[cfg(test)]
mod tests {
    use pizzeria_app::auth::{AuthenticatedUser, MockAuthService, Role};
    use salvo::{
        affix_state::inject,
        test::{ResponseExt, TestClient},
    };
    use testresult::TestResult;

    use crate::test_helpers::{Mocks, TEST_USER_UUID};

    use super::*;

    #[salvo::handler]
    async fn echo_actor(depot: &mut Depot, res: &mut Response) {
        let actor = depot
            .actor_or_401()
            .map_or_else(|_| "missing".to_string(), |actor| format!("{:?}", actor.role));

        let identity = depot
            .identity_or_401()
            .map_or_else(|_| "missing".to_string(), ToString::to_string);

        res.render(format!("{identity} {actor}"));
    }

    fn make_service(auth: MockAuthService) -> Service {
        let state = Mocks {
            auth,
            ..Mocks::default()
        }
        .into_state();

        let router = Router::new()
            .hoop(inject(state))
            .hoop(handler)
            .push(Router::new().get(echo_actor));

        Service::new(router)
    }

    fn never_called() -> MockAuthService {
        let mut auth = MockAuthService::new();

        auth.expect_authenticate_bearer().never();

        auth
    }

    #[tokio::test]
    async fn test_missing_credentials_returns_401() -> TestResult {
        let res = TestClient::get("http://example.com")
            .send(&make_service(never_called()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn test_non_bearer_authorization_header_returns_401() -> TestResult {
        let res = TestClient::get("http://example.com")
            .add_header(AUTHORIZATION, "Basic abc123", true)
            .add_header(SESSION_ID_HEADER, "guest-1", true)
            .send(&make_service(never_called()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_token_returns_401_even_with_session() -> TestResult {
        let mut auth = MockAuthService::new();

        auth.expect_authenticate_bearer()
            .once()
            .withf(|token| token == "pz_v1_bad")
            .return_once(|_| Err(AuthServiceError::NotFound));

        let res = TestClient::get("http://example.com")
            .add_header(AUTHORIZATION, "Bearer pz_v1_bad", true)
            .add_header(SESSION_ID_HEADER, "guest-1", true)
            .send(&make_service(auth))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn test_valid_token_injects_user() -> TestResult {
        let mut auth = MockAuthService::new();

        auth.expect_authenticate_bearer()
            .once()
            .withf(|token| token == "pz_v1_good")
            .return_once(|_| {
                Ok(AuthenticatedUser {
                    uuid: TEST_USER_UUID,
                    role: Role::Admin,
                })
            });

        let mut res = TestClient::get("http://example.com")
            .add_header(AUTHORIZATION, "Bearer pz_v1_good", true)
            .send(&make_service(auth))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(
            res.take_string().await?,
            format!("user:{TEST_USER_UUID} Admin")
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_session_header_injects_guest() -> TestResult {
        let mut res = TestClient::get("http://example.com")
            .add_header(SESSION_ID_HEADER, "guest-1", true)
            .send(&make_service(never_called()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(res.take_string().await?, "guest Customer");

        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_session_returns_401() -> TestResult {
        let res = TestClient::get("http://example.com")
            .add_header(SESSION_ID_HEADER, "x".repeat(129), true)
            .send(&make_service(never_called()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn test_storage_failure_returns_500() -> TestResult {
        let mut auth = MockAuthService::new();

        auth.expect_authenticate_bearer()
            .once()
            .return_once(|_| Err(AuthServiceError::Sql(sqlx::Error::PoolTimedOut)));

        let res = TestClient::get("http://example.com")
            .add_header(AUTHORIZATION, "Bearer pz_v1_good", true)
            .send(&make_service(auth))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::INTERNAL_SERVER_ERROR));

        Ok(())
    }
}
