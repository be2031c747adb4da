//! Request identities.
//!
//! Every cart and order belongs to exactly one owner: an authenticated user or an
//! anonymous guest session.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::{Role, UserUuid};

/// Longest accepted guest session id.
pub const GUEST_SESSION_MAX_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidGuestSession {
    #[error("session id must not be empty")]
    Empty,

    #[error("session id must be at most {GUEST_SESSION_MAX_LEN} characters")]
    TooLong,

    #[error("session id may only contain visible ASCII characters")]
    InvalidCharacter,
}

/// Client supplied session token identifying an anonymous shopper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct GuestSession(String);

impl GuestSession {
    /// Validate a raw session id.
    ///
    /// # Errors
    ///
    /// Returns an error when the value is empty, longer than
    /// [`GUEST_SESSION_MAX_LEN`], or contains anything but visible ASCII.
    pub fn parse(raw: &str) -> Result<Self, InvalidGuestSession> {
        if raw.is_empty() {
            return Err(InvalidGuestSession::Empty);
        }

        if raw.len() > GUEST_SESSION_MAX_LEN {
            return Err(InvalidGuestSession::TooLong);
        }

        if !raw.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(InvalidGuestSession::InvalidCharacter);
        }

        Ok(Self(raw.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for GuestSession {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;

        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for GuestSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Owner of a cart or order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    User(UserUuid),
    Guest(GuestSession),
}

impl Identity {
    #[must_use]
    pub fn user(&self) -> Option<UserUuid> {
        match self {
            Self::User(user) => Some(*user),
            Self::Guest(_) => None,
        }
    }

    #[must_use]
    pub fn session(&self) -> Option<&GuestSession> {
        match self {
            Self::User(_) => None,
            Self::Guest(session) => Some(session),
        }
    }

    /// Column values for the `(user_uuid, session_id)` owner pair.
    pub(crate) fn owner_columns(&self) -> (Option<Uuid>, Option<&str>) {
        match self {
            Self::User(user) => (Some(user.into_uuid()), None),
            Self::Guest(session) => (None, Some(session.as_str())),
        }
    }

    /// Rebuild an identity from stored owner columns.
    pub(crate) fn from_owner_columns(
        user_uuid: Option<Uuid>,
        session_id: Option<String>,
    ) -> Option<Self> {
        match (user_uuid, session_id) {
            (Some(user), None) => Some(Self::User(UserUuid::from_uuid(user))),
            (None, Some(session)) => GuestSession::parse(&session).ok().map(Self::Guest),
            _ => None,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(user) => write!(f, "user:{user}"),
            Self::Guest(_) => f.write_str("guest"),
        }
    }
}

/// The identity performing an operation together with its access level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub identity: Identity,
    pub role: Role,
}

impl Actor {
    #[must_use]
    pub fn user(uuid: UserUuid, role: Role) -> Self {
        Self {
            identity: Identity::User(uuid),
            role,
        }
    }

    #[must_use]
    pub fn guest(session: GuestSession) -> Self {
        Self {
            identity: Identity::Guest(session),
            role: Role::Customer,
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_session_accepts_visible_ascii() {
        assert!(GuestSession::parse("abc-123_XYZ").is_ok());
        assert!(GuestSession::parse(&"s".repeat(GUEST_SESSION_MAX_LEN)).is_ok());
    }

    #[test]
    fn guest_session_rejects_bad_values() {
        assert_eq!(GuestSession::parse(""), Err(InvalidGuestSession::Empty));
        assert_eq!(
            GuestSession::parse(&"s".repeat(GUEST_SESSION_MAX_LEN + 1)),
            Err(InvalidGuestSession::TooLong)
        );
        assert_eq!(
            GuestSession::parse("has space"),
            Err(InvalidGuestSession::InvalidCharacter)
        );
        assert_eq!(
            GuestSession::parse("caf\u{e9}"),
            Err(InvalidGuestSession::InvalidCharacter)
        );
    }

    #[test]
    fn owner_columns_hold_exactly_one_owner() {
        let user = UserUuid::new();
        let guest = GuestSession::parse("guest-1").expect("valid session");

        assert_eq!(
            Identity::User(user).owner_columns(),
            (Some(user.into_uuid()), None)
        );
        assert_eq!(
            Identity::Guest(guest).owner_columns(),
            (None, Some("guest-1"))
        );
    }

    #[test]
    fn from_owner_columns_rejects_ambiguous_rows() {
        let uuid = Uuid::now_v7();

        assert!(Identity::from_owner_columns(None, None).is_none());
        assert!(Identity::from_owner_columns(Some(uuid), Some("s".to_string())).is_none());
        assert_eq!(
            Identity::from_owner_columns(Some(uuid), None),
            Some(Identity::User(UserUuid::from_uuid(uuid)))
        );
    }

    #[test]
    fn guests_are_never_admins() {
        let guest = GuestSession::parse("guest-1").expect("valid session");

        assert!(!Actor::guest(guest).is_admin());
        assert!(Actor::user(UserUuid::new(), Role::Admin).is_admin());
    }
}
