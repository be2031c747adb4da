//! Request identity resolution.

pub(crate) mod middleware;

/// Header carrying an anonymous shopper's session id.
pub(crate) const SESSION_ID_HEADER: &str = "x-session-id";
