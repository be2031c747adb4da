//! Order status workflow.
//!
//! One transition table drives two permission-scoped entry points: the admin
//! workflow and owner-initiated cancellation.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::Preparing,
        Self::Ready,
        Self::Delivered,
        Self::Cancelled,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown order status \"{0}\"")]
pub struct UnknownOrderStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| UnknownOrderStatus(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot move order from {from} to {to}")]
pub struct TransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// Configurable parts of the workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusPolicy {
    /// Allow admins to cancel orders that are already `ready`.
    pub admin_may_cancel_ready: bool,
}

/// The shared transition table.
const fn allowed(from: OrderStatus, to: OrderStatus, cancel_ready: bool) -> bool {
    use self::OrderStatus::{Cancelled, Confirmed, Delivered, Pending, Preparing, Ready};

    match (from, to) {
        (Pending, Confirmed | Cancelled)
        | (Confirmed, Preparing | Cancelled)
        | (Preparing, Ready | Cancelled)
        | (Ready, Delivered) => true,
        (Ready, Cancelled) => cancel_ready,
        _ => false,
    }
}

impl StatusPolicy {
    /// Check a transition requested through the admin workflow.
    ///
    /// # Errors
    ///
    /// Returns an error if `to` is not reachable from `from`.
    pub const fn admin_transition(
        &self,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<(), TransitionError> {
        if allowed(from, to, self.admin_may_cancel_ready) {
            Ok(())
        } else {
            Err(TransitionError { from, to })
        }
    }

    /// Check a cancellation requested by the order's owner, which is only
    /// possible before preparation starts.
    ///
    /// # Errors
    ///
    /// Returns an error unless the order is `pending` or `confirmed`.
    pub const fn owner_cancellation(&self, from: OrderStatus) -> Result<(), TransitionError> {
        let to = OrderStatus::Cancelled;

        if matches!(from, OrderStatus::Pending | OrderStatus::Confirmed) && allowed(from, to, false)
        {
            Ok(())
        } else {
            Err(TransitionError { from, to })
        }
    }
}
