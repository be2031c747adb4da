//! Order event publishing.
//!
//! Events are published after the originating transaction commits. Failures are
//! logged by the caller and never undo or fail the operation.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::domain::{
    identity::Identity,
    orders::{
        records::{OrderRecord, OrderUuid},
        status::OrderStatus,
    },
};

/// Failure reported by a sink that delivers outside the process, such as a
/// websocket or push relay. The log and broadcast sinks never fail.
#[derive(Debug, Error)]
pub enum OrderEventsError {
    #[error("event publisher is closed")]
    Closed,
}

/// Payload delivered to real-time listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Created {
        order: OrderUuid,
        number: String,
        total: u64,
    },
    StatusChanged {
        order: OrderUuid,
        number: String,
        from: OrderStatus,
        to: OrderStatus,
    },
}

impl OrderEvent {
    #[must_use]
    pub fn created(order: &OrderRecord) -> Self {
        Self::Created {
            order: order.uuid,
            number: order.number.clone(),
            total: order.total,
        }
    }

    #[must_use]
    pub fn status_changed(order: &OrderRecord, from: OrderStatus) -> Self {
        Self::StatusChanged {
            order: order.uuid,
            number: order.number.clone(),
            from,
            to: order.status,
        }
    }
}

#[automock]
#[async_trait]
pub trait OrderEvents: Send + Sync {
    /// A new order was placed.
    async fn order_created(&self, order: &OrderRecord) -> Result<(), OrderEventsError>;

    /// An order moved from `previous` to its current status.
    async fn status_changed(
        &self,
        order: &OrderRecord,
        previous: OrderStatus,
    ) -> Result<(), OrderEventsError>;
}

/// Publish `event`, logging instead of propagating failures.
pub(crate) async fn publish_created(events: &dyn OrderEvents, order: &OrderRecord) {
    if let Err(error) = events.order_created(order).await {
        warn!(%error, order_number = %order.number, "failed to publish order created event");
    }
}

pub(crate) async fn publish_status_changed(
    events: &dyn OrderEvents,
    order: &OrderRecord,
    previous: OrderStatus,
) {
    if let Err(error) = events.status_changed(order, previous).await {
        warn!(%error, order_number = %order.number, "failed to publish order status event");
    }
}

/// Writes events to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOrderEvents;

#[async_trait]
impl OrderEvents for LogOrderEvents {
    async fn order_created(&self, order: &OrderRecord) -> Result<(), OrderEventsError> {
        let guest = matches!(order.owner, Identity::Guest(_));

        info!(
            order_number = %order.number,
            order_type = %order.order_type,
            total = order.total,
            guest,
            "order created"
        );

        Ok(())
    }

    async fn status_changed(
        &self,
        order: &OrderRecord,
        previous: OrderStatus,
    ) -> Result<(), OrderEventsError> {
        info!(
            order_number = %order.number,
            from = %previous,
            to = %order.status,
            "order status changed"
        );

        Ok(())
    }
}

/// Fans events out to in-process subscribers.
#[derive(Debug, Clone)]
pub struct BroadcastOrderEvents {
    sender: broadcast::Sender<OrderEvent>,
}

impl BroadcastOrderEvents {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));

        Self { sender }
    }

    /// Hook point for a real-time relay (websocket, SSE). No relay ships with
    /// the server, so only tests subscribe today.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.sender.subscribe()
    }

    fn send(&self, event: OrderEvent) {
        // No subscribers is not an error.
        if let Err(broadcast::error::SendError(event)) = self.sender.send(event) {
            debug!(?event, "no order event subscribers");
        }
    }
}

#[async_trait]
impl OrderEvents for BroadcastOrderEvents {
    async fn order_created(&self, order: &OrderRecord) -> Result<(), OrderEventsError> {
        self.send(OrderEvent::created(order));

        Ok(())
    }

    async fn status_changed(
        &self,
        order: &OrderRecord,
        previous: OrderStatus,
    ) -> Result<(), OrderEventsError> {
        self.send(OrderEvent::status_changed(order, previous));

        Ok(())
    }
}

/// Publishes to several sinks, reporting the first failure after trying all.
#[derive(Clone, Default)]
pub struct FanoutOrderEvents {
    sinks: Vec<Arc<dyn OrderEvents>>,
}

impl FanoutOrderEvents {
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn OrderEvents>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl OrderEvents for FanoutOrderEvents {
    async fn order_created(&self, order: &OrderRecord) -> Result<(), OrderEventsError> {
        let mut outcome = Ok(());

        for sink in &self.sinks {
            if let Err(error) = sink.order_created(order).await
                && outcome.is_ok()
            {
                outcome = Err(error);
            }
        }

        outcome
    }

    async fn status_changed(
        &self,
        order: &OrderRecord,
        previous: OrderStatus,
    ) -> Result<(), OrderEventsError> {
        let mut outcome = Ok(());

        for sink in &self.sinks {
            if let Err(error) = sink.status_changed(order, previous).await
                && outcome.is_ok()
            {
                outcome = Err(error);
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::test::helpers::sample_order;

    use super::*;

    #[tokio::test]
    async fn broadcast_delivers_to_subscribers() -> TestResult {
        let events = BroadcastOrderEvents::new(8);
        let mut receiver = events.subscribe();
        let order = sample_order();

        events.order_created(&order).await?;
        events.status_changed(&order, OrderStatus::Pending).await?;

        assert_eq!(receiver.recv().await?, OrderEvent::created(&order));
        assert_eq!(
            receiver.recv().await?,
            OrderEvent::status_changed(&order, OrderStatus::Pending)
        );

        Ok(())
    }

    #[tokio::test]
    async fn broadcast_without_subscribers_is_ok() -> TestResult {
        let events = BroadcastOrderEvents::new(8);

        events.order_created(&sample_order()).await?;

        Ok(())
    }

    #[tokio::test]
    async fn fanout_tries_every_sink() {
        let mut failing = MockOrderEvents::new();
        failing
            .expect_order_created()
            .once()
            .returning(|_| Err(OrderEventsError::Closed));

        let mut working = MockOrderEvents::new();
        working.expect_order_created().once().returning(|_| Ok(()));

        let fanout = FanoutOrderEvents::new(vec![Arc::new(failing), Arc::new(working)]);

        let result = fanout.order_created(&sample_order()).await;

        assert!(matches!(result, Err(OrderEventsError::Closed)));
    }

    #[test]
    fn events_serialize_with_type_tag() -> TestResult {
        let order = sample_order();

        let json = serde_json::to_value(OrderEvent::status_changed(&order, OrderStatus::Pending))?;

        assert_eq!(json["type"], "status_changed");
        assert_eq!(json["from"], "pending");
        assert_eq!(json["number"], order.number);

        Ok(())
    }
}
