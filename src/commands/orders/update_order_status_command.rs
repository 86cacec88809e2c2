use crate::{
    commands::Command,
    errors::ServiceError,
    events::{Event, EventSender},
    metrics::registered,
    models::{Order, OrderStatus},
    store::DataStore,
};
use lazy_static::lazy_static;
use prometheus::IntCounter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use super::load_order;

lazy_static! {
    static ref ORDER_STATUS_UPDATES: IntCounter = registered(
        IntCounter::new(
            "order_status_updates_total",
            "Total number of order status updates"
        )
        .expect("metric can be created")
    );
    static ref ORDER_STATUS_UPDATE_FAILURES: IntCounter = registered(
        IntCounter::new(
            "order_status_update_failures_total",
            "Total number of failed order status updates"
        )
        .expect("metric can be created")
    );
}

/// Moves an order along the transition table
/// (Pending -> Confirmed -> Preparing -> Ready -> Served -> Completed, or
/// to Cancelled from anything but Completed).
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateOrderStatusCommand {
    pub order_id: Uuid,
    pub new_status: OrderStatus,
    /// Version the caller last saw, for optimistic locking
    pub version: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateOrderStatusResult {
    pub id: Uuid,
    pub old_status: String,
    pub status: String,
    pub version: i32,
}

#[async_trait::async_trait]
impl Command for UpdateOrderStatusCommand {
    type Result = UpdateOrderStatusResult;

    #[instrument(skip(self, store, event_sender), fields(order_id = %self.order_id))]
    async fn execute(
        &self,
        store: Arc<DataStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let (old_status, updated_order) =
            self.update_order_status(&store).await.map_err(|e| {
                ORDER_STATUS_UPDATE_FAILURES.inc();
                e
            })?;

        self.log_and_trigger_event(&event_sender, old_status, &updated_order)
            .await?;

        ORDER_STATUS_UPDATES.inc();

        Ok(UpdateOrderStatusResult {
            id: updated_order.id,
            old_status: old_status.to_string(),
            status: updated_order.status().to_string(),
            version: updated_order.version,
        })
    }
}

impl UpdateOrderStatusCommand {
    async fn update_order_status(
        &self,
        store: &DataStore,
    ) -> Result<(OrderStatus, Order), ServiceError> {
        let mut order = load_order(store, self.order_id).await?;

        if let Some(version) = self.version {
            if order.version != version {
                warn!(
                    "Concurrent modification detected for order {}",
                    self.order_id
                );
                return Err(ServiceError::ConcurrentModification(self.order_id));
            }
        }

        let old_status = order.status();
        order.update_status(self.new_status).map_err(|e| {
            error!(order_id = %self.order_id, "{}", e);
            e
        })?;

        let updated = store.orders.update(order).await?;
        Ok((old_status, updated))
    }

    async fn log_and_trigger_event(
        &self,
        event_sender: &EventSender,
        old_status: OrderStatus,
        updated_order: &Order,
    ) -> Result<(), ServiceError> {
        info!(
            order_id = %self.order_id,
            old_status = %old_status,
            new_status = %updated_order.status(),
            "Order status updated successfully"
        );

        event_sender
            .send(Event::OrderStatusChanged {
                order_id: self.order_id,
                old_status: old_status.to_string(),
                new_status: updated_order.status().to_string(),
            })
            .await
            .map_err(|e| {
                ORDER_STATUS_UPDATE_FAILURES.inc();
                let msg = format!("Failed to send event for updated order: {}", e);
                error!("{}", msg);
                ServiceError::EventError(msg)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    async fn store_with_order() -> (Arc<DataStore>, Order) {
        let store = DataStore::in_memory();
        let order = store
            .orders
            .add(Order::new("ORD-1", Uuid::new_v4(), None).unwrap())
            .await
            .unwrap();
        (Arc::new(store), order)
    }

    #[tokio::test]
    async fn valid_transition_is_persisted_and_published() {
        let (store, order) = store_with_order().await;
        let (sender, mut rx) = EventSender::channel(4);

        let result = UpdateOrderStatusCommand {
            order_id: order.id,
            new_status: OrderStatus::Confirmed,
            version: Some(order.version),
        }
        .execute(store.clone(), Arc::new(sender))
        .await
        .unwrap();

        assert_eq!(result.old_status, "Pending");
        assert_eq!(result.status, "Confirmed");
        assert_eq!(result.version, order.version + 1);
        assert_matches!(
            rx.recv().await,
            Some(Event::OrderStatusChanged { new_status, .. }) if new_status == "Confirmed"
        );
    }

    #[tokio::test]
    async fn invalid_transition_leaves_stored_order_untouched() {
        let (store, order) = store_with_order().await;
        let (sender, _rx) = EventSender::channel(4);

        let err = UpdateOrderStatusCommand {
            order_id: order.id,
            new_status: OrderStatus::Served,
            version: None,
        }
        .execute(store.clone(), Arc::new(sender))
        .await
        .unwrap_err();

        assert!(err.mentions("Invalid status transition from Pending to Served"));
        let stored = store.orders.get_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(stored, order);
    }

    #[tokio::test]
    async fn stale_version_is_rejected() {
        let (store, order) = store_with_order().await;
        let (sender, _rx) = EventSender::channel(4);

        let err = UpdateOrderStatusCommand {
            order_id: order.id,
            new_status: OrderStatus::Confirmed,
            version: Some(order.version + 7),
        }
        .execute(store, Arc::new(sender))
        .await
        .unwrap_err();
        assert_matches!(err, ServiceError::ConcurrentModification(id) if id == order.id);
    }
}
