use crate::{
    commands::Command,
    errors::ServiceError,
    events::EventSender,
    metrics::registered,
    store::DataStore,
};
use lazy_static::lazy_static;
use prometheus::IntCounter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument};
use uuid::Uuid;
use validator::Validate;

use super::{load_order, publish_items_changed};

lazy_static! {
    static ref ORDER_ITEMS_ADDED: IntCounter = registered(
        IntCounter::new(
            "order_items_added_total",
            "Total number of items added to orders"
        )
        .expect("metric can be created")
    );
    static ref ORDER_ITEM_ADD_FAILURES: IntCounter = registered(
        IntCounter::new(
            "order_item_add_failures_total",
            "Total number of failed item additions to orders"
        )
        .expect("metric can be created")
    );
}

/// Adds a menu item to a `Pending` order at the menu's current price.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AddItemToOrderCommand {
    pub order_id: Uuid,
    pub menu_item_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[validate(length(
        max = 250,
        message = "Special instructions cannot exceed 250 characters"
    ))]
    pub special_instructions: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddItemToOrderResult {
    pub id: Uuid,
    pub order_id: Uuid,
    pub menu_item_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub order_total: Decimal,
}

#[async_trait::async_trait]
impl Command for AddItemToOrderCommand {
    type Result = AddItemToOrderResult;

    #[instrument(skip(self, store, event_sender), fields(order_id = %self.order_id))]
    async fn execute(
        &self,
        store: Arc<DataStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let result = self.add_item(&store, &event_sender).await;
        match &result {
            Ok(_) => ORDER_ITEMS_ADDED.inc(),
            Err(e) => {
                ORDER_ITEM_ADD_FAILURES.inc();
                error!(order_id = %self.order_id, "Failed to add item: {}", e);
            }
        }
        result
    }
}

impl AddItemToOrderCommand {
    async fn add_item(
        &self,
        store: &DataStore,
        event_sender: &EventSender,
    ) -> Result<AddItemToOrderResult, ServiceError> {
        self.validate()?;

        let menu_item = store
            .menu_items
            .get_by_id(self.menu_item_id)
            .await?
            .filter(|m| m.is_available())
            .ok_or_else(|| {
                ServiceError::InvalidOperation(format!(
                    "The following menu items are not available: {}",
                    self.menu_item_id
                ))
            })?;

        let mut order = load_order(store, self.order_id).await?;
        let item_id = order.add_item(
            menu_item.id,
            self.quantity,
            menu_item.price(),
            self.special_instructions.clone(),
        )?;
        let order = store.orders.update(order).await?;

        publish_items_changed(event_sender, &order).await?;

        Ok(AddItemToOrderResult {
            id: item_id,
            order_id: order.id,
            menu_item_id: menu_item.id,
            quantity: self.quantity,
            unit_price: menu_item.price(),
            order_total: order.total(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MenuItem, Order, OrderStatus};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn adds_item_and_updates_total() {
        let store = DataStore::in_memory();
        let fries = store
            .menu_items
            .add(MenuItem::new("Fries", "Sides", dec!(3.75), None).unwrap())
            .await
            .unwrap();
        let order = store
            .orders
            .add(Order::new("ORD-3", Uuid::new_v4(), None).unwrap())
            .await
            .unwrap();
        let store = Arc::new(store);
        let (sender, _rx) = EventSender::channel(4);

        let result = AddItemToOrderCommand {
            order_id: order.id,
            menu_item_id: fries.id,
            quantity: 2,
            special_instructions: Some("extra salt".into()),
        }
        .execute(store.clone(), Arc::new(sender))
        .await
        .unwrap();

        assert_eq!(result.order_total, dec!(7.50));
        let stored = store.orders.get_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(stored.items().len(), 1);
        assert_eq!(stored.version, order.version + 1);
    }

    #[tokio::test]
    async fn confirmed_orders_are_frozen() {
        let store = DataStore::in_memory();
        let fries = store
            .menu_items
            .add(MenuItem::new("Fries", "Sides", dec!(3.75), None).unwrap())
            .await
            .unwrap();
        let mut order = Order::new("ORD-4", Uuid::new_v4(), None).unwrap();
        order.update_status(OrderStatus::Confirmed).unwrap();
        let order = store.orders.add(order).await.unwrap();
        let store = Arc::new(store);
        let (sender, _rx) = EventSender::channel(4);

        let err = AddItemToOrderCommand {
            order_id: order.id,
            menu_item_id: fries.id,
            quantity: 1,
            special_instructions: None,
        }
        .execute(store.clone(), Arc::new(sender))
        .await
        .unwrap_err();

        assert!(err.mentions("Cannot add items to order with status: Confirmed"));
        let stored = store.orders.get_by_id(order.id).await.unwrap().unwrap();
        assert!(stored.items().is_empty());
    }
}
