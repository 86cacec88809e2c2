use tracing::{error, info};
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    events::{Event, EventSender},
    models::Order,
    store::DataStore,
};

pub mod add_item_to_order_command;
pub mod advance_order_command;
pub mod create_order_command;
pub mod remove_item_from_order_command;
pub mod update_order_item_quantity_command;
pub mod update_order_status_command;

// Re-export commands for easier access
pub use add_item_to_order_command::AddItemToOrderCommand;
pub use advance_order_command::AdvanceOrderCommand;
pub use create_order_command::{CreateOrderCommand, CreateOrderItem};
pub use remove_item_from_order_command::RemoveItemFromOrderCommand;
pub use update_order_item_quantity_command::UpdateOrderItemQuantityCommand;
pub use update_order_status_command::UpdateOrderStatusCommand;

/// Result shared by the item mutation commands.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct OrderItemsResult {
    pub order_id: Uuid,
    pub item_count: usize,
    pub total: rust_decimal::Decimal,
    pub version: i32,
}

impl From<&Order> for OrderItemsResult {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id,
            item_count: order.items().len(),
            total: order.total(),
            version: order.version,
        }
    }
}

pub(crate) async fn load_order(store: &DataStore, order_id: Uuid) -> Result<Order, ServiceError> {
    store.orders.get_by_id(order_id).await?.ok_or_else(|| {
        let msg = format!("Order {} not found", order_id);
        error!("{}", msg);
        ServiceError::NotFound(msg)
    })
}

pub(crate) async fn publish_items_changed(
    event_sender: &EventSender,
    order: &Order,
) -> Result<(), ServiceError> {
    info!(
        order_id = %order.id,
        items_count = order.items().len(),
        total = %order.total(),
        "Order items changed"
    );

    event_sender
        .send(Event::OrderItemsChanged(order.id))
        .await
        .map_err(|e| {
            let msg = format!("Failed to send event for order items: {}", e);
            error!("{}", msg);
            ServiceError::EventError(msg)
        })
}
