use crate::{commands::Command, errors::ServiceError, events::EventSender, store::DataStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use super::{load_order, publish_items_changed, OrderItemsResult};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateOrderItemQuantityCommand {
    pub order_id: Uuid,
    pub item_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
}

#[async_trait::async_trait]
impl Command for UpdateOrderItemQuantityCommand {
    type Result = OrderItemsResult;

    #[instrument(skip(self, store, event_sender), fields(order_id = %self.order_id, item_id = %self.item_id))]
    async fn execute(
        &self,
        store: Arc<DataStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;

        let mut order = load_order(&store, self.order_id).await?;
        order.update_item_quantity(self.item_id, self.quantity)?;
        let order = store.orders.update(order).await?;

        publish_items_changed(&event_sender, &order).await?;

        Ok(OrderItemsResult::from(&order))
    }
}
