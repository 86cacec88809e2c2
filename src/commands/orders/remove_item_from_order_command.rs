use crate::{commands::Command, errors::ServiceError, events::EventSender, store::DataStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use super::{load_order, publish_items_changed, OrderItemsResult};

/// Removes a line from a `Pending` order. Removing an id the order does not
/// contain is a no-op.
#[derive(Debug, Serialize, Deserialize)]
pub struct RemoveItemFromOrderCommand {
    pub order_id: Uuid,
    pub item_id: Uuid,
}

#[async_trait::async_trait]
impl Command for RemoveItemFromOrderCommand {
    type Result = OrderItemsResult;

    #[instrument(skip(self, store, event_sender), fields(order_id = %self.order_id, item_id = %self.item_id))]
    async fn execute(
        &self,
        store: Arc<DataStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let mut order = load_order(&store, self.order_id).await?;
        order.remove_item(self.item_id)?;
        let order = store.orders.update(order).await?;

        publish_items_changed(&event_sender, &order).await?;

        Ok(OrderItemsResult::from(&order))
    }
}
