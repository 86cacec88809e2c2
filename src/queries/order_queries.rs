use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::Query;
use crate::{errors::ServiceError, models::Order, store::DataStore};

/// Struct to get a specific order by ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetOrderQuery {
    pub order_id: Uuid,
}

#[async_trait]
impl Query for GetOrderQuery {
    type Result = Option<Order>;

    #[instrument(skip(self, store), fields(order_id = %self.order_id))]
    async fn execute(&self, store: &DataStore) -> Result<Self::Result, ServiceError> {
        debug!("Executing GetOrderQuery");
        store.orders.get_by_id(self.order_id).await
    }
}

/// Orders the kitchen still has to deal with (Pending, Confirmed, Preparing
/// or Ready), oldest first.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GetKitchenOrdersQuery;

#[async_trait]
impl Query for GetKitchenOrdersQuery {
    type Result = Vec<Order>;

    #[instrument(skip(self, store))]
    async fn execute(&self, store: &DataStore) -> Result<Self::Result, ServiceError> {
        debug!("Executing GetKitchenOrdersQuery");
        let mut orders: Vec<Order> = store
            .orders
            .list()
            .await?
            .into_iter()
            .filter(|o| o.status().is_kitchen_active())
            .collect();
        orders.sort_by_key(|o| o.order_date);
        Ok(orders)
    }
}
