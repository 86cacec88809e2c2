use crate::{
    commands::Command,
    errors::{DomainResult, ServiceError},
    events::{Event, EventSender},
    metrics::registered,
    models::{Order, OrderStatus},
    store::DataStore,
};
use lazy_static::lazy_static;
use prometheus::IntCounterVec;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::load_order;

lazy_static! {
    static ref ORDER_ADVANCES: IntCounterVec = registered(
        IntCounterVec::new(
            prometheus::Opts::new(
                "order_advances_total",
                "Orders moved through the kitchen lifecycle"
            ),
            &["target"]
        )
        .expect("metric can be created")
    );
}

/// Drives an order through the kitchen lifecycle with one explicit verb per
/// target status: Preparing (start preparation), Ready, Served and Cancelled.
/// Each verb checks its own predecessor; other targets are rejected.
/// Preparation only starts from `Pending`, so a `Confirmed` order must be
/// moved on with `UpdateOrderStatusCommand` instead.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdvanceOrderCommand {
    pub order_id: Uuid,
    pub target: OrderStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdvanceOrderResult {
    pub id: Uuid,
    pub status: String,
    pub version: i32,
}

#[async_trait::async_trait]
impl Command for AdvanceOrderCommand {
    type Result = AdvanceOrderResult;

    #[instrument(skip(self, store, event_sender), fields(order_id = %self.order_id, target = %self.target))]
    async fn execute(
        &self,
        store: Arc<DataStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let mut order = load_order(&store, self.order_id).await?;
        let old_status = order.status();

        self.apply(&mut order).map_err(|e| {
            error!(order_id = %self.order_id, "{}", e);
            e
        })?;

        let updated = store.orders.update(order).await?;

        info!(
            order_id = %updated.id,
            old_status = %old_status,
            new_status = %updated.status(),
            "Order advanced"
        );
        event_sender
            .send(Event::OrderStatusChanged {
                order_id: updated.id,
                old_status: old_status.to_string(),
                new_status: updated.status().to_string(),
            })
            .await
            .map_err(ServiceError::EventError)?;

        ORDER_ADVANCES
            .with_label_values(&[&self.target.to_string()])
            .inc();

        Ok(AdvanceOrderResult {
            id: updated.id,
            status: updated.status().to_string(),
            version: updated.version,
        })
    }
}

impl AdvanceOrderCommand {
    fn apply(&self, order: &mut Order) -> Result<(), ServiceError> {
        let outcome: DomainResult<()> = match self.target {
            OrderStatus::Preparing => order.start_preparation(),
            OrderStatus::Ready => order.mark_as_ready(),
            OrderStatus::Served => order.serve(),
            OrderStatus::Cancelled => order.cancel(),
            other => {
                return Err(ServiceError::InvalidOperation(format!(
                    "Cannot update order to status: {}",
                    other
                )))
            }
        };
        outcome.map_err(ServiceError::from)
    }
}
