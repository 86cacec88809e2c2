use crate::{
    commands::Command,
    errors::ServiceError,
    events::{Event, EventSender},
    metrics::registered,
    models::{MenuItem, Order},
    store::DataStore,
};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    static ref ORDER_CREATIONS: IntCounter = registered(
        IntCounter::new("order_creations_total", "Total number of orders created")
            .expect("metric can be created")
    );
    static ref ORDER_CREATION_FAILURES: IntCounterVec = registered(
        IntCounterVec::new(
            prometheus::Opts::new(
                "order_creation_failures_total",
                "Total number of failed order creations"
            ),
            &["error_type"]
        )
        .expect("metric can be created")
    );
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateOrderCommand {
    pub table_id: Uuid,
    #[validate(length(min = 1, message = "At least one order item is required"))]
    pub items: Vec<CreateOrderItem>,
    #[validate(length(max = 500, message = "Notes cannot exceed 500 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct CreateOrderItem {
    pub menu_item_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be greater than 0"))]
    pub quantity: i32,
    #[validate(length(
        max = 250,
        message = "Special instructions cannot exceed 250 characters"
    ))]
    pub special_instructions: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrderResult {
    pub id: Uuid,
    pub order_number: String,
    pub table_id: Uuid,
    pub order_date: DateTime<Utc>,
    pub status: String,
    pub total: Decimal,
    pub version: i32,
}

#[async_trait::async_trait]
impl Command for CreateOrderCommand {
    type Result = CreateOrderResult;

    #[instrument(skip(self, store, event_sender), fields(table_id = %self.table_id))]
    async fn execute(
        &self,
        store: Arc<DataStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate_input().map_err(|e| {
            ORDER_CREATION_FAILURES
                .with_label_values(&["validation_error"])
                .inc();
            error!("Invalid create order input: {}", e);
            e
        })?;

        let saved_order = self.create_order(&store).await.map_err(|e| {
            ORDER_CREATION_FAILURES
                .with_label_values(&[e.kind()])
                .inc();
            e
        })?;

        self.log_and_trigger_event(&event_sender, &saved_order)
            .await?;

        ORDER_CREATIONS.inc();

        Ok(CreateOrderResult {
            id: saved_order.id,
            order_number: saved_order.order_number.clone(),
            table_id: saved_order.table_id,
            order_date: saved_order.order_date,
            status: saved_order.status().to_string(),
            total: saved_order.total(),
            version: saved_order.version,
        })
    }
}

impl CreateOrderCommand {
    fn validate_input(&self) -> Result<(), ServiceError> {
        let mut messages = Vec::new();
        if let Err(e) = self.validate() {
            messages.extend(ServiceError::from(e).messages());
        }
        for item in &self.items {
            if let Err(e) = item.validate() {
                messages.extend(ServiceError::from(e).messages());
            }
        }

        if messages.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::ValidationError(messages.join("; ")))
        }
    }

    async fn create_order(&self, store: &DataStore) -> Result<Order, ServiceError> {
        let table = store
            .tables
            .get_by_id(self.table_id)
            .await?
            .ok_or_else(|| {
                let msg = format!("Table {} not found", self.table_id);
                error!("{}", msg);
                ServiceError::NotFound(msg)
            })?;

        if !table.is_available() {
            let msg = format!("Table {} is not available for orders", table.number);
            error!("{}", msg);
            return Err(ServiceError::InvalidOperation(msg));
        }

        let menu_items = self.load_available_menu_items(store).await?;

        let order_number = Order::generate_number(&store.order_number_prefix, Utc::now());
        let mut order = Order::new(order_number, self.table_id, self.notes.clone())?;
        for (request, menu_item) in self.items.iter().zip(&menu_items) {
            order.add_item(
                menu_item.id,
                request.quantity,
                menu_item.price(),
                request.special_instructions.clone(),
            )?;
        }

        store.orders.add(order).await
    }

    /// Returns the menu item for every requested line, in request order.
    async fn load_available_menu_items(
        &self,
        store: &DataStore,
    ) -> Result<Vec<MenuItem>, ServiceError> {
        let mut found = Vec::with_capacity(self.items.len());
        let mut unavailable = Vec::new();

        for item in &self.items {
            match store.menu_items.get_by_id(item.menu_item_id).await? {
                Some(menu_item) if menu_item.is_available() => found.push(menu_item),
                _ => unavailable.push(item.menu_item_id.to_string()),
            }
        }

        if !unavailable.is_empty() {
            let msg = format!(
                "The following menu items are not available: {}",
                unavailable.join(", ")
            );
            error!("{}", msg);
            return Err(ServiceError::InvalidOperation(msg));
        }

        Ok(found)
    }

    async fn log_and_trigger_event(
        &self,
        event_sender: &EventSender,
        saved_order: &Order,
    ) -> Result<(), ServiceError> {
        info!(
            order_id = %saved_order.id,
            order_number = %saved_order.order_number,
            items_count = %saved_order.items().len(),
            total = %saved_order.total(),
            "Order created successfully"
        );

        event_sender
            .send(Event::OrderCreated(saved_order.id))
            .await
            .map_err(|e| {
                ORDER_CREATION_FAILURES
                    .with_label_values(&["event_error"])
                    .inc();
                let msg = format!("Failed to send event for created order: {}", e);
                error!("{}", msg);
                ServiceError::EventError(msg)
            })
    }
}
