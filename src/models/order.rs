use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::EnumIter;
use uuid::Uuid;

use crate::errors::{DomainError, DomainResult};

/// Enum representing the possible statuses of an order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize, strum::Display,
)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Served,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Transition table used by [`Order::update_status`].
    ///
    /// The forward chain is Pending -> Confirmed -> Preparing -> Ready ->
    /// Served -> Completed. Any status other than Completed may move to
    /// Cancelled.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        match (self, next) {
            (Pending, Confirmed)
            | (Confirmed, Preparing)
            | (Preparing, Ready)
            | (Ready, Served)
            | (Served, Completed) => true,
            (current, Cancelled) => current != Completed,
            _ => false,
        }
    }

    /// Orders the kitchen still has to work on.
    pub fn is_kitchen_active(self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Preparing | OrderStatus::Ready
        )
    }
}

/// A line on an order. Quantity and unit price are always positive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub menu_item_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub special_instructions: Option<String>,
}

impl OrderItem {
    pub fn new(
        menu_item_id: Uuid,
        quantity: i32,
        unit_price: Decimal,
        special_instructions: Option<String>,
    ) -> DomainResult<Self> {
        if quantity <= 0 {
            return Err(DomainError::new("Quantity must be positive"));
        }
        if unit_price <= Decimal::ZERO {
            return Err(DomainError::new("Price must be positive"));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            menu_item_id,
            quantity,
            unit_price,
            special_instructions,
        })
    }

    pub fn total_price(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Restaurant order aggregate.
///
/// Items can only change while the order is `Pending`, and `total` is
/// recomputed after every item mutation so it always equals the sum of
/// `quantity * unit_price`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "OrderRecord")]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub table_id: Uuid,
    pub order_date: DateTime<Utc>,
    status: OrderStatus,
    items: Vec<OrderItem>,
    total: Decimal,
    pub notes: Option<String>,
    pub version: i32,
}

/// Serialized shape of an [`Order`]. The stored total is ignored and
/// recomputed from the items.
#[derive(Deserialize)]
struct OrderRecord {
    id: Uuid,
    order_number: String,
    table_id: Uuid,
    order_date: DateTime<Utc>,
    status: OrderStatus,
    items: Vec<OrderItem>,
    #[serde(default, rename = "total")]
    _total: Decimal,
    notes: Option<String>,
    version: i32,
}

impl From<OrderRecord> for Order {
    fn from(record: OrderRecord) -> Self {
        let mut order = Self {
            id: record.id,
            order_number: record.order_number,
            table_id: record.table_id,
            order_date: record.order_date,
            status: record.status,
            items: record.items,
            total: Decimal::ZERO,
            notes: record.notes,
            version: record.version,
        };
        order.recalculate_total();
        order
    }
}

impl Order {
    /// Creates a new `Pending` order with no items.
    pub fn new(
        order_number: impl Into<String>,
        table_id: Uuid,
        notes: Option<String>,
    ) -> DomainResult<Self> {
        let order_number = order_number.into();
        if order_number.trim().is_empty() {
            return Err(DomainError::new("Order number cannot be empty"));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            order_number,
            table_id,
            order_date: Utc::now(),
            status: OrderStatus::Pending,
            items: Vec::new(),
            total: Decimal::ZERO,
            notes,
            version: 1,
        })
    }

    /// Formats an order number as `{prefix}-yyyyMMdd-HHmmss`.
    pub fn generate_number(prefix: &str, now: DateTime<Utc>) -> String {
        format!("{}-{}", prefix, now.format("%Y%m%d-%H%M%S"))
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn can_be_modified(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    pub fn add_item(
        &mut self,
        menu_item_id: Uuid,
        quantity: i32,
        unit_price: Decimal,
        special_instructions: Option<String>,
    ) -> DomainResult<Uuid> {
        if !self.can_be_modified() {
            return Err(DomainError::new(format!(
                "Cannot add items to order with status: {}",
                self.status
            )));
        }

        let item = OrderItem::new(menu_item_id, quantity, unit_price, special_instructions)?;
        let item_id = item.id;
        self.items.push(item);
        self.recalculate_total();
        Ok(item_id)
    }

    /// Removes an item. Unknown item ids are ignored.
    pub fn remove_item(&mut self, item_id: Uuid) -> DomainResult<()> {
        if !self.can_be_modified() {
            return Err(DomainError::new(format!(
                "Cannot remove items from order with status: {}",
                self.status
            )));
        }

        let before = self.items.len();
        self.items.retain(|item| item.id != item_id);
        if self.items.len() != before {
            self.recalculate_total();
        }
        Ok(())
    }

    /// Changes an item's quantity. Unknown item ids are ignored.
    pub fn update_item_quantity(&mut self, item_id: Uuid, quantity: i32) -> DomainResult<()> {
        if !self.can_be_modified() {
            return Err(DomainError::new(format!(
                "Cannot update items in order with status: {}",
                self.status
            )));
        }
        if let Some(item) = self.items.iter_mut().find(|item| item.id == item_id) {
            if quantity <= 0 {
                return Err(DomainError::new("Quantity must be positive"));
            }
            item.quantity = quantity;
            self.recalculate_total();
        }
        Ok(())
    }

    pub fn update_notes(&mut self, notes: Option<String>) {
        self.notes = notes;
    }

    /// Moves the order along the transition table. Rejected transitions
    /// leave the order untouched.
    pub fn update_status(&mut self, new_status: OrderStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(new_status) {
            return Err(DomainError::new(format!(
                "Invalid status transition from {} to {}",
                self.status, new_status
            )));
        }
        self.status = new_status;
        Ok(())
    }

    pub fn start_preparation(&mut self) -> DomainResult<()> {
        if self.status != OrderStatus::Pending {
            return Err(DomainError::new(format!(
                "Cannot start preparation for order with status: {}",
                self.status
            )));
        }
        if self.items.is_empty() {
            return Err(DomainError::new(
                "Cannot start preparation for order with no items",
            ));
        }
        self.status = OrderStatus::Preparing;
        Ok(())
    }

    pub fn mark_as_ready(&mut self) -> DomainResult<()> {
        if self.status != OrderStatus::Preparing {
            return Err(DomainError::new(format!(
                "Cannot mark order as ready with status: {}",
                self.status
            )));
        }
        self.status = OrderStatus::Ready;
        Ok(())
    }

    pub fn serve(&mut self) -> DomainResult<()> {
        if self.status != OrderStatus::Ready {
            return Err(DomainError::new(format!(
                "Cannot serve order with status: {}",
                self.status
            )));
        }
        self.status = OrderStatus::Served;
        Ok(())
    }

    pub fn cancel(&mut self) -> DomainResult<()> {
        if self.status == OrderStatus::Served {
            return Err(DomainError::new("Cannot cancel a served order"));
        }
        self.status = OrderStatus::Cancelled;
        Ok(())
    }

    fn recalculate_total(&mut self) {
        self.total = self.items.iter().map(OrderItem::total_price).sum();
    }
}
