use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DomainError, DomainResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    price: Decimal,
    is_available: bool,
    pub version: i32,
}

impl MenuItem {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        price: Decimal,
        description: Option<String>,
    ) -> DomainResult<Self> {
        let name = name.into();
        let mut errors = Vec::new();
        if name.trim().is_empty() {
            errors.push("Menu item name cannot be empty".to_string());
        }
        if price <= Decimal::ZERO {
            errors.push("Price must be positive".to_string());
        }
        if !errors.is_empty() {
            return Err(DomainError::from_messages(errors));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            category: category.into(),
            description,
            price,
            is_available: true,
            version: 1,
        })
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn is_available(&self) -> bool {
        self.is_available
    }

    pub fn make_available(&mut self) {
        self.is_available = true;
    }

    pub fn make_unavailable(&mut self) {
        self.is_available = false;
    }

    pub fn update_price(&mut self, price: Decimal) -> DomainResult<()> {
        if price <= Decimal::ZERO {
            return Err(DomainError::new("Price must be positive"));
        }
        self.price = price;
        Ok(())
    }
}
