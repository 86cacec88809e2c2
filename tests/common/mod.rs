#![allow(dead_code)]

use std::sync::Arc;

use aggregate_workflows::{
    commands::goals::{AddGoalPeriodCommand, CreateGoalSetCommand},
    models::{MenuItem, Table},
    Command, DataStore, Event, EventSender, ServiceError,
};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Store plus event channel shared by the integration tests.
pub struct TestApp {
    pub store: Arc<DataStore>,
    pub events: Arc<EventSender>,
    receiver: mpsc::Receiver<Event>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(DataStore::in_memory())
    }

    pub fn with_store(store: DataStore) -> Self {
        let (sender, receiver) = EventSender::channel(256);
        Self {
            store: Arc::new(store),
            events: Arc::new(sender),
            receiver,
        }
    }

    pub async fn run<C: Command>(&self, command: C) -> Result<C::Result, ServiceError> {
        command.execute(self.store.clone(), self.events.clone()).await
    }

    /// Everything published so far, oldest first.
    pub fn drain_events(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    pub async fn seed_table(&self, number: i32, capacity: i32) -> Table {
        self.store
            .tables
            .add(Table::new(number, capacity).expect("valid table"))
            .await
            .expect("table stored")
    }

    pub async fn seed_menu_item(&self, name: &str, price: Decimal) -> MenuItem {
        self.store
            .menu_items
            .add(MenuItem::new(name, "Mains", price, None).expect("valid menu item"))
            .await
            .expect("menu item stored")
    }

    /// Opens the period and creates an empty goal set for `user_id`.
    pub async fn seed_goal_set(&self, team_id: i32, year: i32, user_id: i32) -> Uuid {
        self.run(AddGoalPeriodCommand { team_id, year })
            .await
            .expect("period created");
        self.run(CreateGoalSetCommand {
            team_id,
            user_id,
            year,
        })
        .await
        .expect("goal set created")
        .id
    }
}
