use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::models::{GoalPeriod, GoalSet, MenuItem, Order, Table};
use crate::repositories::{InMemoryRepository, Repository};
use crate::retry::RetryConfig;

/// Everything a command needs besides its own input: one repository per
/// aggregate, the concurrency retry settings and a shutdown signal that
/// aborts in-flight retry loops.
#[derive(Clone)]
pub struct DataStore {
    pub orders: Arc<dyn Repository<Order>>,
    pub tables: Arc<dyn Repository<Table>>,
    pub menu_items: Arc<dyn Repository<MenuItem>>,
    pub goal_periods: Arc<dyn Repository<GoalPeriod>>,
    pub goal_sets: Arc<dyn Repository<GoalSet>>,
    pub retry: RetryConfig,
    pub order_number_prefix: String,
    pub shutdown: CancellationToken,
}

impl DataStore {
    /// Fresh in-memory repositories with default settings.
    pub fn in_memory() -> Self {
        Self {
            orders: Arc::new(InMemoryRepository::<Order>::new()),
            tables: Arc::new(InMemoryRepository::<Table>::new()),
            menu_items: Arc::new(InMemoryRepository::<MenuItem>::new()),
            goal_periods: Arc::new(InMemoryRepository::<GoalPeriod>::new()),
            goal_sets: Arc::new(InMemoryRepository::<GoalSet>::new()),
            retry: RetryConfig::default(),
            order_number_prefix: "ORD".to_string(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            retry: config.retry_config(),
            order_number_prefix: config.order_number_prefix.clone(),
            ..Self::in_memory()
        }
    }

    pub fn with_goal_sets(mut self, goal_sets: Arc<dyn Repository<GoalSet>>) -> Self {
        self.goal_sets = goal_sets;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}
