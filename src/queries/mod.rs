use async_trait::async_trait;

use crate::{errors::ServiceError, store::DataStore};

pub mod goal_queries;
pub mod order_queries;
pub mod table_queries;

pub use goal_queries::{
    GetGoalQuery, GetGoalSetQuery, GetGoalTypeLookupQuery, GetGoalValueTypeLookupQuery,
    GetPendingApprovalGoalSetsQuery, GetPendingApprovalGoalsQuery, LookupItem, PendingGoal,
};
pub use order_queries::{GetKitchenOrdersQuery, GetOrderQuery};
pub use table_queries::{GetAvailableTablesQuery, GetTableQuery};

/// Trait representing a generic asynchronous query.
#[async_trait]
pub trait Query: Send + Sync {
    type Result: Send + Sync;

    /// Executes the query against the store. Queries never mutate.
    async fn execute(&self, store: &DataStore) -> Result<Self::Result, ServiceError>;
}
