use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::Query;
use crate::{errors::ServiceError, models::Table, store::DataStore};

#[derive(Debug, Serialize, Deserialize)]
pub struct GetTableQuery {
    pub table_id: Uuid,
}

#[async_trait]
impl Query for GetTableQuery {
    type Result = Option<Table>;

    #[instrument(skip(self, store), fields(table_id = %self.table_id))]
    async fn execute(&self, store: &DataStore) -> Result<Self::Result, ServiceError> {
        store.tables.get_by_id(self.table_id).await
    }
}

/// Available tables ordered by table number, optionally only those seating
/// at least `min_capacity` guests.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GetAvailableTablesQuery {
    pub min_capacity: Option<i32>,
}

#[async_trait]
impl Query for GetAvailableTablesQuery {
    type Result = Vec<Table>;

    #[instrument(skip(self, store))]
    async fn execute(&self, store: &DataStore) -> Result<Self::Result, ServiceError> {
        debug!(min_capacity = ?self.min_capacity, "Executing GetAvailableTablesQuery");
        let min_capacity = self.min_capacity.unwrap_or(0);
        let mut tables: Vec<Table> = store
            .tables
            .list()
            .await?
            .into_iter()
            .filter(|t| t.is_available() && t.capacity >= min_capacity)
            .collect();
        tables.sort_by_key(|t| t.number);
        Ok(tables)
    }
}
