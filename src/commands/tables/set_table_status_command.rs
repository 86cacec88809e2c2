use crate::{
    commands::Command, errors::ServiceError, events::EventSender, models::TableStatus,
    store::DataStore,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use super::{load_table, save_and_publish, TableStatusResult};

/// Unchecked status setter used by floor staff tooling. Any target is
/// accepted; the reservation stamp follows the new status.
#[derive(Debug, Serialize, Deserialize)]
pub struct SetTableStatusCommand {
    pub table_id: Uuid,
    pub new_status: TableStatus,
}

#[async_trait::async_trait]
impl Command for SetTableStatusCommand {
    type Result = TableStatusResult;

    #[instrument(skip(self, store, event_sender), fields(table_id = %self.table_id))]
    async fn execute(
        &self,
        store: Arc<DataStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let mut table = load_table(&store, self.table_id).await?;
        let old_status = table.status();
        table.set_status(self.new_status, Utc::now());
        save_and_publish(&store, &event_sender, old_status, table).await
    }
}
