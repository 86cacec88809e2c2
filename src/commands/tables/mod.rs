use tracing::{error, info};
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    events::{Event, EventSender},
    models::{Table, TableStatus},
    store::DataStore,
};

pub mod set_table_status_command;
pub mod update_table_status_command;

pub use set_table_status_command::SetTableStatusCommand;
pub use update_table_status_command::UpdateTableStatusCommand;

/// Result shared by the table status commands.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct TableStatusResult {
    pub id: Uuid,
    pub number: i32,
    pub old_status: TableStatus,
    pub status: TableStatus,
    pub reserved_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

pub(crate) async fn load_table(store: &DataStore, table_id: Uuid) -> Result<Table, ServiceError> {
    store.tables.get_by_id(table_id).await?.ok_or_else(|| {
        let msg = format!("Table {} not found", table_id);
        error!("{}", msg);
        ServiceError::NotFound(msg)
    })
}

/// Persists `table` and announces the change. Returns the stored table.
pub(crate) async fn save_and_publish(
    store: &DataStore,
    event_sender: &EventSender,
    old_status: TableStatus,
    table: Table,
) -> Result<TableStatusResult, ServiceError> {
    let table = store.tables.update(table).await?;

    info!(
        table_id = %table.id,
        number = table.number,
        old_status = %old_status,
        new_status = %table.status(),
        "Table status changed"
    );

    event_sender
        .send(Event::TableStatusChanged {
            table_id: table.id,
            old_status: old_status.to_string(),
            new_status: table.status().to_string(),
        })
        .await
        .map_err(|e| {
            let msg = format!("Failed to send event for table status change: {}", e);
            error!("{}", msg);
            ServiceError::EventError(msg)
        })?;

    Ok(TableStatusResult {
        id: table.id,
        number: table.number,
        old_status,
        status: table.status(),
        reserved_at: table.reserved_at(),
        version: table.version,
    })
}
