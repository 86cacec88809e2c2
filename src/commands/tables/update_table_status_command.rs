use crate::{
    commands::Command,
    errors::{DomainResult, ServiceError},
    events::EventSender,
    metrics::registered,
    models::{Table, TableStatus},
    store::DataStore,
};
use chrono::Utc;
use lazy_static::lazy_static;
use prometheus::IntCounter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{load_table, save_and_publish, TableStatusResult};

lazy_static! {
    static ref TABLE_STATUS_UPDATES: IntCounter = registered(
        IntCounter::new(
            "table_status_updates_total",
            "Total number of table status updates"
        )
        .expect("metric can be created")
    );
    static ref TABLE_STATUS_UPDATE_FAILURES: IntCounter = registered(
        IntCounter::new(
            "table_status_update_failures_total",
            "Total number of rejected table status updates"
        )
        .expect("metric can be created")
    );
}

/// Moves a table using the checked verbs: reserve (from Available), occupy
/// (from Available or Reserved), make available (always) and take out of
/// service (unless occupied). `Cleaning` has no verb.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateTableStatusCommand {
    pub table_id: Uuid,
    pub new_status: TableStatus,
}

#[async_trait::async_trait]
impl Command for UpdateTableStatusCommand {
    type Result = TableStatusResult;

    #[instrument(skip(self, store, event_sender), fields(table_id = %self.table_id, new_status = %self.new_status))]
    async fn execute(
        &self,
        store: Arc<DataStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let mut table = load_table(&store, self.table_id).await?;
        let old_status = table.status();

        if let Err(e) = self.apply(&mut table) {
            TABLE_STATUS_UPDATE_FAILURES.inc();
            warn!(table_id = %self.table_id, "{}", e);
            return Err(e);
        }

        let result = save_and_publish(&store, &event_sender, old_status, table).await?;
        TABLE_STATUS_UPDATES.inc();
        Ok(result)
    }
}

impl UpdateTableStatusCommand {
    fn apply(&self, table: &mut Table) -> Result<(), ServiceError> {
        let outcome: DomainResult<()> = match self.new_status {
            TableStatus::Available => {
                table.make_available();
                Ok(())
            }
            TableStatus::Occupied => table.occupy(),
            TableStatus::Reserved => table.reserve(Utc::now()),
            TableStatus::OutOfService => table.take_out_of_service(),
            TableStatus::Cleaning => {
                return Err(ServiceError::InvalidOperation(format!(
                    "Cannot update table to status: {}",
                    self.new_status
                )))
            }
        };
        outcome.map_err(ServiceError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Event;
    use assert_matches::assert_matches;

    async fn setup() -> (Arc<DataStore>, Table) {
        let store = DataStore::in_memory();
        let table = store.tables.add(Table::new(12, 6).unwrap()).await.unwrap();
        (Arc::new(store), table)
    }

    #[tokio::test]
    async fn reserve_then_free_the_table() {
        let (store, table) = setup().await;
        let (sender, mut rx) = EventSender::channel(8);
        let sender = Arc::new(sender);

        let reserved = UpdateTableStatusCommand {
            table_id: table.id,
            new_status: TableStatus::Reserved,
        }
        .execute(store.clone(), sender.clone())
        .await
        .unwrap();
        assert_eq!(reserved.status, TableStatus::Reserved);
        assert!(reserved.reserved_at.is_some());

        let freed = UpdateTableStatusCommand {
            table_id: table.id,
            new_status: TableStatus::Available,
        }
        .execute(store, sender)
        .await
        .unwrap();
        assert_eq!(freed.old_status, TableStatus::Reserved);
        assert!(freed.reserved_at.is_none());

        assert_matches!(
            rx.recv().await,
            Some(Event::TableStatusChanged { new_status, .. }) if new_status == "Reserved"
        );
    }

    #[tokio::test]
    async fn occupied_table_stays_in_service() {
        let (store, table) = setup().await;
        let (sender, _rx) = EventSender::channel(8);
        let sender = Arc::new(sender);

        UpdateTableStatusCommand {
            table_id: table.id,
            new_status: TableStatus::Occupied,
        }
        .execute(store.clone(), sender.clone())
        .await
        .unwrap();

        let err = UpdateTableStatusCommand {
            table_id: table.id,
            new_status: TableStatus::OutOfService,
        }
        .execute(store.clone(), sender)
        .await
        .unwrap_err();
        assert!(err.mentions("Cannot take occupied table 12 out of service"));

        let stored = store.tables.get_by_id(table.id).await.unwrap().unwrap();
        assert_eq!(stored.status(), TableStatus::Occupied);
    }

    #[tokio::test]
    async fn cleaning_has_no_verb() {
        let (store, table) = setup().await;
        let (sender, _rx) = EventSender::channel(8);

        let err = UpdateTableStatusCommand {
            table_id: table.id,
            new_status: TableStatus::Cleaning,
        }
        .execute(store, Arc::new(sender))
        .await
        .unwrap_err();
        assert_eq!(
            err,
            ServiceError::InvalidOperation("Cannot update table to status: Cleaning".into())
        );
    }
}
