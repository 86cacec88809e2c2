use std::sync::Arc;

use rust_decimal_macros::dec;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use aggregate_workflows as workflows;
use workflows::{
    commands::{
        goals::{
            AddGoalCommand, AddGoalPeriodCommand, ApproveGoalProgressCommand,
            ApproveGoalSetCommand, CreateGoalSetCommand, SendGoalSetToApprovalCommand,
            UpdateGoalProgressCommand,
        },
        orders::{AdvanceOrderCommand, CreateOrderCommand, CreateOrderItem},
        tables::UpdateTableStatusCommand,
    },
    models::{GoalType, GoalValueType, MenuItem, OrderStatus, Table, TableStatus},
    queries::{GetAvailableTablesQuery, GetKitchenOrdersQuery},
    Command, DataStore, EventSender, Query, ServiceError,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = workflows::config::load_config()?;
    workflows::config::init_tracing(&cfg.log_level, cfg.log_json);

    let shutdown = CancellationToken::new();
    let store = Arc::new(DataStore::from_config(&cfg).with_shutdown(shutdown.clone()));

    let (event_sender, event_rx) = EventSender::channel(cfg.event_channel_capacity);
    let event_sender = Arc::new(event_sender);
    let processor = tokio::spawn(workflows::events::process_events(
        event_rx,
        shutdown.clone(),
    ));

    let outcome = tokio::select! {
        result = run_walkthrough(store, event_sender.clone()) => result,
        _ = shutdown_signal() => {
            warn!("Shutdown requested before the walkthrough finished");
            shutdown.cancel();
            Ok(())
        }
    };

    // Closing the channel lets the processor drain and exit.
    drop(event_sender);
    if let Err(e) = processor.await {
        error!("Event processor failed: {}", e);
    }

    outcome.map_err(Into::into)
}

/// Seeds a small restaurant and one team, then drives both workflows to
/// their final states.
async fn run_walkthrough(
    store: Arc<DataStore>,
    events: Arc<EventSender>,
) -> Result<(), ServiceError> {
    let table = store.tables.add(Table::new(1, 4)?).await?;
    let soup = store
        .menu_items
        .add(MenuItem::new("Tomato soup", "Starters", dec!(6.50), None)?)
        .await?;

    let order = CreateOrderCommand {
        table_id: table.id,
        items: vec![CreateOrderItem {
            menu_item_id: soup.id,
            quantity: 2,
            special_instructions: None,
        }],
        notes: None,
    }
    .execute(store.clone(), events.clone())
    .await?;
    info!(order_number = %order.order_number, total = %order.total, "Order placed");

    UpdateTableStatusCommand {
        table_id: table.id,
        new_status: TableStatus::Occupied,
    }
    .execute(store.clone(), events.clone())
    .await?;

    for target in [OrderStatus::Preparing, OrderStatus::Ready, OrderStatus::Served] {
        AdvanceOrderCommand {
            order_id: order.id,
            target,
        }
        .execute(store.clone(), events.clone())
        .await?;
    }

    let kitchen = GetKitchenOrdersQuery.execute(&store).await?;
    let free_tables = GetAvailableTablesQuery::default().execute(&store).await?;
    info!(
        kitchen_orders = kitchen.len(),
        free_tables = free_tables.len(),
        "Restaurant walkthrough finished"
    );

    let (team_id, user_id, year) = (1, 1, 2030);
    AddGoalPeriodCommand { team_id, year }
        .execute(store.clone(), events.clone())
        .await?;
    let goal_set = CreateGoalSetCommand {
        team_id,
        user_id,
        year,
    }
    .execute(store.clone(), events.clone())
    .await?;

    let goal = AddGoalCommand {
        goal_set_id: goal_set.id,
        title: "Customer satisfaction".into(),
        goal_type: GoalType::Team,
        min_value: 60,
        mid_value: 80,
        max_value: 95,
        value_type: GoalValueType::Percentage,
        percentage: 100,
    }
    .execute(store.clone(), events.clone())
    .await?;

    UpdateGoalProgressCommand {
        goal_set_id: goal_set.id,
        goal_id: goal.goal_id,
        actual_value: 84,
        comment: Some("Survey results".into()),
    }
    .execute(store.clone(), events.clone())
    .await?;
    ApproveGoalProgressCommand {
        goal_set_id: goal_set.id,
        goal_id: goal.goal_id,
    }
    .execute(store.clone(), events.clone())
    .await?;
    SendGoalSetToApprovalCommand {
        goal_set_id: goal_set.id,
    }
    .execute(store.clone(), events.clone())
    .await?;

    let approved = ApproveGoalSetCommand {
        goal_set_id: goal_set.id,
        user_id: 2,
    }
    .execute(store, events)
    .await?;
    info!(goal_set_id = %approved.goal_set_id, "{}", approved.message);

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
