//! End-to-end tests for the restaurant order and table lifecycle.
//!
//! Tests cover:
//! - Order creation against a free table
//! - Editing items while the order is pending
//! - Kitchen progression (preparing -> ready -> served -> completed)
//! - Cancellation rules
//! - Table reservation bookkeeping

mod common;

use aggregate_workflows::{
    commands::{
        orders::{
            AddItemToOrderCommand, AdvanceOrderCommand, CreateOrderCommand, CreateOrderItem,
            UpdateOrderStatusCommand,
        },
        tables::{SetTableStatusCommand, UpdateTableStatusCommand},
    },
    models::{OrderStatus, TableStatus},
    queries::{GetAvailableTablesQuery, GetKitchenOrdersQuery, GetOrderQuery},
    Event, Query, ServiceError,
};
use assert_matches::assert_matches;
use common::TestApp;
use rust_decimal_macros::dec;

// ==================== Order Lifecycle Tests ====================

#[tokio::test]
async fn test_order_lifecycle_pending_to_completed() {
    let mut app = TestApp::new();
    let table = app.seed_table(4, 4).await;
    let burger = app.seed_menu_item("Burger", dec!(12.50)).await;
    let soda = app.seed_menu_item("Soda", dec!(2.25)).await;

    // Step 1: Create order (starts as pending)
    let created = app
        .run(CreateOrderCommand {
            table_id: table.id,
            items: vec![CreateOrderItem {
                menu_item_id: burger.id,
                quantity: 2,
                special_instructions: Some("no onions".into()),
            }],
            notes: None,
        })
        .await
        .expect("order created");
    assert_eq!(created.status, "Pending");
    assert_eq!(created.total, dec!(25.00));
    assert!(created.order_number.starts_with("ORD-"));

    // Step 2: Add a drink while still pending
    let added = app
        .run(AddItemToOrderCommand {
            order_id: created.id,
            menu_item_id: soda.id,
            quantity: 2,
            special_instructions: None,
        })
        .await
        .expect("item added");
    assert_eq!(added.order_total, dec!(29.50));

    // Step 3: Confirm through the transition table
    app.run(UpdateOrderStatusCommand {
        order_id: created.id,
        new_status: OrderStatus::Confirmed,
        version: None,
    })
    .await
    .expect("confirmed");

    // Step 4: Kitchen steps, still through the transition table
    for new_status in [OrderStatus::Preparing, OrderStatus::Ready, OrderStatus::Served] {
        let updated = app
            .run(UpdateOrderStatusCommand {
                order_id: created.id,
                new_status,
                version: None,
            })
            .await
            .expect("kitchen step");
        assert_eq!(updated.status, new_status.to_string());
    }

    // Step 5: Close the order
    app.run(UpdateOrderStatusCommand {
        order_id: created.id,
        new_status: OrderStatus::Completed,
        version: None,
    })
    .await
    .expect("completed");

    let order = GetOrderQuery {
        order_id: created.id,
    }
    .execute(&app.store)
    .await
    .unwrap()
    .expect("order exists");
    assert_eq!(order.status(), OrderStatus::Completed);
    assert_eq!(order.total(), dec!(29.50));

    let events = app.drain_events();
    assert_eq!(events.first(), Some(&Event::OrderCreated(created.id)));
    assert_matches!(
        events.last(),
        Some(Event::OrderStatusChanged { new_status, .. }) if new_status == "Completed"
    );

    // Completed orders cannot be cancelled
    let err = app
        .run(UpdateOrderStatusCommand {
            order_id: created.id,
            new_status: OrderStatus::Cancelled,
            version: None,
        })
        .await
        .unwrap_err();
    assert!(err.mentions("Invalid status transition from Completed to Cancelled"));
}

#[tokio::test]
async fn test_confirmed_order_items_are_frozen() {
    let app = TestApp::new();
    let table = app.seed_table(1, 2).await;
    let pasta = app.seed_menu_item("Pasta", dec!(14)).await;

    let created = app
        .run(CreateOrderCommand {
            table_id: table.id,
            items: vec![CreateOrderItem {
                menu_item_id: pasta.id,
                quantity: 1,
                special_instructions: None,
            }],
            notes: Some("window seat".into()),
        })
        .await
        .unwrap();

    app.run(UpdateOrderStatusCommand {
        order_id: created.id,
        new_status: OrderStatus::Confirmed,
        version: Some(created.version),
    })
    .await
    .unwrap();

    let err = app
        .run(AddItemToOrderCommand {
            order_id: created.id,
            menu_item_id: pasta.id,
            quantity: 1,
            special_instructions: None,
        })
        .await
        .unwrap_err();
    assert!(err.mentions("Cannot add items to order with status: Confirmed"));
}

#[tokio::test]
async fn test_confirmed_order_cannot_use_kitchen_verbs() {
    let app = TestApp::new();
    let table = app.seed_table(3, 2).await;
    let pasta = app.seed_menu_item("Pasta", dec!(14)).await;

    let created = app
        .run(CreateOrderCommand {
            table_id: table.id,
            items: vec![CreateOrderItem {
                menu_item_id: pasta.id,
                quantity: 1,
                special_instructions: None,
            }],
            notes: None,
        })
        .await
        .unwrap();

    app.run(UpdateOrderStatusCommand {
        order_id: created.id,
        new_status: OrderStatus::Confirmed,
        version: None,
    })
    .await
    .unwrap();

    let err = app
        .run(AdvanceOrderCommand {
            order_id: created.id,
            target: OrderStatus::Preparing,
        })
        .await
        .unwrap_err();
    assert!(err.mentions("Cannot start preparation for order with status: Confirmed"));

    let order = GetOrderQuery {
        order_id: created.id,
    }
    .execute(&app.store)
    .await
    .unwrap()
    .unwrap();
    assert_eq!(order.status(), OrderStatus::Confirmed);
}

#[tokio::test]
async fn test_stale_version_is_rejected() {
    let app = TestApp::new();
    let table = app.seed_table(2, 2).await;
    let pasta = app.seed_menu_item("Pasta", dec!(14)).await;

    let created = app
        .run(CreateOrderCommand {
            table_id: table.id,
            items: vec![CreateOrderItem {
                menu_item_id: pasta.id,
                quantity: 1,
                special_instructions: None,
            }],
            notes: None,
        })
        .await
        .unwrap();

    let err = app
        .run(UpdateOrderStatusCommand {
            order_id: created.id,
            new_status: OrderStatus::Confirmed,
            version: Some(created.version + 5),
        })
        .await
        .unwrap_err();
    assert_eq!(err, ServiceError::ConcurrentModification(created.id));
}

#[tokio::test]
async fn test_order_requires_a_free_table_and_available_menu() {
    let app = TestApp::new();
    let table = app.seed_table(8, 4).await;
    let mut fish = app.seed_menu_item("Fish", dec!(18)).await;
    fish.make_unavailable();
    let fish = app.store.menu_items.update(fish).await.unwrap();

    let err = app
        .run(CreateOrderCommand {
            table_id: table.id,
            items: vec![CreateOrderItem {
                menu_item_id: fish.id,
                quantity: 1,
                special_instructions: None,
            }],
            notes: None,
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ServiceError::InvalidOperation(format!(
            "The following menu items are not available: {}",
            fish.id
        ))
    );

    app.run(UpdateTableStatusCommand {
        table_id: table.id,
        new_status: TableStatus::Occupied,
    })
    .await
    .unwrap();

    let err = app
        .run(CreateOrderCommand {
            table_id: table.id,
            items: vec![CreateOrderItem {
                menu_item_id: fish.id,
                quantity: 1,
                special_instructions: None,
            }],
            notes: None,
        })
        .await
        .unwrap_err();
    assert!(err.mentions("Table 8 is not available for orders"));
    assert!(app.store.orders.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_kitchen_queue_tracks_active_orders() {
    let app = TestApp::new();
    let dish = app.seed_menu_item("Curry", dec!(11)).await;

    let mut ids = Vec::new();
    for number in 1..=3 {
        let table = app.seed_table(number, 2).await;
        let created = app
            .run(CreateOrderCommand {
                table_id: table.id,
                items: vec![CreateOrderItem {
                    menu_item_id: dish.id,
                    quantity: 1,
                    special_instructions: None,
                }],
                notes: None,
            })
            .await
            .unwrap();
        ids.push(created.id);
    }

    app.run(AdvanceOrderCommand {
        order_id: ids[1],
        target: OrderStatus::Cancelled,
    })
    .await
    .unwrap();

    let kitchen = GetKitchenOrdersQuery.execute(&app.store).await.unwrap();
    let mut active: Vec<_> = kitchen.iter().map(|o| o.id).collect();
    active.sort();
    let mut expected = vec![ids[0], ids[2]];
    expected.sort();
    assert_eq!(active, expected);
}

// ==================== Table Lifecycle Tests ====================

#[tokio::test]
async fn test_reservation_stamp_follows_status() {
    let app = TestApp::new();
    let table = app.seed_table(6, 4).await;

    let reserved = app
        .run(UpdateTableStatusCommand {
            table_id: table.id,
            new_status: TableStatus::Reserved,
        })
        .await
        .unwrap();
    assert!(reserved.reserved_at.is_some());

    let available = GetAvailableTablesQuery::default()
        .execute(&app.store)
        .await
        .unwrap();
    assert!(available.is_empty());

    let err = app
        .run(UpdateTableStatusCommand {
            table_id: table.id,
            new_status: TableStatus::Reserved,
        })
        .await
        .unwrap_err();
    assert!(err.mentions("Cannot reserve table 6. Current status: Reserved"));

    let freed = app
        .run(SetTableStatusCommand {
            table_id: table.id,
            new_status: TableStatus::Available,
        })
        .await
        .unwrap();
    assert!(freed.reserved_at.is_none());

    let cleaning = app
        .run(SetTableStatusCommand {
            table_id: table.id,
            new_status: TableStatus::Cleaning,
        })
        .await
        .unwrap();
    assert_eq!(cleaning.status, TableStatus::Cleaning);
    assert!(cleaning.reserved_at.is_none());
}
