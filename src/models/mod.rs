//! Aggregates and value objects.

pub mod goal;
pub mod goal_period;
pub mod goal_set;
pub mod menu_item;
pub mod order;
pub mod table;

pub use goal::{
    Goal, GoalProgress, GoalProgressStatus, GoalType, GoalValue, GoalValueType, LookupValue,
};
pub use goal_period::GoalPeriod;
pub use goal_set::{GoalSet, GoalSetStatus};
pub use menu_item::MenuItem;
pub use order::{Order, OrderItem, OrderStatus};
pub use table::{Table, TableStatus};
