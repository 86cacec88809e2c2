//! Goal-set workflow commands.
//!
//! Every command that changes an existing goal set runs its
//! fetch-apply-save cycle through [`with_concurrency_retry`], so a
//! concurrent writer costs at most a few extra fetches and never a partial
//! update.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    errors::{DomainResult, ServiceError},
    events::{Event, EventSender},
    metrics,
    models::{GoalSet, GoalSetStatus},
    retry::with_concurrency_retry,
    store::DataStore,
};

pub mod add_goal_command;
pub mod add_goal_period_command;
pub mod approve_goal_progress_command;
pub mod approve_goal_set_command;
pub mod create_goal_set_command;
pub mod reject_goal_progress_command;
pub mod reject_goal_set_command;
pub mod send_goal_set_to_approval_command;
pub mod update_goal_command;
pub mod update_goal_progress_command;

pub use add_goal_command::AddGoalCommand;
pub use add_goal_period_command::AddGoalPeriodCommand;
pub use approve_goal_progress_command::ApproveGoalProgressCommand;
pub use approve_goal_set_command::ApproveGoalSetCommand;
pub use create_goal_set_command::CreateGoalSetCommand;
pub use reject_goal_progress_command::RejectGoalProgressCommand;
pub use reject_goal_set_command::RejectGoalSetCommand;
pub use send_goal_set_to_approval_command::SendGoalSetToApprovalCommand;
pub use update_goal_command::UpdateGoalCommand;
pub use update_goal_progress_command::UpdateGoalProgressCommand;

/// Identifies the goal a command acted on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalResult {
    pub goal_set_id: Uuid,
    pub goal_id: Uuid,
    pub version: i32,
}

/// Outcome of a set-level transition, with the message shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalSetTransitionResult {
    pub goal_set_id: Uuid,
    pub status: Option<GoalSetStatus>,
    pub version: i32,
    pub message: String,
}

pub(crate) async fn load_goal_set(
    store: &DataStore,
    goal_set_id: Uuid,
) -> Result<GoalSet, ServiceError> {
    store.goal_sets.get_by_id(goal_set_id).await?.ok_or_else(|| {
        let msg = "Goal set not found".to_string();
        error!(%goal_set_id, "{}", msg);
        ServiceError::NotFound(msg)
    })
}

/// Loads the goal set, applies `transition` and saves the result, retrying
/// the whole cycle on concurrency conflicts. Returns the saved set together
/// with whatever `transition` produced.
pub(crate) async fn modify_goal_set<F, R>(
    store: &DataStore,
    goal_set_id: Uuid,
    transition: F,
) -> Result<(GoalSet, R), ServiceError>
where
    F: Fn(&mut GoalSet) -> DomainResult<R> + Sync,
    R: Send,
{
    let transition = &transition;
    with_concurrency_retry(&store.retry, &store.shutdown, goal_set_id, || async move {
        let mut goal_set = load_goal_set(store, goal_set_id).await?;
        let output = transition(&mut goal_set)?;
        let saved = store.goal_sets.update(goal_set).await?;
        Ok((saved, output))
    })
    .await
}

pub(crate) async fn publish(event_sender: &EventSender, event: Event) -> Result<(), ServiceError> {
    event_sender.send(event).await.map_err(|e| {
        let msg = format!("Failed to send goal event: {}", e);
        error!("{}", msg);
        ServiceError::EventError(msg)
    })
}

/// Counts the outcome under `command` and logs failures.
pub(crate) fn record<T>(command: &'static str, result: &Result<T, ServiceError>) {
    match result {
        Ok(_) => {
            metrics::record_success(command);
            info!(command, "Goal command succeeded");
        }
        Err(e) => {
            metrics::record_failure(command, e);
            warn!(command, error = %e, "Goal command failed");
        }
    }
}
