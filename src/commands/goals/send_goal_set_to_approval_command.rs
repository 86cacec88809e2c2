use crate::{
    commands::Command,
    errors::ServiceError,
    events::{Event, EventSender},
    store::DataStore,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{modify_goal_set, publish, record, GoalSetTransitionResult};

const COMMAND: &str = "send_goal_set_to_approval";

/// Submits a goal set for manager approval once every goal has approved
/// progress and the weights add up to exactly 100.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendGoalSetToApprovalCommand {
    pub goal_set_id: Uuid,
}

#[async_trait::async_trait]
impl Command for SendGoalSetToApprovalCommand {
    type Result = GoalSetTransitionResult;

    #[instrument(skip(self, store, event_sender), fields(goal_set_id = %self.goal_set_id))]
    async fn execute(
        &self,
        store: Arc<DataStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let result = self.send(&store, &event_sender).await;
        record(COMMAND, &result);
        result
    }
}

impl SendGoalSetToApprovalCommand {
    async fn send(
        &self,
        store: &DataStore,
        event_sender: &EventSender,
    ) -> Result<GoalSetTransitionResult, ServiceError> {
        let (goal_set, _) =
            modify_goal_set(store, self.goal_set_id, |goal_set| goal_set.send_to_approval())
                .await?;

        info!(goal_set_id = %goal_set.id, "Goal set sent to approval");
        publish(event_sender, Event::GoalSetSubmitted(goal_set.id)).await?;

        Ok(GoalSetTransitionResult {
            goal_set_id: goal_set.id,
            status: goal_set.status(),
            version: goal_set.version,
            message: "Goal set is sent to approval".to_string(),
        })
    }
}
