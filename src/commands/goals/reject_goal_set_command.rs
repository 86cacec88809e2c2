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
use validator::Validate;

use super::{modify_goal_set, publish, record, GoalSetTransitionResult};

const COMMAND: &str = "reject_goal_set";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RejectGoalSetCommand {
    pub goal_set_id: Uuid,
    /// User taking the decision. Only carried on the event.
    #[validate(range(min = 1, message = "User id must be positive"))]
    pub user_id: i32,
}

#[async_trait::async_trait]
impl Command for RejectGoalSetCommand {
    type Result = GoalSetTransitionResult;

    #[instrument(skip(self, store, event_sender), fields(goal_set_id = %self.goal_set_id, user_id = self.user_id))]
    async fn execute(
        &self,
        store: Arc<DataStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let result = self.reject(&store, &event_sender).await;
        record(COMMAND, &result);
        result
    }
}

impl RejectGoalSetCommand {
    async fn reject(
        &self,
        store: &DataStore,
        event_sender: &EventSender,
    ) -> Result<GoalSetTransitionResult, ServiceError> {
        self.validate()?;

        let (goal_set, _) = modify_goal_set(store, self.goal_set_id, |goal_set| {
            goal_set.reject(self.user_id)
        })
        .await?;

        info!(goal_set_id = %goal_set.id, user_id = self.user_id, "Goal set rejected");
        publish(
            event_sender,
            Event::GoalSetRejected {
                goal_set_id: goal_set.id,
                approver_id: self.user_id,
            },
        )
        .await?;

        Ok(GoalSetTransitionResult {
            goal_set_id: goal_set.id,
            status: goal_set.status(),
            version: goal_set.version,
            message: "Goal set is rejected".to_string(),
        })
    }
}
