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

use super::{modify_goal_set, publish, record, GoalResult};

const COMMAND: &str = "update_goal_progress";

/// Records the actual value reached for a goal. Any previous progress,
/// approved or not, is replaced and the new record waits for approval.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateGoalProgressCommand {
    pub goal_set_id: Uuid,
    pub goal_id: Uuid,
    pub actual_value: i32,
    #[validate(length(max = 1000, message = "Comment cannot exceed 1000 characters"))]
    pub comment: Option<String>,
}

#[async_trait::async_trait]
impl Command for UpdateGoalProgressCommand {
    type Result = GoalResult;

    #[instrument(skip(self, store, event_sender), fields(goal_set_id = %self.goal_set_id, goal_id = %self.goal_id))]
    async fn execute(
        &self,
        store: Arc<DataStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let result = self.submit(&store, &event_sender).await;
        record(COMMAND, &result);
        result
    }
}

impl UpdateGoalProgressCommand {
    async fn submit(
        &self,
        store: &DataStore,
        event_sender: &EventSender,
    ) -> Result<GoalResult, ServiceError> {
        self.validate()?;

        let (goal_set, _) = modify_goal_set(store, self.goal_set_id, |goal_set| {
            goal_set.update_goal_progress(self.goal_id, self.actual_value, self.comment.clone())
        })
        .await?;

        info!(
            goal_set_id = %goal_set.id,
            goal_id = %self.goal_id,
            actual_value = self.actual_value,
            "Goal progress submitted"
        );
        publish(
            event_sender,
            Event::GoalProgressSubmitted {
                goal_set_id: goal_set.id,
                goal_id: self.goal_id,
            },
        )
        .await?;

        Ok(GoalResult {
            goal_set_id: goal_set.id,
            goal_id: self.goal_id,
            version: goal_set.version,
        })
    }
}
