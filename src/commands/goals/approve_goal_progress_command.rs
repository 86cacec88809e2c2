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

use super::{modify_goal_set, publish, record, GoalResult};

const COMMAND: &str = "approve_goal_progress";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveGoalProgressCommand {
    pub goal_set_id: Uuid,
    pub goal_id: Uuid,
}

#[async_trait::async_trait]
impl Command for ApproveGoalProgressCommand {
    type Result = GoalResult;

    #[instrument(skip(self, store, event_sender), fields(goal_set_id = %self.goal_set_id, goal_id = %self.goal_id))]
    async fn execute(
        &self,
        store: Arc<DataStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let result = self.approve(&store, &event_sender).await;
        record(COMMAND, &result);
        result
    }
}

impl ApproveGoalProgressCommand {
    async fn approve(
        &self,
        store: &DataStore,
        event_sender: &EventSender,
    ) -> Result<GoalResult, ServiceError> {
        let (goal_set, _) = modify_goal_set(store, self.goal_set_id, |goal_set| {
            goal_set.approve_goal_progress(self.goal_id)
        })
        .await?;

        info!(goal_set_id = %goal_set.id, goal_id = %self.goal_id, "Goal progress approved");
        publish(
            event_sender,
            Event::GoalProgressApproved {
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
