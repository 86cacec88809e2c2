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

const COMMAND: &str = "approve_goal_set";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApproveGoalSetCommand {
    pub goal_set_id: Uuid,
    /// User taking the decision. Only carried on the event.
    #[validate(range(min = 1, message = "User id must be positive"))]
    pub user_id: i32,
}

#[async_trait::async_trait]
impl Command for ApproveGoalSetCommand {
    type Result = GoalSetTransitionResult;

    #[instrument(skip(self, store, event_sender), fields(goal_set_id = %self.goal_set_id, user_id = self.user_id))]
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

impl ApproveGoalSetCommand {
    async fn approve(
        &self,
        store: &DataStore,
        event_sender: &EventSender,
    ) -> Result<GoalSetTransitionResult, ServiceError> {
        self.validate()?;

        let (goal_set, _) = modify_goal_set(store, self.goal_set_id, |goal_set| {
            goal_set.approve(self.user_id)
        })
        .await?;

        info!(goal_set_id = %goal_set.id, user_id = self.user_id, "Goal set approved");
        publish(
            event_sender,
            Event::GoalSetApproved {
                goal_set_id: goal_set.id,
                approver_id: self.user_id,
            },
        )
        .await?;

        Ok(GoalSetTransitionResult {
            goal_set_id: goal_set.id,
            status: goal_set.status(),
            version: goal_set.version,
            message: "Goal set is approved".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::goals::fixtures::{sender, store_with_goal};
    use crate::models::GoalSetStatus;

    #[tokio::test]
    async fn new_set_cannot_be_approved() {
        let (store, goal_set, _) = store_with_goal(true).await;
        let err = ApproveGoalSetCommand {
            goal_set_id: goal_set.id,
            user_id: 99,
        }
        .execute(store.clone(), sender())
        .await
        .unwrap_err();

        assert!(err.mentions("Cannot approve goal set"));
        let stored = store.goal_sets.get_by_id(goal_set.id).await.unwrap().unwrap();
        assert_eq!(stored.version, goal_set.version);
    }

    #[tokio::test]
    async fn approves_a_waiting_set() {
        let (store, goal_set, _) = store_with_goal(true).await;
        let mut waiting = goal_set.clone();
        waiting.send_to_approval().unwrap();
        store.goal_sets.update(waiting).await.unwrap();

        let result = ApproveGoalSetCommand {
            goal_set_id: goal_set.id,
            user_id: 1001,
        }
        .execute(store, sender())
        .await
        .unwrap();

        assert_eq!(result.message, "Goal set is approved");
        assert_eq!(result.status, Some(GoalSetStatus::Approved));
    }

    #[tokio::test]
    async fn missing_set_is_not_found() {
        let (store, _, _) = store_with_goal(false).await;
        let err = ApproveGoalSetCommand {
            goal_set_id: Uuid::new_v4(),
            user_id: 1001,
        }
        .execute(store, sender())
        .await
        .unwrap_err();

        assert_eq!(err, ServiceError::NotFound("Goal set not found".into()));
    }
}
