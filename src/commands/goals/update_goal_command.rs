use crate::{
    commands::Command,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{GoalType, GoalValueType},
    store::DataStore,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use super::{modify_goal_set, publish, record, GoalResult};

const COMMAND: &str = "update_goal";

/// Rewrites a goal's title, type, value type and weight. The goal's range
/// is kept and re-checked against the new value type.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateGoalCommand {
    pub goal_set_id: Uuid,
    pub goal_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    pub goal_type: GoalType,
    pub value_type: GoalValueType,
    #[validate(range(min = 1, max = 100, message = "Percentage must be between 1 and 100"))]
    pub percentage: i32,
}

#[async_trait::async_trait]
impl Command for UpdateGoalCommand {
    type Result = GoalResult;

    #[instrument(skip(self, store, event_sender), fields(goal_set_id = %self.goal_set_id, goal_id = %self.goal_id))]
    async fn execute(
        &self,
        store: Arc<DataStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let result = self.update_goal(&store, &event_sender).await;
        record(COMMAND, &result);
        result
    }
}

impl UpdateGoalCommand {
    async fn update_goal(
        &self,
        store: &DataStore,
        event_sender: &EventSender,
    ) -> Result<GoalResult, ServiceError> {
        self.validate()?;

        let (goal_set, _) = modify_goal_set(store, self.goal_set_id, |goal_set| {
            goal_set.update_goal(
                self.goal_id,
                self.title.clone(),
                self.goal_type,
                self.value_type,
                self.percentage,
            )
        })
        .await?;

        info!(goal_set_id = %goal_set.id, goal_id = %self.goal_id, "Goal updated");
        publish(
            event_sender,
            Event::GoalUpdated {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::goals::fixtures::{sender, store_with_goal};

    fn command(goal_set_id: Uuid, goal_id: Uuid, percentage: i32) -> UpdateGoalCommand {
        UpdateGoalCommand {
            goal_set_id,
            goal_id,
            title: "Updated Title".into(),
            goal_type: GoalType::Team,
            value_type: GoalValueType::Percentage,
            percentage,
        }
    }

    #[tokio::test]
    async fn replaces_the_goal_definition() {
        let (store, goal_set, goal_id) = store_with_goal(false).await;

        let result = command(goal_set.id, goal_id, 100)
            .execute(store.clone(), sender())
            .await
            .unwrap();
        assert_eq!((result.goal_set_id, result.goal_id), (goal_set.id, goal_id));

        let stored = store.goal_sets.get_by_id(goal_set.id).await.unwrap().unwrap();
        assert_eq!(stored.goal(goal_id).unwrap().title, "Updated Title");
    }

    #[tokio::test]
    async fn unknown_goal_is_reported() {
        let (store, goal_set, _) = store_with_goal(false).await;
        let err = command(goal_set.id, Uuid::new_v4(), 30)
            .execute(store, sender())
            .await
            .unwrap_err();
        assert!(err.mentions("Goal not found"));
    }

    #[tokio::test]
    async fn weights_cannot_exceed_one_hundred() {
        let (store, goal_set, goal_id) = store_with_goal(false).await;
        let second = super::super::AddGoalCommand {
            goal_set_id: goal_set.id,
            title: "Second".into(),
            goal_type: GoalType::Team,
            min_value: 1,
            mid_value: 2,
            max_value: 3,
            value_type: GoalValueType::Number,
            percentage: 30,
        }
        .execute(store.clone(), sender())
        .await
        .unwrap();

        let err = command(goal_set.id, second.goal_id, 70)
            .execute(store.clone(), sender())
            .await
            .unwrap_err();
        assert!(err.mentions("Total percentage"));

        let stored = store.goal_sets.get_by_id(goal_set.id).await.unwrap().unwrap();
        assert_eq!(stored.goal(goal_id).unwrap().percentage, 100);
        assert_eq!(stored.goal(second.goal_id).unwrap().percentage, 30);
    }
}
