use crate::{
    commands::Command,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{GoalType, GoalValue, GoalValueType},
    store::DataStore,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use super::{modify_goal_set, publish, record, GoalResult};

const COMMAND: &str = "add_goal";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddGoalCommand {
    pub goal_set_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    pub goal_type: GoalType,
    pub min_value: i32,
    pub mid_value: i32,
    pub max_value: i32,
    pub value_type: GoalValueType,
    #[validate(range(min = 1, max = 100, message = "Percentage must be between 1 and 100"))]
    pub percentage: i32,
}

#[async_trait::async_trait]
impl Command for AddGoalCommand {
    type Result = GoalResult;

    #[instrument(skip(self, store, event_sender), fields(goal_set_id = %self.goal_set_id))]
    async fn execute(
        &self,
        store: Arc<DataStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let result = self.add_goal(&store, &event_sender).await;
        record(COMMAND, &result);
        result
    }
}

impl AddGoalCommand {
    async fn add_goal(
        &self,
        store: &DataStore,
        event_sender: &EventSender,
    ) -> Result<GoalResult, ServiceError> {
        self.validate()?;
        let goal_value =
            GoalValue::create(self.min_value, self.mid_value, self.max_value, self.value_type)?;

        let (goal_set, goal_id) = modify_goal_set(store, self.goal_set_id, |goal_set| {
            goal_set.add_goal(
                self.title.clone(),
                self.goal_type,
                goal_value,
                self.percentage,
            )
        })
        .await?;

        info!(goal_set_id = %goal_set.id, %goal_id, percentage = self.percentage, "Goal added");
        publish(
            event_sender,
            Event::GoalAdded {
                goal_set_id: goal_set.id,
                goal_id,
            },
        )
        .await?;

        Ok(GoalResult {
            goal_set_id: goal_set.id,
            goal_id,
            version: goal_set.version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::goals::fixtures::{sender, store_with_goal};
    use crate::models::GoalSet;
    use test_case::test_case;

    fn command(goal_set_id: Uuid, min: i32, mid: i32, max: i32) -> AddGoalCommand {
        AddGoalCommand {
            goal_set_id,
            title: "Reduce churn".into(),
            goal_type: GoalType::Individual,
            min_value: min,
            mid_value: mid,
            max_value: max,
            value_type: GoalValueType::Percentage,
            percentage: 40,
        }
    }

    #[test_case(5, 5, 10, "Min value must be less than mid value" ; "min equals mid")]
    #[test_case(3, 7, 7, "Mid value must be less than max value" ; "mid equals max")]
    #[test_case(0, 10, 20, "Values must be between 1 and 100 for percentage goal type" ; "below range")]
    #[tokio::test]
    async fn invalid_values_never_touch_the_store(min: i32, mid: i32, max: i32, message: &str) {
        let store = Arc::new(DataStore::in_memory());
        let err = command(Uuid::new_v4(), min, mid, max)
            .execute(store, sender())
            .await
            .unwrap_err();

        assert_eq!(err.messages(), vec![message.to_string()]);
    }

    #[tokio::test]
    async fn appends_to_an_editable_set() {
        let store = DataStore::in_memory();
        let goal_set = store
            .goal_sets
            .add(GoalSet::create(1, Uuid::new_v4(), 2).unwrap())
            .await
            .unwrap();
        let store = Arc::new(store);

        let result = command(goal_set.id, 10, 20, 30)
            .execute(store.clone(), sender())
            .await
            .unwrap();

        let stored = store.goal_sets.get_by_id(goal_set.id).await.unwrap().unwrap();
        assert_eq!(stored.goals().len(), 1);
        assert_eq!(stored.goal(result.goal_id).unwrap().percentage, 40);
        assert_eq!(result.version, goal_set.version + 1);
    }

    #[tokio::test]
    async fn waiting_set_rejects_new_goals() {
        let (store, goal_set, _) = store_with_goal(true).await;
        let mut waiting = goal_set.clone();
        waiting.send_to_approval().unwrap();
        store.goal_sets.update(waiting).await.unwrap();

        let err = command(goal_set.id, 10, 20, 30)
            .execute(store, sender())
            .await
            .unwrap_err();
        assert!(err.mentions("Cannot add goals"));
    }

    #[tokio::test]
    async fn missing_goal_set_is_not_found() {
        let store = Arc::new(DataStore::in_memory());
        let err = command(Uuid::new_v4(), 10, 20, 30)
            .execute(store, sender())
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::NotFound("Goal set not found".into()));
    }
}
