use crate::{
    commands::Command,
    errors::ServiceError,
    events::{Event, EventSender},
    models::GoalSet,
    store::DataStore,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use super::{publish, record};

const COMMAND: &str = "create_goal_set";

/// Starts an empty goal set for a user in the team's period for `year`.
/// A user has one goal set per team and period.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateGoalSetCommand {
    #[validate(range(min = 1, message = "Team id must be positive"))]
    pub team_id: i32,
    #[validate(range(min = 1, message = "User id must be positive"))]
    pub user_id: i32,
    pub year: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateGoalSetResult {
    pub id: Uuid,
    pub team_id: i32,
    pub period_id: Uuid,
    pub user_id: i32,
    pub version: i32,
}

#[async_trait::async_trait]
impl Command for CreateGoalSetCommand {
    type Result = CreateGoalSetResult;

    #[instrument(skip(self, store, event_sender), fields(team_id = self.team_id, user_id = self.user_id))]
    async fn execute(
        &self,
        store: Arc<DataStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let result = self.create(&store, &event_sender).await;
        record(COMMAND, &result);
        result
    }
}

impl CreateGoalSetCommand {
    async fn create(
        &self,
        store: &DataStore,
        event_sender: &EventSender,
    ) -> Result<CreateGoalSetResult, ServiceError> {
        self.validate()?;

        let period = store
            .goal_periods
            .list()
            .await?
            .into_iter()
            .find(|p| p.matches(self.team_id, self.year))
            .ok_or_else(|| {
                ServiceError::InvalidOperation(format!(
                    "The goal period is not created for team {} and year {}",
                    self.team_id, self.year
                ))
            })?;

        let goal_set = GoalSet::create(self.team_id, period.id, self.user_id)?;
        let goal_set = store.goal_sets.add(goal_set).await.map_err(|e| match e {
            ServiceError::AlreadyExists(_) => ServiceError::AlreadyExists(format!(
                "Goal set for user {} in team {} and year {} already exists",
                self.user_id, self.team_id, self.year
            )),
            other => other,
        })?;

        info!(goal_set_id = %goal_set.id, period_id = %period.id, "Goal set created");
        publish(event_sender, Event::GoalSetCreated(goal_set.id)).await?;

        Ok(CreateGoalSetResult {
            id: goal_set.id,
            team_id: goal_set.team_id,
            period_id: goal_set.period_id,
            user_id: goal_set.user_id,
            version: goal_set.version,
        })
    }
}
