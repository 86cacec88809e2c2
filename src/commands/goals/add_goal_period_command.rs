use crate::{
    commands::Command,
    errors::ServiceError,
    events::{Event, EventSender},
    models::GoalPeriod,
    store::DataStore,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use super::{publish, record};

const COMMAND: &str = "add_goal_period";

/// Opens the goal period for a team and year. A team has at most one period
/// per year.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AddGoalPeriodCommand {
    #[validate(range(min = 1, message = "Team id must be positive"))]
    pub team_id: i32,
    #[validate(range(min = 2000, max = 2100, message = "Year must be between 2000 and 2100"))]
    pub year: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddGoalPeriodResult {
    pub id: Uuid,
    pub team_id: i32,
    pub year: i32,
}

#[async_trait::async_trait]
impl Command for AddGoalPeriodCommand {
    type Result = AddGoalPeriodResult;

    #[instrument(skip(self, store, event_sender), fields(team_id = self.team_id, year = self.year))]
    async fn execute(
        &self,
        store: Arc<DataStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let result = self.add_period(&store, &event_sender).await;
        record(COMMAND, &result);
        result
    }
}

impl AddGoalPeriodCommand {
    async fn add_period(
        &self,
        store: &DataStore,
        event_sender: &EventSender,
    ) -> Result<AddGoalPeriodResult, ServiceError> {
        self.validate()?;

        let period = store
            .goal_periods
            .add(GoalPeriod::create(self.team_id, self.year)?)
            .await
            .map_err(|e| match e {
                ServiceError::AlreadyExists(_) => ServiceError::AlreadyExists(format!(
                    "Goal period for team {} and year {} already exists",
                    self.team_id, self.year
                )),
                other => other,
            })?;

        info!(period_id = %period.id, "Goal period created");
        publish(
            event_sender,
            Event::GoalPeriodCreated {
                period_id: period.id,
                team_id: period.team_id,
                year: period.year,
            },
        )
        .await?;

        Ok(AddGoalPeriodResult {
            id: period.id,
            team_id: period.team_id,
            year: period.year,
        })
    }
}
