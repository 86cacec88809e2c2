use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::Query;
use crate::{
    errors::ServiceError,
    models::{Goal, GoalProgressStatus, GoalSet, GoalType, GoalValueType, LookupValue},
    store::DataStore,
};

/// Id/name pair returned by the lookup queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupItem {
    pub id: i32,
    pub name: String,
}

fn lookup<T: LookupValue>() -> Vec<LookupItem> {
    T::list()
        .into_iter()
        .map(|v| LookupItem {
            id: v.value(),
            name: v.to_string(),
        })
        .collect()
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GetGoalTypeLookupQuery;

#[async_trait]
impl Query for GetGoalTypeLookupQuery {
    type Result = Vec<LookupItem>;

    async fn execute(&self, _store: &DataStore) -> Result<Self::Result, ServiceError> {
        Ok(lookup::<GoalType>())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GetGoalValueTypeLookupQuery;

#[async_trait]
impl Query for GetGoalValueTypeLookupQuery {
    type Result = Vec<LookupItem>;

    async fn execute(&self, _store: &DataStore) -> Result<Self::Result, ServiceError> {
        Ok(lookup::<GoalValueType>())
    }
}

/// A user's goal set for a team and year. `None` when the period or the set
/// does not exist yet.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetGoalSetQuery {
    pub team_id: i32,
    pub year: i32,
    pub user_id: i32,
}

#[async_trait]
impl Query for GetGoalSetQuery {
    type Result = Option<GoalSet>;

    #[instrument(skip(self, store), fields(team_id = self.team_id, year = self.year, user_id = self.user_id))]
    async fn execute(&self, store: &DataStore) -> Result<Self::Result, ServiceError> {
        let period = store
            .goal_periods
            .list()
            .await?
            .into_iter()
            .find(|p| p.matches(self.team_id, self.year));

        let Some(period) = period else {
            debug!("No goal period for team and year");
            return Ok(None);
        };

        Ok(store.goal_sets.list().await?.into_iter().find(|gs| {
            gs.team_id == self.team_id && gs.period_id == period.id && gs.user_id == self.user_id
        }))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetGoalQuery {
    pub goal_set_id: Uuid,
    pub goal_id: Uuid,
}

#[async_trait]
impl Query for GetGoalQuery {
    type Result = Option<Goal>;

    #[instrument(skip(self, store), fields(goal_set_id = %self.goal_set_id, goal_id = %self.goal_id))]
    async fn execute(&self, store: &DataStore) -> Result<Self::Result, ServiceError> {
        Ok(store
            .goal_sets
            .get_by_id(self.goal_set_id)
            .await?
            .and_then(|gs| gs.goal(self.goal_id).cloned()))
    }
}

/// Goal sets waiting for a manager decision in any of `team_ids`, ordered by
/// team and then user.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetPendingApprovalGoalSetsQuery {
    pub team_ids: Vec<i32>,
}

#[async_trait]
impl Query for GetPendingApprovalGoalSetsQuery {
    type Result = Vec<GoalSet>;

    #[instrument(skip(self, store), fields(teams = self.team_ids.len()))]
    async fn execute(&self, store: &DataStore) -> Result<Self::Result, ServiceError> {
        if self.team_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut pending: Vec<GoalSet> = store
            .goal_sets
            .list()
            .await?
            .into_iter()
            .filter(|gs| gs.is_waiting_for_approval() && self.team_ids.contains(&gs.team_id))
            .collect();
        pending.sort_by_key(|gs| (gs.team_id, gs.user_id));
        Ok(pending)
    }
}

/// A goal whose submitted progress still needs review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingGoal {
    pub goal_set_id: Uuid,
    pub team_id: i32,
    pub user_id: i32,
    pub goal: Goal,
}

/// Goals in `team_ids` whose latest progress waits for approval.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetPendingApprovalGoalsQuery {
    pub team_ids: Vec<i32>,
}

#[async_trait]
impl Query for GetPendingApprovalGoalsQuery {
    type Result = Vec<PendingGoal>;

    #[instrument(skip(self, store), fields(teams = self.team_ids.len()))]
    async fn execute(&self, store: &DataStore) -> Result<Self::Result, ServiceError> {
        if self.team_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut goal_sets: Vec<GoalSet> = store
            .goal_sets
            .list()
            .await?
            .into_iter()
            .filter(|gs| self.team_ids.contains(&gs.team_id))
            .collect();
        goal_sets.sort_by_key(|gs| (gs.team_id, gs.user_id));

        Ok(goal_sets
            .iter()
            .flat_map(|gs| {
                gs.goals()
                    .iter()
                    .filter(|g| {
                        g.progress
                            .as_ref()
                            .map_or(false, |p| p.status == GoalProgressStatus::WaitingForApproval)
                    })
                    .map(move |g| PendingGoal {
                        goal_set_id: gs.id,
                        team_id: gs.team_id,
                        user_id: gs.user_id,
                        goal: g.clone(),
                    })
            })
            .collect())
    }
}
