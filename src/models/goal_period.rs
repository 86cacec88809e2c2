use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DomainError, DomainResult};

pub const MIN_PERIOD_YEAR: i32 = 2000;
pub const MAX_PERIOD_YEAR: i32 = 2100;

/// The year a team's goal sets belong to. At most one per team and year.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalPeriod {
    pub id: Uuid,
    pub team_id: i32,
    pub year: i32,
    pub version: i32,
}

impl GoalPeriod {
    pub fn create(team_id: i32, year: i32) -> DomainResult<Self> {
        let mut errors = Vec::new();
        if team_id <= 0 {
            errors.push("Team id must be positive".to_string());
        }
        if !(MIN_PERIOD_YEAR..=MAX_PERIOD_YEAR).contains(&year) {
            errors.push(format!(
                "Year must be between {} and {}",
                MIN_PERIOD_YEAR, MAX_PERIOD_YEAR
            ));
        }
        if !errors.is_empty() {
            return Err(DomainError::from_messages(errors));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            team_id,
            year,
            version: 1,
        })
    }

    pub fn matches(&self, team_id: i32, year: i32) -> bool {
        self.team_id == team_id && self.year == year
    }
}
