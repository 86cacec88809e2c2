use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};
use uuid::Uuid;

use crate::errors::{DomainError, DomainResult};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize, strum::Display,
)]
pub enum GoalType {
    Team,
    Individual,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize, strum::Display,
)]
pub enum GoalValueType {
    Number,
    Percentage,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize, strum::Display,
)]
pub enum GoalProgressStatus {
    WaitingForApproval,
    Approved,
    Rejected,
}

/// Stable identifiers exposed by the lookup queries.
pub trait LookupValue: IntoEnumIterator + std::fmt::Display + Copy {
    fn value(self) -> i32;

    fn list() -> Vec<Self> {
        Self::iter().collect()
    }
}

impl LookupValue for GoalType {
    fn value(self) -> i32 {
        match self {
            GoalType::Team => 1,
            GoalType::Individual => 2,
        }
    }
}

impl LookupValue for GoalValueType {
    fn value(self) -> i32 {
        match self {
            GoalValueType::Number => 1,
            GoalValueType::Percentage => 2,
        }
    }
}

/// Three-point scoring range. Only obtainable through [`GoalValue::create`],
/// so `min < mid < max` always holds, and percentage values lie in 1..=100.
/// Deserialization goes through `create` as well.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GoalValueRecord")]
pub struct GoalValue {
    min_value: i32,
    mid_value: i32,
    max_value: i32,
    value_type: GoalValueType,
}

#[derive(Deserialize)]
struct GoalValueRecord {
    min_value: i32,
    mid_value: i32,
    max_value: i32,
    value_type: GoalValueType,
}

impl TryFrom<GoalValueRecord> for GoalValue {
    type Error = DomainError;

    fn try_from(record: GoalValueRecord) -> DomainResult<Self> {
        Self::create(
            record.min_value,
            record.mid_value,
            record.max_value,
            record.value_type,
        )
    }
}

impl GoalValue {
    pub fn create(
        min_value: i32,
        mid_value: i32,
        max_value: i32,
        value_type: GoalValueType,
    ) -> DomainResult<Self> {
        if min_value >= mid_value {
            return Err(DomainError::new("Min value must be less than mid value"));
        }
        if mid_value >= max_value {
            return Err(DomainError::new("Mid value must be less than max value"));
        }
        if value_type == GoalValueType::Percentage && (min_value < 1 || max_value > 100) {
            return Err(DomainError::new(
                "Values must be between 1 and 100 for percentage goal type",
            ));
        }

        Ok(Self {
            min_value,
            mid_value,
            max_value,
            value_type,
        })
    }

    pub fn min_value(&self) -> i32 {
        self.min_value
    }

    pub fn mid_value(&self) -> i32 {
        self.mid_value
    }

    pub fn max_value(&self) -> i32 {
        self.max_value
    }

    pub fn value_type(&self) -> GoalValueType {
        self.value_type
    }

    /// Same range re-checked under another value type.
    pub fn with_value_type(&self, value_type: GoalValueType) -> DomainResult<Self> {
        Self::create(self.min_value, self.mid_value, self.max_value, value_type)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub actual_value: i32,
    pub comment: Option<String>,
    pub status: GoalProgressStatus,
}

impl GoalProgress {
    pub fn submitted(actual_value: i32, comment: Option<String>) -> Self {
        Self {
            actual_value,
            comment,
            status: GoalProgressStatus::WaitingForApproval,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.status == GoalProgressStatus::Approved
    }
}

/// A weighted goal inside a goal set. Mutated only through its owning
/// [`GoalSet`](super::goal_set::GoalSet).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub title: String,
    pub goal_type: GoalType,
    pub goal_value: GoalValue,
    pub percentage: i32,
    pub progress: Option<GoalProgress>,
}

impl Goal {
    pub(crate) fn new(
        title: String,
        goal_type: GoalType,
        goal_value: GoalValue,
        percentage: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            goal_type,
            goal_value,
            percentage,
            progress: None,
        }
    }

    pub fn has_approved_progress(&self) -> bool {
        self.progress.as_ref().map_or(false, GoalProgress::is_approved)
    }
}
