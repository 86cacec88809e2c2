use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::goal::{Goal, GoalProgress, GoalProgressStatus, GoalType, GoalValue, GoalValueType};
use crate::errors::{DomainError, DomainResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum GoalSetStatus {
    None,
    WaitingForApproval,
    Approved,
}

/// A user's goals for one team and goal period.
///
/// `status` is `None` for a freshly created set and `Some(GoalSetStatus::None)`
/// after a rejection; both are editable. Goals can only change while the set
/// is neither waiting for approval nor approved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GoalSet {
    pub id: Uuid,
    pub team_id: i32,
    pub period_id: Uuid,
    pub user_id: i32,
    status: Option<GoalSetStatus>,
    goals: Vec<Goal>,
    pub version: i32,
}

impl GoalSet {
    pub fn create(team_id: i32, period_id: Uuid, user_id: i32) -> DomainResult<Self> {
        let mut errors = Vec::new();
        if team_id <= 0 {
            errors.push("Team id must be positive".to_string());
        }
        if user_id <= 0 {
            errors.push("User id must be positive".to_string());
        }
        if !errors.is_empty() {
            return Err(DomainError::from_messages(errors));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            team_id,
            period_id,
            user_id,
            status: None,
            goals: Vec::new(),
            version: 1,
        })
    }

    pub fn status(&self) -> Option<GoalSetStatus> {
        self.status
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn goal(&self, goal_id: Uuid) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == goal_id)
    }

    pub fn total_percentage(&self) -> i32 {
        self.goals.iter().map(|g| g.percentage).sum()
    }

    pub fn is_editable(&self) -> bool {
        !matches!(
            self.status,
            Some(GoalSetStatus::WaitingForApproval) | Some(GoalSetStatus::Approved)
        )
    }

    pub fn is_waiting_for_approval(&self) -> bool {
        self.status == Some(GoalSetStatus::WaitingForApproval)
    }

    pub fn add_goal(
        &mut self,
        title: impl Into<String>,
        goal_type: GoalType,
        goal_value: GoalValue,
        percentage: i32,
    ) -> DomainResult<Uuid> {
        if !self.is_editable() {
            return Err(DomainError::new(format!(
                "Cannot add goals to a goal set with status: {}",
                self.status_label()
            )));
        }

        let goal = Goal::new(title.into(), goal_type, goal_value, percentage);
        let goal_id = goal.id;
        self.goals.push(goal);
        Ok(goal_id)
    }

    /// Replaces a goal's definition in place. Progress is kept. The new value
    /// type is applied to the goal's existing range, which is re-validated.
    pub fn update_goal(
        &mut self,
        goal_id: Uuid,
        title: impl Into<String>,
        goal_type: GoalType,
        value_type: GoalValueType,
        percentage: i32,
    ) -> DomainResult<()> {
        if !self.is_editable() {
            return Err(DomainError::new(format!(
                "Cannot update goal in a goal set with status: {}",
                self.status_label()
            )));
        }

        let current = self
            .goal(goal_id)
            .ok_or_else(|| DomainError::new("Goal not found"))?;

        let total = self.total_percentage() - current.percentage + percentage;
        if total > 100 {
            return Err(DomainError::new(format!(
                "Total percentage of goals cannot exceed 100 (would be {})",
                total
            )));
        }

        let goal_value = current.goal_value.with_value_type(value_type)?;

        let goal = self.goal_mut(goal_id)?;
        goal.title = title.into();
        goal.goal_type = goal_type;
        goal.goal_value = goal_value;
        goal.percentage = percentage;
        Ok(())
    }

    /// Replaces any existing progress with a fresh record awaiting approval.
    pub fn update_goal_progress(
        &mut self,
        goal_id: Uuid,
        actual_value: i32,
        comment: Option<String>,
    ) -> DomainResult<()> {
        let goal = self.goal_mut(goal_id)?;
        goal.progress = Some(GoalProgress::submitted(actual_value, comment));
        Ok(())
    }

    /// Approves the goal's current progress. Re-approving a record that was
    /// already approved or rejected is allowed.
    pub fn approve_goal_progress(&mut self, goal_id: Uuid) -> DomainResult<()> {
        self.set_progress_status(goal_id, GoalProgressStatus::Approved)
    }

    /// Rejects the goal's current progress. Like approval, this has no guard
    /// on the record's previous status.
    pub fn reject_goal_progress(&mut self, goal_id: Uuid) -> DomainResult<()> {
        self.set_progress_status(goal_id, GoalProgressStatus::Rejected)
    }

    pub fn send_to_approval(&mut self) -> DomainResult<()> {
        if !self.goals.iter().all(Goal::has_approved_progress) {
            return Err(DomainError::new(
                "Cannot send goal set to approval until every goal has approved progress",
            ));
        }

        let total = self.total_percentage();
        if total != 100 {
            return Err(DomainError::new(format!(
                "The sum of all goal percentages must be 100, but is {}",
                total
            )));
        }

        self.status = Some(GoalSetStatus::WaitingForApproval);
        Ok(())
    }

    /// Approves the set. The approver is not recorded on the aggregate.
    pub fn approve(&mut self, _approver_id: i32) -> DomainResult<()> {
        if !self.is_waiting_for_approval() {
            return Err(DomainError::new(format!(
                "Cannot approve goal set with status: {}",
                self.status_label()
            )));
        }
        self.status = Some(GoalSetStatus::Approved);
        Ok(())
    }

    /// Rejects the set and makes it editable again.
    pub fn reject(&mut self, _approver_id: i32) -> DomainResult<()> {
        if !self.is_waiting_for_approval() {
            return Err(DomainError::new(format!(
                "Cannot reject goal set with status: {}",
                self.status_label()
            )));
        }
        self.status = Some(GoalSetStatus::None);
        Ok(())
    }

    fn goal_mut(&mut self, goal_id: Uuid) -> DomainResult<&mut Goal> {
        self.goals
            .iter_mut()
            .find(|g| g.id == goal_id)
            .ok_or_else(|| DomainError::new("Goal not found"))
    }

    fn set_progress_status(
        &mut self,
        goal_id: Uuid,
        status: GoalProgressStatus,
    ) -> DomainResult<()> {
        let goal = self.goal_mut(goal_id)?;
        let progress = goal
            .progress
            .as_mut()
            .ok_or_else(|| DomainError::new("No progress record found for this goal"))?;
        if progress.status != GoalProgressStatus::WaitingForApproval {
            debug!(
                %goal_id,
                from = %progress.status,
                to = %status,
                "Reviewing goal progress that was already reviewed"
            );
        }
        progress.status = status;
        Ok(())
    }

    fn status_label(&self) -> String {
        self.status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "New".to_string())
    }
}
