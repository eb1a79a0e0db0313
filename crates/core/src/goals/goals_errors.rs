use thiserror::Error;

/// Business-rule failures specific to goals.
#[derive(Error, Debug)]
pub enum GoalError {
    #[error("Goal {goal_id} already completed this week")]
    AlreadyCompletedThisWeek { goal_id: String },
}
