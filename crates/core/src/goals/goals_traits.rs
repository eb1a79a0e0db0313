use crate::errors::Result;
use crate::goals::goals_model::{Goal, GoalCompletion, NewGoal, PendingGoal, WeekSummary};
use crate::utils::WeekWindow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Trait for goal repository operations
#[async_trait]
pub trait GoalRepositoryTrait: Send + Sync {
    fn load_goals(&self) -> Result<Vec<Goal>>;

    /// Goals created on or before the end of `window`, each with the number of
    /// its completions inside `window` (zero when it has none).
    fn load_week_pending_goals(&self, window: &WeekWindow) -> Result<Vec<PendingGoal>>;

    /// Completion count, summed weekly targets and per-day completions for
    /// `window`, read from a single snapshot.
    fn load_week_summary(&self, window: &WeekWindow) -> Result<WeekSummary>;

    async fn insert_new_goal(&self, new_goal: NewGoal, created_at: DateTime<Utc>) -> Result<Goal>;

    /// Records a completion unless the goal already reached its weekly target
    /// inside `window`. The check and the insert run in one write transaction.
    async fn insert_goal_completion(
        &self,
        goal_id: String,
        window: WeekWindow,
        completed_at: DateTime<Utc>,
    ) -> Result<GoalCompletion>;
}

/// Trait for goal service operations
#[async_trait]
pub trait GoalServiceTrait: Send + Sync {
    fn get_goals(&self) -> Result<Vec<Goal>>;
    fn get_week_pending_goals(&self) -> Result<Vec<PendingGoal>>;
    fn get_week_summary(&self) -> Result<WeekSummary>;
    async fn create_goal(&self, new_goal: NewGoal) -> Result<Goal>;
    async fn complete_goal(&self, goal_id: String) -> Result<GoalCompletion>;
}
