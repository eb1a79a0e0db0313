//! Goals domain models.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_DESIRED_WEEKLY_FREQUENCY, MIN_DESIRED_WEEKLY_FREQUENCY};
use crate::errors::{Error, Result, ValidationError};
use crate::utils::WeekWindow;

/// Domain model representing a goal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub title: String,
    pub desired_weekly_frequency: i32,
    pub created_at: DateTime<Utc>,
}

/// Input model for creating a new goal
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    pub title: String,
    pub desired_weekly_frequency: i32,
}

impl NewGoal {
    pub fn new(title: impl Into<String>, desired_weekly_frequency: i32) -> Self {
        Self {
            title: title.into(),
            desired_weekly_frequency,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Goal title cannot be empty".to_string(),
            )));
        }
        if !(MIN_DESIRED_WEEKLY_FREQUENCY..=MAX_DESIRED_WEEKLY_FREQUENCY)
            .contains(&self.desired_weekly_frequency)
        {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Desired weekly frequency must be between {} and {}, got {}",
                MIN_DESIRED_WEEKLY_FREQUENCY,
                MAX_DESIRED_WEEKLY_FREQUENCY,
                self.desired_weekly_frequency
            ))));
        }
        Ok(())
    }
}

/// One recorded instance of performing a goal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalCompletion {
    pub id: String,
    pub goal_id: String,
    pub created_at: DateTime<Utc>,
}

/// A goal in scope for the current week with its completions so far
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingGoal {
    pub id: String,
    pub title: String,
    pub desired_weekly_frequency: i32,
    pub completion_count: i64,
}

/// Completion entry listed under a day of the weekly summary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeekCompletion {
    pub id: String,
    pub title: String,
    pub completed_at: DateTime<Utc>,
}

/// Weekly progress: completions made, completions wanted, and what was done
/// on each day.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeekSummary {
    pub completed: i64,
    pub total: i64,
    pub goals_per_day: BTreeMap<NaiveDate, Vec<WeekCompletion>>,
}

impl WeekSummary {
    /// Builds the summary, keying each completion by its calendar day in the
    /// window's timezone. Days without completions get no entry and each
    /// day's list is ordered by completion time.
    pub fn from_completions(
        completed: i64,
        total: i64,
        completions: Vec<WeekCompletion>,
        window: &WeekWindow,
    ) -> Self {
        let mut goals_per_day: BTreeMap<NaiveDate, Vec<WeekCompletion>> = BTreeMap::new();
        for completion in completions {
            goals_per_day
                .entry(window.day_of(completion.completed_at))
                .or_default()
                .push(completion);
        }
        for day in goals_per_day.values_mut() {
            day.sort_by(|a, b| {
                a.completed_at
                    .cmp(&b.completed_at)
                    .then_with(|| a.id.cmp(&b.id))
            });
        }

        Self {
            completed,
            total,
            goals_per_day,
        }
    }
}
