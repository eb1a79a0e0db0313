//! Database models for goals.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use habitual_core::goals::{Goal, GoalCompletion, WeekCompletion};

/// Database model for goals
#[derive(Insertable, Queryable, Identifiable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::goals)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GoalDB {
    pub id: String,
    pub title: String,
    pub desired_weekly_frequency: i32,
    pub created_at: NaiveDateTime,
}

/// Database model for goal completions
#[derive(
    Insertable, Queryable, Identifiable, Associations, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(belongs_to(GoalDB, foreign_key = goal_id))]
#[diesel(table_name = crate::schema::goal_completions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GoalCompletionDB {
    pub id: String,
    pub goal_id: String,
    pub created_at: NaiveDateTime,
}

/// Completion joined with its goal's title
#[derive(Queryable, Debug, Clone)]
pub struct WeekCompletionDB {
    pub id: String,
    pub title: String,
    pub completed_at: NaiveDateTime,
}

// Conversion to domain models. Timestamps are stored as naive UTC.
impl From<GoalDB> for Goal {
    fn from(db: GoalDB) -> Self {
        Self {
            id: db.id,
            title: db.title,
            desired_weekly_frequency: db.desired_weekly_frequency,
            created_at: db.created_at.and_utc(),
        }
    }
}

impl From<GoalCompletionDB> for GoalCompletion {
    fn from(db: GoalCompletionDB) -> Self {
        Self {
            id: db.id,
            goal_id: db.goal_id,
            created_at: db.created_at.and_utc(),
        }
    }
}

impl From<WeekCompletionDB> for WeekCompletion {
    fn from(db: WeekCompletionDB) -> Self {
        Self {
            id: db.id,
            title: db.title,
            completed_at: db.completed_at.and_utc(),
        }
    }
}
