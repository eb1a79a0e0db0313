use habitual_core::errors::{DatabaseError, Error};
use habitual_core::goals::{
    Goal, GoalCompletion, GoalError, GoalRepositoryTrait, NewGoal, PendingGoal, WeekCompletion,
    WeekSummary,
};
use habitual_core::utils::WeekWindow;
use habitual_core::Result;

use super::model::{GoalCompletionDB, GoalDB, WeekCompletionDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::{goal_completions, goals};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sql_types::{BigInt, Integer, Nullable, Text, Timestamp};
use diesel::SqliteConnection;
use log::debug;

use std::sync::Arc;
use uuid::Uuid;

#[derive(QueryableByName, Debug)]
struct PendingGoalRow {
    #[diesel(sql_type = Text)]
    id: String,
    #[diesel(sql_type = Text)]
    title: String,
    #[diesel(sql_type = Integer)]
    desired_weekly_frequency: i32,
    #[diesel(sql_type = BigInt)]
    completion_count: i64,
}

#[derive(QueryableByName, Debug)]
struct WeekTotalsRow {
    #[diesel(sql_type = BigInt)]
    completed: i64,
    #[diesel(sql_type = Nullable<BigInt>)]
    total: Option<i64>,
}

pub struct GoalRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl GoalRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        GoalRepository { pool, writer }
    }

    fn load_week_totals(
        conn: &mut SqliteConnection,
        window: &WeekWindow,
    ) -> QueryResult<WeekTotalsRow> {
        // Completions are inner-joined to their goal here, unlike the pending
        // goals query which starts from goals and left-joins the counts.
        diesel::sql_query(
            r#"
            WITH goals_created_up_to_week AS (
                SELECT desired_weekly_frequency
                FROM goals
                WHERE created_at <= ?2
            ),
            goals_completed_in_week AS (
                SELECT gc.id
                FROM goal_completions gc
                INNER JOIN goals g ON g.id = gc.goal_id
                WHERE gc.created_at >= ?1
                  AND gc.created_at <= ?2
            )
            SELECT
                (SELECT COUNT(*) FROM goals_completed_in_week) AS completed,
                (SELECT SUM(desired_weekly_frequency) FROM goals_created_up_to_week) AS total
            "#,
        )
        .bind::<Timestamp, _>(window.start_naive())
        .bind::<Timestamp, _>(window.end_naive())
        .get_result::<WeekTotalsRow>(conn)
    }

    fn load_week_completions(
        conn: &mut SqliteConnection,
        window: &WeekWindow,
    ) -> QueryResult<Vec<WeekCompletionDB>> {
        goal_completions::table
            .inner_join(goals::table)
            .filter(goal_completions::created_at.ge(window.start_naive()))
            .filter(goal_completions::created_at.le(window.end_naive()))
            .select((goal_completions::id, goals::title, goal_completions::created_at))
            .order((goal_completions::created_at.asc(), goal_completions::id.asc()))
            .load::<WeekCompletionDB>(conn)
    }

    fn count_completions_in_window(
        conn: &mut SqliteConnection,
        goal_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> QueryResult<i64> {
        goal_completions::table
            .filter(goal_completions::goal_id.eq(goal_id))
            .filter(goal_completions::created_at.ge(start))
            .filter(goal_completions::created_at.le(end))
            .count()
            .get_result(conn)
    }
}

#[async_trait]
impl GoalRepositoryTrait for GoalRepository {
    fn load_goals(&self) -> Result<Vec<Goal>> {
        let mut conn = get_connection(&self.pool)?;
        let goals_db = goals::table
            .order((goals::created_at.asc(), goals::id.asc()))
            .select(GoalDB::as_select())
            .load::<GoalDB>(&mut conn)
            .into_core()?;
        Ok(goals_db.into_iter().map(Goal::from).collect())
    }

    fn load_week_pending_goals(&self, window: &WeekWindow) -> Result<Vec<PendingGoal>> {
        let mut conn = get_connection(&self.pool)?;

        let rows: Vec<PendingGoalRow> = diesel::sql_query(
            r#"
            WITH goals_created_up_to_week AS (
                SELECT id, title, desired_weekly_frequency, created_at
                FROM goals
                WHERE created_at <= ?2
            ),
            goal_completion_counts AS (
                SELECT goal_id, COUNT(id) AS completion_count
                FROM goal_completions
                WHERE created_at >= ?1
                  AND created_at <= ?2
                GROUP BY goal_id
            )
            SELECT
                g.id,
                g.title,
                g.desired_weekly_frequency,
                COALESCE(c.completion_count, 0) AS completion_count
            FROM goals_created_up_to_week g
            LEFT JOIN goal_completion_counts c ON c.goal_id = g.id
            ORDER BY g.created_at ASC, g.id ASC
            "#,
        )
        .bind::<Timestamp, _>(window.start_naive())
        .bind::<Timestamp, _>(window.end_naive())
        .load(&mut conn)
        .map_err(StorageError::from)?;

        debug!(
            "Loaded {} pending goals between {} and {}",
            rows.len(),
            window.start,
            window.end
        );

        Ok(rows
            .into_iter()
            .map(|row| PendingGoal {
                id: row.id,
                title: row.title,
                desired_weekly_frequency: row.desired_weekly_frequency,
                completion_count: row.completion_count,
            })
            .collect())
    }

    fn load_week_summary(&self, window: &WeekWindow) -> Result<WeekSummary> {
        let mut conn = get_connection(&self.pool)?;

        let (totals, completions) = conn
            .transaction::<_, StorageError, _>(|tx| {
                let totals = Self::load_week_totals(tx, window)?;
                let completions = Self::load_week_completions(tx, window)?;
                Ok((totals, completions))
            })?;

        debug!(
            "Week totals between {} and {}: completed={}, total={:?}",
            window.start, window.end, totals.completed, totals.total
        );

        let completions: Vec<WeekCompletion> =
            completions.into_iter().map(WeekCompletion::from).collect();

        // SUM over no goals is NULL; report it as zero.
        Ok(WeekSummary::from_completions(
            totals.completed,
            totals.total.unwrap_or(0),
            completions,
            window,
        ))
    }

    async fn insert_new_goal(
        &self,
        new_goal: NewGoal,
        created_at: DateTime<Utc>,
    ) -> Result<Goal> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Goal> {
                let goal_db = GoalDB {
                    id: Uuid::new_v4().to_string(),
                    title: new_goal.title,
                    desired_weekly_frequency: new_goal.desired_weekly_frequency,
                    created_at: created_at.naive_utc(),
                };

                let result_db = diesel::insert_into(goals::table)
                    .values(&goal_db)
                    .returning(GoalDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(Goal::from(result_db))
            })
            .await
    }

    async fn insert_goal_completion(
        &self,
        goal_id: String,
        window: WeekWindow,
        completed_at: DateTime<Utc>,
    ) -> Result<GoalCompletion> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<GoalCompletion> {
                let goal = goals::table
                    .find(goal_id.as_str())
                    .select(GoalDB::as_select())
                    .first::<GoalDB>(conn)
                    .optional()
                    .map_err(StorageError::from)?
                    .ok_or_else(|| {
                        Error::Database(DatabaseError::NotFound(format!(
                            "Goal {} not found",
                            goal_id
                        )))
                    })?;

                let completion_count = Self::count_completions_in_window(
                    conn,
                    &goal.id,
                    window.start_naive(),
                    window.end_naive(),
                )
                .map_err(StorageError::from)?;

                if completion_count >= i64::from(goal.desired_weekly_frequency) {
                    return Err(GoalError::AlreadyCompletedThisWeek { goal_id: goal.id }.into());
                }

                let completion_db = GoalCompletionDB {
                    id: Uuid::new_v4().to_string(),
                    goal_id: goal.id,
                    created_at: completed_at.naive_utc(),
                };

                let result_db = diesel::insert_into(goal_completions::table)
                    .values(&completion_db)
                    .returning(GoalCompletionDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(GoalCompletion::from(result_db))
            })
            .await
    }
}
