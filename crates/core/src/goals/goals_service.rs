use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};

use crate::errors::{Error, Result};
use crate::goals::goals_model::{Goal, GoalCompletion, NewGoal, PendingGoal, WeekSummary};
use crate::goals::goals_traits::{GoalRepositoryTrait, GoalServiceTrait};
use crate::goals::GoalError;
use crate::settings::WeekSettings;
use crate::utils::{Clock, WeekWindow};

pub struct GoalService {
    goal_repo: Arc<dyn GoalRepositoryTrait>,
    clock: Arc<dyn Clock>,
    settings: WeekSettings,
}

impl GoalService {
    pub fn new(
        goal_repo: Arc<dyn GoalRepositoryTrait>,
        clock: Arc<dyn Clock>,
        settings: WeekSettings,
    ) -> Self {
        GoalService {
            goal_repo,
            clock,
            settings,
        }
    }

    /// The week containing the clock's current instant.
    pub fn current_week(&self) -> Result<WeekWindow> {
        WeekWindow::containing(self.clock.now(), &self.settings)
    }
}

#[async_trait]
impl GoalServiceTrait for GoalService {
    fn get_goals(&self) -> Result<Vec<Goal>> {
        self.goal_repo.load_goals()
    }

    fn get_week_pending_goals(&self) -> Result<Vec<PendingGoal>> {
        let window = self.current_week()?;
        let pending = self.goal_repo.load_week_pending_goals(&window)?;
        debug!(
            "{} pending goals for week starting {}",
            pending.len(),
            window.first_day
        );
        Ok(pending)
    }

    fn get_week_summary(&self) -> Result<WeekSummary> {
        let window = self.current_week()?;
        let summary = self.goal_repo.load_week_summary(&window)?;
        debug!(
            "Week starting {}: {}/{} completions over {} days",
            window.first_day,
            summary.completed,
            summary.total,
            summary.goals_per_day.len()
        );
        Ok(summary)
    }

    async fn create_goal(&self, new_goal: NewGoal) -> Result<Goal> {
        new_goal.validate()?;
        let normalized = NewGoal {
            title: new_goal.title.trim().to_string(),
            ..new_goal
        };
        self.goal_repo
            .insert_new_goal(normalized, self.clock.now())
            .await
    }

    async fn complete_goal(&self, goal_id: String) -> Result<GoalCompletion> {
        let now = self.clock.now();
        let window = WeekWindow::containing(now, &self.settings)?;
        let result = self
            .goal_repo
            .insert_goal_completion(goal_id.clone(), window, now)
            .await;

        if let Err(Error::Goal(GoalError::AlreadyCompletedThisWeek { .. })) = &result {
            warn!("Refused completion for goal {}: weekly target reached", goal_id);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DatabaseError;
    use crate::goals::WeekCompletion;
    use crate::settings::WeekStart;
    use crate::utils::FixedClock;
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    // ============== Mock Repository ==============

    #[derive(Default)]
    struct MockGoalRepository {
        goals: Mutex<Vec<Goal>>,
        completions: Mutex<Vec<GoalCompletion>>,
        seen_windows: Mutex<Vec<WeekWindow>>,
    }

    impl MockGoalRepository {
        fn with_goal(self, id: &str, frequency: i32, created_at: &str) -> Self {
            self.goals.lock().unwrap().push(Goal {
                id: id.to_string(),
                title: format!("Goal {}", id),
                desired_weekly_frequency: frequency,
                created_at: utc(created_at),
            });
            self
        }

        fn with_completion(self, goal_id: &str, at: &str) -> Self {
            let id = format!("c{}", self.completions.lock().unwrap().len() + 1);
            self.completions.lock().unwrap().push(GoalCompletion {
                id,
                goal_id: goal_id.to_string(),
                created_at: utc(at),
            });
            self
        }

        fn count_in_window(&self, goal_id: &str, window: &WeekWindow) -> i64 {
            self.completions
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.goal_id == goal_id && window.contains(c.created_at))
                .count() as i64
        }
    }

    #[async_trait]
    impl GoalRepositoryTrait for MockGoalRepository {
        fn load_goals(&self) -> Result<Vec<Goal>> {
            Ok(self.goals.lock().unwrap().clone())
        }

        fn load_week_pending_goals(&self, window: &WeekWindow) -> Result<Vec<PendingGoal>> {
            self.seen_windows.lock().unwrap().push(*window);
            let goals = self.goals.lock().unwrap().clone();
            Ok(goals
                .into_iter()
                .filter(|g| g.created_at <= window.end)
                .map(|g| PendingGoal {
                    completion_count: self.count_in_window(&g.id, window),
                    id: g.id,
                    title: g.title,
                    desired_weekly_frequency: g.desired_weekly_frequency,
                })
                .collect())
        }

        fn load_week_summary(&self, window: &WeekWindow) -> Result<WeekSummary> {
            self.seen_windows.lock().unwrap().push(*window);
            let goals = self.goals.lock().unwrap().clone();
            let total = goals
                .iter()
                .filter(|g| g.created_at <= window.end)
                .map(|g| i64::from(g.desired_weekly_frequency))
                .sum();
            let completions: Vec<WeekCompletion> = self
                .completions
                .lock()
                .unwrap()
                .iter()
                .filter(|c| window.contains(c.created_at))
                .filter_map(|c| {
                    goals.iter().find(|g| g.id == c.goal_id).map(|g| WeekCompletion {
                        id: c.id.clone(),
                        title: g.title.clone(),
                        completed_at: c.created_at,
                    })
                })
                .collect();
            Ok(WeekSummary::from_completions(
                completions.len() as i64,
                total,
                completions,
                window,
            ))
        }

        async fn insert_new_goal(
            &self,
            new_goal: NewGoal,
            created_at: DateTime<Utc>,
        ) -> Result<Goal> {
            let goal = Goal {
                id: format!("g{}", self.goals.lock().unwrap().len() + 1),
                title: new_goal.title,
                desired_weekly_frequency: new_goal.desired_weekly_frequency,
                created_at,
            };
            self.goals.lock().unwrap().push(goal.clone());
            Ok(goal)
        }

        async fn insert_goal_completion(
            &self,
            goal_id: String,
            window: WeekWindow,
            completed_at: DateTime<Utc>,
        ) -> Result<GoalCompletion> {
            let goal = self
                .goals
                .lock()
                .unwrap()
                .iter()
                .find(|g| g.id == goal_id)
                .cloned()
                .ok_or_else(|| Error::Database(DatabaseError::NotFound(goal_id.clone())))?;

            if self.count_in_window(&goal_id, &window) >= i64::from(goal.desired_weekly_frequency)
            {
                return Err(GoalError::AlreadyCompletedThisWeek { goal_id }.into());
            }

            let completion = GoalCompletion {
                id: format!("c{}", self.completions.lock().unwrap().len() + 1),
                goal_id,
                created_at: completed_at,
            };
            self.completions.lock().unwrap().push(completion.clone());
            Ok(completion)
        }
    }

    fn service_at(repo: Arc<MockGoalRepository>, now: &str) -> (GoalService, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(utc(now)));
        let service = GoalService::new(repo, clock.clone(), WeekSettings::default());
        (service, clock)
    }

    // ============== Tests ==============

    #[test]
    fn test_reads_use_week_of_clock() {
        let repo = Arc::new(MockGoalRepository::default());
        let (service, _clock) = service_at(repo.clone(), "2026-10-14T12:00:00Z");

        service.get_week_pending_goals().unwrap();
        service.get_week_summary().unwrap();

        let windows = repo.seen_windows.lock().unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0], windows[1]);
        assert_eq!(windows[0].start, utc("2026-10-11T00:00:00Z"));
        assert_eq!(windows[0].end, utc("2026-10-17T23:59:59.999Z"));
    }

    #[test]
    fn test_settings_change_window() {
        let repo = Arc::new(MockGoalRepository::default());
        let clock = Arc::new(FixedClock::new(utc("2026-10-11T12:00:00Z")));
        let service = GoalService::new(
            repo,
            clock,
            WeekSettings::new(WeekStart::Monday, chrono_tz::UTC),
        );

        let window = service.current_week().unwrap();
        assert_eq!(window.start, utc("2026-10-05T00:00:00Z"));
    }

    #[test]
    fn test_pending_goals_and_summary_agree() {
        let repo = Arc::new(
            MockGoalRepository::default()
                .with_goal("g1", 3, "2026-10-12T09:00:00Z")
                .with_goal("g2", 2, "2026-09-01T09:00:00Z")
                .with_goal("future", 5, "2026-10-20T09:00:00Z")
                .with_completion("g1", "2026-10-13T08:00:00Z")
                .with_completion("g1", "2026-10-15T08:00:00Z")
                .with_completion("g2", "2026-10-09T08:00:00Z"),
        );
        let (service, _clock) = service_at(repo, "2026-10-16T12:00:00Z");

        let pending = service.get_week_pending_goals().unwrap();
        let summary = service.get_week_summary().unwrap();

        assert_eq!(pending.len(), 2);
        let sum: i64 = pending.iter().map(|p| p.completion_count).sum();
        assert_eq!(sum, summary.completed);
        assert_eq!(summary.total, 5);
    }

    #[test]
    fn test_get_goals_ignores_week_window() {
        let repo = Arc::new(
            MockGoalRepository::default()
                .with_goal("g1", 3, "2026-09-01T09:00:00Z")
                .with_goal("future", 5, "2026-10-20T09:00:00Z"),
        );
        let (service, _clock) = service_at(repo.clone(), "2026-10-14T12:00:00Z");

        let ids: Vec<String> = service.get_goals().unwrap().into_iter().map(|g| g.id).collect();
        assert_eq!(ids, vec!["g1".to_string(), "future".to_string()]);
        assert!(repo.seen_windows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_goal_validates_and_trims() {
        let repo = Arc::new(MockGoalRepository::default());
        let (service, _clock) = service_at(repo, "2026-10-14T12:00:00Z");

        let err = service.create_goal(NewGoal::new("", 3)).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = service
            .create_goal(NewGoal::new("Read", 9))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let goal = service
            .create_goal(NewGoal::new("  Read  ", 3))
            .await
            .unwrap();
        assert_eq!(goal.title, "Read");
        assert_eq!(goal.created_at, utc("2026-10-14T12:00:00Z"));
    }

    #[tokio::test]
    async fn test_complete_goal_stops_at_weekly_target() {
        let repo = Arc::new(MockGoalRepository::default().with_goal(
            "g1",
            1,
            "2026-10-12T09:00:00Z",
        ));
        let (service, clock) = service_at(repo, "2026-10-14T12:00:00Z");

        service.complete_goal("g1".to_string()).await.unwrap();
        let err = service.complete_goal("g1".to_string()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Goal(GoalError::AlreadyCompletedThisWeek { .. })
        ));

        // Next week the counter starts over
        clock.set(utc("2026-10-19T12:00:00Z"));
        let completion = service.complete_goal("g1".to_string()).await.unwrap();
        assert_eq!(completion.created_at, utc("2026-10-19T12:00:00Z"));
    }

    #[tokio::test]
    async fn test_complete_unknown_goal_propagates_not_found() {
        let repo = Arc::new(MockGoalRepository::default());
        let (service, _clock) = service_at(repo, "2026-10-14T12:00:00Z");

        let err = service
            .complete_goal("missing".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Database(DatabaseError::NotFound(_))));
    }
}
