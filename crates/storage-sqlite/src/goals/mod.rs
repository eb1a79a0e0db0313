//! SQLite storage implementation for goals.

mod model;
mod repository;

pub use model::{GoalCompletionDB, GoalDB, WeekCompletionDB};
pub use repository::GoalRepository;
