pub mod time_utils;

pub use time_utils::{get_days_between, local_date_from_utc, Clock, FixedClock, SystemClock, WeekWindow};
