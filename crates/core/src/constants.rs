/// Lowest accepted weekly target for a goal
pub const MIN_DESIRED_WEEKLY_FREQUENCY: i32 = 1;

/// Highest accepted weekly target for a goal (once per day)
pub const MAX_DESIRED_WEEKLY_FREQUENCY: i32 = 7;

/// Environment variable selecting the first day of the week
pub const WEEK_START_ENV: &str = "HABITUAL_WEEK_START";

/// Environment variable naming the IANA timezone used for week boundaries
pub const TIMEZONE_ENV: &str = "HABITUAL_TIMEZONE";
