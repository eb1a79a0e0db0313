use std::sync::RwLock;

use chrono::{
    DateTime, Datelike, Days, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta,
    TimeZone, Utc,
};
use chrono_tz::Tz;

use crate::errors::{Error, Result};
use crate::settings::WeekSettings;

/// Upper bound when walking out of a DST gap, in minutes.
const MAX_GAP_MINUTES: u32 = 180;

/// Source of "now". Services take an `Arc<dyn Clock>` so week boundaries can
/// be computed against a pinned instant in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to an instant; can be moved with `set`.
#[derive(Debug)]
pub struct FixedClock {
    instant: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: RwLock::new(instant),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        match self.instant.write() {
            Ok(mut guard) => *guard = instant,
            Err(poisoned) => *poisoned.into_inner() = instant,
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.instant.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Converts a UTC instant to the calendar date it falls on in `tz`.
pub fn local_date_from_utc(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

pub fn get_days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }
    let mut days = Vec::new();
    let mut current = start;
    while current <= end {
        days.push(current);
        if let Some(next) = current.succ_opt() {
            current = next;
        } else {
            break;
        }
    }
    days
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Start,
    End,
}

/// Maps a local wall-clock time to UTC. Inside a DST gap the start edge moves
/// forward to the first valid minute and the end edge moves backward; on a
/// fold the start edge takes the earlier instant and the end edge the later.
fn resolve_local(tz: Tz, naive: NaiveDateTime, edge: Edge) -> Result<DateTime<Utc>> {
    let step = match edge {
        Edge::Start => TimeDelta::minutes(1),
        Edge::End => TimeDelta::minutes(-1),
    };

    let mut candidate = naive;
    for _ in 0..=MAX_GAP_MINUTES {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(dt) => return Ok(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, latest) => {
                let dt = match edge {
                    Edge::Start => earliest,
                    Edge::End => latest,
                };
                return Ok(dt.with_timezone(&Utc));
            }
            LocalResult::None => candidate += step,
        }
    }

    Err(Error::Unexpected(format!(
        "No valid local time near {} in {}",
        naive, tz
    )))
}

/// The `[first_day_of_week, last_day_of_week]` interval that scopes "this week".
///
/// `start` is 00:00:00.000 on the first day and `end` is 23:59:59.999 on the
/// last day, both in the configured timezone and stored as UTC instants. Both
/// bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    timezone: Tz,
}

impl WeekWindow {
    /// Returns the week that contains `instant` under `settings`.
    pub fn containing(instant: DateTime<Utc>, settings: &WeekSettings) -> Result<Self> {
        let tz = settings.timezone;
        let today = local_date_from_utc(instant, tz);

        let week_start = settings.week_start.weekday().num_days_from_sunday();
        let offset = (7 + today.weekday().num_days_from_sunday() - week_start) % 7;

        let out_of_range = || Error::Unexpected(format!("Week of {} is out of range", today));
        let first_day = today
            .checked_sub_days(Days::new(u64::from(offset)))
            .ok_or_else(out_of_range)?;
        let last_day = first_day
            .checked_add_days(Days::new(6))
            .ok_or_else(out_of_range)?;

        let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).ok_or_else(out_of_range)?;
        let start = resolve_local(tz, first_day.and_time(NaiveTime::MIN), Edge::Start)?;
        let end = resolve_local(tz, last_day.and_time(end_of_day), Edge::End)?;

        log::debug!(
            "Week window for {}: {} ({}) .. {} ({})",
            instant,
            first_day,
            start,
            last_day,
            end
        );

        Ok(Self {
            first_day,
            last_day,
            start,
            end,
            timezone: tz,
        })
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Calendar date of `instant` in the window's timezone.
    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        local_date_from_utc(instant, self.timezone)
    }

    /// The seven calendar days of the window.
    pub fn days(&self) -> Vec<NaiveDate> {
        get_days_between(self.first_day, self.last_day)
    }

    /// Lower bound as a naive UTC timestamp, for binding against storage.
    pub fn start_naive(&self) -> NaiveDateTime {
        self.start.naive_utc()
    }

    /// Upper bound as a naive UTC timestamp, for binding against storage.
    pub fn end_naive(&self) -> NaiveDateTime {
        self.end.naive_utc()
    }
}
