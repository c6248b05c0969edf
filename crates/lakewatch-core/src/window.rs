use chrono::{DateTime, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LakewatchError, Result};

/// Half-open calendar-month interval `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Instant at which the window opens (UTC midnight).
    pub fn start_instant(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    /// Instant at which the window closes (exclusive).
    pub fn end_instant(&self) -> DateTime<Utc> {
        self.end.and_time(NaiveTime::MIN).and_utc()
    }

    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        *instant >= self.start_instant() && *instant < self.end_instant()
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Advance `date` by `months` calendar months.
///
/// A day-of-month that does not exist in the target month is clamped to
/// that month's last day (Jan 31 + 1 month = Feb 28, or Feb 29 in leap years).
pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| {
            LakewatchError::Config(format!("{date} + {months} months is out of range"))
        })
}

/// Generate the `count + 1` consecutive monthly windows starting at `start`.
///
/// Each boundary is offset from `start` itself, so clamping in a short month
/// never drifts into the following windows.
pub fn generate_windows(start: NaiveDate, count: i64) -> Result<Vec<DateWindow>> {
    if count < 0 {
        return Err(LakewatchError::Config(format!(
            "window count must be >= 0, got {count}"
        )));
    }
    let count = u32::try_from(count)
        .map_err(|_| LakewatchError::Config(format!("window count {count} is too large")))?;

    let mut windows = Vec::new();
    let mut window_start = start;
    for k in 1..=count.saturating_add(1) {
        let window_end = add_months(start, k)?;
        windows.push(DateWindow {
            start: window_start,
            end: window_end,
        });
        window_start = window_end;
    }
    Ok(windows)
}
