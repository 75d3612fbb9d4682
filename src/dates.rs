//! Date parsing and interval helpers.
//!
//! Every date in this crate travels as a string and is parsed on demand into
//! epoch milliseconds (UTC). Parsing is permissive and total: anything that
//! cannot be read becomes `None` and the caller treats it as "no date".

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse a calendar date or timestamp into epoch milliseconds.
///
/// Accepts RFC 3339 timestamps, `YYYY-MM-DD HH:MM:SS[.f][+HH[:MM]]` as
/// emitted by Postgres, naive timestamps (read as UTC) and bare `YYYY-MM-DD`
/// dates (UTC midnight).
pub fn parse_millis(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.timestamp_millis());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_millis())
}

/// Closed interval `[from, to]` in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: i64,
    pub to: i64,
}

impl DateRange {
    /// Build a range from two optional bounds. A single bound is used for
    /// both ends; no bound at all means no range.
    pub fn from_bounds(start: Option<&str>, end: Option<&str>) -> Option<DateRange> {
        let start = start.and_then(parse_millis);
        let end = end.and_then(parse_millis);
        match (start, end) {
            (None, None) => None,
            (Some(from), None) => Some(DateRange { from, to: from }),
            (None, Some(to)) => Some(DateRange { from: to, to }),
            (Some(from), Some(to)) => Some(DateRange { from, to }),
        }
    }

    /// Inclusive overlap test.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.from <= other.to && self.to >= other.from
    }
}

/// Deadline summary shown next to a task, relative to `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueIndicator {
    NoDueDate,
    Overdue,
    DueToday,
    DueIn(i64),
}

/// The current UTC day. Due days are UTC days, so "today" must be one too.
pub fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

impl DueIndicator {
    /// `None` when a due date is present but unreadable.
    pub fn for_due(due: Option<&str>, today: NaiveDate) -> Option<DueIndicator> {
        let Some(raw) = due.filter(|d| !d.trim().is_empty()) else {
            return Some(DueIndicator::NoDueDate);
        };
        let due_day = DateTime::from_timestamp_millis(parse_millis(raw)?)?.date_naive();
        let days = (due_day - today).num_days();
        Some(match days {
            d if d < 0 => DueIndicator::Overdue,
            0 => DueIndicator::DueToday,
            d => DueIndicator::DueIn(d),
        })
    }

    pub fn label(&self) -> String {
        match self {
            DueIndicator::NoDueDate => "No due date".into(),
            DueIndicator::Overdue => "Overdue".into(),
            DueIndicator::DueToday => "Due today".into(),
            DueIndicator::DueIn(1) => "Due in 1 day".into(),
            DueIndicator::DueIn(d) => format!("Due in {d} days"),
        }
    }
}
