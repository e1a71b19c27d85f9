//! Calendar windows for aggregating operations by period

use chrono::{
    DateTime, Datelike, Days, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime,
    Offset, Utc,
};
use pennywise_config::{Period, StatsConfig, WeekStart};
use serde::{Deserialize, Serialize};

use crate::models::Operation;

/// Inclusive span of local wall-clock time
///
/// `end` is one nanosecond before the next window starts, so
/// `start <= t <= end` never double counts at a boundary. A window reaching
/// past the last representable date ends at [`NaiveDateTime::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Window {
    /// Window covering whole days from `first` up to (excluding) `next`
    ///
    /// `None` for `next` leaves the end open.
    pub fn days(first: NaiveDate, next: Option<NaiveDate>) -> Self {
        let end = next
            .and_then(|next| {
                next.and_time(NaiveTime::MIN)
                    .checked_sub_signed(Duration::nanoseconds(1))
            })
            .unwrap_or(NaiveDateTime::MAX);
        Self {
            start: first.and_time(NaiveTime::MIN),
            end,
        }
    }

    pub fn day(date: NaiveDate) -> Self {
        Self::days(date, date.succ_opt())
    }

    /// Calendar month containing `date`
    pub fn month(date: NaiveDate) -> Self {
        let first = date.with_day(1).unwrap_or(date);
        Self::days(first, first.checked_add_months(Months::new(1)))
    }

    /// Calendar year containing `date`
    pub fn year(date: NaiveDate) -> Self {
        let first = NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date);
        Self::days(first, NaiveDate::from_ymd_opt(date.year() + 1, 1, 1))
    }

    /// Seven-day week containing `date`
    pub fn week(date: NaiveDate, week_start: WeekStart) -> Self {
        let back = match week_start {
            WeekStart::Sunday => date.weekday().num_days_from_sunday(),
            WeekStart::Monday => date.weekday().num_days_from_monday(),
        };
        let first = date
            .checked_sub_days(Days::new(u64::from(back)))
            .unwrap_or(NaiveDate::MIN);
        Self::days(first, first.checked_add_days(Days::new(7)))
    }

    pub fn contains(&self, local: NaiveDateTime) -> bool {
        self.start <= local && local <= self.end
    }
}

/// Maps instants onto the user's calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
    week_start: WeekStart,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl Calendar {
    /// UTC calendar with weeks starting on Sunday
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
            week_start: WeekStart::Sunday,
        }
    }

    pub fn new(offset: FixedOffset, week_start: WeekStart) -> Self {
        Self { offset, week_start }
    }

    /// Build from the stats section; an out-of-range offset falls back to UTC
    pub fn from_config(stats: &StatsConfig) -> Self {
        let offset = FixedOffset::east_opt(stats.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix());
        Self::new(offset, stats.week_start)
    }

    pub fn with_week_start(mut self, week_start: WeekStart) -> Self {
        self.week_start = week_start;
        self
    }

    /// Wall-clock time of `instant` in this calendar
    ///
    /// Saturates at the representable range instead of overflowing.
    pub fn local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        let shift = i64::from(self.offset.local_minus_utc());
        instant
            .naive_utc()
            .checked_add_signed(Duration::seconds(shift))
            .unwrap_or(if shift > 0 {
                NaiveDateTime::MAX
            } else {
                NaiveDateTime::MIN
            })
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.local(now).date()
    }

    /// Window of the current `period` at `now`
    pub fn period_window(&self, period: Period, now: DateTime<Utc>) -> Window {
        let today = self.today(now);
        match period {
            Period::Daily => Window::day(today),
            Period::Weekly => Window::week(today, self.week_start),
            Period::Monthly => Window::month(today),
            Period::Annual => Window::year(today),
        }
    }

    /// The last `count` days, oldest first, ending today
    ///
    /// Days before [`NaiveDate::MIN`] do not exist and are left out.
    pub fn days_ending(&self, now: DateTime<Utc>, count: usize) -> Vec<NaiveDate> {
        let today = self.today(now);
        let available = today.signed_duration_since(NaiveDate::MIN).num_days() + 1;
        let count = count.min(usize::try_from(available).unwrap_or(usize::MAX));
        (0..count)
            .rev()
            .filter_map(|back| today.checked_sub_days(Days::new(back as u64)))
            .collect()
    }

    /// First days of the last `count` months, oldest first, ending with the current month
    ///
    /// Months before [`NaiveDate::MIN`] are left out.
    pub fn months_ending(&self, now: DateTime<Utc>, count: usize) -> Vec<NaiveDate> {
        let today = self.today(now);
        let current = today.with_day(1).unwrap_or(today);
        let available = i64::from(current.year() - NaiveDate::MIN.year()) * 12
            + i64::from(current.month0())
            - i64::from(NaiveDate::MIN.month0())
            + 1;
        let count = count.min(usize::try_from(available).unwrap_or(usize::MAX));
        (0..count)
            .rev()
            .filter_map(|back| {
                let back = u32::try_from(back).ok()?;
                current.checked_sub_months(Months::new(back))
            })
            .collect()
    }

    /// Whether `instant` falls on or after `from` and on or before `to`
    ///
    /// Both bounds are whole calendar days; a missing bound is open.
    pub fn within_dates(
        &self,
        instant: DateTime<Utc>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> bool {
        let local = self.local(instant);
        let after_start = from.map_or(true, |f| local >= f.and_time(NaiveTime::MIN));
        let before_end = to.map_or(true, |t| local <= Window::day(t).end);
        after_start && before_end
    }
}

/// Time filtering trait
pub trait TimeFilter {
    /// Whether the item falls inside `window` on `calendar`
    fn within(&self, calendar: &Calendar, window: &Window) -> bool;
}

impl TimeFilter for Operation {
    fn within(&self, calendar: &Calendar, window: &Window) -> bool {
        window.contains(calendar.local(self.timestamp))
    }
}
