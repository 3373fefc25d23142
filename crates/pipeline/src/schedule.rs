//! Weekly posting cadence and forward projection of the rotation pointer.
//!
//! [`project`] is the pure half of the pipeline preview: it pairs each of the
//! next `weeks` posting slots with the rotation pointer that would be current
//! at that slot, advancing a local copy of the pointer with the same
//! transition as a real publish. The persisted state is never touched.
//!
//! The returned [`SlotProjection`] is a lazy, finite iterator. It is `Clone`,
//! so a projection can be replayed from the same starting point.

use chrono::{
    DateTime, Datelike, Days, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Utc, Weekday,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::RotationPointer;

/// Longest preview a single run projects: ten years of weekly slots.
pub const MAX_PREVIEW_WEEKS: u32 = 520;

/// Errors produced while building a [`PostingSchedule`] from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("unknown posting day '{0}'")]
    InvalidWeekday(String),

    #[error("posting time '{0}' is not in HH:MM form")]
    InvalidTime(String),

    #[error("unknown timezone '{0}'")]
    InvalidTimezone(String),
}

/// A fixed weekly slot: one weekday at one local time in one timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingSchedule {
    pub weekday: Weekday,
    pub time: NaiveTime,
    pub timezone: Tz,
}

impl Default for PostingSchedule {
    /// Thursdays at 11:30 New York time.
    fn default() -> Self {
        Self {
            weekday: Weekday::Thu,
            time: NaiveTime::from_hms_opt(11, 30, 0).unwrap_or_default(),
            timezone: chrono_tz::America::New_York,
        }
    }
}

impl PostingSchedule {
    pub fn new(weekday: Weekday, time: NaiveTime, timezone: Tz) -> Self {
        Self {
            weekday,
            time,
            timezone,
        }
    }

    /// Parses a day name (`"Thursday"`, `"thu"`), an `HH:MM` time and an IANA
    /// timezone name.
    pub fn parse(day: &str, time: &str, timezone: &str) -> Result<Self, ScheduleError> {
        let weekday = day
            .trim()
            .parse::<Weekday>()
            .map_err(|_| ScheduleError::InvalidWeekday(day.to_string()))?;
        let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
            .map_err(|_| ScheduleError::InvalidTime(time.to_string()))?;
        let timezone = timezone
            .trim()
            .parse::<Tz>()
            .map_err(|_| ScheduleError::InvalidTimezone(timezone.to_string()))?;
        Ok(Self::new(weekday, time, timezone))
    }

    /// Local date of the first slot strictly after `now`.
    ///
    /// When `now` falls on the posting weekday at or after the posting time,
    /// the slot rolls to the following week.
    pub fn first_slot_date(&self, now: DateTime<Utc>) -> NaiveDate {
        let local = now.with_timezone(&self.timezone);
        let target = self.weekday.num_days_from_monday();
        let today = local.weekday().num_days_from_monday();
        let mut days_ahead = (target + 7 - today) % 7;
        if days_ahead == 0 && local.time() >= self.time {
            days_ahead = 7;
        }
        local.date_naive() + Days::new(u64::from(days_ahead))
    }

    /// The slot `week` weeks after `first`, at the posting time in local wall-clock terms.
    pub fn slot(&self, first: NaiveDate, week: u32) -> DateTime<Tz> {
        let date = first + Days::new(7 * u64::from(week));
        self.localize(date.and_time(self.time))
    }

    // A wall-clock time skipped by a DST jump is moved forward an hour.
    fn localize(&self, naive: NaiveDateTime) -> DateTime<Tz> {
        self.timezone
            .from_local_datetime(&naive)
            .earliest()
            .or_else(|| {
                self.timezone
                    .from_local_datetime(&(naive + Duration::hours(1)))
                    .earliest()
            })
            .unwrap_or_else(|| self.timezone.from_utc_datetime(&naive))
    }
}

impl std::fmt::Display for PostingSchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "every {} at {} {}",
            self.weekday,
            self.time.format("%H:%M"),
            self.timezone
        )
    }
}

/// One future posting slot and the rotation pointer that would be current then.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedSlot {
    /// 1-based week index within the projection.
    pub week: u32,
    pub scheduled_for: DateTime<FixedOffset>,
    pub pointer: RotationPointer,
}

/// Iterator over the next `weeks` slots. See [`project`].
#[derive(Debug, Clone)]
pub struct SlotProjection {
    schedule: PostingSchedule,
    first_date: NaiveDate,
    pointer: RotationPointer,
    article_count: u32,
    next_week: u32,
    weeks: u32,
}

impl Iterator for SlotProjection {
    type Item = PlannedSlot;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_week >= self.weeks {
            return None;
        }
        let slot = PlannedSlot {
            week: self.next_week + 1,
            scheduled_for: self
                .schedule
                .slot(self.first_date, self.next_week)
                .fixed_offset(),
            pointer: self.pointer,
        };
        self.pointer = self.pointer.advance(self.article_count);
        self.next_week += 1;
        Some(slot)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.weeks - self.next_week) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for SlotProjection {}

/// Projects `start` forward over the next `weeks` posting slots after `now`.
pub fn project(
    schedule: PostingSchedule,
    now: DateTime<Utc>,
    start: RotationPointer,
    article_count: u32,
    weeks: u32,
) -> SlotProjection {
    SlotProjection {
        first_date: schedule.first_slot_date(now),
        schedule,
        pointer: start,
        article_count,
        next_week: 0,
        weeks,
    }
}
