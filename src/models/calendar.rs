//! Exam calendar.
//!
//! Maps day offsets and slot indices onto concrete date-times.
//!
//! # Day Model
//! Exam days are every calendar day except one designated non-exam
//! weekday. Offsets count exam days only: offset 0 is the first exam day
//! on or after the start date, offset 1 the next exam day, and so on.
//! The start date is only ever moved forward, never backward.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

/// Exam days and daily time slots for one institution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamCalendar {
    /// Weekday on which no exam is held.
    pub non_exam_weekday: Weekday,
    /// Daily exam start hours, in slot order.
    pub slot_hours: Vec<u32>,
}

impl ExamCalendar {
    /// Creates a calendar. Hours are taken modulo 24.
    pub fn new(non_exam_weekday: Weekday, slot_hours: Vec<u32>) -> Self {
        Self {
            non_exam_weekday,
            slot_hours: slot_hours.into_iter().map(|h| h % 24).collect(),
        }
    }

    /// Builds the calendar described by an engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.non_exam_weekday, config.time_slot_hours.clone())
    }

    /// Whether exams may be held on `date`.
    #[inline]
    pub fn is_exam_day(&self, date: NaiveDate) -> bool {
        date.weekday() != self.non_exam_weekday
    }

    /// First exam day on or after `date`.
    pub fn normalize(&self, date: NaiveDate) -> NaiveDate {
        let mut current = date;
        while !self.is_exam_day(current) {
            current += Duration::days(1);
        }
        current
    }

    /// The exam day `offset` exam days after the normalized `start`.
    pub fn date_after(&self, start: NaiveDate, offset: u32) -> NaiveDate {
        let mut current = self.normalize(start);
        let mut added = 0;
        while added < offset {
            current += Duration::days(1);
            if self.is_exam_day(current) {
                added += 1;
            }
        }
        current
    }

    /// Number of daily slots.
    pub fn slot_count(&self) -> usize {
        self.slot_hours.len()
    }

    /// Start hour of the slot at `index` (wrapping). Falls back to midnight
    /// for a calendar without slots.
    pub fn slot_hour(&self, index: usize) -> u32 {
        if self.slot_hours.is_empty() {
            return 0;
        }
        self.slot_hours[index % self.slot_hours.len()]
    }

    /// Date-time of slot `index` on `date`.
    pub fn at_slot(&self, date: NaiveDate, index: usize) -> NaiveDateTime {
        date.and_time(NaiveTime::default()) + Duration::hours(i64::from(self.slot_hour(index)))
    }
}

impl Default for ExamCalendar {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
