//! Temporal allocation: one date and time slot per module.
//!
//! # Algorithm
//!
//! 1. Group modules by program; order each program's modules by id.
//! 2. Derive a starting day offset (`program_id mod day_spread`) and a base
//!    slot (`program_id mod slot_count`) from the program id. This spreads
//!    programs over the first days and over the daily slots without any
//!    central coordination.
//! 3. The i-th module of a program sits on exam day `start_offset + i`, so
//!    no two modules of one program share a date. Students of a program
//!    share a cohort and enroll in many of its modules; keeping their exams
//!    on distinct days is the main defence against student conflicts.
//! 4. The slot shifts by one position after every `rotation_period`
//!    modules of the same program.
//!
//! The non-exam weekday is skipped both when normalizing the start date
//! and when advancing by offset (see [`ExamCalendar`]).
//!
//! # Complexity
//! O(m log m) for m modules, plus the day walk per module.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::models::{ExamCalendar, Module, ModuleId, NewExam, ProgramId};

/// An exam placed in time, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedExam {
    pub module_id: ModuleId,
    pub program_id: ProgramId,
    pub starts_at: NaiveDateTime,
    pub duration_minutes: u32,
}

/// Assigns every module an exam date-time.
#[derive(Debug, Clone)]
pub struct TemporalAllocator {
    calendar: ExamCalendar,
    day_spread: u32,
    rotation_period: u32,
    duration_minutes: u32,
}

impl PlannedExam {
    /// Write request for the store.
    pub fn to_new_exam(&self) -> NewExam {
        NewExam {
            module_id: self.module_id,
            starts_at: self.starts_at,
            duration_minutes: self.duration_minutes,
        }
    }

    #[inline]
    pub fn date(&self) -> NaiveDate {
        self.starts_at.date()
    }
}

impl TemporalAllocator {
    /// Creates an allocator with the default spreading parameters.
    pub fn new(calendar: ExamCalendar) -> Self {
        let defaults = EngineConfig::default();
        Self {
            calendar,
            day_spread: defaults.program_day_spread,
            rotation_period: defaults.slot_rotation_period,
            duration_minutes: defaults.default_duration_minutes,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(ExamCalendar::from_config(config))
            .with_day_spread(config.program_day_spread)
            .with_rotation_period(config.slot_rotation_period)
            .with_duration(config.default_duration_minutes)
    }

    pub fn with_day_spread(mut self, day_spread: u32) -> Self {
        self.day_spread = day_spread.max(1);
        self
    }

    pub fn with_rotation_period(mut self, rotation_period: u32) -> Self {
        self.rotation_period = rotation_period.max(1);
        self
    }

    pub fn with_duration(mut self, duration_minutes: u32) -> Self {
        self.duration_minutes = duration_minutes;
        self
    }

    pub fn calendar(&self) -> &ExamCalendar {
        &self.calendar
    }

    /// Exam-day offset of a program's first module.
    #[inline]
    pub fn program_day_offset(&self, program_id: ProgramId) -> u32 {
        program_id % self.day_spread
    }

    /// Slot index of a program's first module.
    #[inline]
    pub fn program_slot_base(&self, program_id: ProgramId) -> usize {
        program_id as usize % self.calendar.slot_count().max(1)
    }

    /// Places every module's exam, starting from `start_date`.
    ///
    /// Output is ordered by program id, then module id.
    pub fn allocate(&self, modules: &[Module], start_date: NaiveDate) -> Vec<PlannedExam> {
        let mut by_program: BTreeMap<ProgramId, Vec<&Module>> = BTreeMap::new();
        for module in modules {
            by_program.entry(module.program_id).or_default().push(module);
        }

        let mut planned = Vec::with_capacity(modules.len());
        for (program_id, mut program_modules) in by_program {
            program_modules.sort_by_key(|m| m.id);

            let start_offset = self.program_day_offset(program_id);
            let slot_base = self.program_slot_base(program_id);

            for (i, module) in program_modules.iter().enumerate() {
                let date = self.calendar.date_after(start_date, start_offset + i as u32);
                let slot = slot_base + i / self.rotation_period as usize;
                planned.push(PlannedExam {
                    module_id: module.id,
                    program_id,
                    starts_at: self.calendar.at_slot(date, slot),
                    duration_minutes: self.duration_minutes,
                });
            }
        }
        planned
    }
}

impl Default for TemporalAllocator {
    fn default() -> Self {
        Self::new(ExamCalendar::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike, Weekday};
    use std::collections::HashSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_friday_start_moves_to_saturday() {
        // Program 6 → day offset 0, slot base 2
        let modules = vec![Module::new(1, 6)];
        let planned = TemporalAllocator::default().allocate(&modules, date(2025, 1, 10));
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].date(), date(2025, 1, 11));
        assert_eq!(planned[0].starts_at.hour(), 13);
    }

    #[test]
    fn test_program_offsets() {
        let alloc = TemporalAllocator::default();
        assert_eq!(alloc.program_day_offset(7), 1);
        assert_eq!(alloc.program_slot_base(7), 3);
        assert_eq!(alloc.program_day_offset(12), 0);
        assert_eq!(alloc.program_slot_base(12), 0);
    }

    #[test]
    fn test_same_program_modules_on_distinct_dates() {
        let modules: Vec<Module> = (1..=15).map(|id| Module::new(id, 3)).collect();
        let planned = TemporalAllocator::default().allocate(&modules, date(2025, 1, 6));

        let dates: HashSet<NaiveDate> = planned.iter().map(|p| p.date()).collect();
        assert_eq!(dates.len(), 15);
        assert!(planned
            .iter()
            .all(|p| p.date().weekday() != Weekday::Fri));
    }

    #[test]
    fn test_modules_ordered_by_id_within_program() {
        let modules = vec![Module::new(30, 0), Module::new(10, 0), Module::new(20, 0)];
        let planned = TemporalAllocator::default().allocate(&modules, date(2025, 1, 6));
        let order: Vec<ModuleId> = planned.iter().map(|p| p.module_id).collect();
        assert_eq!(order, vec![10, 20, 30]);
        assert!(planned[0].starts_at < planned[1].starts_at);
        assert!(planned[1].starts_at < planned[2].starts_at);
    }

    #[test]
    fn test_slot_rotates_after_period() {
        // Program 1 → slot base 1 (10:00); module index 7 moves to 13:00
        let modules: Vec<Module> = (1..=8).map(|id| Module::new(id, 1)).collect();
        let planned = TemporalAllocator::default().allocate(&modules, date(2025, 1, 6));
        assert!(planned[..7].iter().all(|p| p.starts_at.hour() == 10));
        assert_eq!(planned[7].starts_at.hour(), 13);
    }

    #[test]
    fn test_custom_config() {
        let config = EngineConfig {
            non_exam_weekday: Weekday::Sun,
            time_slot_hours: vec![9],
            program_day_spread: 1,
            default_duration_minutes: 90,
            ..Default::default()
        };
        let modules = vec![Module::new(1, 5), Module::new(2, 5)];
        // 2025-01-12 is a Sunday
        let planned = TemporalAllocator::from_config(&config).allocate(&modules, date(2025, 1, 12));
        assert_eq!(planned[0].date(), date(2025, 1, 13));
        assert_eq!(planned[1].date(), date(2025, 1, 14));
        assert!(planned.iter().all(|p| p.starts_at.hour() == 9));
        assert!(planned.iter().all(|p| p.duration_minutes == 90));
    }

    #[test]
    fn test_no_modules() {
        let planned = TemporalAllocator::default().allocate(&[], date(2025, 1, 6));
        assert!(planned.is_empty());
    }

    #[test]
    fn test_to_new_exam() {
        let modules = vec![Module::new(4, 2)];
        let planned = TemporalAllocator::default().allocate(&modules, date(2025, 1, 6));
        let new = planned[0].to_new_exam();
        assert_eq!(new.module_id, 4);
        assert_eq!(new.starts_at, planned[0].starts_at);
        assert_eq!(new.duration_minutes, 120);
    }
}
