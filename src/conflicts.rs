//! Post-hoc conflict detection over a persisted schedule.
//!
//! A pure read-side scan: the detector never changes the schedule and
//! never tries to repair it. Four independent classes are reported:
//!
//! | Class | Condition |
//! |-------|-----------|
//! | Student | A student sits in more than one block on one calendar date |
//! | Professor | A professor supervises more blocks on one date than the daily cap |
//! | Capacity | A block's roster exceeds its room's capacity |
//! | Staffing | A block has fewer supervisors than its room type requires |
//!
//! Every list is sorted by its natural key, so scanning the same state
//! twice yields identical reports.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, StaffingPolicy};
use crate::models::{BlockId, ProfessorId, Room, RoomId, ScheduleSnapshot, StudentId};

/// A student with several sittings on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentConflict {
    pub student_id: StudentId,
    pub date: NaiveDate,
    /// Number of blocks the student sits in that day.
    pub exam_count: usize,
}

/// A professor supervising beyond the daily cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfessorConflict {
    pub professor_id: ProfessorId,
    pub date: NaiveDate,
    pub supervision_count: usize,
}

/// A block seating more students than its room holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityConflict {
    pub block_id: BlockId,
    pub room_id: RoomId,
    /// Date the block is held on.
    pub date: NaiveDate,
    pub capacity: u32,
    pub student_count: usize,
}

/// A block with fewer supervisors than required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffingConflict {
    pub block_id: BlockId,
    pub room_id: RoomId,
    pub date: NaiveDate,
    pub required: u32,
    pub assigned: usize,
}

/// All conflicts found in one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    pub students: Vec<StudentConflict>,
    pub professors: Vec<ProfessorConflict>,
    pub capacity: Vec<CapacityConflict>,
    pub staffing: Vec<StaffingConflict>,
}

impl ConflictReport {
    /// Total number of conflicts across every class.
    pub fn total(&self) -> usize {
        self.students.len() + self.professors.len() + self.capacity.len() + self.staffing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Scans a persisted schedule for conflicts.
#[derive(Debug, Clone)]
pub struct ConflictDetector {
    daily_cap: u32,
    staffing: StaffingPolicy,
}

impl ConflictDetector {
    pub fn new(daily_cap: u32, staffing: StaffingPolicy) -> Self {
        Self {
            daily_cap,
            staffing,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.max_supervisions_per_day, config.staffing)
    }

    /// Runs every check against `snapshot`. Blocks whose room is not in
    /// `rooms`, or whose exam is missing, are skipped by the capacity and
    /// staffing checks.
    pub fn detect(&self, snapshot: &ScheduleSnapshot, rooms: &[Room]) -> ConflictReport {
        let starts = snapshot.block_start_times();
        let rooms: HashMap<RoomId, &Room> = rooms.iter().map(|r| (r.id, r)).collect();

        ConflictReport {
            students: student_conflicts(snapshot, &starts),
            professors: self.professor_conflicts(snapshot, &starts),
            capacity: capacity_conflicts(snapshot, &starts, &rooms),
            staffing: self.staffing_conflicts(snapshot, &starts, &rooms),
        }
    }

    fn professor_conflicts(
        &self,
        snapshot: &ScheduleSnapshot,
        starts: &HashMap<BlockId, NaiveDateTime>,
    ) -> Vec<ProfessorConflict> {
        let mut per_day: BTreeMap<(ProfessorId, NaiveDate), usize> = BTreeMap::new();
        for s in &snapshot.supervisions {
            if let Some(at) = starts.get(&s.block_id) {
                *per_day.entry((s.professor_id, at.date())).or_insert(0) += 1;
            }
        }
        per_day
            .into_iter()
            .filter(|&(_, count)| count > self.daily_cap as usize)
            .map(|((professor_id, date), supervision_count)| ProfessorConflict {
                professor_id,
                date,
                supervision_count,
            })
            .collect()
    }

    fn staffing_conflicts(
        &self,
        snapshot: &ScheduleSnapshot,
        starts: &HashMap<BlockId, NaiveDateTime>,
        rooms: &HashMap<RoomId, &Room>,
    ) -> Vec<StaffingConflict> {
        let counts = snapshot.supervisor_counts();
        let mut conflicts: Vec<StaffingConflict> = snapshot
            .blocks
            .iter()
            .filter_map(|block| {
                let room = rooms.get(&block.room_id)?;
                let at = starts.get(&block.id)?;
                let required = self.staffing.required_for(room.room_type);
                let assigned = counts.get(&block.id).copied().unwrap_or(0);
                (assigned < required as usize).then_some(StaffingConflict {
                    block_id: block.id,
                    room_id: room.id,
                    date: at.date(),
                    required,
                    assigned,
                })
            })
            .collect();
        conflicts.sort_by_key(|c| c.block_id);
        conflicts
    }
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

fn student_conflicts(
    snapshot: &ScheduleSnapshot,
    starts: &HashMap<BlockId, NaiveDateTime>,
) -> Vec<StudentConflict> {
    let mut per_day: BTreeMap<(StudentId, NaiveDate), BTreeSet<BlockId>> = BTreeMap::new();
    for entry in &snapshot.roster {
        if let Some(at) = starts.get(&entry.block_id) {
            per_day
                .entry((entry.student_id, at.date()))
                .or_default()
                .insert(entry.block_id);
        }
    }
    per_day
        .into_iter()
        .filter(|(_, blocks)| blocks.len() > 1)
        .map(|((student_id, date), blocks)| StudentConflict {
            student_id,
            date,
            exam_count: blocks.len(),
        })
        .collect()
}

fn capacity_conflicts(
    snapshot: &ScheduleSnapshot,
    starts: &HashMap<BlockId, NaiveDateTime>,
    rooms: &HashMap<RoomId, &Room>,
) -> Vec<CapacityConflict> {
    let sizes = snapshot.roster_sizes();
    let mut conflicts: Vec<CapacityConflict> = snapshot
        .blocks
        .iter()
        .filter_map(|block| {
            let room = rooms.get(&block.room_id)?;
            let at = starts.get(&block.id)?;
            let student_count = sizes.get(&block.id).copied().unwrap_or(0);
            (!room.fits(student_count)).then_some(CapacityConflict {
                block_id: block.id,
                room_id: room.id,
                date: at.date(),
                capacity: room.capacity,
                student_count,
            })
        })
        .collect();
    conflicts.sort_by_key(|c| c.block_id);
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Exam, ExamBlock, RosterEntry, Supervision};

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn exam(id: u32, starts_at: NaiveDateTime) -> Exam {
        Exam {
            id,
            module_id: id,
            starts_at,
            duration_minutes: 120,
        }
    }

    fn block(id: BlockId, exam_id: u32, room_id: RoomId) -> ExamBlock {
        ExamBlock {
            id,
            exam_id,
            room_id,
        }
    }

    fn seat(block_id: BlockId, student_id: StudentId) -> RosterEntry {
        RosterEntry {
            block_id,
            student_id,
        }
    }

    fn watch(block_id: BlockId, professor_id: ProfessorId) -> Supervision {
        Supervision {
            block_id,
            professor_id,
        }
    }

    fn rooms() -> Vec<Room> {
        vec![
            Room::classroom(1, 2),
            Room::classroom(2, 30),
            Room::amphitheater(3, 100),
        ]
    }

    /// Two exams on Jan 6 (08:00, 10:00) and one on Jan 7, fully staffed.
    fn clean_snapshot() -> ScheduleSnapshot {
        ScheduleSnapshot {
            exams: vec![exam(1, at(6, 8)), exam(2, at(6, 10)), exam(3, at(7, 8))],
            blocks: vec![block(1, 1, 1), block(2, 2, 2), block(3, 3, 3)],
            roster: vec![seat(1, 10), seat(1, 11), seat(2, 12), seat(3, 10)],
            supervisions: vec![watch(1, 1), watch(2, 2), watch(3, 1), watch(3, 2)],
        }
    }

    #[test]
    fn test_clean_schedule() {
        let report = ConflictDetector::default().detect(&clean_snapshot(), &rooms());
        assert!(report.is_empty(), "{report:?}");
    }

    #[test]
    fn test_student_same_day() {
        let mut snapshot = clean_snapshot();
        snapshot.roster.push(seat(2, 10));
        let report = ConflictDetector::default().detect(&snapshot, &rooms());
        assert_eq!(
            report.students,
            vec![StudentConflict {
                student_id: 10,
                date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
                exam_count: 2,
            }]
        );
        assert_eq!(report.total(), 1);
    }

    #[test]
    fn test_student_on_different_days_is_fine() {
        // Student 10 sits on Jan 6 and Jan 7 in the clean snapshot already
        let report = ConflictDetector::default().detect(&clean_snapshot(), &rooms());
        assert!(report.students.is_empty());
    }

    #[test]
    fn test_professor_over_cap() {
        let mut snapshot = clean_snapshot();
        snapshot.supervisions.push(watch(2, 1));
        let detector = ConflictDetector::new(1, StaffingPolicy::default());
        let report = detector.detect(&snapshot, &rooms());
        assert_eq!(report.professors.len(), 1);
        assert_eq!(report.professors[0].professor_id, 1);
        assert_eq!(report.professors[0].supervision_count, 2);
        assert_eq!(
            report.professors[0].date,
            NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
        );
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut snapshot = clean_snapshot();
        snapshot.roster.push(seat(1, 13));
        let report = ConflictDetector::default().detect(&snapshot, &rooms());
        assert_eq!(
            report.capacity,
            vec![CapacityConflict {
                block_id: 1,
                room_id: 1,
                date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
                capacity: 2,
                student_count: 3,
            }]
        );
    }

    #[test]
    fn test_understaffed_block() {
        let mut snapshot = clean_snapshot();
        snapshot.supervisions.retain(|s| !(s.block_id == 3 && s.professor_id == 2));
        let report = ConflictDetector::default().detect(&snapshot, &rooms());
        assert_eq!(
            report.staffing,
            vec![StaffingConflict {
                block_id: 3,
                room_id: 3,
                date: NaiveDate::from_ymd_opt(2025, 1, 7).unwrap(),
                required: 2,
                assigned: 1,
            }]
        );
    }

    #[test]
    fn test_unknown_room_skipped() {
        let mut snapshot = clean_snapshot();
        snapshot.blocks.push(block(4, 3, 99));
        snapshot.roster.push(seat(4, 50));
        let report = ConflictDetector::default().detect(&snapshot, &rooms());
        assert!(report.capacity.is_empty());
        assert!(report.staffing.is_empty());
    }

    #[test]
    fn test_block_without_exam_skipped() {
        let mut snapshot = clean_snapshot();
        snapshot.blocks.push(block(4, 99, 1));
        snapshot.roster.extend([seat(4, 50), seat(4, 51), seat(4, 52)]);
        let report = ConflictDetector::default().detect(&snapshot, &rooms());
        assert!(report.capacity.is_empty());
        assert!(report.staffing.is_empty());
    }

    #[test]
    fn test_detection_is_idempotent() {
        let mut snapshot = clean_snapshot();
        snapshot.roster.push(seat(2, 10));
        snapshot.roster.push(seat(2, 11));
        snapshot.roster.push(seat(1, 14));
        snapshot.supervisions.clear();

        let detector = ConflictDetector::default();
        let first = detector.detect(&snapshot, &rooms());
        let second = detector.detect(&snapshot, &rooms());
        assert_eq!(first, second);
        assert_eq!(first.students.len(), 2);
        assert_eq!(first.students[0].student_id, 10);
        assert_eq!(first.students[1].student_id, 11);
        assert_eq!(first.staffing.len(), 3);
    }

    #[test]
    fn test_report_serializes() {
        let report = ConflictDetector::default().detect(&clean_snapshot(), &rooms());
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"students\":[]"));
    }
}
