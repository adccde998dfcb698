//! Generation statistics.
//!
//! Computes the summary of a generation run from the persisted schedule.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Totals | Exams, blocks, distinct students seated |
//! | Conflicts | Sum of every conflict class |
//! | Unplaced | Students left without a seat |
//! | Understaffed | Blocks with fewer supervisors than required |
//! | End date | Latest exam date (start date when nothing was scheduled) |
//! | Room usage | Rooms used / rooms available, per room type |
//! | Supervision load | Professors used, max and mean supervisions per professor |

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{ProfessorId, Room, RoomType, ScheduleSnapshot};

/// Booking rate of one room type over a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomUsage {
    pub room_type: RoomType,
    pub rooms_total: usize,
    /// Rooms holding at least one block.
    pub rooms_used: usize,
    /// `rooms_used / rooms_total` (0.0 when there are no rooms).
    pub utilization_rate: f64,
}

/// How supervision duties are spread over professors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupervisionLoad {
    pub professors_used: usize,
    pub max_per_professor: usize,
    pub avg_per_professor: f64,
}

/// Summary of a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub total_exams: usize,
    pub total_blocks: usize,
    pub total_students: usize,
    pub conflicts_detected: usize,
    pub unplaced_students: usize,
    pub understaffed_blocks: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub room_usage: Vec<RoomUsage>,
    pub supervision_load: SupervisionLoad,
}

impl GenerationStats {
    /// Computes statistics for a persisted schedule.
    ///
    /// # Arguments
    /// * `snapshot` - The schedule as read back from the store.
    /// * `rooms` - The room inventory the run allocated from.
    /// * `start_date` - The requested first exam date.
    /// * `conflicts_detected` - Conflict total from the detector.
    /// * `unplaced_students` - Students the room allocator could not seat.
    pub fn calculate(
        snapshot: &ScheduleSnapshot,
        rooms: &[Room],
        start_date: NaiveDate,
        conflicts_detected: usize,
        unplaced_students: usize,
    ) -> Self {
        let end_date = snapshot.last_exam_date().unwrap_or(start_date);

        Self {
            total_exams: snapshot.exams.len(),
            total_blocks: snapshot.blocks.len(),
            total_students: snapshot.distinct_students(),
            conflicts_detected,
            unplaced_students,
            understaffed_blocks: 0,
            start_date,
            end_date,
            room_usage: room_usage(snapshot, rooms),
            supervision_load: supervision_load(snapshot),
        }
    }

    /// Sets the understaffed block count.
    pub fn with_understaffed(mut self, understaffed_blocks: usize) -> Self {
        self.understaffed_blocks = understaffed_blocks;
        self
    }

    /// Usage of one room type, if the inventory has any.
    pub fn usage_of(&self, room_type: RoomType) -> Option<&RoomUsage> {
        self.room_usage.iter().find(|u| u.room_type == room_type)
    }
}

fn room_usage(snapshot: &ScheduleSnapshot, rooms: &[Room]) -> Vec<RoomUsage> {
    let used: BTreeSet<_> = snapshot.blocks.iter().map(|b| b.room_id).collect();

    [RoomType::Classroom, RoomType::Amphitheater]
        .into_iter()
        .filter_map(|room_type| {
            let of_type: Vec<&Room> = rooms.iter().filter(|r| r.room_type == room_type).collect();
            if of_type.is_empty() {
                return None;
            }
            let rooms_used = of_type.iter().filter(|r| used.contains(&r.id)).count();
            Some(RoomUsage {
                room_type,
                rooms_total: of_type.len(),
                rooms_used,
                utilization_rate: rooms_used as f64 / of_type.len() as f64,
            })
        })
        .collect()
}

fn supervision_load(snapshot: &ScheduleSnapshot) -> SupervisionLoad {
    let mut per_professor: HashMap<ProfessorId, usize> = HashMap::new();
    for s in &snapshot.supervisions {
        *per_professor.entry(s.professor_id).or_insert(0) += 1;
    }

    if per_professor.is_empty() {
        return SupervisionLoad::default();
    }
    SupervisionLoad {
        professors_used: per_professor.len(),
        max_per_professor: per_professor.values().copied().max().unwrap_or(0),
        avg_per_professor: snapshot.supervisions.len() as f64 / per_professor.len() as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Exam, ExamBlock, RosterEntry, Supervision};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn snapshot() -> ScheduleSnapshot {
        ScheduleSnapshot {
            exams: vec![
                Exam {
                    id: 1,
                    module_id: 1,
                    starts_at: date(6).and_hms_opt(8, 0, 0).unwrap(),
                    duration_minutes: 120,
                },
                Exam {
                    id: 2,
                    module_id: 2,
                    starts_at: date(9).and_hms_opt(10, 0, 0).unwrap(),
                    duration_minutes: 120,
                },
            ],
            blocks: vec![
                ExamBlock {
                    id: 1,
                    exam_id: 1,
                    room_id: 1,
                },
                ExamBlock {
                    id: 2,
                    exam_id: 2,
                    room_id: 3,
                },
            ],
            roster: vec![
                RosterEntry {
                    block_id: 1,
                    student_id: 1,
                },
                RosterEntry {
                    block_id: 1,
                    student_id: 2,
                },
                RosterEntry {
                    block_id: 2,
                    student_id: 1,
                },
            ],
            supervisions: vec![
                Supervision {
                    block_id: 1,
                    professor_id: 1,
                },
                Supervision {
                    block_id: 2,
                    professor_id: 1,
                },
                Supervision {
                    block_id: 2,
                    professor_id: 2,
                },
            ],
        }
    }

    fn rooms() -> Vec<Room> {
        vec![
            Room::classroom(1, 30),
            Room::classroom(2, 30),
            Room::amphitheater(3, 200),
        ]
    }

    #[test]
    fn test_totals_and_dates() {
        let stats = GenerationStats::calculate(&snapshot(), &rooms(), date(6), 2, 5);
        assert_eq!(stats.total_exams, 2);
        assert_eq!(stats.total_blocks, 2);
        assert_eq!(stats.total_students, 2);
        assert_eq!(stats.conflicts_detected, 2);
        assert_eq!(stats.unplaced_students, 5);
        assert_eq!(stats.start_date, date(6));
        assert_eq!(stats.end_date, date(9));
    }

    #[test]
    fn test_room_usage() {
        let stats = GenerationStats::calculate(&snapshot(), &rooms(), date(6), 0, 0);
        let classrooms = stats.usage_of(RoomType::Classroom).unwrap();
        assert_eq!(classrooms.rooms_total, 2);
        assert_eq!(classrooms.rooms_used, 1);
        assert!((classrooms.utilization_rate - 0.5).abs() < 1e-10);

        let halls = stats.usage_of(RoomType::Amphitheater).unwrap();
        assert!((halls.utilization_rate - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_room_type_without_rooms_omitted() {
        let rooms = vec![Room::classroom(1, 30)];
        let stats = GenerationStats::calculate(&snapshot(), &rooms, date(6), 0, 0);
        assert!(stats.usage_of(RoomType::Amphitheater).is_none());
    }

    #[test]
    fn test_supervision_load() {
        let stats = GenerationStats::calculate(&snapshot(), &rooms(), date(6), 0, 0);
        assert_eq!(stats.supervision_load.professors_used, 2);
        assert_eq!(stats.supervision_load.max_per_professor, 2);
        assert!((stats.supervision_load.avg_per_professor - 1.5).abs() < 1e-10);
    }

    #[test]
    fn test_empty_schedule() {
        let stats =
            GenerationStats::calculate(&ScheduleSnapshot::new(), &rooms(), date(6), 0, 0)
                .with_understaffed(0);
        assert_eq!(stats.total_exams, 0);
        assert_eq!(stats.end_date, date(6));
        assert_eq!(stats.supervision_load, SupervisionLoad::default());
        assert!(stats
            .room_usage
            .iter()
            .all(|u| u.rooms_used == 0 && u.utilization_rate == 0.0));
    }
}
