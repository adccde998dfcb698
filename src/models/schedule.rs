//! Schedule (generation output) model.
//!
//! A schedule is the set of exams, room-bound exam blocks, block rosters
//! and supervisions produced by one generation run. `New*` types are
//! write requests; the store assigns identifiers on insert.

use std::collections::{BTreeSet, HashMap};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{BlockId, ExamId, ModuleId, ProfessorId, RoomId, StudentId};

/// Exam write request: one per module per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExam {
    pub module_id: ModuleId,
    pub starts_at: NaiveDateTime,
    pub duration_minutes: u32,
}

/// A persisted exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    pub id: ExamId,
    pub module_id: ModuleId,
    pub starts_at: NaiveDateTime,
    pub duration_minutes: u32,
}

/// Exam block write request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBlock {
    pub exam_id: ExamId,
    pub room_id: RoomId,
}

/// A persisted exam block: one room-bound sitting of (part of) an exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamBlock {
    pub id: BlockId,
    pub exam_id: ExamId,
    pub room_id: RoomId,
}

/// Membership of one student in one block's roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RosterEntry {
    pub block_id: BlockId,
    pub student_id: StudentId,
}

/// One professor's proctoring assignment to one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Supervision {
    pub block_id: BlockId,
    pub professor_id: ProfessorId,
}

/// Read-back of everything a generation run persisted.
///
/// Used by the conflict detector and the statistics pass; both are pure
/// functions of a snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleSnapshot {
    pub exams: Vec<Exam>,
    pub blocks: Vec<ExamBlock>,
    pub roster: Vec<RosterEntry>,
    pub supervisions: Vec<Supervision>,
}

impl Exam {
    /// Calendar date of the sitting.
    #[inline]
    pub fn date(&self) -> NaiveDate {
        self.starts_at.date()
    }
}

impl ScheduleSnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Exams indexed by id.
    pub fn exams_by_id(&self) -> HashMap<ExamId, &Exam> {
        self.exams.iter().map(|e| (e.id, e)).collect()
    }

    /// Start date-time of every block whose exam is known.
    pub fn block_start_times(&self) -> HashMap<BlockId, NaiveDateTime> {
        let exams = self.exams_by_id();
        self.blocks
            .iter()
            .filter_map(|b| exams.get(&b.exam_id).map(|e| (b.id, e.starts_at)))
            .collect()
    }

    /// Number of students seated in each block.
    pub fn roster_sizes(&self) -> HashMap<BlockId, usize> {
        let mut sizes: HashMap<BlockId, usize> = self.blocks.iter().map(|b| (b.id, 0)).collect();
        for entry in &self.roster {
            *sizes.entry(entry.block_id).or_insert(0) += 1;
        }
        sizes
    }

    /// Number of supervisors assigned to each block.
    pub fn supervisor_counts(&self) -> HashMap<BlockId, usize> {
        let mut counts: HashMap<BlockId, usize> =
            self.blocks.iter().map(|b| (b.id, 0)).collect();
        for s in &self.supervisions {
            *counts.entry(s.block_id).or_insert(0) += 1;
        }
        counts
    }

    /// Blocks created for one exam.
    pub fn blocks_for_exam(&self, exam_id: ExamId) -> Vec<&ExamBlock> {
        self.blocks.iter().filter(|b| b.exam_id == exam_id).collect()
    }

    /// Students seated in one block.
    pub fn roster_for_block(&self, block_id: BlockId) -> Vec<StudentId> {
        self.roster
            .iter()
            .filter(|r| r.block_id == block_id)
            .map(|r| r.student_id)
            .collect()
    }

    /// Distinct students with at least one seat.
    pub fn distinct_students(&self) -> usize {
        self.roster
            .iter()
            .map(|r| r.student_id)
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Latest exam date, if any exam exists.
    pub fn last_exam_date(&self) -> Option<NaiveDate> {
        self.exams.iter().map(Exam::date).max()
    }

    /// Whether nothing was persisted.
    pub fn is_empty(&self) -> bool {
        self.exams.is_empty() && self.blocks.is_empty()
    }
}
