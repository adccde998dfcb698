//! Data access gateway.
//!
//! The engine never talks to a database directly. Everything it reads or
//! writes goes through [`DataGateway`], a narrow typed contract over the
//! relational store:
//!
//! - reference data reads (departments, programs, modules, rooms,
//!   professors, enrollments), fetched once per run;
//! - a wholesale wipe of the generation-owned tables;
//! - batched inserts of exams, blocks, roster entries and supervisions;
//! - read-back of the persisted schedule for the conflict scan;
//! - the generation record and its validation markers.
//!
//! Writes take `&mut self`: exclusive access to the gateway is what keeps
//! two generation runs from wiping the same tables concurrently.
//!
//! [`MemoryStore`] is a complete in-process implementation.

mod memory;

pub use memory::MemoryStore;

use std::collections::HashMap;

use crate::error::StoreResult;
use crate::models::{
    BlockId, Department, Enrollment, Exam, ExamBlock, ExamId, GenerationId, GenerationRecord,
    Module, ModuleId, NewBlock, NewExam, Professor, Program, Room, RosterEntry, ScheduleSnapshot,
    Supervision, ValidationMarker,
};

/// Identifies one gateway operation (for logging and failure injection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ListDepartments,
    ListPrograms,
    ListModules,
    ListRooms,
    ListProfessors,
    ListEnrollments,
    ClearGenerationTables,
    InsertExams,
    InsertBlocks,
    InsertRosterEntries,
    InsertSupervisions,
    InsertGenerationRecord,
    InsertValidationMarkers,
    ListExams,
    ListBlocks,
    ListRosterEntries,
    ListSupervisions,
}

impl StoreOp {
    pub fn name(&self) -> &'static str {
        match self {
            StoreOp::ListDepartments => "list_departments",
            StoreOp::ListPrograms => "list_programs",
            StoreOp::ListModules => "list_modules",
            StoreOp::ListRooms => "list_rooms",
            StoreOp::ListProfessors => "list_professors",
            StoreOp::ListEnrollments => "list_enrollments",
            StoreOp::ClearGenerationTables => "clear_generation_tables",
            StoreOp::InsertExams => "insert_exams",
            StoreOp::InsertBlocks => "insert_blocks",
            StoreOp::InsertRosterEntries => "insert_roster_entries",
            StoreOp::InsertSupervisions => "insert_supervisions",
            StoreOp::InsertGenerationRecord => "insert_generation_record",
            StoreOp::InsertValidationMarkers => "insert_validation_markers",
            StoreOp::ListExams => "list_exams",
            StoreOp::ListBlocks => "list_blocks",
            StoreOp::ListRosterEntries => "list_roster_entries",
            StoreOp::ListSupervisions => "list_supervisions",
        }
    }

    /// Whether the operation mutates the store.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            StoreOp::ClearGenerationTables
                | StoreOp::InsertExams
                | StoreOp::InsertBlocks
                | StoreOp::InsertRosterEntries
                | StoreOp::InsertSupervisions
                | StoreOp::InsertGenerationRecord
                | StoreOp::InsertValidationMarkers
        )
    }
}

/// Typed access to the relational store backing the engine.
pub trait DataGateway {
    // ── Reference data ─────────────────────────────────────────────

    fn list_departments(&self) -> StoreResult<Vec<Department>>;
    fn list_programs(&self) -> StoreResult<Vec<Program>>;
    fn list_modules(&self) -> StoreResult<Vec<Module>>;
    fn list_rooms(&self) -> StoreResult<Vec<Room>>;
    fn list_professors(&self) -> StoreResult<Vec<Professor>>;
    /// Every (module, student, cohort group) enrollment, in bulk.
    fn list_enrollments(&self) -> StoreResult<Vec<Enrollment>>;

    // ── Generation-owned tables ────────────────────────────────────

    /// Deletes every supervision, roster entry, block and exam.
    fn clear_generation_tables(&mut self) -> StoreResult<()>;

    /// Inserts exams and returns the id assigned to each module's exam.
    fn insert_exams(&mut self, exams: &[NewExam]) -> StoreResult<HashMap<ModuleId, ExamId>>;

    /// Inserts blocks and returns their ids, in input order.
    fn insert_blocks(&mut self, blocks: &[NewBlock]) -> StoreResult<Vec<BlockId>>;

    fn insert_roster_entries(&mut self, entries: &[RosterEntry]) -> StoreResult<()>;
    fn insert_supervisions(&mut self, supervisions: &[Supervision]) -> StoreResult<()>;

    fn list_exams(&self) -> StoreResult<Vec<Exam>>;
    fn list_blocks(&self) -> StoreResult<Vec<ExamBlock>>;
    fn list_roster_entries(&self) -> StoreResult<Vec<RosterEntry>>;
    fn list_supervisions(&self) -> StoreResult<Vec<Supervision>>;

    // ── Run bookkeeping ────────────────────────────────────────────

    fn insert_generation_record(&mut self, record: &GenerationRecord)
        -> StoreResult<GenerationId>;
    fn insert_validation_markers(&mut self, markers: &[ValidationMarker]) -> StoreResult<()>;

    /// Reads back the whole persisted schedule.
    fn load_snapshot(&self) -> StoreResult<ScheduleSnapshot> {
        Ok(ScheduleSnapshot {
            exams: self.list_exams()?,
            blocks: self.list_blocks()?,
            roster: self.list_roster_entries()?,
            supervisions: self.list_supervisions()?,
        })
    }
}
