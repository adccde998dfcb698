//! In-process implementation of the data access gateway.
//!
//! Holds every table in plain vectors, assigns sequential identifiers on
//! insert and enforces the foreign keys of the generation-owned tables.
//! Individual operations can be made to fail, which is how store-failure
//! handling is exercised in tests.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::{DataGateway, StoreOp};
use crate::error::{StoreError, StoreResult};
use crate::models::{
    BlockId, Department, Enrollment, Exam, ExamBlock, ExamId, GenerationId, GenerationRecord,
    Module, ModuleId, NewBlock, NewExam, Professor, Program, Room, RosterEntry, Supervision,
    ValidationMarker,
};

/// In-memory relational store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    departments: Vec<Department>,
    programs: Vec<Program>,
    modules: Vec<Module>,
    rooms: Vec<Room>,
    professors: Vec<Professor>,
    enrollments: Vec<Enrollment>,

    exams: Vec<Exam>,
    blocks: Vec<ExamBlock>,
    roster: Vec<RosterEntry>,
    supervisions: Vec<Supervision>,
    records: Vec<(GenerationId, GenerationRecord)>,
    markers: Vec<ValidationMarker>,

    next_exam_id: ExamId,
    next_block_id: BlockId,
    next_generation_id: GenerationId,

    failing: HashSet<StoreOp>,
    write_calls: HashMap<StoreOp, usize>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_departments(mut self, departments: Vec<Department>) -> Self {
        self.departments = departments;
        self
    }

    pub fn with_programs(mut self, programs: Vec<Program>) -> Self {
        self.programs = programs;
        self
    }

    pub fn with_modules(mut self, modules: Vec<Module>) -> Self {
        self.modules = modules;
        self
    }

    pub fn with_rooms(mut self, rooms: Vec<Room>) -> Self {
        self.rooms = rooms;
        self
    }

    pub fn with_professors(mut self, professors: Vec<Professor>) -> Self {
        self.professors = professors;
        self
    }

    pub fn with_enrollments(mut self, enrollments: Vec<Enrollment>) -> Self {
        self.enrollments = enrollments;
        self
    }

    /// Makes every future call of `op` fail.
    pub fn fail_on(&mut self, op: StoreOp) {
        self.failing.insert(op);
    }

    /// Removes all injected failures.
    pub fn clear_failures(&mut self) {
        self.failing.clear();
    }

    /// Number of times a write operation has been invoked.
    pub fn write_calls(&self, op: StoreOp) -> usize {
        self.write_calls.get(&op).copied().unwrap_or(0)
    }

    pub fn exams(&self) -> &[Exam] {
        &self.exams
    }

    pub fn blocks(&self) -> &[ExamBlock] {
        &self.blocks
    }

    pub fn roster(&self) -> &[RosterEntry] {
        &self.roster
    }

    pub fn supervisions(&self) -> &[Supervision] {
        &self.supervisions
    }

    /// Persisted generation records with their ids, oldest first.
    pub fn generation_records(&self) -> &[(GenerationId, GenerationRecord)] {
        &self.records
    }

    pub fn validation_markers(&self) -> &[ValidationMarker] {
        &self.markers
    }

    fn check(&self, op: StoreOp) -> StoreResult<()> {
        if !self.failing.contains(&op) {
            return Ok(());
        }
        let message = "injected failure".to_string();
        if op.is_write() {
            Err(StoreError::Write {
                operation: op.name(),
                message,
            })
        } else {
            Err(StoreError::Read {
                operation: op.name(),
                message,
            })
        }
    }

    fn begin_write(&mut self, op: StoreOp) -> StoreResult<()> {
        *self.write_calls.entry(op).or_insert(0) += 1;
        self.check(op)
    }

    fn block_ids(&self) -> HashSet<BlockId> {
        self.blocks.iter().map(|b| b.id).collect()
    }
}

impl DataGateway for MemoryStore {
    fn list_departments(&self) -> StoreResult<Vec<Department>> {
        self.check(StoreOp::ListDepartments)?;
        Ok(self.departments.clone())
    }

    fn list_programs(&self) -> StoreResult<Vec<Program>> {
        self.check(StoreOp::ListPrograms)?;
        Ok(self.programs.clone())
    }

    fn list_modules(&self) -> StoreResult<Vec<Module>> {
        self.check(StoreOp::ListModules)?;
        Ok(self.modules.clone())
    }

    fn list_rooms(&self) -> StoreResult<Vec<Room>> {
        self.check(StoreOp::ListRooms)?;
        Ok(self.rooms.clone())
    }

    fn list_professors(&self) -> StoreResult<Vec<Professor>> {
        self.check(StoreOp::ListProfessors)?;
        Ok(self.professors.clone())
    }

    fn list_enrollments(&self) -> StoreResult<Vec<Enrollment>> {
        self.check(StoreOp::ListEnrollments)?;
        Ok(self.enrollments.clone())
    }

    fn clear_generation_tables(&mut self) -> StoreResult<()> {
        self.begin_write(StoreOp::ClearGenerationTables)?;
        self.supervisions.clear();
        self.roster.clear();
        self.blocks.clear();
        self.exams.clear();
        debug!("generation tables cleared");
        Ok(())
    }

    fn insert_exams(&mut self, exams: &[NewExam]) -> StoreResult<HashMap<ModuleId, ExamId>> {
        self.begin_write(StoreOp::InsertExams)?;
        let known: HashSet<ModuleId> = self.modules.iter().map(|m| m.id).collect();
        if let Some(bad) = exams.iter().find(|e| !known.contains(&e.module_id)) {
            return Err(StoreError::NotFound(format!("module {}", bad.module_id)));
        }

        let mut ids = HashMap::with_capacity(exams.len());
        for new in exams {
            self.next_exam_id += 1;
            let id = self.next_exam_id;
            self.exams.push(Exam {
                id,
                module_id: new.module_id,
                starts_at: new.starts_at,
                duration_minutes: new.duration_minutes,
            });
            ids.insert(new.module_id, id);
        }
        debug!(count = exams.len(), "exams inserted");
        Ok(ids)
    }

    fn insert_blocks(&mut self, blocks: &[NewBlock]) -> StoreResult<Vec<BlockId>> {
        self.begin_write(StoreOp::InsertBlocks)?;
        let exams: HashSet<ExamId> = self.exams.iter().map(|e| e.id).collect();
        let rooms: HashSet<_> = self.rooms.iter().map(|r| r.id).collect();
        for b in blocks {
            if !exams.contains(&b.exam_id) {
                return Err(StoreError::NotFound(format!("exam {}", b.exam_id)));
            }
            if !rooms.contains(&b.room_id) {
                return Err(StoreError::NotFound(format!("room {}", b.room_id)));
            }
        }

        let mut ids = Vec::with_capacity(blocks.len());
        for new in blocks {
            self.next_block_id += 1;
            let id = self.next_block_id;
            self.blocks.push(ExamBlock {
                id,
                exam_id: new.exam_id,
                room_id: new.room_id,
            });
            ids.push(id);
        }
        debug!(count = blocks.len(), "blocks inserted");
        Ok(ids)
    }

    fn insert_roster_entries(&mut self, entries: &[RosterEntry]) -> StoreResult<()> {
        self.begin_write(StoreOp::InsertRosterEntries)?;
        let blocks = self.block_ids();
        if let Some(bad) = entries.iter().find(|e| !blocks.contains(&e.block_id)) {
            return Err(StoreError::NotFound(format!("block {}", bad.block_id)));
        }
        self.roster.extend_from_slice(entries);
        debug!(count = entries.len(), "roster entries inserted");
        Ok(())
    }

    fn insert_supervisions(&mut self, supervisions: &[Supervision]) -> StoreResult<()> {
        self.begin_write(StoreOp::InsertSupervisions)?;
        let blocks = self.block_ids();
        if let Some(bad) = supervisions.iter().find(|s| !blocks.contains(&s.block_id)) {
            return Err(StoreError::NotFound(format!("block {}", bad.block_id)));
        }
        self.supervisions.extend_from_slice(supervisions);
        debug!(count = supervisions.len(), "supervisions inserted");
        Ok(())
    }

    fn list_exams(&self) -> StoreResult<Vec<Exam>> {
        self.check(StoreOp::ListExams)?;
        Ok(self.exams.clone())
    }

    fn list_blocks(&self) -> StoreResult<Vec<ExamBlock>> {
        self.check(StoreOp::ListBlocks)?;
        Ok(self.blocks.clone())
    }

    fn list_roster_entries(&self) -> StoreResult<Vec<RosterEntry>> {
        self.check(StoreOp::ListRosterEntries)?;
        Ok(self.roster.clone())
    }

    fn list_supervisions(&self) -> StoreResult<Vec<Supervision>> {
        self.check(StoreOp::ListSupervisions)?;
        Ok(self.supervisions.clone())
    }

    fn insert_generation_record(
        &mut self,
        record: &GenerationRecord,
    ) -> StoreResult<GenerationId> {
        self.begin_write(StoreOp::InsertGenerationRecord)?;
        self.next_generation_id += 1;
        let id = self.next_generation_id;
        self.records.push((id, record.clone()));
        debug!(generation_id = id, "generation record stored");
        Ok(id)
    }

    fn insert_validation_markers(&mut self, markers: &[ValidationMarker]) -> StoreResult<()> {
        self.begin_write(StoreOp::InsertValidationMarkers)?;
        let known: HashSet<GenerationId> = self.records.iter().map(|(id, _)| *id).collect();
        if let Some(bad) = markers.iter().find(|m| !known.contains(&m.generation_id)) {
            return Err(StoreError::NotFound(format!(
                "generation {}",
                bad.generation_id
            )));
        }
        self.markers.extend_from_slice(markers);
        Ok(())
    }
}
