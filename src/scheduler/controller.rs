//! Run controller: one time-boxed generation run end to end.
//!
//! # Phases
//!
//! 1. **Load** – read every reference table once.
//! 2. **Validate** – reject broken reference data before touching anything.
//! 3. **Clear** – wipe the generation-owned tables.
//! 4. **Temporal** – place each module's exam; insert exams in one batch.
//! 5. **Rooms** – pack students into blocks; insert blocks and rosters.
//! 6. **Supervisors** – staff every block; insert supervisions.
//! 7. **Conflicts** – read the schedule back, scan it, compute statistics.
//! 8. **Persist** – write the generation record and pending validation markers.
//!
//! The deadline is polled before phases 3–7 and inside the room and
//! supervisor loops. A run that observes it exceeded stops producing work,
//! keeps whatever was already written and ends in `TIMEOUT`. A store
//! failure ends the run in `ERROR`. Neither rolls back: a run that cleared
//! the tables and did not succeed leaves the store needing regeneration
//! ([`GenerationOutcome::requires_regeneration`]).
//!
//! The store is borrowed mutably for the whole run, so two runs can never
//! interleave on one store.

use std::fmt;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::{
    BlockDuty, CohortIndex, Deadline, ExamSlot, GenerationStats, ReferenceData, RoomAllocator,
    SupervisorAllocator, TemporalAllocator, UnplacedStudents, Understaffed, WallClockDeadline,
};
use crate::config::EngineConfig;
use crate::conflicts::{ConflictDetector, ConflictReport};
use crate::error::{EngineError, EngineResult, StoreError};
use crate::models::{
    GenerationId, GenerationRecord, RosterEntry, RunStatus, ValidationMarker, ValidatorRole,
};
use crate::store::DataGateway;
use crate::validation::validate_reference_data;

/// Step of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Load,
    Validate,
    Clear,
    Temporal,
    Rooms,
    Supervisors,
    Conflicts,
    Persist,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Load => "load",
            Phase::Validate => "validate",
            Phase::Clear => "clear",
            Phase::Temporal => "temporal",
            Phase::Rooms => "rooms",
            Phase::Supervisors => "supervisors",
            Phase::Conflicts => "conflicts",
            Phase::Persist => "persist",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input of a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// First date exams may be held on (moved forward past the non-exam day).
    pub start_date: NaiveDate,
    /// Exam duration for this run; the configured default when `None`.
    pub duration_minutes: Option<u32>,
}

impl GenerationRequest {
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            duration_minutes: None,
        }
    }

    /// Overrides the configured exam duration.
    pub fn with_duration(mut self, duration_minutes: u32) -> Self {
        self.duration_minutes = Some(duration_minutes);
        self
    }
}

/// Structured result of a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutcome {
    /// Terminal status.
    pub status: RunStatus,
    /// Phase the run was in when it ended.
    pub phase: Phase,
    pub start_date: NaiveDate,
    pub exams_created: usize,
    pub blocks_created: usize,
    pub roster_entries_created: usize,
    pub supervisions_created: usize,
    /// Computed once the conflict phase completes.
    pub stats: Option<GenerationStats>,
    pub conflicts: Option<ConflictReport>,
    pub unplaced: Vec<UnplacedStudents>,
    pub understaffed: Vec<Understaffed>,
    pub elapsed_seconds: f64,
    /// Failure reason for `ERROR` runs.
    pub error: Option<String>,
    /// Persisted generation record (successful runs only).
    pub generation_id: Option<GenerationId>,
    /// Whether the generation tables were wiped during this run.
    pub store_modified: bool,
}

impl GenerationOutcome {
    fn started(start_date: NaiveDate) -> Self {
        Self {
            status: RunStatus::Running,
            phase: Phase::Load,
            start_date,
            exams_created: 0,
            blocks_created: 0,
            roster_entries_created: 0,
            supervisions_created: 0,
            stats: None,
            conflicts: None,
            unplaced: Vec::new(),
            understaffed: Vec::new(),
            elapsed_seconds: 0.0,
            error: None,
            generation_id: None,
            store_modified: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }

    /// Whether the store holds a partial schedule that must be regenerated.
    pub fn requires_regeneration(&self) -> bool {
        self.store_modified && !self.is_success()
    }

    /// Number of students left without a seat.
    pub fn unplaced_count(&self) -> usize {
        self.unplaced.iter().map(|u| u.students.len()).sum()
    }
}

/// Why a run stopped before completing.
enum Halt {
    Timeout,
    Failed(EngineError),
}

impl From<EngineError> for Halt {
    fn from(err: EngineError) -> Self {
        Halt::Failed(err)
    }
}

impl From<StoreError> for Halt {
    fn from(err: StoreError) -> Self {
        Halt::Failed(err.into())
    }
}

/// Time-boxed exam schedule generator.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use exam_schedule::config::EngineConfig;
/// use exam_schedule::models::{Department, Enrollment, Module, Professor, Program, Room, RunStatus};
/// use exam_schedule::scheduler::{ExamScheduler, GenerationRequest};
/// use exam_schedule::store::MemoryStore;
///
/// let mut store = MemoryStore::new()
///     .with_departments(vec![Department::new(1)])
///     .with_programs(vec![Program::new(1, 1)])
///     .with_modules(vec![Module::new(1, 1)])
///     .with_rooms(vec![Room::classroom(1, 30)])
///     .with_professors(vec![Professor::new(1, 1)])
///     .with_enrollments(vec![Enrollment::new(1, 1, "G1")]);
///
/// let mut scheduler = ExamScheduler::new(EngineConfig::default()).unwrap();
/// let request = GenerationRequest::new(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
/// let outcome = scheduler.generate(&mut store, &request).unwrap();
/// assert_eq!(outcome.status, RunStatus::Success);
/// assert_eq!(outcome.blocks_created, 1);
/// ```
#[derive(Debug, Clone)]
pub struct ExamScheduler {
    config: EngineConfig,
    status: RunStatus,
}

impl ExamScheduler {
    /// Creates a scheduler; rejects an invalid configuration.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            status: RunStatus::Idle,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Status of the latest run (`Idle` before the first one).
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Runs a generation under the configured wall-clock budget.
    pub fn generate<G: DataGateway + ?Sized>(
        &mut self,
        store: &mut G,
        request: &GenerationRequest,
    ) -> EngineResult<GenerationOutcome> {
        let deadline = WallClockDeadline::start(self.config.time_budget());
        self.generate_with_deadline(store, request, &deadline)
    }

    /// Runs a generation under a caller-supplied deadline.
    ///
    /// Store failures and timeouts are reported through the outcome's
    /// status; `Err` only means the run could not start.
    pub fn generate_with_deadline<G: DataGateway + ?Sized>(
        &mut self,
        store: &mut G,
        request: &GenerationRequest,
        deadline: &dyn Deadline,
    ) -> EngineResult<GenerationOutcome> {
        self.transition(RunStatus::Running)?;
        info!(
            start_date = %request.start_date,
            budget_secs = self.config.time_budget_secs,
            "exam generation started"
        );

        let mut outcome = GenerationOutcome::started(request.start_date);
        let status = match self.execute(store, request, deadline, &mut outcome) {
            Ok(()) => RunStatus::Success,
            Err(Halt::Timeout) => {
                warn!(phase = %outcome.phase, "exam generation timed out");
                RunStatus::Timeout
            }
            Err(Halt::Failed(err)) => {
                error!(phase = %outcome.phase, error = %err, "exam generation failed");
                outcome.error = Some(err.to_string());
                RunStatus::Error
            }
        };

        outcome.status = status;
        outcome.elapsed_seconds = deadline.elapsed().as_secs_f64();
        self.transition(status)?;

        info!(
            status = %status,
            phase = %outcome.phase,
            exams = outcome.exams_created,
            blocks = outcome.blocks_created,
            elapsed_secs = outcome.elapsed_seconds,
            "exam generation finished"
        );
        Ok(outcome)
    }

    fn transition(&mut self, next: RunStatus) -> EngineResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(EngineError::IllegalTransition {
                from: self.status.as_str(),
                to: next.as_str(),
            });
        }
        self.status = next;
        Ok(())
    }

    fn execute<G: DataGateway + ?Sized>(
        &self,
        store: &mut G,
        request: &GenerationRequest,
        deadline: &dyn Deadline,
        outcome: &mut GenerationOutcome,
    ) -> Result<(), Halt> {
        let data = ReferenceData::load(&*store)?;
        info!(
            modules = data.modules.len(),
            rooms = data.rooms.len(),
            professors = data.professors.len(),
            enrollments = data.enrollments.len(),
            "reference data loaded"
        );

        outcome.phase = Phase::Validate;
        validate_reference_data(&data).map_err(EngineError::InvalidReferenceData)?;

        enter(Phase::Clear, deadline, outcome)?;
        outcome.store_modified = true;
        store.clear_generation_tables()?;

        // Temporal
        enter(Phase::Temporal, deadline, outcome)?;
        let mut temporal = TemporalAllocator::from_config(&self.config);
        if let Some(minutes) = request.duration_minutes {
            temporal = temporal.with_duration(minutes);
        }
        let planned = temporal.allocate(&data.modules, request.start_date);
        let new_exams: Vec<_> = planned.iter().map(|p| p.to_new_exam()).collect();
        let exam_ids = store.insert_exams(&new_exams)?;
        outcome.exams_created = exam_ids.len();
        info!(exams = exam_ids.len(), "exams placed");

        let mut slots = Vec::with_capacity(planned.len());
        for p in &planned {
            let exam_id = exam_ids.get(&p.module_id).copied().ok_or_else(|| {
                StoreError::NotFound(format!("exam id for module {}", p.module_id))
            })?;
            slots.push(ExamSlot {
                exam_id,
                module_id: p.module_id,
                starts_at: p.starts_at,
            });
        }

        // Rooms
        enter(Phase::Rooms, deadline, outcome)?;
        let cohorts = CohortIndex::from_enrollments(&data.enrollments);
        let room_plan =
            RoomAllocator::new(&data.rooms, self.config.merge).allocate(&slots, &cohorts, deadline);

        let new_blocks: Vec<_> = room_plan.blocks.iter().map(|b| b.to_new_block()).collect();
        let block_ids = store.insert_blocks(&new_blocks)?;
        if block_ids.len() != room_plan.blocks.len() {
            return Err(StoreError::Write {
                operation: "insert_blocks",
                message: format!(
                    "expected {} block ids, got {}",
                    room_plan.blocks.len(),
                    block_ids.len()
                ),
            }
            .into());
        }
        outcome.blocks_created = block_ids.len();

        let roster: Vec<RosterEntry> = block_ids
            .iter()
            .zip(&room_plan.blocks)
            .flat_map(|(&block_id, block)| {
                block
                    .students
                    .iter()
                    .map(move |&student_id| RosterEntry {
                        block_id,
                        student_id,
                    })
            })
            .collect();
        store.insert_roster_entries(&roster)?;
        outcome.roster_entries_created = roster.len();
        outcome.unplaced = room_plan.unplaced.clone();
        info!(
            blocks = block_ids.len(),
            seated = roster.len(),
            unplaced = room_plan.unplaced_count(),
            "rooms allocated"
        );
        if room_plan.interrupted {
            return Err(Halt::Timeout);
        }

        // Supervisors
        enter(Phase::Supervisors, deadline, outcome)?;
        let departments = data.module_departments();
        let duties: Vec<BlockDuty> = block_ids
            .iter()
            .zip(&room_plan.blocks)
            .map(|(&block_id, block)| BlockDuty {
                block_id,
                starts_at: block.starts_at,
                room_type: block.room_type,
                department_id: departments.get(&block.module_id).copied(),
            })
            .collect();
        let staffing = SupervisorAllocator::from_config(&self.config).allocate(
            &duties,
            &data.professors,
            deadline,
        );
        store.insert_supervisions(&staffing.supervisions)?;
        outcome.supervisions_created = staffing.supervisions.len();
        outcome.understaffed = staffing.understaffed.clone();
        info!(
            supervisions = staffing.supervisions.len(),
            understaffed = staffing.understaffed.len(),
            "supervisors assigned"
        );
        if staffing.interrupted {
            return Err(Halt::Timeout);
        }

        // Conflicts
        enter(Phase::Conflicts, deadline, outcome)?;
        let snapshot = store.load_snapshot()?;
        let report = ConflictDetector::from_config(&self.config).detect(&snapshot, &data.rooms);
        let stats = GenerationStats::calculate(
            &snapshot,
            &data.rooms,
            request.start_date,
            report.total(),
            room_plan.unplaced_count(),
        )
        .with_understaffed(staffing.understaffed.len());
        info!(
            students = report.students.len(),
            professors = report.professors.len(),
            capacity = report.capacity.len(),
            staffing = report.staffing.len(),
            "conflict scan complete"
        );

        // Persist
        outcome.phase = Phase::Persist;
        let record = GenerationRecord {
            generated_at: Utc::now(),
            start_date: request.start_date,
            end_date: stats.end_date,
            elapsed_seconds: deadline.elapsed().as_secs_f64(),
            total_exams: stats.total_exams,
            total_blocks: stats.total_blocks,
            total_students: stats.total_students,
            conflicts_detected: stats.conflicts_detected,
            status: RunStatus::Success,
        };
        outcome.conflicts = Some(report);
        outcome.stats = Some(stats);

        let generation_id = store.insert_generation_record(&record)?;
        let mut department_ids: Vec<_> = data.departments.iter().map(|d| d.id).collect();
        department_ids.sort_unstable();
        let markers: Vec<ValidationMarker> = department_ids
            .into_iter()
            .map(ValidatorRole::DepartmentHead)
            .chain(std::iter::once(ValidatorRole::ViceDean))
            .map(|role| ValidationMarker::pending(generation_id, role))
            .collect();
        store.insert_validation_markers(&markers)?;
        outcome.generation_id = Some(generation_id);
        Ok(())
    }
}

/// Enters `phase`, unless the deadline has passed.
fn enter(
    phase: Phase,
    deadline: &dyn Deadline,
    outcome: &mut GenerationOutcome,
) -> Result<(), Halt> {
    outcome.phase = phase;
    if deadline.is_exceeded() {
        return Err(Halt::Timeout);
    }
    Ok(())
}
