//! Exam scheduling domain models.
//!
//! Reference data (departments, programs, modules, rooms, professors,
//! enrollments) is long-lived and read-only from the engine's point of
//! view. Schedule data (exams, blocks, rosters, supervisions) is owned by
//! a generation run and replaced wholesale by the next one.
//!
//! # Domain Mappings
//!
//! | exam-schedule | Generic scheduling |
//! |---------------|--------------------|
//! | Module | Task |
//! | Exam | Activity with a fixed start |
//! | Room | Capacitated resource |
//! | Professor | Human resource |
//! | ExamBlock | Assignment of part of an exam to one room |

mod calendar;
mod generation;
mod institution;
mod room;
mod schedule;

pub use calendar::ExamCalendar;
pub use generation::{
    GenerationRecord, RunStatus, ValidationMarker, ValidationStatus, ValidatorRole,
};
pub use institution::{Department, Enrollment, Module, Professor, Program};
pub use room::{Room, RoomType};
pub use schedule::{Exam, ExamBlock, NewBlock, NewExam, RosterEntry, ScheduleSnapshot, Supervision};

/// Department identifier.
pub type DepartmentId = u32;
/// Program (formation) identifier.
pub type ProgramId = u32;
/// Course module identifier.
pub type ModuleId = u32;
/// Student identifier.
pub type StudentId = u32;
/// Professor identifier.
pub type ProfessorId = u32;
/// Room identifier.
pub type RoomId = u32;
/// Exam identifier (assigned by the store).
pub type ExamId = u32;
/// Exam block identifier (assigned by the store).
pub type BlockId = u32;
/// Generation record identifier (assigned by the store).
pub type GenerationId = u32;
