//! Allocation phases and the run controller.
//!
//! A generation run chains four greedy phases over reference data fetched
//! once up front:
//!
//! 1. [`TemporalAllocator`] gives every module a date and a time slot.
//! 2. [`RoomAllocator`] packs each exam's cohort groups into rooms.
//! 3. [`SupervisorAllocator`] staffs every block under a daily cap.
//! 4. [`ConflictDetector`](crate::conflicts::ConflictDetector) audits the result.
//!
//! [`ExamScheduler`] drives them under a [`Deadline`] and persists the
//! outcome. [`GenerationStats`] summarizes a finished run.
//!
//! # References
//!
//! - Carter, Laporte & Lee (1996), "Examination timetabling: algorithmic
//!   strategies and applications"
//! - Martello & Toth (1990), "Knapsack Problems", Ch. 8: Bin packing

mod controller;
mod deadline;
mod reference;
mod rooms;
mod stats;
mod supervisors;
mod temporal;

pub use controller::{ExamScheduler, GenerationOutcome, GenerationRequest, Phase};
pub use deadline::{Deadline, PollBudget, WallClockDeadline};
pub use reference::ReferenceData;
pub use rooms::{
    CohortIndex, ExamSlot, Placement, PlannedBlock, RoomAllocator, RoomOccupancy, RoomPlan,
    UnplacedStudents,
};
pub use stats::{GenerationStats, RoomUsage, SupervisionLoad};
pub use supervisors::{BlockDuty, SupervisionPlan, SupervisorAllocator, Understaffed};
pub use temporal::{PlannedExam, TemporalAllocator};
