//! University exam scheduling engine.
//!
//! Assigns every course module an exam date and time slot, packs the
//! enrolled cohort groups into rooms, staffs each room-bound sitting with
//! supervisors and scans the result for conflicts, all within a hard
//! wall-clock budget. The output is a feasible schedule built by greedy
//! heuristics, not a proven optimum.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Module`, `Program`, `Room`, `Professor`,
//!   `Enrollment`, `Exam`, `ExamBlock`, `Supervision`, `GenerationRecord`
//! - **`scheduler`**: Allocation phases and the time-boxed run controller
//! - **`conflicts`**: Read-side conflict scan over a persisted schedule
//! - **`store`**: Data access gateway contract and an in-memory store
//! - **`validation`**: Reference data integrity checks
//! - **`config`**: Engine options, loadable from TOML
//! - **`error`**: Error types
//!
//! # Architecture
//!
//! The engine owns no storage. It reads reference data and writes the
//! generated schedule through [`store::DataGateway`], and reports progress
//! through `tracing` events; installing a subscriber is the caller's job.
//!
//! # References
//!
//! - Burke & Petrovic (2002), "Recent research directions in automated timetabling"
//! - Qu et al. (2009), "A survey of search methodologies and automated system
//!   development for examination timetabling"
//! - Coffman et al. (1996), "Approximation algorithms for bin packing: a survey"

pub mod config;
pub mod conflicts;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod store;
pub mod validation;
