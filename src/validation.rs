//! Reference data validation.
//!
//! Checks the structural integrity of the institution data before a
//! generation run wipes anything. Detects:
//! - Duplicate IDs
//! - Dangling references (module → program, program → department,
//!   professor → department, enrollment → module)
//! - Rooms without seats
//! - Duplicate enrollments
//! - Students carrying more than one cohort group label

use std::collections::{HashMap, HashSet};

use crate::scheduler::ReferenceData;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ValidationErrorKind {
    /// Two entities of the same kind share an ID.
    DuplicateId,
    /// An entity references a parent that doesn't exist.
    DanglingReference,
    /// A room has zero capacity.
    EmptyRoom,
    /// The same student is enrolled twice in one module.
    DuplicateEnrollment,
    /// A student appears under different cohort groups.
    InconsistentGroup,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the reference data of a generation run.
///
/// Checks:
/// 1. No duplicate department, program, module, room or professor IDs
/// 2. Every module belongs to a known program
/// 3. Every program belongs to a known department
/// 4. Every professor belongs to a known department
/// 5. Every enrollment references a known module
/// 6. Every room has at least one seat
/// 7. No (module, student) pair is enrolled twice
/// 8. Each student carries a single cohort group label
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_reference_data(data: &ReferenceData) -> ValidationResult {
    let mut errors = Vec::new();

    let department_ids = collect_ids(
        "department",
        data.departments.iter().map(|d| d.id),
        &mut errors,
    );
    let program_ids = collect_ids("program", data.programs.iter().map(|p| p.id), &mut errors);
    let module_ids = collect_ids("module", data.modules.iter().map(|m| m.id), &mut errors);
    collect_ids("room", data.rooms.iter().map(|r| r.id), &mut errors);
    collect_ids(
        "professor",
        data.professors.iter().map(|p| p.id),
        &mut errors,
    );

    for module in &data.modules {
        if !program_ids.contains(&module.program_id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DanglingReference,
                format!(
                    "Module {} references unknown program {}",
                    module.id, module.program_id
                ),
            ));
        }
    }

    for program in &data.programs {
        if !department_ids.contains(&program.department_id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DanglingReference,
                format!(
                    "Program {} references unknown department {}",
                    program.id, program.department_id
                ),
            ));
        }
    }

    for professor in &data.professors {
        if !department_ids.contains(&professor.department_id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DanglingReference,
                format!(
                    "Professor {} references unknown department {}",
                    professor.id, professor.department_id
                ),
            ));
        }
    }

    for room in &data.rooms {
        if room.capacity == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyRoom,
                format!("Room {} has no seats", room.id),
            ));
        }
    }

    // Enrollments
    let mut seen = HashSet::new();
    let mut groups: HashMap<_, &str> = HashMap::new();
    for e in &data.enrollments {
        if !module_ids.contains(&e.module_id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DanglingReference,
                format!(
                    "Student {} is enrolled in unknown module {}",
                    e.student_id, e.module_id
                ),
            ));
        }
        if !seen.insert((e.module_id, e.student_id)) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateEnrollment,
                format!(
                    "Student {} is enrolled twice in module {}",
                    e.student_id, e.module_id
                ),
            ));
        }
        let group = *groups.entry(e.student_id).or_insert(e.group.as_str());
        if group != e.group {
            errors.push(ValidationError::new(
                ValidationErrorKind::InconsistentGroup,
                format!(
                    "Student {} appears in groups '{}' and '{}'",
                    e.student_id, group, e.group
                ),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn collect_ids(
    entity: &str,
    ids: impl Iterator<Item = u32>,
    errors: &mut Vec<ValidationError>,
) -> HashSet<u32> {
    let mut unique = HashSet::new();
    for id in ids {
        if !unique.insert(id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate {entity} ID: {id}"),
            ));
        }
    }
    unique
}
