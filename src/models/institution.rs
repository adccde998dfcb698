//! Institution reference data.
//!
//! Departments own programs and professors; programs own modules;
//! students enroll in modules and carry one fixed cohort group label.

use serde::{Deserialize, Serialize};

use super::{DepartmentId, ModuleId, ProfessorId, ProgramId, StudentId};

/// An academic department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
}

/// A degree program (formation), owned by one department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    pub department_id: DepartmentId,
    pub name: String,
}

/// A course module. Each module gets exactly one exam per generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub program_id: ProgramId,
    pub name: String,
}

/// A professor available for supervision duty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Professor {
    pub id: ProfessorId,
    pub department_id: DepartmentId,
    pub name: String,
}

/// One student's enrollment in one module.
///
/// `group` is the student's cohort group label; it is the atomic unit
/// for room placement before any splitting happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub module_id: ModuleId,
    pub student_id: StudentId,
    pub group: String,
}

impl Department {
    pub fn new(id: DepartmentId) -> Self {
        Self {
            id,
            name: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Program {
    pub fn new(id: ProgramId, department_id: DepartmentId) -> Self {
        Self {
            id,
            department_id,
            name: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Module {
    pub fn new(id: ModuleId, program_id: ProgramId) -> Self {
        Self {
            id,
            program_id,
            name: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Professor {
    pub fn new(id: ProfessorId, department_id: DepartmentId) -> Self {
        Self {
            id,
            department_id,
            name: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Enrollment {
    pub fn new(module_id: ModuleId, student_id: StudentId, group: impl Into<String>) -> Self {
        Self {
            module_id,
            student_id,
            group: group.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let d = Department::new(1).with_name("Computer Science");
        let p = Program::new(10, 1).with_name("L3 Informatique");
        let m = Module::new(100, 10).with_name("Compilers");
        let prof = Professor::new(7, 1).with_name("Dr. Benali");

        assert_eq!(d.name, "Computer Science");
        assert_eq!(p.department_id, 1);
        assert_eq!(m.program_id, 10);
        assert_eq!(prof.department_id, d.id);
    }

    #[test]
    fn test_enrollment_serde() {
        let e = Enrollment::new(100, 42, "G1");
        let json = serde_json::to_string(&e).unwrap();
        assert_eq!(json, r#"{"module_id":100,"student_id":42,"group":"G1"}"#);
        let back: Enrollment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }
}
