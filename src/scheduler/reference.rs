//! Reference data snapshot.
//!
//! Fetched once at the start of a run and held in memory for its whole
//! duration; no phase re-queries the store for reference data.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::models::{
    Department, DepartmentId, Enrollment, Module, ModuleId, Professor, Program, Room, RoomId,
};
use crate::store::DataGateway;

/// Institution data a generation run works from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceData {
    pub departments: Vec<Department>,
    pub programs: Vec<Program>,
    pub modules: Vec<Module>,
    pub rooms: Vec<Room>,
    pub professors: Vec<Professor>,
    pub enrollments: Vec<Enrollment>,
}

impl ReferenceData {
    /// Reads every reference table through the gateway.
    pub fn load<G: DataGateway + ?Sized>(store: &G) -> StoreResult<Self> {
        Ok(Self {
            departments: store.list_departments()?,
            programs: store.list_programs()?,
            modules: store.list_modules()?,
            rooms: store.list_rooms()?,
            professors: store.list_professors()?,
            enrollments: store.list_enrollments()?,
        })
    }

    /// Owning department of each module (module → program → department).
    pub fn module_departments(&self) -> HashMap<ModuleId, DepartmentId> {
        let program_departments: HashMap<_, _> = self
            .programs
            .iter()
            .map(|p| (p.id, p.department_id))
            .collect();
        self.modules
            .iter()
            .filter_map(|m| {
                program_departments
                    .get(&m.program_id)
                    .map(|&dept| (m.id, dept))
            })
            .collect()
    }

    pub fn rooms_by_id(&self) -> HashMap<RoomId, &Room> {
        self.rooms.iter().map(|r| (r.id, r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreOp};

    fn sample_store() -> MemoryStore {
        MemoryStore::new()
            .with_departments(vec![Department::new(1), Department::new(2)])
            .with_programs(vec![Program::new(10, 1), Program::new(20, 2)])
            .with_modules(vec![Module::new(100, 10), Module::new(200, 20)])
            .with_rooms(vec![Room::classroom(1, 30)])
            .with_professors(vec![Professor::new(1, 2)])
            .with_enrollments(vec![Enrollment::new(100, 1, "G1")])
    }

    #[test]
    fn test_load() {
        let data = ReferenceData::load(&sample_store()).unwrap();
        assert_eq!(data.departments.len(), 2);
        assert_eq!(data.modules.len(), 2);
        assert_eq!(data.enrollments.len(), 1);
        assert_eq!(data.rooms_by_id()[&1].capacity, 30);
    }

    #[test]
    fn test_module_departments() {
        let data = ReferenceData::load(&sample_store()).unwrap();
        let depts = data.module_departments();
        assert_eq!(depts[&100], 1);
        assert_eq!(depts[&200], 2);
    }

    #[test]
    fn test_load_propagates_failure() {
        let mut store = sample_store();
        store.fail_on(StoreOp::ListEnrollments);
        assert!(ReferenceData::load(&store).is_err());
    }
}
