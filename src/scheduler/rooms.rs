//! Room allocation: packing cohort groups into exam blocks.
//!
//! # Algorithm
//!
//! Exams are processed in ascending date-time order (ties by exam id), so
//! earlier exams get first pick of the rooms free at their slot. For each
//! exam the enrolled students, already split into cohort groups, go
//! through three passes:
//!
//! 1. **Merge** – amphitheaters by descending capacity. For each free hall,
//!    take whole groups first-fit in label order while they fit. Keep the
//!    merge only if it clears the [`MergePolicy`] utilization bar; an
//!    accepted merge becomes one block and books the hall.
//! 2. **Direct fit** – each remaining group goes to the smallest free
//!    classroom that holds it whole (best fit).
//! 3. **Split** – a group no single free classroom can hold is carved into
//!    chunks over free classrooms by descending capacity. Students left
//!    over once classrooms run out are reported as unplaced.
//!
//! Occupancy is exclusive per room per date-time. All ordering uses
//! explicit keys (capacity, then room id; group label) so the result is
//! reproducible.
//!
//! # Complexity
//! O(e · (a·g + g·c)) for e exams, a amphitheaters, g groups per exam and
//! c classrooms.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::Deadline;
use crate::config::MergePolicy;
use crate::models::{Enrollment, ExamId, ModuleId, NewBlock, Room, RoomId, RoomType, StudentId};

/// Booked rooms per date-time.
#[derive(Debug, Clone, Default)]
pub struct RoomOccupancy {
    booked: HashMap<NaiveDateTime, HashSet<RoomId>>,
}

impl RoomOccupancy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `room_id` is still free at `at`.
    pub fn is_free(&self, room_id: RoomId, at: NaiveDateTime) -> bool {
        self.booked
            .get(&at)
            .map_or(true, |rooms| !rooms.contains(&room_id))
    }

    /// Books `room_id` at `at`. Returns `false` if it was already booked.
    pub fn reserve(&mut self, room_id: RoomId, at: NaiveDateTime) -> bool {
        self.booked.entry(at).or_default().insert(room_id)
    }

    /// Number of rooms booked at `at`.
    pub fn booked_count(&self, at: NaiveDateTime) -> usize {
        self.booked.get(&at).map_or(0, HashSet::len)
    }
}

/// Enrolled students of each module, by cohort group label.
///
/// Groups iterate in label order; students within a group by id.
#[derive(Debug, Clone, Default)]
pub struct CohortIndex {
    by_module: HashMap<ModuleId, BTreeMap<String, Vec<StudentId>>>,
}

impl CohortIndex {
    pub fn from_enrollments(enrollments: &[Enrollment]) -> Self {
        let mut by_module: HashMap<ModuleId, BTreeMap<String, Vec<StudentId>>> = HashMap::new();
        for e in enrollments {
            by_module
                .entry(e.module_id)
                .or_default()
                .entry(e.group.clone())
                .or_default()
                .push(e.student_id);
        }
        for groups in by_module.values_mut() {
            for students in groups.values_mut() {
                students.sort_unstable();
                students.dedup();
            }
        }
        Self { by_module }
    }

    /// Cohort groups enrolled in `module_id`, if any.
    pub fn groups(&self, module_id: ModuleId) -> Option<&BTreeMap<String, Vec<StudentId>>> {
        self.by_module.get(&module_id)
    }

    /// Number of students enrolled in `module_id`.
    pub fn enrolled(&self, module_id: ModuleId) -> usize {
        self.groups(module_id)
            .map_or(0, |groups| groups.values().map(Vec::len).sum())
    }
}

/// A persisted exam waiting for rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamSlot {
    pub exam_id: ExamId,
    pub module_id: ModuleId,
    pub starts_at: NaiveDateTime,
}

/// How a block came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Several groups (or one large group) in an amphitheater.
    Merged,
    /// One whole group in a best-fit classroom.
    Direct,
    /// A fragment of a group too large for any free classroom.
    Split,
}

/// A room-bound sitting produced by the allocator, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedBlock {
    pub exam_id: ExamId,
    pub module_id: ModuleId,
    pub room_id: RoomId,
    pub room_type: RoomType,
    pub starts_at: NaiveDateTime,
    /// Cohort groups (fully or partly) seated in this block.
    pub groups: Vec<String>,
    pub students: Vec<StudentId>,
    pub placement: Placement,
}

/// Students of one group that no free room could seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnplacedStudents {
    pub exam_id: ExamId,
    pub module_id: ModuleId,
    pub group: String,
    pub starts_at: NaiveDateTime,
    pub students: Vec<StudentId>,
}

/// Output of a room allocation pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomPlan {
    pub blocks: Vec<PlannedBlock>,
    pub unplaced: Vec<UnplacedStudents>,
    /// Exams fully handled before the pass stopped.
    pub exams_processed: usize,
    /// Whether the deadline stopped the pass early.
    pub interrupted: bool,
}

impl PlannedBlock {
    pub fn to_new_block(&self) -> NewBlock {
        NewBlock {
            exam_id: self.exam_id,
            room_id: self.room_id,
        }
    }
}

impl RoomPlan {
    /// Total number of students left without a seat.
    pub fn unplaced_count(&self) -> usize {
        self.unplaced.iter().map(|u| u.students.len()).sum()
    }

    /// Total number of seats handed out.
    pub fn seated_count(&self) -> usize {
        self.blocks.iter().map(|b| b.students.len()).sum()
    }
}

/// Packs exams into rooms.
#[derive(Debug, Clone)]
pub struct RoomAllocator {
    /// Descending capacity, then ascending id.
    amphitheaters: Vec<Room>,
    /// Ascending capacity, then ascending id (best-fit order).
    classrooms_asc: Vec<Room>,
    /// Descending capacity, then ascending id (split order).
    classrooms_desc: Vec<Room>,
    merge: MergePolicy,
}

impl RoomAllocator {
    /// Creates an allocator over the given room inventory.
    pub fn new(rooms: &[Room], merge: MergePolicy) -> Self {
        let mut amphitheaters: Vec<Room> = rooms
            .iter()
            .filter(|r| r.room_type == RoomType::Amphitheater)
            .cloned()
            .collect();
        amphitheaters.sort_by_key(|r| (Reverse(r.capacity), r.id));

        let mut classrooms_asc: Vec<Room> = rooms
            .iter()
            .filter(|r| r.room_type == RoomType::Classroom)
            .cloned()
            .collect();
        classrooms_asc.sort_by_key(|r| (r.capacity, r.id));

        let mut classrooms_desc = classrooms_asc.clone();
        classrooms_desc.sort_by_key(|r| (Reverse(r.capacity), r.id));

        Self {
            amphitheaters,
            classrooms_asc,
            classrooms_desc,
            merge,
        }
    }

    /// Allocates rooms for `exams`, polling `deadline` before each exam.
    pub fn allocate(
        &self,
        exams: &[ExamSlot],
        cohorts: &CohortIndex,
        deadline: &dyn Deadline,
    ) -> RoomPlan {
        let mut ordered: Vec<&ExamSlot> = exams.iter().collect();
        ordered.sort_by_key(|e| (e.starts_at, e.exam_id));

        let mut occupancy = RoomOccupancy::new();
        let mut plan = RoomPlan::default();

        for exam in ordered {
            if deadline.is_exceeded() {
                warn!(
                    exam_id = exam.exam_id,
                    processed = plan.exams_processed,
                    "deadline exceeded during room allocation"
                );
                plan.interrupted = true;
                break;
            }
            if let Some(groups) = cohorts.groups(exam.module_id) {
                self.allocate_exam(exam, groups, &mut occupancy, &mut plan);
            }
            plan.exams_processed += 1;
        }
        plan
    }

    fn allocate_exam(
        &self,
        exam: &ExamSlot,
        groups: &BTreeMap<String, Vec<StudentId>>,
        occupancy: &mut RoomOccupancy,
        plan: &mut RoomPlan,
    ) {
        let blocks_before = plan.blocks.len();
        let remaining: Vec<(&str, &[StudentId])> = groups
            .iter()
            .map(|(label, students)| (label.as_str(), students.as_slice()))
            .collect();

        let remaining = self.merge_pass(exam, remaining, occupancy, plan);
        for (label, students) in remaining {
            if !self.direct_fit(exam, label, students, occupancy, plan) {
                self.split(exam, label, students, occupancy, plan);
            }
        }

        debug!(
            exam_id = exam.exam_id,
            module_id = exam.module_id,
            groups = groups.len(),
            blocks = plan.blocks.len() - blocks_before,
            "exam rooms allocated"
        );
    }

    /// Merge pass over amphitheaters. Returns the groups left to place.
    fn merge_pass<'g>(
        &self,
        exam: &ExamSlot,
        mut remaining: Vec<(&'g str, &'g [StudentId])>,
        occupancy: &mut RoomOccupancy,
        plan: &mut RoomPlan,
    ) -> Vec<(&'g str, &'g [StudentId])> {
        for hall in &self.amphitheaters {
            if remaining.is_empty() {
                break;
            }
            if !occupancy.is_free(hall.id, exam.starts_at) {
                continue;
            }

            let mut selected = Vec::new();
            let mut seated = 0usize;
            for (i, (_, students)) in remaining.iter().enumerate() {
                if hall.fits(seated + students.len()) {
                    seated += students.len();
                    selected.push(i);
                }
            }

            if !self.merge.accepts(selected.len(), seated, hall.capacity) {
                continue;
            }

            let mut groups = Vec::with_capacity(selected.len());
            let mut students = Vec::with_capacity(seated);
            for &i in &selected {
                let (label, members) = remaining[i];
                groups.push(label.to_string());
                students.extend_from_slice(members);
            }
            occupancy.reserve(hall.id, exam.starts_at);
            plan.blocks.push(PlannedBlock {
                exam_id: exam.exam_id,
                module_id: exam.module_id,
                room_id: hall.id,
                room_type: hall.room_type,
                starts_at: exam.starts_at,
                groups,
                students,
                placement: Placement::Merged,
            });

            let mut index = 0;
            remaining.retain(|_| {
                let keep = !selected.contains(&index);
                index += 1;
                keep
            });
        }
        remaining
    }

    /// Seats a whole group in the smallest free classroom that holds it.
    fn direct_fit(
        &self,
        exam: &ExamSlot,
        label: &str,
        students: &[StudentId],
        occupancy: &mut RoomOccupancy,
        plan: &mut RoomPlan,
    ) -> bool {
        let Some(room) = self
            .classrooms_asc
            .iter()
            .find(|r| r.fits(students.len()) && occupancy.is_free(r.id, exam.starts_at))
        else {
            return false;
        };

        occupancy.reserve(room.id, exam.starts_at);
        plan.blocks.push(PlannedBlock {
            exam_id: exam.exam_id,
            module_id: exam.module_id,
            room_id: room.id,
            room_type: room.room_type,
            starts_at: exam.starts_at,
            groups: vec![label.to_string()],
            students: students.to_vec(),
            placement: Placement::Direct,
        });
        true
    }

    /// Carves a group into chunks over free classrooms, largest first.
    fn split(
        &self,
        exam: &ExamSlot,
        label: &str,
        students: &[StudentId],
        occupancy: &mut RoomOccupancy,
        plan: &mut RoomPlan,
    ) {
        let mut rest = students;
        for room in &self.classrooms_desc {
            if rest.is_empty() {
                break;
            }
            if !occupancy.is_free(room.id, exam.starts_at) {
                continue;
            }
            let take = rest.len().min(room.capacity as usize);
            let (chunk, tail) = rest.split_at(take);
            rest = tail;

            occupancy.reserve(room.id, exam.starts_at);
            plan.blocks.push(PlannedBlock {
                exam_id: exam.exam_id,
                module_id: exam.module_id,
                room_id: room.id,
                room_type: room.room_type,
                starts_at: exam.starts_at,
                groups: vec![label.to_string()],
                students: chunk.to_vec(),
                placement: Placement::Split,
            });
        }

        if !rest.is_empty() {
            warn!(
                exam_id = exam.exam_id,
                module_id = exam.module_id,
                group = label,
                unplaced = rest.len(),
                starts_at = %exam.starts_at,
                "not enough free room capacity, students left without a seat"
            );
            plan.unplaced.push(UnplacedStudents {
                exam_id: exam.exam_id,
                module_id: exam.module_id,
                group: label.to_string(),
                starts_at: exam.starts_at,
                students: rest.to_vec(),
            });
        }
    }
}
