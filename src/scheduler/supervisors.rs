//! Supervisor allocation: proctors for every exam block.
//!
//! # Algorithm
//!
//! Blocks are processed in ascending start time (ties by block id). Each
//! block needs as many supervisors as its room type requires. Candidates
//! are the professors of the block's owning department followed by all
//! others, each part in id order. A candidate is taken while their count of
//! supervisions on that calendar day is below the daily cap.
//!
//! Only the daily count is tracked, not the time slot: blocks sharing a
//! start time are handed the same first eligible professor until that
//! professor hits the cap. With the default cap of 3, three blocks at 08:00
//! all get the department's lowest-id professor.
//!
//! When the candidates run out the block keeps the supervisors it got and
//! is reported as understaffed. The run goes on; missing coverage is a
//! reported condition, never a failure.
//!
//! # Complexity
//! O(b · p) for b blocks and p professors.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::Deadline;
use crate::config::{EngineConfig, StaffingPolicy};
use crate::models::{BlockId, DepartmentId, Professor, ProfessorId, RoomType, Supervision};

/// A persisted block waiting for supervisors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDuty {
    pub block_id: BlockId,
    pub starts_at: NaiveDateTime,
    pub room_type: RoomType,
    /// Department owning the exam's module, if known.
    pub department_id: Option<DepartmentId>,
}

/// A block that received fewer supervisors than its room type requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Understaffed {
    pub block_id: BlockId,
    pub starts_at: NaiveDateTime,
    pub required: u32,
    pub assigned: u32,
}

/// Output of a supervisor allocation pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupervisionPlan {
    pub supervisions: Vec<Supervision>,
    pub understaffed: Vec<Understaffed>,
    pub blocks_processed: usize,
    pub interrupted: bool,
}

/// Assigns professors to blocks under a per-day cap.
#[derive(Debug, Clone)]
pub struct SupervisorAllocator {
    staffing: StaffingPolicy,
    daily_cap: u32,
}

impl SupervisorAllocator {
    pub fn new(staffing: StaffingPolicy, daily_cap: u32) -> Self {
        Self {
            staffing,
            daily_cap,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.staffing, config.max_supervisions_per_day)
    }

    /// Assigns supervisors to `blocks`, polling `deadline` before each block.
    pub fn allocate(
        &self,
        blocks: &[BlockDuty],
        professors: &[Professor],
        deadline: &dyn Deadline,
    ) -> SupervisionPlan {
        let mut ordered: Vec<&BlockDuty> = blocks.iter().collect();
        ordered.sort_by_key(|b| (b.starts_at, b.block_id));

        let mut roster: Vec<&Professor> = professors.iter().collect();
        roster.sort_by_key(|p| p.id);

        let mut daily: HashMap<(NaiveDate, ProfessorId), u32> = HashMap::new();
        let mut plan = SupervisionPlan::default();

        for block in ordered {
            if deadline.is_exceeded() {
                warn!(
                    block_id = block.block_id,
                    processed = plan.blocks_processed,
                    "deadline exceeded during supervisor allocation"
                );
                plan.interrupted = true;
                break;
            }

            let required = self.staffing.required_for(block.room_type);
            let date = block.starts_at.date();
            let home = roster
                .iter()
                .filter(|p| Some(p.department_id) == block.department_id);
            let others = roster
                .iter()
                .filter(|p| Some(p.department_id) != block.department_id);

            let mut assigned = 0u32;
            for professor in home.chain(others) {
                if assigned >= required {
                    break;
                }
                let count = daily.entry((date, professor.id)).or_insert(0);
                if *count >= self.daily_cap {
                    continue;
                }
                *count += 1;
                assigned += 1;
                plan.supervisions.push(Supervision {
                    block_id: block.block_id,
                    professor_id: professor.id,
                });
            }

            if assigned < required {
                warn!(
                    block_id = block.block_id,
                    required,
                    assigned,
                    date = %date,
                    "block understaffed, no eligible professor left"
                );
                plan.understaffed.push(Understaffed {
                    block_id: block.block_id,
                    starts_at: block.starts_at,
                    required,
                    assigned,
                });
            }
            plan.blocks_processed += 1;
        }
        plan
    }
}

impl Default for SupervisorAllocator {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{PollBudget, WallClockDeadline};
    use std::time::Duration;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn duty(block_id: BlockId, starts_at: NaiveDateTime, room_type: RoomType) -> BlockDuty {
        BlockDuty {
            block_id,
            starts_at,
            room_type,
            department_id: Some(1),
        }
    }

    fn no_deadline() -> WallClockDeadline {
        WallClockDeadline::start(Duration::from_secs(3600))
    }

    fn assigned_to(plan: &SupervisionPlan, block_id: BlockId) -> Vec<ProfessorId> {
        plan.supervisions
            .iter()
            .filter(|s| s.block_id == block_id)
            .map(|s| s.professor_id)
            .collect()
    }

    #[test]
    fn test_staffing_by_room_type() {
        let professors: Vec<Professor> = (1..=5).map(|id| Professor::new(id, 1)).collect();
        let blocks = vec![
            duty(1, at(6, 8), RoomType::Classroom),
            duty(2, at(6, 10), RoomType::Amphitheater),
        ];
        let plan = SupervisorAllocator::default().allocate(&blocks, &professors, &no_deadline());

        assert_eq!(assigned_to(&plan, 1).len(), 1);
        assert_eq!(assigned_to(&plan, 2).len(), 2);
        assert!(plan.understaffed.is_empty());
        assert_eq!(plan.blocks_processed, 2);
    }

    #[test]
    fn test_home_department_first() {
        let professors = vec![
            Professor::new(1, 2),
            Professor::new(2, 2),
            Professor::new(3, 1),
            Professor::new(4, 1),
        ];
        let blocks = vec![duty(1, at(6, 8), RoomType::Amphitheater)];
        let plan = SupervisorAllocator::default().allocate(&blocks, &professors, &no_deadline());
        assert_eq!(assigned_to(&plan, 1), vec![3, 4]);
    }

    #[test]
    fn test_falls_back_to_other_departments() {
        let professors = vec![Professor::new(7, 2), Professor::new(3, 1)];
        let blocks = vec![duty(1, at(6, 8), RoomType::Amphitheater)];
        let plan = SupervisorAllocator::default().allocate(&blocks, &professors, &no_deadline());
        assert_eq!(assigned_to(&plan, 1), vec![3, 7]);
    }

    #[test]
    fn test_daily_cap() {
        let professors = vec![Professor::new(1, 1), Professor::new(2, 1)];
        let blocks: Vec<BlockDuty> = (1..=4)
            .map(|id| duty(id, at(6, 8), RoomType::Classroom))
            .collect();
        let allocator = SupervisorAllocator::new(StaffingPolicy::default(), 2);
        let plan = allocator.allocate(&blocks, &professors, &no_deadline());

        assert_eq!(assigned_to(&plan, 1), vec![1]);
        assert_eq!(assigned_to(&plan, 2), vec![1]);
        assert_eq!(assigned_to(&plan, 3), vec![2]);
        assert_eq!(assigned_to(&plan, 4), vec![2]);
    }

    #[test]
    fn test_same_slot_blocks_share_first_professor() {
        let professors: Vec<Professor> = (1..=10).map(|id| Professor::new(id, 1)).collect();
        let blocks: Vec<BlockDuty> = (1..=4)
            .map(|id| duty(id, at(6, 8), RoomType::Classroom))
            .collect();
        let plan = SupervisorAllocator::default().allocate(&blocks, &professors, &no_deadline());

        assert_eq!(assigned_to(&plan, 1), vec![1]);
        assert_eq!(assigned_to(&plan, 2), vec![1]);
        assert_eq!(assigned_to(&plan, 3), vec![1]);
        // Cap of 3 reached
        assert_eq!(assigned_to(&plan, 4), vec![2]);
        assert!(plan.understaffed.is_empty());
    }

    #[test]
    fn test_cap_resets_next_day() {
        let professors = vec![Professor::new(1, 1)];
        let blocks = vec![
            duty(1, at(6, 8), RoomType::Classroom),
            duty(2, at(6, 10), RoomType::Classroom),
            duty(3, at(7, 8), RoomType::Classroom),
        ];
        let allocator = SupervisorAllocator::new(StaffingPolicy::default(), 1);
        let plan = allocator.allocate(&blocks, &professors, &no_deadline());

        assert_eq!(assigned_to(&plan, 1), vec![1]);
        assert!(assigned_to(&plan, 2).is_empty());
        assert_eq!(assigned_to(&plan, 3), vec![1]);
        assert_eq!(plan.understaffed.len(), 1);
        assert_eq!(plan.understaffed[0].block_id, 2);
    }

    #[test]
    fn test_understaffed_reported() {
        let professors = vec![Professor::new(1, 1)];
        let blocks = vec![duty(1, at(6, 8), RoomType::Amphitheater)];
        let plan = SupervisorAllocator::default().allocate(&blocks, &professors, &no_deadline());

        assert_eq!(plan.supervisions.len(), 1);
        assert_eq!(
            plan.understaffed,
            vec![Understaffed {
                block_id: 1,
                starts_at: at(6, 8),
                required: 2,
                assigned: 1,
            }]
        );
    }

    #[test]
    fn test_earlier_blocks_served_first() {
        // Only one slot of capacity; the earlier block must get it
        let professors = vec![Professor::new(1, 1)];
        let blocks = vec![
            duty(1, at(6, 10), RoomType::Classroom),
            duty(2, at(6, 8), RoomType::Classroom),
        ];
        let allocator = SupervisorAllocator::new(StaffingPolicy::default(), 1);
        let plan = allocator.allocate(&blocks, &professors, &no_deadline());
        assert_eq!(assigned_to(&plan, 2), vec![1]);
        assert!(assigned_to(&plan, 1).is_empty());
    }

    #[test]
    fn test_unknown_department_uses_everyone() {
        let professors = vec![Professor::new(2, 1), Professor::new(1, 2)];
        let mut block = duty(1, at(6, 8), RoomType::Amphitheater);
        block.department_id = None;
        let plan = SupervisorAllocator::default().allocate(&[block], &professors, &no_deadline());
        assert_eq!(assigned_to(&plan, 1), vec![1, 2]);
    }

    #[test]
    fn test_deadline_interrupts() {
        let professors = vec![Professor::new(1, 1)];
        let blocks = vec![
            duty(1, at(6, 8), RoomType::Classroom),
            duty(2, at(7, 8), RoomType::Classroom),
        ];
        let plan =
            SupervisorAllocator::default().allocate(&blocks, &professors, &PollBudget::new(1));
        assert!(plan.interrupted);
        assert_eq!(plan.blocks_processed, 1);
        assert_eq!(plan.supervisions.len(), 1);
    }
}
