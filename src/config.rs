//! Engine configuration.
//!
//! Every recognized option has a default matching the institution's
//! standing rules, so an empty TOML document is a valid configuration.
//!
//! ```toml
//! non_exam_weekday = "Fri"
//! time_slot_hours = [8, 10, 13, 15]
//! max_supervisions_per_day = 3
//! time_budget_secs = 30
//!
//! [staffing]
//! classroom = 1
//! amphitheater = 2
//!
//! [merge]
//! min_groups = 2
//! utilization_threshold = 0.6
//! large_group_threshold = 50
//! ```

use std::path::Path;
use std::time::Duration;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::RoomType;

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Weekday on which no exam is ever scheduled.
    pub non_exam_weekday: Weekday,
    /// Fixed daily exam start hours (24-hour clock).
    pub time_slot_hours: Vec<u32>,
    /// Modulus for the per-program starting day offset.
    pub program_day_spread: u32,
    /// Number of modules in a program before its time slot shifts by one.
    pub slot_rotation_period: u32,
    /// Duration given to every generated exam (minutes).
    pub default_duration_minutes: u32,
    /// Maximum supervisions one professor may take on a single day.
    pub max_supervisions_per_day: u32,
    /// Hard wall-clock budget for one generation run (seconds).
    pub time_budget_secs: u64,
    /// Supervisors required per room type.
    pub staffing: StaffingPolicy,
    /// Amphitheater merge acceptance rules.
    pub merge: MergePolicy,
}

/// Supervisors required per block, by room type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaffingPolicy {
    pub classroom: u32,
    pub amphitheater: u32,
}

/// Utilization bar an amphitheater merge has to clear.
///
/// A merge is accepted when at least `min_groups` groups were merged, or
/// the seated students reach `utilization_threshold` of the capacity, or a
/// single group larger than `large_group_threshold` fills the hall alone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergePolicy {
    pub min_groups: usize,
    pub utilization_threshold: f64,
    pub large_group_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            non_exam_weekday: Weekday::Fri,
            time_slot_hours: vec![8, 10, 13, 15],
            program_day_spread: 6,
            slot_rotation_period: 7,
            default_duration_minutes: 120,
            max_supervisions_per_day: 3,
            time_budget_secs: 30,
            staffing: StaffingPolicy::default(),
            merge: MergePolicy::default(),
        }
    }
}

impl Default for StaffingPolicy {
    fn default() -> Self {
        Self {
            classroom: 1,
            amphitheater: 2,
        }
    }
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            min_groups: 2,
            utilization_threshold: 0.6,
            large_group_threshold: 50,
        }
    }
}

impl StaffingPolicy {
    /// Supervisors required for a block held in a room of the given type.
    pub fn required_for(&self, room_type: RoomType) -> u32 {
        match room_type {
            RoomType::Classroom => self.classroom,
            RoomType::Amphitheater => self.amphitheater,
        }
    }
}

impl MergePolicy {
    /// Whether merging `groups` cohort groups totalling `students` into a
    /// hall of `capacity` seats is worth booking the hall.
    pub fn accepts(&self, groups: usize, students: usize, capacity: u32) -> bool {
        if groups == 0 || students == 0 {
            return false;
        }
        if groups >= self.min_groups {
            return true;
        }
        if students as f64 >= f64::from(capacity) * self.utilization_threshold {
            return true;
        }
        groups == 1 && students > self.large_group_threshold
    }
}

impl EngineConfig {
    /// Parses a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The run's hard wall-clock budget.
    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.time_budget_secs)
    }

    /// Checks every option and reports the first invalid one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_slot_hours.is_empty() {
            return Err(invalid("time_slot_hours", "at least one slot is required"));
        }
        if let Some(hour) = self.time_slot_hours.iter().find(|&&h| h >= 24) {
            return Err(invalid(
                "time_slot_hours",
                format!("hour {hour} is outside 0..24"),
            ));
        }
        if self.program_day_spread == 0 {
            return Err(invalid("program_day_spread", "must be at least 1"));
        }
        if self.slot_rotation_period == 0 {
            return Err(invalid("slot_rotation_period", "must be at least 1"));
        }
        if self.default_duration_minutes == 0 {
            return Err(invalid("default_duration_minutes", "must be positive"));
        }
        if self.max_supervisions_per_day == 0 {
            return Err(invalid("max_supervisions_per_day", "must be at least 1"));
        }
        if self.time_budget_secs == 0 {
            return Err(invalid("time_budget_secs", "must be positive"));
        }
        if self.merge.min_groups == 0 {
            return Err(invalid("merge.min_groups", "must be at least 1"));
        }
        let threshold = self.merge.utilization_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(invalid(
                "merge.utilization_threshold",
                format!("{threshold} is outside (0, 1]"),
            ));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}
