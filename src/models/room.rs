//! Room model.
//!
//! Rooms are the capacitated resources exams are packed into. The room
//! type decides both the packing strategy (amphitheaters host merged
//! cohort groups, classrooms host one group or a fragment of one) and
//! how many supervisors a block in that room needs.

use serde::{Deserialize, Serialize};

use super::RoomId;

/// An exam room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Unique room identifier.
    pub id: RoomId,
    /// Human-readable name.
    pub name: String,
    /// Number of seats (must be positive).
    pub capacity: u32,
    /// Room classification.
    pub room_type: RoomType,
}

/// Room type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    /// Regular classroom, one cohort group (or fragment) per sitting.
    Classroom,
    /// Large lecture hall able to host several cohort groups at once.
    Amphitheater,
}

impl Room {
    /// Creates a new room.
    pub fn new(id: RoomId, capacity: u32, room_type: RoomType) -> Self {
        Self {
            id,
            name: String::new(),
            capacity,
            room_type,
        }
    }

    /// Creates a classroom.
    pub fn classroom(id: RoomId, capacity: u32) -> Self {
        Self::new(id, capacity, RoomType::Classroom)
    }

    /// Creates an amphitheater.
    pub fn amphitheater(id: RoomId, capacity: u32) -> Self {
        Self::new(id, capacity, RoomType::Amphitheater)
    }

    /// Sets the room name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn is_amphitheater(&self) -> bool {
        self.room_type == RoomType::Amphitheater
    }

    /// Whether `students` seats fit in this room.
    #[inline]
    pub fn fits(&self, students: usize) -> bool {
        students <= self.capacity as usize
    }
}

impl RoomType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomType::Classroom => "classroom",
            RoomType::Amphitheater => "amphitheater",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_builder() {
        let r = Room::amphitheater(1, 300).with_name("Amphi A");
        assert_eq!(r.id, 1);
        assert_eq!(r.name, "Amphi A");
        assert_eq!(r.capacity, 300);
        assert!(r.is_amphitheater());

        let c = Room::classroom(2, 30);
        assert_eq!(c.room_type, RoomType::Classroom);
        assert!(!c.is_amphitheater());
    }

    #[test]
    fn test_room_fits() {
        let c = Room::classroom(2, 30);
        assert!(c.fits(30));
        assert!(!c.fits(31));
        assert!(c.fits(0));
    }

    #[test]
    fn test_room_type_serde() {
        let json = serde_json::to_string(&RoomType::Amphitheater).unwrap();
        assert_eq!(json, "\"amphitheater\"");
        assert_eq!(RoomType::Classroom.as_str(), "classroom");
    }
}
