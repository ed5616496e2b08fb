use super::{grid, FacultyId, RoomId, SectionId, SubjectId};
use serde::{Deserialize, Serialize};

/// One placed class meeting: a section, subject, faculty and room bound
/// to a contiguous run of periods on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledSlot {
    pub section_id: SectionId,
    pub subject_id: SubjectId,
    pub faculty_id: FacultyId,
    pub room_id: RoomId,
    /// Day of week (0 = first weekday, 5 = Saturday)
    pub day: u8,
    /// First period, 1-based inclusive
    pub start_period: u8,
    /// Last period, 1-based inclusive
    pub end_period: u8,
}

impl ScheduledSlot {
    /// Number of periods this slot spans
    pub fn span(&self) -> u8 {
        self.end_period - self.start_period + 1
    }

    /// Iterate the periods covered by this slot
    pub fn periods(&self) -> impl Iterator<Item = u8> {
        self.start_period..=self.end_period
    }

    /// Whether the slot lies in the morning half of the day
    pub fn is_morning(&self) -> bool {
        self.start_period <= grid::MORNING_END
    }

    /// Check for a time collision with another slot
    pub fn overlaps(&self, other: &ScheduledSlot) -> bool {
        grid::overlaps(self, other)
    }

    /// Whether the two slots may not coexist: colliding in time while
    /// sharing a faculty, room or section
    pub fn conflicts_with(&self, other: &ScheduledSlot) -> bool {
        self.overlaps(other)
            && (self.faculty_id == other.faculty_id
                || self.room_id == other.room_id
                || self.section_id == other.section_id)
    }
}

impl std::fmt::Display for ScheduledSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} P{}-{}: {} / {} in {}",
            grid::day_name(self.day),
            self.start_period,
            self.end_period,
            self.section_id,
            self.subject_id,
            self.room_id
        )
    }
}
