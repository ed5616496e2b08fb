use super::FacultyId;
use serde::{Deserialize, Serialize};

/// A teaching staff member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faculty {
    pub id: FacultyId,
    pub code: String,
    #[serde(default)]
    pub name: String,
}

/// An inclusive range of periods a faculty member is willing to teach
/// on one day. A faculty with no windows at all is unrestricted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub faculty_id: FacultyId,
    /// Day of week (0 = first weekday, 5 = Saturday)
    pub day: u8,
    pub start_period: u8,
    pub end_period: u8,
}

impl AvailabilityWindow {
    /// Check whether this window covers a given (day, period)
    pub fn covers(&self, day: u8, period: u8) -> bool {
        self.day == day && self.start_period <= period && period <= self.end_period
    }

    /// Number of periods in the window
    pub fn len(&self) -> u8 {
        self.end_period.saturating_sub(self.start_period) + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end_period < self.start_period
    }
}
