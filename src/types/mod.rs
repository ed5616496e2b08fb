mod config;
mod course;
mod faculty;
pub mod grid;
mod room;
mod schedule;
mod section;
mod slot;
mod subject;

pub use config::*;
pub use course::*;
pub use faculty::*;
pub use grid::*;
pub use room::*;
pub use schedule::*;
pub use section::*;
pub use slot::*;
pub use subject::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Newtype for section identifiers
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectionId(pub String);

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Newtype for subject identifiers
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectId(pub String);

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Newtype for faculty identifiers
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FacultyId(pub String);

impl fmt::Display for FacultyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Newtype for room identifiers
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(pub String);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// All input data bundled together
#[derive(Debug)]
pub struct ScheduleInput {
    pub sections: Vec<Section>,
    pub subjects: Vec<Subject>,
    pub faculty: Vec<Faculty>,
    pub rooms: Vec<Room>,
    pub availability: Vec<AvailabilityWindow>,
    pub bindings: Vec<CourseBinding>,
    pub config: EngineConfig,
}
