use super::{FacultyId, ScheduledSlot, SectionId, SubjectId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata about a generated schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleMetadata {
    pub generated_at: String,
    pub algorithm_version: String,
    /// Soft-constraint fitness in [0, 1]
    pub fitness: f64,
    /// Scheduled periods over required periods
    pub coverage: f64,
    /// Label of the multi-start ordering that produced the schedule
    pub best_strategy: Option<String>,
    pub base_time_ms: u64,
}

impl Default for ScheduleMetadata {
    fn default() -> Self {
        Self {
            generated_at: String::new(),
            algorithm_version: String::new(),
            fitness: 0.0,
            coverage: 0.0,
            best_strategy: None,
            base_time_ms: 0,
        }
    }
}

/// The complete generated timetable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub slots: Vec<ScheduledSlot>,
    pub metadata: ScheduleMetadata,
}

impl Schedule {
    /// Create a new empty schedule
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            metadata: ScheduleMetadata {
                generated_at: chrono::Utc::now().to_rfc3339(),
                algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
        }
    }

    /// Slots belonging to one section
    pub fn section_slots(&self, section_id: &SectionId) -> Vec<&ScheduledSlot> {
        self.slots.iter().filter(|s| &s.section_id == section_id).collect()
    }

    /// Slots taught by one faculty member
    pub fn faculty_slots(&self, faculty_id: &FacultyId) -> Vec<&ScheduledSlot> {
        self.slots.iter().filter(|s| &s.faculty_id == faculty_id).collect()
    }

    /// Periods scheduled per (section, subject) pair
    pub fn periods_by_course(&self) -> HashMap<(SectionId, SubjectId), u32> {
        let mut totals: HashMap<(SectionId, SubjectId), u32> = HashMap::new();
        for slot in &self.slots {
            *totals
                .entry((slot.section_id.clone(), slot.subject_id.clone()))
                .or_insert(0) += slot.span() as u32;
        }
        totals
    }

    /// Total scheduled periods across all slots
    pub fn total_periods(&self) -> u32 {
        self.slots.iter().map(|s| s.span() as u32).sum()
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new()
    }
}

/// Record of one period-reduction applied by the capacity fallback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReducedCourse {
    pub section_id: SectionId,
    pub subject_id: SubjectId,
    pub original: u8,
    pub new: u8,
}

/// A course instance that ended up short of its required periods
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissingCoverage {
    pub section_id: SectionId,
    pub subject_id: SubjectId,
    pub expected: u8,
    pub scheduled: u8,
}

/// Why a lab could not be placed by solver or greedy fallback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabFailure {
    pub section_id: SectionId,
    pub subject_id: SubjectId,
    /// Lab rooms passing the capacity rule
    pub suitable_rooms: usize,
    /// Declared availability windows of the assigned faculty
    pub availability_windows: usize,
    /// Lab-sized blocks those windows admit across the week
    pub admissible_blocks: usize,
}

/// Capacity and failure picture of a generation run, emitted on failure
/// or degraded success
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleDiagnostics {
    pub lab_rooms: usize,
    pub theory_rooms: usize,
    pub lab_blocks_needed: usize,
    pub lab_blocks_available: usize,
    /// Percentage
    pub lab_utilization: f64,
    pub theory_periods_needed: usize,
    pub theory_periods_available: usize,
    /// Percentage
    pub theory_utilization: f64,
    pub lab_failures: Vec<LabFailure>,
    pub theory_failures: Vec<MissingCoverage>,
    pub faculty_with_limited_availability: Vec<FacultyId>,
    pub reduced_courses: Vec<ReducedCourse>,
    pub best_strategy: Option<String>,
    /// Ranked, most impactful first
    pub suggestions: Vec<String>,
}

/// Everything a generation run hands back to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub schedule: Schedule,
    pub reduced_courses: Vec<ReducedCourse>,
    pub diagnostics: ScheduleDiagnostics,
    pub base_time_ms: u64,
}
