use super::{FacultyId, SectionId, SubjectId, SubjectKind};
use serde::{Deserialize, Serialize};

/// Input binding of one subject to one section with one faculty member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseBinding {
    pub section_id: SectionId,
    pub subject_id: SubjectId,
    pub faculty_id: FacultyId,
}

/// The unit the scheduler places: a section-subject-faculty triple with
/// everything joined in from the catalogues
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseInstance {
    pub section_id: SectionId,
    pub subject_id: SubjectId,
    pub faculty_id: FacultyId,
    pub kind: SubjectKind,
    pub periods_per_week: u8,
    pub student_count: u32,
    pub year_level: u8,
}

impl CourseInstance {
    pub fn is_lab(&self) -> bool {
        self.kind.is_lab()
    }
}
