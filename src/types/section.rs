use super::SectionId;
use serde::{Deserialize, Serialize};

/// A cohort of students that attends classes together
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub name: String,
    /// Year of study, 1 through 4
    pub year_level: u8,
    pub student_count: u32,
}

impl Section {
    pub fn new(id: &str, name: &str, year_level: u8, student_count: u32) -> Self {
        Self {
            id: SectionId(id.to_string()),
            name: name.to_string(),
            year_level,
            student_count,
        }
    }
}
