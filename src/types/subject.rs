use super::SubjectId;
use serde::{Deserialize, Serialize};

/// Whether a subject needs a lab room and block scheduling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Theory,
    Lab,
}

impl SubjectKind {
    pub fn is_lab(&self) -> bool {
        matches!(self, SubjectKind::Lab)
    }
}

/// A subject taught to one or more sections
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub code: String,
    pub name: String,
    pub kind: SubjectKind,
    /// Periods this subject meets per week; labs meet as one block
    pub periods_per_week: u8,
}

impl Subject {
    pub fn is_lab(&self) -> bool {
        self.kind.is_lab()
    }
}
