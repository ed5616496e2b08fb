use super::{RoomId, SubjectKind};
use serde::{Deserialize, Serialize};

/// Whether a room hosts theory classes or lab sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomKind {
    Theory,
    Lab,
}

/// Represents a physical room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub capacity: u32,
    pub kind: RoomKind,
}

impl Room {
    /// Check whether this room may host the given subject kind
    pub fn hosts(&self, kind: SubjectKind) -> bool {
        matches!(
            (self.kind, kind),
            (RoomKind::Theory, SubjectKind::Theory) | (RoomKind::Lab, SubjectKind::Lab)
        )
    }
}
