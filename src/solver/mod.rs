//! The constraint-solver collaborator behind lab and theory placement.
//!
//! The generator talks to the solver only through [`SatSolver`] and the
//! request/response contract below, so the embedded ILP model can be
//! swapped for a remote service or a stub without touching the engine.
//! Solver output is untrusted: the generator re-validates every returned
//! assignment through the occupancy tracker before accepting it.

mod ilp;
mod stub;

pub use ilp::*;
pub use stub::*;

use crate::error::SchedulerError;
use crate::scheduler::CancelFlag;
use crate::types::{
    AvailabilityWindow, CourseInstance, Faculty, FacultyId, Room, RoomId, SectionId, SubjectId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One course instance in a solve request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRequest {
    pub section_id: SectionId,
    pub section_name: String,
    pub subject_id: SubjectId,
    pub subject_code: String,
    pub faculty_id: FacultyId,
    pub faculty_code: String,
    pub student_count: u32,
    pub year_level: u8,
    /// Only meaningful for theory requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periods_per_week: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRequest {
    pub id: RoomId,
    pub name: String,
    pub capacity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowRequest {
    pub day_of_week: u8,
    pub start_period: u8,
    pub end_period: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyAvailability {
    pub faculty_id: FacultyId,
    pub slots: Vec<WindowRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabRules {
    pub lab_periods: u8,
    pub days_per_week: u8,
    pub periods_per_day: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TheoryRules {
    pub days_per_week: u8,
    pub periods_per_day: u8,
    pub max_periods_per_block: u8,
    pub max_periods_per_day: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabSolveRequest {
    pub courses: Vec<CourseRequest>,
    pub rooms: Vec<RoomRequest>,
    pub faculty_availability: Vec<FacultyAvailability>,
    pub rules: LabRules,
}

/// A placement already on the grid that the theory solve must respect
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingAssignment {
    pub section_id: SectionId,
    pub day: u8,
    pub start_period: u8,
    pub end_period: u8,
    pub faculty_id: FacultyId,
    pub room_id: RoomId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TheorySolveRequest {
    pub courses: Vec<CourseRequest>,
    pub rooms: Vec<RoomRequest>,
    pub faculty_availability: Vec<FacultyAvailability>,
    pub existing_assignments: Vec<ExistingAssignment>,
    pub rules: TheoryRules,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
    Timeout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolvedAssignment {
    pub section_id: SectionId,
    pub subject_id: SubjectId,
    pub day: u8,
    pub start_period: u8,
    pub end_period: u8,
    pub room_id: RoomId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveResponse {
    pub success: bool,
    pub status: SolveStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub assignments: Vec<SolvedAssignment>,
    pub solve_time_ms: u64,
}

/// The replaceable solver collaborator.
///
/// Implementations must honor `cancel` while a solve is in flight:
/// raising the flag aborts the call, surfaced as
/// `Err(SolverUnavailable)`. That error also covers transport failures
/// and deadlines that expire with no partial result. An INFEASIBLE
/// verdict is raised as `Err(SolverInfeasible)` carrying the solver's
/// diagnostic; the generator maps both errors onto its fallback paths.
/// TIMEOUT with partial assignments is a success response with
/// whatever was found by the deadline.
pub trait SatSolver {
    fn solve_labs(
        &self,
        request: &LabSolveRequest,
        cancel: &CancelFlag,
    ) -> Result<SolveResponse, SchedulerError>;
    fn solve_theory(
        &self,
        request: &TheorySolveRequest,
        cancel: &CancelFlag,
    ) -> Result<SolveResponse, SchedulerError>;
}

/// Assemble availability payloads, one entry per faculty that declared
/// windows. Faculty with no entry are unrestricted.
pub fn availability_payload(windows: &[AvailabilityWindow]) -> Vec<FacultyAvailability> {
    let mut by_faculty: HashMap<&FacultyId, Vec<WindowRequest>> = HashMap::new();
    for w in windows {
        by_faculty.entry(&w.faculty_id).or_default().push(WindowRequest {
            day_of_week: w.day,
            start_period: w.start_period,
            end_period: w.end_period,
        });
    }
    let mut payload: Vec<FacultyAvailability> = by_faculty
        .into_iter()
        .map(|(faculty_id, slots)| FacultyAvailability {
            faculty_id: faculty_id.clone(),
            slots,
        })
        .collect();
    payload.sort_by(|a, b| a.faculty_id.cmp(&b.faculty_id));
    payload
}

/// Build course payloads from instances, joining codes from catalogues
pub fn course_payload(
    courses: &[CourseInstance],
    sections_by_id: &HashMap<&SectionId, &crate::types::Section>,
    faculty_by_id: &HashMap<&FacultyId, &Faculty>,
    subjects_by_id: &HashMap<&SubjectId, &crate::types::Subject>,
    with_periods: bool,
) -> Vec<CourseRequest> {
    courses
        .iter()
        .map(|c| CourseRequest {
            section_id: c.section_id.clone(),
            section_name: sections_by_id
                .get(&c.section_id)
                .map(|s| s.name.clone())
                .unwrap_or_default(),
            subject_id: c.subject_id.clone(),
            subject_code: subjects_by_id
                .get(&c.subject_id)
                .map(|s| s.code.clone())
                .unwrap_or_default(),
            faculty_id: c.faculty_id.clone(),
            faculty_code: faculty_by_id
                .get(&c.faculty_id)
                .map(|f| f.code.clone())
                .unwrap_or_default(),
            student_count: c.student_count,
            year_level: c.year_level,
            periods_per_week: with_periods.then_some(c.periods_per_week),
        })
        .collect()
}

pub fn room_payload(rooms: &[&Room]) -> Vec<RoomRequest> {
    rooms
        .iter()
        .map(|r| RoomRequest {
            id: r.id.clone(),
            name: r.name.clone(),
            capacity: r.capacity,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_uses_camel_case_wire_names() {
        let response = SolveResponse {
            success: true,
            status: SolveStatus::Optimal,
            message: None,
            assignments: vec![SolvedAssignment {
                section_id: SectionId("s1".to_string()),
                subject_id: SubjectId("phy".to_string()),
                day: 0,
                start_period: 1,
                end_period: 4,
                room_id: RoomId("lab1".to_string()),
            }],
            solve_time_ms: 12,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"sectionId\""));
        assert!(json.contains("\"startPeriod\""));
        assert!(json.contains("\"solveTimeMs\""));
        assert!(json.contains("\"OPTIMAL\""));
    }

    #[test]
    fn test_availability_payload_groups_windows() {
        let windows = vec![
            AvailabilityWindow {
                faculty_id: FacultyId("f1".to_string()),
                day: 0,
                start_period: 1,
                end_period: 4,
            },
            AvailabilityWindow {
                faculty_id: FacultyId("f1".to_string()),
                day: 2,
                start_period: 5,
                end_period: 8,
            },
            AvailabilityWindow {
                faculty_id: FacultyId("f0".to_string()),
                day: 1,
                start_period: 1,
                end_period: 8,
            },
        ];
        let payload = availability_payload(&windows);
        assert_eq!(payload.len(), 2);
        assert_eq!(payload[0].faculty_id.0, "f0");
        assert_eq!(payload[1].slots.len(), 2);
    }
}
