use crate::types::{
    grid, AvailabilityWindow, CourseInstance, FacultyId, LabFailure, MissingCoverage,
    ReducedCourse, Room, RoomKind, ScheduleDiagnostics,
};
use std::collections::HashMap;

/// Windows admitting fewer weekly periods than this mark a faculty as
/// availability-limited in diagnostics
const LIMITED_AVAILABILITY_PERIODS: usize = 16;

/// Assemble the capacity-and-failure picture handed back with every
/// degraded or failed run
pub fn build_diagnostics(
    labs: &[CourseInstance],
    theory: &[CourseInstance],
    rooms: &[Room],
    windows: &[AvailabilityWindow],
    lab_failures: Vec<LabFailure>,
    theory_failures: Vec<MissingCoverage>,
    reduced_courses: Vec<ReducedCourse>,
    best_strategy: Option<String>,
) -> ScheduleDiagnostics {
    let lab_rooms = rooms.iter().filter(|r| r.kind == RoomKind::Lab).count();
    let theory_rooms = rooms.iter().filter(|r| r.kind == RoomKind::Theory).count();

    let lab_blocks_needed = labs.len();
    // Two half-day blocks per lab room per day
    let lab_blocks_available = lab_rooms * grid::DAYS_PER_WEEK as usize * 2;
    let lab_utilization = percentage(lab_blocks_needed, lab_blocks_available);

    let theory_periods_needed: usize =
        theory.iter().map(|c| c.periods_per_week as usize).sum();
    let theory_periods_available = theory_rooms * grid::TOTAL_GRID_SLOTS;
    let theory_utilization = percentage(theory_periods_needed, theory_periods_available);

    let faculty_with_limited_availability = limited_faculty(windows);

    let suggestions = rank_suggestions(
        lab_utilization,
        theory_utilization,
        &lab_failures,
        &theory_failures,
        &faculty_with_limited_availability,
        &reduced_courses,
    );

    ScheduleDiagnostics {
        lab_rooms,
        theory_rooms,
        lab_blocks_needed,
        lab_blocks_available,
        lab_utilization,
        theory_periods_needed,
        theory_periods_available,
        theory_utilization,
        lab_failures,
        theory_failures,
        faculty_with_limited_availability,
        reduced_courses,
        best_strategy,
        suggestions,
    }
}

fn percentage(needed: usize, available: usize) -> f64 {
    if available == 0 {
        if needed == 0 {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        needed as f64 / available as f64 * 100.0
    }
}

fn limited_faculty(windows: &[AvailabilityWindow]) -> Vec<FacultyId> {
    let mut periods_per_faculty: HashMap<&FacultyId, usize> = HashMap::new();
    for w in windows {
        *periods_per_faculty.entry(&w.faculty_id).or_insert(0) += w.len() as usize;
    }
    let mut limited: Vec<FacultyId> = periods_per_faculty
        .into_iter()
        .filter(|(_, periods)| *periods < LIMITED_AVAILABILITY_PERIODS)
        .map(|(fid, _)| fid.clone())
        .collect();
    limited.sort();
    limited
}

fn rank_suggestions(
    lab_utilization: f64,
    theory_utilization: f64,
    lab_failures: &[LabFailure],
    theory_failures: &[MissingCoverage],
    limited_faculty: &[FacultyId],
    reduced: &[ReducedCourse],
) -> Vec<String> {
    let mut suggestions = Vec::new();

    if lab_utilization > 80.0 || lab_failures.iter().any(|f| f.suitable_rooms == 0) {
        suggestions.push(format!(
            "Add lab rooms or enlarge existing ones (lab block utilization {lab_utilization:.0}%)"
        ));
    }
    if theory_utilization > 80.0 {
        suggestions.push(format!(
            "Add theory rooms (period utilization {theory_utilization:.0}%)"
        ));
    }
    if !limited_faculty.is_empty() {
        suggestions.push(format!(
            "Extend availability for {} faculty with narrow windows ({})",
            limited_faculty.len(),
            limited_faculty
                .iter()
                .map(|f| f.0.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    if lab_failures.iter().any(|f| f.admissible_blocks == 0 && f.suitable_rooms > 0) {
        suggestions.push(
            "Some lab faculty have no window wide enough for a full lab block".to_string(),
        );
    }
    if !theory_failures.is_empty() || !reduced.is_empty() {
        suggestions.push(
            "Reduce weekly periods of elective theory subjects to relieve the grid".to_string(),
        );
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RoomId, SectionId, SubjectId, SubjectKind};

    #[test]
    fn test_utilization_percentages() {
        let rooms = vec![
            Room {
                id: RoomId("l1".to_string()),
                name: "L1".to_string(),
                capacity: 40,
                kind: RoomKind::Lab,
            },
            Room {
                id: RoomId("r1".to_string()),
                name: "R1".to_string(),
                capacity: 60,
                kind: RoomKind::Theory,
            },
        ];
        let labs = vec![CourseInstance {
            section_id: SectionId("a".to_string()),
            subject_id: SubjectId("lab".to_string()),
            faculty_id: FacultyId("f1".to_string()),
            kind: SubjectKind::Lab,
            periods_per_week: 4,
            student_count: 40,
            year_level: 1,
        }];
        let theory = vec![CourseInstance {
            section_id: SectionId("a".to_string()),
            subject_id: SubjectId("th".to_string()),
            faculty_id: FacultyId("f1".to_string()),
            kind: SubjectKind::Theory,
            periods_per_week: 12,
            student_count: 40,
            year_level: 1,
        }];

        let d = build_diagnostics(&labs, &theory, &rooms, &[], vec![], vec![], vec![], None);
        assert_eq!(d.lab_rooms, 1);
        assert_eq!(d.theory_rooms, 1);
        assert_eq!(d.lab_blocks_available, 12);
        assert!((d.lab_utilization - 100.0 / 12.0).abs() < 1e-9);
        assert_eq!(d.theory_periods_available, 48);
        assert!((d.theory_utilization - 25.0).abs() < 1e-9);
        assert!(d.suggestions.is_empty());
    }

    #[test]
    fn test_limited_faculty_and_suggestions() {
        let windows = vec![AvailabilityWindow {
            faculty_id: FacultyId("narrow".to_string()),
            day: 0,
            start_period: 1,
            end_period: 4,
        }];
        let d = build_diagnostics(&[], &[], &[], &windows, vec![], vec![], vec![], None);
        assert_eq!(d.faculty_with_limited_availability.len(), 1);
        assert!(d.suggestions.iter().any(|s| s.contains("narrow")));
    }
}
