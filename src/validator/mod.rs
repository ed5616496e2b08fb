mod hard_constraints;
mod soft_constraints;

pub use hard_constraints::*;
pub use soft_constraints::*;

use crate::types::{ReducedCourse, Schedule, ScheduleInput, SubjectKind};
use std::collections::HashMap;

/// Result of schedule validation
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub hard_violations: Vec<Violation>,
    pub soft_scores: Vec<SoftScore>,
    /// 0-100; zero whenever any hard constraint is broken
    pub total_score: f64,
    pub statistics: ScheduleStatistics,
}

/// A constraint violation
#[derive(Debug, Clone)]
pub struct Violation {
    pub constraint: String,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Error,
    Warning,
}

/// Score for a soft constraint
#[derive(Debug, Clone)]
pub struct SoftScore {
    pub constraint: String,
    pub score: f64,
    pub max_score: f64,
    pub details: String,
}

/// Statistics about the schedule
#[derive(Debug, Clone)]
pub struct ScheduleStatistics {
    pub total_slots: usize,
    pub total_periods: u32,
    pub lab_slots: usize,
    pub theory_slots: usize,
    pub morning_periods: u32,
    pub reduced_count: usize,
}

/// Validate a complete schedule against every hard invariant and score
/// the soft terms
pub fn validate_schedule(
    schedule: &Schedule,
    input: &ScheduleInput,
    reduced: &[ReducedCourse],
) -> ValidationReport {
    let mut hard_violations = Vec::new();
    hard_violations.extend(check_resource_conflicts(schedule));
    hard_violations.extend(check_room_assignments(schedule, input));
    hard_violations.extend(check_block_structure(schedule, input));
    hard_violations.extend(check_saturday_rule(schedule, input));
    hard_violations.extend(check_faculty_availability(schedule, input));
    hard_violations.extend(check_theory_day_cap(schedule, input));
    hard_violations.extend(check_section_daily_load(schedule));
    hard_violations.extend(check_coverage(schedule, input, reduced));

    let soft_scores = calculate_soft_scores(schedule, input);
    let statistics = calculate_statistics(schedule, input, reduced);

    let total_score = if hard_violations.iter().any(|v| v.severity == Severity::Error) {
        0.0
    } else {
        let soft_total: f64 = soft_scores.iter().map(|s| s.score).sum();
        let soft_max: f64 = soft_scores.iter().map(|s| s.max_score).sum();
        if soft_max > 0.0 {
            (soft_total / soft_max) * 100.0
        } else {
            100.0
        }
    };

    ValidationReport {
        is_valid: hard_violations.iter().all(|v| v.severity != Severity::Error),
        hard_violations,
        soft_scores,
        total_score,
        statistics,
    }
}

fn calculate_statistics(
    schedule: &Schedule,
    input: &ScheduleInput,
    reduced: &[ReducedCourse],
) -> ScheduleStatistics {
    let kinds: HashMap<_, _> = input.subjects.iter().map(|s| (&s.id, s.kind)).collect();
    let lab_slots = schedule
        .slots
        .iter()
        .filter(|s| kinds.get(&s.subject_id) == Some(&SubjectKind::Lab))
        .count();

    ScheduleStatistics {
        total_slots: schedule.slots.len(),
        total_periods: schedule.total_periods(),
        lab_slots,
        theory_slots: schedule.slots.len() - lab_slots,
        morning_periods: schedule
            .slots
            .iter()
            .filter(|s| s.is_morning())
            .map(|s| s.span() as u32)
            .sum(),
        reduced_count: reduced.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        EngineConfig, Faculty, FacultyId, Room, RoomId, RoomKind, ScheduledSlot, Section,
        SectionId, Subject, SubjectId,
    };

    fn input_with_binding() -> ScheduleInput {
        ScheduleInput {
            sections: vec![Section::new("sec-a", "A", 2, 40)],
            subjects: vec![Subject {
                id: SubjectId("th1".to_string()),
                code: "TH1".to_string(),
                name: "Theory 1".to_string(),
                kind: SubjectKind::Theory,
                periods_per_week: 4,
            }],
            faculty: vec![Faculty {
                id: FacultyId("f1".to_string()),
                code: "F1".to_string(),
                name: String::new(),
            }],
            rooms: vec![Room {
                id: RoomId("r1".to_string()),
                name: "R1".to_string(),
                capacity: 60,
                kind: RoomKind::Theory,
            }],
            availability: Vec::new(),
            bindings: vec![crate::types::CourseBinding {
                section_id: SectionId("sec-a".to_string()),
                subject_id: SubjectId("th1".to_string()),
                faculty_id: FacultyId("f1".to_string()),
            }],
            config: EngineConfig::default(),
        }
    }

    fn slot(day: u8, start: u8, end: u8) -> ScheduledSlot {
        ScheduledSlot {
            section_id: SectionId("sec-a".to_string()),
            subject_id: SubjectId("th1".to_string()),
            faculty_id: FacultyId("f1".to_string()),
            room_id: RoomId("r1".to_string()),
            day,
            start_period: start,
            end_period: end,
        }
    }

    #[test]
    fn test_valid_schedule_scores_nonzero() {
        let input = input_with_binding();
        let mut schedule = Schedule::new();
        schedule.slots = vec![slot(0, 1, 2), slot(1, 1, 2)];

        let report = validate_schedule(&schedule, &input, &[]);
        assert!(report.is_valid, "{:?}", report.hard_violations);
        assert!(report.total_score > 0.0);
        assert_eq!(report.statistics.total_periods, 4);
        assert_eq!(report.statistics.theory_slots, 2);
    }

    #[test]
    fn test_conflicting_schedule_scores_zero() {
        let input = input_with_binding();
        let mut schedule = Schedule::new();
        schedule.slots = vec![slot(0, 1, 2), slot(0, 2, 3)];

        let report = validate_schedule(&schedule, &input, &[]);
        assert!(!report.is_valid);
        assert_eq!(report.total_score, 0.0);
    }

    #[test]
    fn test_whole_validation_matches_pairwise_rule() {
        // validate_whole and the validator agree on conflict-freeness
        let input = input_with_binding();
        let tracker = crate::scheduler::OccupancyTracker::new(
            &input.rooms,
            &input.faculty,
            &input.availability,
            &input.subjects,
        );

        let mut schedule = Schedule::new();
        schedule.slots = vec![slot(0, 1, 2), slot(1, 1, 2)];
        assert!(tracker.validate_whole(&schedule.slots).is_empty());
        assert!(check_resource_conflicts(&schedule).is_empty());

        schedule.slots = vec![slot(0, 1, 2), slot(0, 2, 3)];
        assert!(!tracker.validate_whole(&schedule.slots).is_empty());
        assert!(!check_resource_conflicts(&schedule).is_empty());
    }
}
