use crate::types::{grid, ReducedCourse, Schedule, ScheduleInput, SubjectKind};
use crate::validator::{Severity, Violation};
use itertools::Itertools;
use std::collections::HashMap;

fn violation(constraint: &str, message: String) -> Violation {
    Violation {
        constraint: constraint.to_string(),
        message,
        severity: Severity::Error,
    }
}

/// No faculty, room or section may be in two places at once
pub fn check_resource_conflicts(schedule: &Schedule) -> Vec<Violation> {
    let mut violations = Vec::new();
    for (a, b) in schedule.slots.iter().tuple_combinations() {
        if !a.overlaps(b) {
            continue;
        }
        if a.faculty_id == b.faculty_id {
            violations.push(violation(
                "NoFacultyConflict",
                format!("Faculty '{}' double-booked: [{}] vs [{}]", a.faculty_id, a, b),
            ));
        }
        if a.room_id == b.room_id {
            violations.push(violation(
                "NoRoomConflict",
                format!("Room '{}' double-booked: [{}] vs [{}]", a.room_id, a, b),
            ));
        }
        if a.section_id == b.section_id {
            violations.push(violation(
                "NoSectionConflict",
                format!("Section '{}' double-booked: [{}] vs [{}]", a.section_id, a, b),
            ));
        }
    }
    violations
}

/// Room kind must match subject kind, and capacity must fit the section
/// (with the 15% lab slack)
pub fn check_room_assignments(schedule: &Schedule, input: &ScheduleInput) -> Vec<Violation> {
    let subjects: HashMap<_, _> = input.subjects.iter().map(|s| (&s.id, s)).collect();
    let sections: HashMap<_, _> = input.sections.iter().map(|s| (&s.id, s)).collect();
    let rooms: HashMap<_, _> = input.rooms.iter().map(|r| (&r.id, r)).collect();

    let mut violations = Vec::new();
    for slot in &schedule.slots {
        let (Some(subject), Some(section), Some(room)) = (
            subjects.get(&slot.subject_id),
            sections.get(&slot.section_id),
            rooms.get(&slot.room_id),
        ) else {
            violations.push(violation(
                "KnownReferences",
                format!("Slot references unknown catalogue entries: [{slot}]"),
            ));
            continue;
        };

        if !room.hosts(subject.kind) {
            violations.push(violation(
                "RoomTypeMatch",
                format!("{:?} subject '{}' in {:?} room '{}'", subject.kind, subject.id, room.kind, room.id),
            ));
        }
        if !grid::fits_capacity(room.capacity, section.student_count, subject.is_lab()) {
            violations.push(violation(
                "RoomCapacity",
                format!(
                    "Room '{}' (cap {}) too small for section '{}' ({} students)",
                    room.id, room.capacity, section.id, section.student_count
                ),
            ));
        }
    }
    violations
}

/// Lab slots span exactly the configured block inside one half-day; no
/// slot of any kind straddles lunch
pub fn check_block_structure(schedule: &Schedule, input: &ScheduleInput) -> Vec<Violation> {
    let subjects: HashMap<_, _> = input.subjects.iter().map(|s| (&s.id, s)).collect();
    let lab_block = input.config.lab_block;

    let mut violations = Vec::new();
    for slot in &schedule.slots {
        if !grid::valid_slot(slot) {
            violations.push(violation(
                "LunchIntegrity",
                format!("Slot crosses the lunch break or leaves the grid: [{slot}]"),
            ));
        }
        if subjects.get(&slot.subject_id).is_some_and(|s| s.is_lab()) && slot.span() != lab_block {
            violations.push(violation(
                "LabBlockSize",
                format!("Lab slot spans {} periods, expected {}: [{}]", slot.span(), lab_block, slot),
            ));
        }
    }
    violations
}

/// Saturday afternoon belongs to year-1 labs alone
pub fn check_saturday_rule(schedule: &Schedule, input: &ScheduleInput) -> Vec<Violation> {
    let subjects: HashMap<_, _> = input.subjects.iter().map(|s| (&s.id, s)).collect();
    let sections: HashMap<_, _> = input.sections.iter().map(|s| (&s.id, s)).collect();

    schedule
        .slots
        .iter()
        .filter(|slot| {
            let is_lab = subjects.get(&slot.subject_id).is_some_and(|s| s.is_lab());
            let year = sections.get(&slot.section_id).map(|s| s.year_level).unwrap_or(0);
            !grid::saturday_allowed(slot.day, slot.start_period, is_lab, year)
        })
        .map(|slot| {
            violation(
                "SaturdayHalfDay",
                format!("Saturday afternoon slot outside year-1 labs: [{slot}]"),
            )
        })
        .collect()
}

/// Every occupied period must sit inside a declared window, unless the
/// faculty declared none
pub fn check_faculty_availability(schedule: &Schedule, input: &ScheduleInput) -> Vec<Violation> {
    let mut violations = Vec::new();
    for slot in &schedule.slots {
        let windows: Vec<_> = input
            .availability
            .iter()
            .filter(|w| w.faculty_id == slot.faculty_id)
            .collect();
        if windows.is_empty() {
            continue;
        }
        for p in slot.periods() {
            if !windows.iter().any(|w| w.covers(slot.day, p)) {
                violations.push(violation(
                    "FacultyAvailability",
                    format!("Faculty '{}' scheduled outside windows: [{}]", slot.faculty_id, slot),
                ));
                break;
            }
        }
    }
    violations
}

/// At most two periods of one theory subject per section per day
pub fn check_theory_day_cap(schedule: &Schedule, input: &ScheduleInput) -> Vec<Violation> {
    let subjects: HashMap<_, _> = input.subjects.iter().map(|s| (&s.id, s)).collect();

    let mut totals: HashMap<(&_, &_, u8), u8> = HashMap::new();
    for slot in &schedule.slots {
        if subjects.get(&slot.subject_id).map(|s| s.kind) == Some(SubjectKind::Theory) {
            *totals.entry((&slot.section_id, &slot.subject_id, slot.day)).or_insert(0) +=
                slot.span();
        }
    }

    totals
        .into_iter()
        .filter(|(_, periods)| *periods > grid::MAX_THEORY_PERIODS_PER_DAY)
        .map(|((section, subject, day), periods)| {
            violation(
                "TheoryDayCap",
                format!(
                    "Section '{}' has {} periods of '{}' on {}",
                    section,
                    periods,
                    subject,
                    grid::day_name(day)
                ),
            )
        })
        .collect()
}

/// A section sits through at most six periods a day
pub fn check_section_daily_load(schedule: &Schedule) -> Vec<Violation> {
    let mut totals: HashMap<(&_, u8), u8> = HashMap::new();
    for slot in &schedule.slots {
        *totals.entry((&slot.section_id, slot.day)).or_insert(0) += slot.span();
    }

    totals
        .into_iter()
        .filter(|(_, periods)| *periods > grid::MAX_SECTION_PERIODS_PER_DAY)
        .map(|((section, day), periods)| {
            violation(
                "SectionDailyLoad",
                format!("Section '{}' has {} periods on {}", section, periods, grid::day_name(day)),
            )
        })
        .collect()
}

/// Scheduled periods must equal the (possibly reduced) weekly quota of
/// every bound course
pub fn check_coverage(
    schedule: &Schedule,
    input: &ScheduleInput,
    reduced: &[ReducedCourse],
) -> Vec<Violation> {
    let subjects: HashMap<_, _> = input.subjects.iter().map(|s| (&s.id, s)).collect();
    let reductions: HashMap<(&_, &_), u8> = reduced
        .iter()
        .map(|r| ((&r.section_id, &r.subject_id), r.new))
        .collect();
    let scheduled = schedule.periods_by_course();

    let mut violations = Vec::new();
    for binding in &input.bindings {
        let Some(subject) = subjects.get(&binding.subject_id) else {
            continue;
        };
        let expected = reductions
            .get(&(&binding.section_id, &binding.subject_id))
            .copied()
            .unwrap_or(subject.periods_per_week) as u32;
        let got = scheduled
            .get(&(binding.section_id.clone(), binding.subject_id.clone()))
            .copied()
            .unwrap_or(0);
        if got != expected {
            violations.push(violation(
                "Coverage",
                format!(
                    "Course {}/{} scheduled {} of {} periods",
                    binding.section_id, binding.subject_id, got, expected
                ),
            ));
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        EngineConfig, Faculty, FacultyId, Room, RoomId, RoomKind, ScheduledSlot, Section,
        SectionId, Subject, SubjectId,
    };

    fn base_input() -> ScheduleInput {
        ScheduleInput {
            sections: vec![Section::new("sec-a", "A", 2, 40)],
            subjects: vec![
                Subject {
                    id: SubjectId("th1".to_string()),
                    code: "TH1".to_string(),
                    name: "Theory 1".to_string(),
                    kind: SubjectKind::Theory,
                    periods_per_week: 4,
                },
                Subject {
                    id: SubjectId("lab1".to_string()),
                    code: "LAB1".to_string(),
                    name: "Lab 1".to_string(),
                    kind: SubjectKind::Lab,
                    periods_per_week: 4,
                },
            ],
            faculty: vec![Faculty {
                id: FacultyId("f1".to_string()),
                code: "F1".to_string(),
                name: String::new(),
            }],
            rooms: vec![
                Room {
                    id: RoomId("r1".to_string()),
                    name: "R1".to_string(),
                    capacity: 60,
                    kind: RoomKind::Theory,
                },
                Room {
                    id: RoomId("l1".to_string()),
                    name: "L1".to_string(),
                    capacity: 40,
                    kind: RoomKind::Lab,
                },
            ],
            availability: Vec::new(),
            bindings: Vec::new(),
            config: EngineConfig::default(),
        }
    }

    fn slot(subject: &str, room: &str, day: u8, start: u8, end: u8) -> ScheduledSlot {
        ScheduledSlot {
            section_id: SectionId("sec-a".to_string()),
            subject_id: SubjectId(subject.to_string()),
            faculty_id: FacultyId("f1".to_string()),
            room_id: RoomId(room.to_string()),
            day,
            start_period: start,
            end_period: end,
        }
    }

    fn schedule_of(slots: Vec<ScheduledSlot>) -> Schedule {
        let mut schedule = Schedule::new();
        schedule.slots = slots;
        schedule
    }

    #[test]
    fn test_detects_double_booking() {
        let schedule = schedule_of(vec![
            slot("th1", "r1", 0, 1, 2),
            slot("th1", "r1", 0, 2, 3),
        ]);
        let violations = check_resource_conflicts(&schedule);
        // Faculty, room and section all collide
        assert_eq!(violations.len(), 3);
    }

    #[test]
    fn test_detects_lab_in_theory_room() {
        let input = base_input();
        let schedule = schedule_of(vec![slot("lab1", "r1", 0, 1, 4)]);
        let violations = check_room_assignments(&schedule, &input);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].constraint, "RoomTypeMatch");
    }

    #[test]
    fn test_detects_wrong_lab_span_and_lunch_crossing() {
        let input = base_input();
        let schedule = schedule_of(vec![
            slot("lab1", "l1", 0, 1, 3),
            slot("th1", "r1", 1, 4, 5),
        ]);
        let violations = check_block_structure(&schedule, &input);
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn test_detects_saturday_theory_afternoon() {
        let input = base_input();
        let schedule = schedule_of(vec![slot("th1", "r1", 5, 5, 6)]);
        assert_eq!(check_saturday_rule(&schedule, &input).len(), 1);

        // Year-2 lab is just as illegal there
        let schedule = schedule_of(vec![slot("lab1", "l1", 5, 5, 8)]);
        assert_eq!(check_saturday_rule(&schedule, &input).len(), 1);
    }

    #[test]
    fn test_detects_window_violation() {
        let mut input = base_input();
        input.availability.push(crate::types::AvailabilityWindow {
            faculty_id: FacultyId("f1".to_string()),
            day: 0,
            start_period: 1,
            end_period: 4,
        });
        let schedule = schedule_of(vec![slot("th1", "r1", 0, 5, 6)]);
        assert_eq!(check_faculty_availability(&schedule, &input).len(), 1);

        let inside = schedule_of(vec![slot("th1", "r1", 0, 1, 2)]);
        assert!(check_faculty_availability(&inside, &input).is_empty());
    }

    #[test]
    fn test_detects_theory_day_cap_breach() {
        let input = base_input();
        let schedule = schedule_of(vec![
            slot("th1", "r1", 0, 1, 2),
            slot("th1", "r1", 0, 3, 4),
        ]);
        assert_eq!(check_theory_day_cap(&schedule, &input).len(), 1);
    }

    #[test]
    fn test_coverage_respects_reductions() {
        let mut input = base_input();
        input.bindings.push(crate::types::CourseBinding {
            section_id: SectionId("sec-a".to_string()),
            subject_id: SubjectId("th1".to_string()),
            faculty_id: FacultyId("f1".to_string()),
        });

        // Two periods scheduled against a quota of four
        let schedule = schedule_of(vec![slot("th1", "r1", 0, 1, 2)]);
        assert_eq!(check_coverage(&schedule, &input, &[]).len(), 1);

        // The same schedule is complete once the course was reduced
        let reduced = vec![ReducedCourse {
            section_id: SectionId("sec-a".to_string()),
            subject_id: SubjectId("th1".to_string()),
            original: 4,
            new: 2,
        }];
        assert!(check_coverage(&schedule, &input, &reduced).is_empty());
    }
}
