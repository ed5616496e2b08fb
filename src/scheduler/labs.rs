use super::priority::prioritize_labs;
use super::tracker::OccupancyTracker;
use super::CancelFlag;
use crate::solver::{
    availability_payload, course_payload, room_payload, LabRules, LabSolveRequest, SatSolver,
    SolvedAssignment,
};
use crate::types::{
    grid, AvailabilityWindow, CourseInstance, EngineConfig, Faculty, LabFailure, Room,
    ScheduledSlot, Section, SectionId, Subject, SubjectId,
};
use std::collections::{HashMap, HashSet};

/// Phase 1: place every lab course as one block.
///
/// The full lab set goes to the solver first. Whatever it could not or
/// did not place falls through to the deterministic greedy sweep; the
/// tracker re-validates every solver assignment, so a lying solver can
/// degrade the result but never corrupt it. Returns the labs that ended
/// up with no placement at all.
pub fn schedule_labs(
    labs: &[CourseInstance],
    sections: &[Section],
    subjects: &[Subject],
    faculty: &[Faculty],
    rooms: &[Room],
    windows: &[AvailabilityWindow],
    tracker: &mut OccupancyTracker,
    solver: &dyn SatSolver,
    config: &EngineConfig,
    cancel: &CancelFlag,
) -> Vec<LabFailure> {
    if labs.is_empty() {
        return Vec::new();
    }

    let lab_rooms: Vec<&Room> = rooms.iter().filter(|r| r.kind == crate::types::RoomKind::Lab).collect();
    let course_of: HashMap<(&SectionId, &SubjectId), &CourseInstance> = labs
        .iter()
        .map(|c| ((&c.section_id, &c.subject_id), c))
        .collect();

    let mut placed: HashSet<(SectionId, SubjectId)> = HashSet::new();

    // Cancellation aborts the solver leg, even mid-call; the greedy
    // fallback still runs so a complete result can be cancelled out
    // cleanly.
    if !cancel.is_cancelled() {
        let request = build_lab_request(labs, sections, subjects, faculty, &lab_rooms, windows, config);
        match solver.solve_labs(&request, cancel) {
            Ok(response) => {
                for assignment in &response.assignments {
                    if commit_solver_assignment(assignment, &course_of, tracker, config.lab_block) {
                        placed.insert((assignment.section_id.clone(), assignment.subject_id.clone()));
                    }
                }
            }
            // Unavailable or infeasible: the greedy sweep below takes the whole set
            Err(_) => {}
        }
    }

    // Greedy fallback for everything the solver leg left unplaced
    let order = prioritize_labs(labs, windows);
    let mut failures = Vec::new();
    for idx in order {
        let course = &labs[idx];
        if placed.contains(&(course.section_id.clone(), course.subject_id.clone())) {
            continue;
        }
        if greedy_place_lab(course, &lab_rooms, tracker, config.lab_block) {
            placed.insert((course.section_id.clone(), course.subject_id.clone()));
        } else {
            failures.push(describe_failure(course, &lab_rooms, windows, config.lab_block));
        }
    }
    failures
}

fn build_lab_request(
    labs: &[CourseInstance],
    sections: &[Section],
    subjects: &[Subject],
    faculty: &[Faculty],
    lab_rooms: &[&Room],
    windows: &[AvailabilityWindow],
    config: &EngineConfig,
) -> LabSolveRequest {
    let sections_by_id = sections.iter().map(|s| (&s.id, s)).collect();
    let faculty_by_id = faculty.iter().map(|f| (&f.id, f)).collect();
    let subjects_by_id = subjects.iter().map(|s| (&s.id, s)).collect();

    LabSolveRequest {
        courses: course_payload(labs, &sections_by_id, &faculty_by_id, &subjects_by_id, false),
        rooms: room_payload(lab_rooms),
        faculty_availability: availability_payload(windows),
        rules: LabRules {
            lab_periods: config.lab_block,
            days_per_week: grid::DAYS_PER_WEEK,
            periods_per_day: grid::PERIODS_PER_DAY,
        },
    }
}

/// Map one solver assignment back through the tracker; solver output is
/// untrusted input, so block shape, the Saturday rule and the daily
/// load cap are all re-checked here
fn commit_solver_assignment(
    assignment: &SolvedAssignment,
    course_of: &HashMap<(&SectionId, &SubjectId), &CourseInstance>,
    tracker: &mut OccupancyTracker,
    lab_block: u8,
) -> bool {
    let Some(&course) = course_of.get(&(&assignment.section_id, &assignment.subject_id)) else {
        return false;
    };
    let slot = ScheduledSlot {
        section_id: assignment.section_id.clone(),
        subject_id: assignment.subject_id.clone(),
        faculty_id: course.faculty_id.clone(),
        room_id: assignment.room_id.clone(),
        day: assignment.day,
        start_period: assignment.start_period,
        end_period: assignment.end_period,
    };
    grid::valid_slot(&slot)
        && slot.span() == lab_block
        && grid::saturday_allowed(slot.day, slot.start_period, true, course.year_level)
        && tracker.section_load_on(&slot.section_id, slot.day) + lab_block
            <= grid::MAX_SECTION_PERIODS_PER_DAY
        && tracker.try_commit(&slot).is_ok()
}

/// The deterministic sweep: first fitting (day, block, room) wins
fn greedy_place_lab(
    course: &CourseInstance,
    lab_rooms: &[&Room],
    tracker: &mut OccupancyTracker,
    lab_block: u8,
) -> bool {
    for day in 0..grid::DAYS_PER_WEEK {
        if tracker.section_load_on(&course.section_id, day) + lab_block
            > grid::MAX_SECTION_PERIODS_PER_DAY
        {
            continue;
        }
        for (start, end) in grid::lab_blocks(day, course.year_level, lab_block) {
            for room in lab_rooms {
                if !grid::fits_capacity(room.capacity, course.student_count, true) {
                    continue;
                }
                let slot = ScheduledSlot {
                    section_id: course.section_id.clone(),
                    subject_id: course.subject_id.clone(),
                    faculty_id: course.faculty_id.clone(),
                    room_id: room.id.clone(),
                    day,
                    start_period: start,
                    end_period: end,
                };
                if tracker.try_commit(&slot).is_ok() {
                    return true;
                }
            }
        }
    }
    false
}

fn describe_failure(
    course: &CourseInstance,
    lab_rooms: &[&Room],
    windows: &[AvailabilityWindow],
    lab_block: u8,
) -> LabFailure {
    let suitable_rooms = lab_rooms
        .iter()
        .filter(|r| grid::fits_capacity(r.capacity, course.student_count, true))
        .count();

    let own_windows: Vec<&AvailabilityWindow> = windows
        .iter()
        .filter(|w| w.faculty_id == course.faculty_id)
        .collect();

    // Lab-sized blocks the declared windows admit; unrestricted faculty
    // admit every candidate block of the week
    let admissible_blocks = (0..grid::DAYS_PER_WEEK)
        .flat_map(|day| grid::lab_blocks(day, course.year_level, lab_block).into_iter().map(move |b| (day, b)))
        .filter(|&(day, (start, end))| {
            own_windows.is_empty()
                || (start..=end).all(|p| own_windows.iter().any(|w| w.covers(day, p)))
        })
        .count();

    LabFailure {
        section_id: course.section_id.clone(),
        subject_id: course.subject_id.clone(),
        suitable_rooms,
        availability_windows: own_windows.len(),
        admissible_blocks,
    }
}
