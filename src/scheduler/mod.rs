mod diagnostics;
mod genetic;
mod labs;
mod priority;
mod reduction;
mod theory;
mod tracker;

pub use diagnostics::*;
pub use genetic::*;
pub use labs::*;
pub use priority::*;
pub use reduction::*;
pub use theory::*;
pub use tracker::*;

use crate::error::SchedulerError;
use crate::solver::{
    availability_payload, course_payload, room_payload, ExistingAssignment, SatSolver,
    SolveResponse, TheoryRules, TheorySolveRequest,
};
use crate::types::{
    grid, CourseInstance, GenerationResult, MissingCoverage, ReducedCourse, RoomKind, Schedule,
    ScheduleInput, ScheduleMetadata, ScheduledSlot, SectionId, SubjectId,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Cooperative cancellation, observed between phases, between
/// multi-start attempts and between optimizer generations
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Main entry point for base-schedule generation.
///
/// Runs the lab phase (solver with greedy fallback), the pre-flight
/// capacity check with its one-shot period reduction, the multi-start
/// theory phase with its solver fallback, and a final whole-schedule
/// validation. Returns a fully covered, invariant-clean schedule or a
/// typed failure with diagnostics.
pub fn generate_schedule(
    input: &ScheduleInput,
    solver: &dyn SatSolver,
    cancel: &CancelFlag,
    quiet: bool,
) -> Result<GenerationResult, SchedulerError> {
    let start_time = Instant::now();

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb
    };

    progress.set_message("Joining course instances...");
    progress.set_position(5);
    let courses = build_course_instances(input)?;
    let (lab_courses, mut theory_courses): (Vec<_>, Vec<_>) =
        courses.into_iter().partition(CourseInstance::is_lab);

    if lab_courses.is_empty() && theory_courses.is_empty() {
        progress.finish_and_clear();
        return Ok(empty_result(start_time));
    }

    let mut tracker = OccupancyTracker::new(
        &input.rooms,
        &input.faculty,
        &input.availability,
        &input.subjects,
    );

    // Phase 1: labs through the solver, greedy for the remainder
    progress.set_message("Placing lab blocks...");
    progress.set_position(15);
    let lab_failures = schedule_labs(
        &lab_courses,
        &input.sections,
        &input.subjects,
        &input.faculty,
        &input.rooms,
        &input.availability,
        &mut tracker,
        solver,
        &input.config,
        cancel,
    );
    if !lab_failures.is_empty() {
        let diagnostics = build_diagnostics(
            &lab_courses,
            &theory_courses,
            &input.rooms,
            &input.availability,
            lab_failures.clone(),
            Vec::new(),
            Vec::new(),
            None,
        );
        return Err(SchedulerError::LabInfeasible {
            failures: lab_failures,
            diagnostics: Box::new(diagnostics),
        });
    }
    if cancel.is_cancelled() {
        return Err(SchedulerError::Cancelled);
    }

    // Pre-flight capacity check and the one-shot reduction pass
    progress.set_message("Checking theory capacity...");
    progress.set_position(35);
    let theory_room_count = input.rooms.iter().filter(|r| r.kind == RoomKind::Theory).count();
    let mut reduced: Vec<ReducedCourse> = Vec::new();
    if theory_utilization(&theory_courses, theory_room_count) > input.config.utilization_threshold {
        reduced = reduce_one_per_section(&mut theory_courses, &input.availability);
        if theory_utilization(&theory_courses, theory_room_count)
            > input.config.utilization_threshold
        {
            // One pass of relief was not enough; this does not cascade
            let missing = theory_courses
                .iter()
                .map(|c| MissingCoverage {
                    section_id: c.section_id.clone(),
                    subject_id: c.subject_id.clone(),
                    expected: c.periods_per_week,
                    scheduled: 0,
                })
                .collect::<Vec<_>>();
            let diagnostics = build_diagnostics(
                &lab_courses,
                &theory_courses,
                &input.rooms,
                &input.availability,
                Vec::new(),
                missing.clone(),
                reduced.clone(),
                None,
            );
            return Err(SchedulerError::CoverageShortfall {
                missing,
                diagnostics: Box::new(diagnostics),
            });
        }
    }

    // Phase 2: multi-start greedy theory placement
    progress.set_message("Multi-start theory placement...");
    progress.set_position(45);
    let ctx = TheoryContext::new(&theory_courses, &input.availability);
    let post_lab = tracker.snapshot();
    let mut outcome = run_multistart(
        &theory_courses,
        &input.rooms,
        &ctx,
        &mut tracker,
        &input.config,
        cancel,
    );

    // Phase 2B: hand the theory set to the solver when greedy coverage
    // stalls below the cutoff
    if outcome.ratio() < input.config.solver_fallback_cutoff && !cancel.is_cancelled() {
        progress.set_message("Theory solver fallback...");
        progress.set_position(70);
        let best_greedy = tracker.snapshot();
        let theory_backup = theory_courses.clone();
        let reduced_backup = reduced.clone();

        tracker.restore(&post_lab);
        match theory_solver_pass(
            &mut theory_courses,
            input,
            solver,
            &mut tracker,
            &mut reduced,
            cancel,
        ) {
            Ok(placed) if placed > outcome.placed => {
                outcome = TheoryOutcome {
                    strategy: "solver-fallback".to_string(),
                    attempt: 0,
                    relaxed: false,
                    placed,
                    required: theory_courses
                        .iter()
                        .map(|c| c.periods_per_week as u32)
                        .sum(),
                };
            }
            _ => {
                // Roll back the solver leg entirely, reductions included
                tracker.restore(&best_greedy);
                theory_courses = theory_backup;
                reduced = reduced_backup;
            }
        }
    }

    // Coverage: every course must meet its (possibly reduced) quota
    progress.set_message("Checking coverage...");
    progress.set_position(85);
    let missing = coverage_shortfall(&lab_courses, &theory_courses, tracker.committed_slots());
    if !missing.is_empty() {
        if cancel.is_cancelled() {
            return Err(SchedulerError::Cancelled);
        }
        let diagnostics = build_diagnostics(
            &lab_courses,
            &theory_courses,
            &input.rooms,
            &input.availability,
            Vec::new(),
            missing.clone(),
            reduced.clone(),
            Some(outcome.strategy.clone()),
        );
        return Err(SchedulerError::CoverageShortfall {
            missing,
            diagnostics: Box::new(diagnostics),
        });
    }

    // Phase 3: defensive whole-schedule validation
    progress.set_message("Validating...");
    progress.set_position(95);
    let conflicts = tracker.validate_whole(tracker.committed_slots());
    if !conflicts.is_empty() {
        return Err(SchedulerError::OverlapDetected { conflicts });
    }

    progress.finish_with_message("Schedule generated");

    let elapsed_ms = start_time.elapsed().as_millis() as u64;
    let schedule = Schedule {
        slots: tracker.committed_slots().to_vec(),
        metadata: ScheduleMetadata {
            generated_at: chrono::Utc::now().to_rfc3339(),
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            fitness: 0.0,
            coverage: 1.0,
            best_strategy: Some(outcome.strategy.clone()),
            base_time_ms: elapsed_ms,
        },
    };
    let diagnostics = build_diagnostics(
        &lab_courses,
        &theory_courses,
        &input.rooms,
        &input.availability,
        Vec::new(),
        Vec::new(),
        reduced.clone(),
        Some(outcome.strategy),
    );

    Ok(GenerationResult {
        schedule,
        reduced_courses: reduced,
        diagnostics,
        base_time_ms: elapsed_ms,
    })
}

/// Join bindings with the catalogues into placeable course instances.
/// The input tables are related by identifier only; dangling references
/// are an input error.
pub fn build_course_instances(
    input: &ScheduleInput,
) -> Result<Vec<CourseInstance>, SchedulerError> {
    let sections: HashMap<_, _> = input.sections.iter().map(|s| (&s.id, s)).collect();
    let subjects: HashMap<_, _> = input.subjects.iter().map(|s| (&s.id, s)).collect();
    let faculty: HashMap<_, _> = input.faculty.iter().map(|f| (&f.id, f)).collect();

    input
        .bindings
        .iter()
        .map(|b| {
            let section = sections.get(&b.section_id).ok_or_else(|| {
                SchedulerError::InvalidInput(format!("unknown section '{}'", b.section_id))
            })?;
            let subject = subjects.get(&b.subject_id).ok_or_else(|| {
                SchedulerError::InvalidInput(format!("unknown subject '{}'", b.subject_id))
            })?;
            if !faculty.contains_key(&b.faculty_id) {
                return Err(SchedulerError::InvalidInput(format!(
                    "unknown faculty '{}'",
                    b.faculty_id
                )));
            }
            Ok(CourseInstance {
                section_id: b.section_id.clone(),
                subject_id: b.subject_id.clone(),
                faculty_id: b.faculty_id.clone(),
                kind: subject.kind,
                periods_per_week: subject.periods_per_week,
                student_count: section.student_count,
                year_level: section.year_level,
            })
        })
        .collect()
}

fn empty_result(start_time: Instant) -> GenerationResult {
    let elapsed_ms = start_time.elapsed().as_millis() as u64;
    let mut schedule = Schedule::new();
    schedule.metadata.coverage = 1.0;
    schedule.metadata.base_time_ms = elapsed_ms;
    GenerationResult {
        schedule,
        reduced_courses: Vec::new(),
        diagnostics: Default::default(),
        base_time_ms: elapsed_ms,
    }
}

/// One solver pass over the full theory set, with a single
/// reduce-and-retry on an infeasible verdict. Returns committed periods.
fn theory_solver_pass(
    theory: &mut Vec<CourseInstance>,
    input: &ScheduleInput,
    solver: &dyn SatSolver,
    tracker: &mut OccupancyTracker,
    reduced: &mut Vec<ReducedCourse>,
    cancel: &CancelFlag,
) -> Result<u32, SchedulerError> {
    let request = build_theory_request(theory, input, tracker);
    match solver.solve_theory(&request, cancel) {
        Ok(response) => Ok(commit_theory_response(&response, theory, tracker)),
        Err(SchedulerError::SolverInfeasible(_)) if reduced.is_empty() => {
            reduced.extend(reduce_one_per_section(theory, &input.availability));
            let request = build_theory_request(theory, input, tracker);
            let response = solver.solve_theory(&request, cancel)?;
            Ok(commit_theory_response(&response, theory, tracker))
        }
        Err(e) => Err(e),
    }
}

fn build_theory_request(
    theory: &[CourseInstance],
    input: &ScheduleInput,
    tracker: &OccupancyTracker,
) -> TheorySolveRequest {
    let sections_by_id = input.sections.iter().map(|s| (&s.id, s)).collect();
    let faculty_by_id = input.faculty.iter().map(|f| (&f.id, f)).collect();
    let subjects_by_id = input.subjects.iter().map(|s| (&s.id, s)).collect();
    let theory_rooms: Vec<&crate::types::Room> = input
        .rooms
        .iter()
        .filter(|r| r.kind == RoomKind::Theory)
        .collect();

    TheorySolveRequest {
        courses: course_payload(theory, &sections_by_id, &faculty_by_id, &subjects_by_id, true),
        rooms: room_payload(&theory_rooms),
        faculty_availability: availability_payload(&input.availability),
        existing_assignments: tracker
            .committed_slots()
            .iter()
            .map(|s| ExistingAssignment {
                section_id: s.section_id.clone(),
                day: s.day,
                start_period: s.start_period,
                end_period: s.end_period,
                faculty_id: s.faculty_id.clone(),
                room_id: s.room_id.clone(),
            })
            .collect(),
        rules: TheoryRules {
            days_per_week: grid::DAYS_PER_WEEK,
            periods_per_day: grid::PERIODS_PER_DAY,
            max_periods_per_block: THEORY_BLOCK,
            max_periods_per_day: grid::MAX_THEORY_PERIODS_PER_DAY,
        },
    }
}

/// Replay solver assignments through the tracker; whatever fails
/// re-validation is dropped. The tracker covers double-booking and
/// availability, so the structural rules and the per-day caps are
/// re-checked here. Returns the periods actually committed.
fn commit_theory_response(
    response: &SolveResponse,
    theory: &[CourseInstance],
    tracker: &mut OccupancyTracker,
) -> u32 {
    let faculty_of: HashMap<(&SectionId, &SubjectId), &crate::types::FacultyId> = theory
        .iter()
        .map(|c| ((&c.section_id, &c.subject_id), &c.faculty_id))
        .collect();

    let mut committed = 0;
    for a in &response.assignments {
        let Some(&faculty_id) = faculty_of.get(&(&a.section_id, &a.subject_id)) else {
            continue;
        };
        let slot = ScheduledSlot {
            section_id: a.section_id.clone(),
            subject_id: a.subject_id.clone(),
            faculty_id: faculty_id.clone(),
            room_id: a.room_id.clone(),
            day: a.day,
            start_period: a.start_period,
            end_period: a.end_period,
        };
        let legal = grid::valid_slot(&slot)
            && grid::saturday_allowed(slot.day, slot.start_period, false, 0)
            && tracker.section_subject_load_on(&slot.section_id, &slot.subject_id, slot.day)
                + slot.span()
                <= grid::MAX_THEORY_PERIODS_PER_DAY
            && tracker.section_load_on(&slot.section_id, slot.day) + slot.span()
                <= grid::MAX_SECTION_PERIODS_PER_DAY;
        if legal && tracker.try_commit(&slot).is_ok() {
            committed += slot.span() as u32;
        }
    }
    committed
}

fn coverage_shortfall(
    labs: &[CourseInstance],
    theory: &[CourseInstance],
    slots: &[ScheduledSlot],
) -> Vec<MissingCoverage> {
    let mut scheduled: HashMap<(&SectionId, &SubjectId), u32> = HashMap::new();
    for s in slots {
        *scheduled.entry((&s.section_id, &s.subject_id)).or_insert(0) += s.span() as u32;
    }

    labs.iter()
        .chain(theory)
        .filter_map(|c| {
            let got = scheduled
                .get(&(&c.section_id, &c.subject_id))
                .copied()
                .unwrap_or(0);
            (got < c.periods_per_week as u32).then(|| MissingCoverage {
                section_id: c.section_id.clone(),
                subject_id: c.subject_id.clone(),
                expected: c.periods_per_week,
                scheduled: got as u8,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::OfflineSolver;
    use crate::types::{
        AvailabilityWindow, CourseBinding, EngineConfig, Faculty, FacultyId, Room, RoomId,
        Section, Subject, SubjectKind,
    };

    struct Fixture {
        input: ScheduleInput,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                input: ScheduleInput {
                    sections: Vec::new(),
                    subjects: Vec::new(),
                    faculty: Vec::new(),
                    rooms: Vec::new(),
                    availability: Vec::new(),
                    bindings: Vec::new(),
                    config: EngineConfig::default(),
                },
            }
        }

        fn section(mut self, id: &str, year: u8, students: u32) -> Self {
            self.input.sections.push(Section::new(id, id, year, students));
            self
        }

        fn subject(mut self, id: &str, kind: SubjectKind, ppw: u8) -> Self {
            self.input.subjects.push(Subject {
                id: SubjectId(id.to_string()),
                code: id.to_uppercase(),
                name: id.to_string(),
                kind,
                periods_per_week: ppw,
            });
            self
        }

        fn faculty(mut self, id: &str) -> Self {
            self.input.faculty.push(Faculty {
                id: FacultyId(id.to_string()),
                code: id.to_uppercase(),
                name: String::new(),
            });
            self
        }

        fn room(mut self, id: &str, kind: RoomKind, capacity: u32) -> Self {
            self.input.rooms.push(Room {
                id: RoomId(id.to_string()),
                name: id.to_string(),
                capacity,
                kind,
            });
            self
        }

        fn window(mut self, faculty: &str, day: u8, start: u8, end: u8) -> Self {
            self.input.availability.push(AvailabilityWindow {
                faculty_id: FacultyId(faculty.to_string()),
                day,
                start_period: start,
                end_period: end,
            });
            self
        }

        fn bind(mut self, section: &str, subject: &str, faculty: &str) -> Self {
            self.input.bindings.push(CourseBinding {
                section_id: SectionId(section.to_string()),
                subject_id: SubjectId(subject.to_string()),
                faculty_id: FacultyId(faculty.to_string()),
            });
            self
        }
    }

    fn generate(input: &ScheduleInput) -> Result<GenerationResult, SchedulerError> {
        generate_schedule(input, &OfflineSolver, &CancelFlag::default(), true)
    }

    #[test]
    fn test_empty_input_yields_empty_schedule() {
        let fx = Fixture::new();
        let result = generate(&fx.input).unwrap();
        assert!(result.schedule.slots.is_empty());
        assert!(result.reduced_courses.is_empty());
    }

    #[test]
    fn test_single_lab_lands_first_morning() {
        let fx = Fixture::new()
            .section("sec-a", 2, 40)
            .subject("phy-lab", SubjectKind::Lab, 4)
            .faculty("f1")
            .room("lab1", RoomKind::Lab, 50)
            .window("f1", 0, 1, 8)
            .bind("sec-a", "phy-lab", "f1");

        let result = generate(&fx.input).unwrap();
        assert_eq!(result.schedule.slots.len(), 1);
        let slot = &result.schedule.slots[0];
        assert_eq!((slot.day, slot.start_period, slot.end_period), (0, 1, 4));
    }

    #[test]
    fn test_lab_with_no_usable_window_is_infeasible() {
        // Year 2 section, faculty only free Saturday afternoon
        let fx = Fixture::new()
            .section("sec-a", 2, 40)
            .subject("phy-lab", SubjectKind::Lab, 4)
            .faculty("f1")
            .room("lab1", RoomKind::Lab, 50)
            .window("f1", 5, 5, 8)
            .bind("sec-a", "phy-lab", "f1");

        match generate(&fx.input) {
            Err(SchedulerError::LabInfeasible { failures, diagnostics }) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].admissible_blocks, 0);
                assert!(!diagnostics.suggestions.is_empty());
            }
            other => panic!("expected LabInfeasible, got {other:?}"),
        }
    }

    #[test]
    fn test_theory_day_cap_causes_shortfall() {
        // Four periods wanted, but the faculty exists on day 0 only and
        // one subject may take at most two periods a day
        let fx = Fixture::new()
            .section("sec-a", 2, 40)
            .subject("th1", SubjectKind::Theory, 4)
            .faculty("f1")
            .room("r1", RoomKind::Theory, 60)
            .window("f1", 0, 1, 8)
            .bind("sec-a", "th1", "f1");

        match generate(&fx.input) {
            Err(SchedulerError::CoverageShortfall { missing, .. }) => {
                assert_eq!(missing.len(), 1);
                assert_eq!(missing[0].expected, 4);
                assert_eq!(missing[0].scheduled, 2);
            }
            other => panic!("expected CoverageShortfall, got {other:?}"),
        }
    }

    #[test]
    fn test_one_period_theory_is_never_silently_dropped() {
        let fx = Fixture::new()
            .section("sec-a", 2, 40)
            .subject("th1", SubjectKind::Theory, 1)
            .faculty("f1")
            .room("r1", RoomKind::Theory, 60)
            .bind("sec-a", "th1", "f1");

        match generate(&fx.input) {
            Err(SchedulerError::CoverageShortfall { missing, .. }) => {
                assert_eq!(missing[0].scheduled, 0);
            }
            other => panic!("expected CoverageShortfall, got {other:?}"),
        }
    }

    #[test]
    fn test_full_run_covers_everything_and_reports_strategy() {
        let mut fx = Fixture::new()
            .room("r1", RoomKind::Theory, 60)
            .room("r2", RoomKind::Theory, 60)
            .room("lab1", RoomKind::Lab, 40);
        for (si, section) in ["sec-a", "sec-b"].into_iter().enumerate() {
            fx = fx.section(section, (si + 1) as u8, 40);
        }
        for subject in ["th1", "th2", "th3"] {
            fx = fx.subject(subject, SubjectKind::Theory, 4);
        }
        fx = fx.subject("phy-lab", SubjectKind::Lab, 4);
        for f in ["f1", "f2", "f3", "f4"] {
            fx = fx.faculty(f);
        }
        for section in ["sec-a", "sec-b"] {
            fx = fx
                .bind(section, "th1", "f1")
                .bind(section, "th2", "f2")
                .bind(section, "th3", "f3")
                .bind(section, "phy-lab", "f4");
        }

        let result = generate(&fx.input).unwrap();

        // 2 sections x (3 theory x 4 + one 4-period lab)
        assert_eq!(result.schedule.total_periods(), 32);
        assert!(result.diagnostics.best_strategy.is_some());
        assert_eq!(result.schedule.metadata.coverage, 1.0);
        assert!(result.reduced_courses.is_empty());

        // Labs in lab rooms, theory in theory rooms
        for slot in &result.schedule.slots {
            if slot.subject_id.0 == "phy-lab" {
                assert_eq!(slot.room_id.0, "lab1");
                assert_eq!(slot.span(), 4);
            } else {
                assert_ne!(slot.room_id.0, "lab1");
                assert_eq!(slot.span(), 2);
            }
        }
    }

    #[test]
    fn test_infeasible_solver_verdict_falls_back_to_greedy() {
        let fx = Fixture::new()
            .section("sec-a", 2, 40)
            .subject("phy-lab", SubjectKind::Lab, 4)
            .faculty("f1")
            .room("lab1", RoomKind::Lab, 50)
            .bind("sec-a", "phy-lab", "f1");

        let result = generate_schedule(
            &fx.input,
            &crate::solver::InfeasibleSolver,
            &CancelFlag::default(),
            true,
        )
        .unwrap();
        assert_eq!(result.schedule.slots.len(), 1);
        assert_eq!(result.schedule.slots[0].span(), 4);
    }

    #[test]
    fn test_preflight_reduction_trims_one_course_per_section() {
        // 42 of 48 periods on one room trips a 0.80 threshold; one
        // reduction per section brings the load back under it
        let mut fx = Fixture::new().room("r1", RoomKind::Theory, 60);
        fx.input.config.utilization_threshold = 0.80;

        for section in ["sec-a", "sec-b", "sec-c"] {
            fx = fx.section(section, 2, 40);
        }
        for (i, subject) in ["th1", "th2", "th3", "th4"].into_iter().enumerate() {
            let ppw = if i == 3 { 2 } else { 4 };
            fx = fx.subject(subject, SubjectKind::Theory, ppw);
        }
        for i in 0..4 {
            fx = fx.faculty(&format!("f{i}"));
        }
        for section in ["sec-a", "sec-b", "sec-c"] {
            for (i, subject) in ["th1", "th2", "th3", "th4"].into_iter().enumerate() {
                fx = fx.bind(section, subject, &format!("f{i}"));
            }
        }

        let result = generate(&fx.input).unwrap();

        assert_eq!(result.reduced_courses.len(), 3);
        assert!(result.reduced_courses.iter().all(|r| r.original == 4 && r.new == 2));
        // Coverage is against the reduced quotas: 3 sections x (2+4+4+2)
        assert_eq!(result.schedule.total_periods(), 36);
        assert_eq!(result.diagnostics.reduced_courses.len(), 3);
    }

    #[test]
    fn test_saturated_grid_fails_after_one_reduction_pass() {
        // 12 four-period subjects on one room: 48/48 before, 46/48
        // after the single allowed reduction; still over the threshold
        let mut fx = Fixture::new().room("r1", RoomKind::Theory, 60).section("sec-a", 2, 40);
        for i in 0..12 {
            fx = fx
                .subject(&format!("th{i}"), SubjectKind::Theory, 4)
                .faculty(&format!("f{i}"))
                .bind("sec-a", &format!("th{i}"), &format!("f{i}"));
        }

        match generate(&fx.input) {
            Err(SchedulerError::CoverageShortfall { missing, diagnostics }) => {
                assert!(!missing.is_empty());
                assert_eq!(diagnostics.reduced_courses.len(), 1);
            }
            other => panic!("expected CoverageShortfall, got {other:?}"),
        }
    }

    #[test]
    fn test_saturated_grid_with_nothing_reducible_fails() {
        // All subjects already at 2 periods: the reduction pass finds
        // no candidate and the run fails with empty reductions
        let mut fx = Fixture::new().room("r1", RoomKind::Theory, 60);
        for section in ["sec-a", "sec-b"] {
            fx = fx.section(section, 2, 40);
        }
        for i in 0..12 {
            fx = fx.subject(&format!("th{i}"), SubjectKind::Theory, 2).faculty(&format!("f{i}"));
        }
        for section in ["sec-a", "sec-b"] {
            for i in 0..12 {
                fx = fx.bind(section, &format!("th{i}"), &format!("f{i}"));
            }
        }

        match generate(&fx.input) {
            Err(SchedulerError::CoverageShortfall { diagnostics, .. }) => {
                assert!(diagnostics.reduced_courses.is_empty());
                assert!(diagnostics.theory_utilization > 95.0);
            }
            other => panic!("expected CoverageShortfall, got {other:?}"),
        }
    }

    #[test]
    fn test_cancelled_before_start_reports_cancelled() {
        let fx = Fixture::new()
            .section("sec-a", 2, 40)
            .subject("th1", SubjectKind::Theory, 4)
            .faculty("f1")
            .room("r1", RoomKind::Theory, 60)
            .bind("sec-a", "th1", "f1");

        let cancel = CancelFlag::default();
        cancel.cancel();
        match generate_schedule(&fx.input, &OfflineSolver, &cancel, true) {
            Err(SchedulerError::Cancelled) => {}
            other => panic!("expected Cancelled, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_binding_reference_is_rejected() {
        let fx = Fixture::new()
            .section("sec-a", 2, 40)
            .subject("th1", SubjectKind::Theory, 4)
            .faculty("f1")
            .room("r1", RoomKind::Theory, 60)
            .bind("sec-a", "ghost", "f1");

        match generate(&fx.input) {
            Err(SchedulerError::InvalidInput(msg)) => assert!(msg.contains("ghost")),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_generated_schedule_passes_whole_validation() {
        let fx = Fixture::new()
            .section("sec-a", 1, 30)
            .section("sec-b", 2, 30)
            .subject("th1", SubjectKind::Theory, 4)
            .subject("th2", SubjectKind::Theory, 2)
            .subject("lab1", SubjectKind::Lab, 4)
            .faculty("f1")
            .faculty("f2")
            .room("r1", RoomKind::Theory, 30)
            .room("l1", RoomKind::Lab, 30)
            .bind("sec-a", "th1", "f1")
            .bind("sec-a", "lab1", "f2")
            .bind("sec-b", "th1", "f1")
            .bind("sec-b", "th2", "f2");

        let result = generate(&fx.input).unwrap();
        let tracker = OccupancyTracker::new(
            &fx.input.rooms,
            &fx.input.faculty,
            &fx.input.availability,
            &fx.input.subjects,
        );
        assert!(tracker.validate_whole(&result.schedule.slots).is_empty());
    }
}
