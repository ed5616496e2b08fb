use super::{
    FacultyAvailability, LabSolveRequest, SatSolver, SolveResponse, SolveStatus, SolvedAssignment,
    TheorySolveRequest,
};
use crate::error::SchedulerError;
use crate::scheduler::CancelFlag;
use crate::types::{grid, FacultyId, RoomId, SectionId};
use good_lp::solvers::highs::{HighsProblem, HighsSolution};
use good_lp::{constraint, variable, variables, Expression, Solution, SolverModel, Variable};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// Embedded ILP realization of both solver endpoints, backed by HiGHS.
///
/// Lab model: one boolean per (course, day, half-day block, room), an
/// exactly-one coverage constraint per course, at-most-one per resource
/// and block, minimizing seat slack. Theory model: one boolean per
/// (course, day, 2-period span, room) with block-count coverage and
/// per-period resource constraints against the existing assignments.
///
/// Each endpoint's deadline is installed as a HiGHS time limit, so the
/// solve itself stops at the deadline and reports whatever incumbent it
/// has; the call runs on a worker thread so cancellation can abort it
/// while it is in flight.
pub struct IlpSolver {
    lab_deadline: Duration,
    theory_deadline: Duration,
}

impl IlpSolver {
    pub fn new() -> Self {
        Self {
            lab_deadline: Duration::from_secs(60),
            theory_deadline: Duration::from_secs(30),
        }
    }
}

impl Default for IlpSolver {
    fn default() -> Self {
        Self::new()
    }
}

type Cell = (u8, u8);

/// Expand availability payloads into per-faculty cell sets. Faculty with
/// no entry are unrestricted and get no set at all.
fn availability_cells(payload: &[FacultyAvailability]) -> HashMap<FacultyId, HashSet<Cell>> {
    let mut cells: HashMap<FacultyId, HashSet<Cell>> = HashMap::new();
    for entry in payload {
        let set = cells.entry(entry.faculty_id.clone()).or_default();
        for w in &entry.slots {
            for p in w.start_period..=w.end_period {
                set.insert((w.day_of_week, p));
            }
        }
    }
    cells
}

fn range_available(
    cells: &HashMap<FacultyId, HashSet<Cell>>,
    faculty_id: &FacultyId,
    day: u8,
    start: u8,
    end: u8,
) -> bool {
    match cells.get(faculty_id) {
        Some(set) => (start..=end).all(|p| set.contains(&(day, p))),
        None => true,
    }
}

impl SatSolver for IlpSolver {
    fn solve_labs(
        &self,
        request: &LabSolveRequest,
        cancel: &CancelFlag,
    ) -> Result<SolveResponse, SchedulerError> {
        let started = Instant::now();
        let availability = availability_cells(&request.faculty_availability);
        let lab_periods = request.rules.lab_periods;

        let mut vars = variables!();
        // (course idx, day, half, room idx) -> decision variable
        let mut x: BTreeMap<(usize, u8, u8, usize), Variable> = BTreeMap::new();

        for (i, course) in request.courses.iter().enumerate() {
            for day in 0..request.rules.days_per_week {
                for (half, (start, end)) in half_day_blocks(lab_periods).into_iter().enumerate() {
                    if !grid::saturday_allowed(day, start, true, course.year_level) {
                        continue;
                    }
                    if !range_available(&availability, &course.faculty_id, day, start, end) {
                        continue;
                    }
                    for (r, room) in request.rooms.iter().enumerate() {
                        if !grid::fits_capacity(room.capacity, course.student_count, true) {
                            continue;
                        }
                        x.insert((i, day, half as u8, r), vars.add(variable().binary()));
                    }
                }
            }
        }

        // Minimize seat slack so large sections keep the big rooms
        let mut objective = Expression::default();
        for (&(i, _, _, r), &var) in &x {
            let slack =
                request.rooms[r].capacity.saturating_sub(request.courses[i].student_count) as f64;
            objective += slack * var;
        }

        let mut problem = vars
            .minimise(objective)
            .using(good_lp::solvers::highs::highs)
            .set_time_limit(self.lab_deadline.as_secs_f64());

        // Exactly one placement per lab course
        for (i, course) in request.courses.iter().enumerate() {
            let candidates: Vec<Variable> = x
                .iter()
                .filter(|((ci, _, _, _), _)| *ci == i)
                .map(|(_, &v)| v)
                .collect();
            if candidates.is_empty() {
                return Err(SchedulerError::SolverInfeasible(format!(
                    "lab {}/{} has no candidate (day, block, room)",
                    course.section_id, course.subject_id
                )));
            }
            let sum: Expression = candidates.into_iter().map(Expression::from).sum();
            problem = problem.with(constraint!(sum == 1));
        }

        // At most one course per (room, day, half)
        for r in 0..request.rooms.len() {
            problem = add_block_exclusions(problem, &x, request.rules.days_per_week, |key| {
                key.3 == r
            });
        }
        // No faculty or section in two rooms during one block
        let faculty_ids: HashSet<&FacultyId> =
            request.courses.iter().map(|c| &c.faculty_id).collect();
        for fid in faculty_ids {
            let members: HashSet<usize> = request
                .courses
                .iter()
                .enumerate()
                .filter(|(_, c)| &c.faculty_id == fid)
                .map(|(i, _)| i)
                .collect();
            problem = add_block_exclusions(problem, &x, request.rules.days_per_week, |key| {
                members.contains(&key.0)
            });
        }
        let section_ids: HashSet<&SectionId> =
            request.courses.iter().map(|c| &c.section_id).collect();
        for sid in section_ids {
            let members: HashSet<usize> = request
                .courses
                .iter()
                .enumerate()
                .filter(|(_, c)| &c.section_id == sid)
                .map(|(i, _)| i)
                .collect();
            problem = add_block_exclusions(problem, &x, request.rules.days_per_week, |key| {
                members.contains(&key.0)
            });

            // Daily load cap: only as many lab blocks per day as fit in
            // the section's period budget
            let per_day =
                (grid::MAX_SECTION_PERIODS_PER_DAY / lab_periods).max(1) as f64;
            for day in 0..request.rules.days_per_week {
                let day_vars: Vec<Variable> = x
                    .iter()
                    .filter(|(key, _)| key.1 == day && members.contains(&key.0))
                    .map(|(_, &v)| v)
                    .collect();
                if day_vars.len() > 1 {
                    let sum: Expression = day_vars.into_iter().map(Expression::from).sum();
                    problem = problem.with(constraint!(sum <= per_day));
                }
            }
        }

        let solution = match solve_abortable(problem, cancel) {
            None => {
                return Err(SchedulerError::SolverUnavailable(
                    "cancelled while the lab solve was in flight".to_string(),
                ))
            }
            Some(Ok(s)) => s,
            Some(Err(good_lp::ResolutionError::Infeasible)) => {
                return Err(SchedulerError::SolverInfeasible(
                    "lab placement model is infeasible".to_string(),
                ))
            }
            Some(Err(e)) if started.elapsed() >= self.lab_deadline => {
                // The time limit expired with no incumbent to hand back
                return Err(SchedulerError::SolverUnavailable(format!(
                    "lab solve hit the deadline with no partial result: {e:?}"
                )))
            }
            Some(Err(e)) => return Err(SchedulerError::SolverUnavailable(format!("{e:?}"))),
        };

        let assignments = x
            .iter()
            .filter(|(_, &var)| solution.value(var) > 0.5)
            .map(|(&(i, day, half, r), _)| {
                let (start, end) = half_day_blocks(lab_periods)[half as usize];
                SolvedAssignment {
                    section_id: request.courses[i].section_id.clone(),
                    subject_id: request.courses[i].subject_id.clone(),
                    day,
                    start_period: start,
                    end_period: end,
                    room_id: request.rooms[r].id.clone(),
                }
            })
            .collect();

        Ok(finish_response(assignments, started, self.lab_deadline))
    }

    fn solve_theory(
        &self,
        request: &TheorySolveRequest,
        cancel: &CancelFlag,
    ) -> Result<SolveResponse, SchedulerError> {
        let started = Instant::now();
        let availability = availability_cells(&request.faculty_availability);
        let block = request.rules.max_periods_per_block;

        // Cells already taken by prior (lab) assignments
        let mut faculty_taken: HashMap<&FacultyId, HashSet<Cell>> = HashMap::new();
        let mut section_taken: HashMap<&SectionId, HashSet<Cell>> = HashMap::new();
        let mut room_taken: HashMap<&RoomId, HashSet<Cell>> = HashMap::new();
        for a in &request.existing_assignments {
            for p in a.start_period..=a.end_period {
                faculty_taken.entry(&a.faculty_id).or_default().insert((a.day, p));
                section_taken.entry(&a.section_id).or_default().insert((a.day, p));
                room_taken.entry(&a.room_id).or_default().insert((a.day, p));
            }
        }

        let mut vars = variables!();
        // (course idx, day, start period, room idx) -> decision variable
        let mut x: BTreeMap<(usize, u8, u8, usize), Variable> = BTreeMap::new();

        for (i, course) in request.courses.iter().enumerate() {
            for day in 0..request.rules.days_per_week {
                for start in theory_starts(day, block) {
                    let end = start + block - 1;
                    if !range_available(&availability, &course.faculty_id, day, start, end) {
                        continue;
                    }
                    let blocked = |taken: Option<&HashSet<Cell>>| {
                        taken.is_some_and(|set| (start..=end).any(|p| set.contains(&(day, p))))
                    };
                    if blocked(faculty_taken.get(&course.faculty_id))
                        || blocked(section_taken.get(&course.section_id))
                    {
                        continue;
                    }
                    for (r, room) in request.rooms.iter().enumerate() {
                        if !grid::fits_capacity(room.capacity, course.student_count, false) {
                            continue;
                        }
                        if blocked(room_taken.get(&room.id)) {
                            continue;
                        }
                        x.insert((i, day, start, r), vars.add(variable().binary()));
                    }
                }
            }
        }

        // Prefer morning blocks
        let mut objective = Expression::default();
        for (&(_, _, start, _), &var) in &x {
            if start > grid::MORNING_END {
                objective += var;
            }
        }

        let mut problem = vars
            .minimise(objective)
            .using(good_lp::solvers::highs::highs)
            .set_time_limit(self.theory_deadline.as_secs_f64());

        // Coverage: the required number of blocks per course, at most one per day
        for (i, course) in request.courses.iter().enumerate() {
            let needed = (course.periods_per_week.unwrap_or(0) / block) as f64;
            let candidates: Vec<(u8, Variable)> = x
                .iter()
                .filter(|((ci, _, _, _), _)| *ci == i)
                .map(|(&(_, day, _, _), &v)| (day, v))
                .collect();
            if (candidates.len() as f64) < needed {
                return Err(SchedulerError::SolverInfeasible(format!(
                    "theory {}/{} has too few candidate blocks",
                    course.section_id, course.subject_id
                )));
            }
            let sum: Expression = candidates.iter().map(|&(_, v)| Expression::from(v)).sum();
            problem = problem.with(constraint!(sum == needed));

            let per_day = (request.rules.max_periods_per_day / block).max(1) as f64;
            for day in 0..request.rules.days_per_week {
                let day_vars: Vec<Variable> = candidates
                    .iter()
                    .filter(|&&(d, _)| d == day)
                    .map(|&(_, v)| v)
                    .collect();
                if day_vars.len() > 1 {
                    let sum: Expression = day_vars.into_iter().map(Expression::from).sum();
                    problem = problem.with(constraint!(sum <= per_day));
                }
            }
        }

        // Per-cell exclusivity for rooms, faculty and sections, and the
        // section daily load cap on top of existing periods
        problem = add_cell_exclusions(problem, request, &x, block);

        let solution = match solve_abortable(problem, cancel) {
            None => {
                return Err(SchedulerError::SolverUnavailable(
                    "cancelled while the theory solve was in flight".to_string(),
                ))
            }
            Some(Ok(s)) => s,
            Some(Err(good_lp::ResolutionError::Infeasible)) => {
                return Err(SchedulerError::SolverInfeasible(
                    "theory placement model is infeasible".to_string(),
                ))
            }
            Some(Err(e)) if started.elapsed() >= self.theory_deadline => {
                // The time limit expired with no incumbent to hand back
                return Err(SchedulerError::SolverUnavailable(format!(
                    "theory solve hit the deadline with no partial result: {e:?}"
                )))
            }
            Some(Err(e)) => return Err(SchedulerError::SolverUnavailable(format!("{e:?}"))),
        };

        let assignments = x
            .iter()
            .filter(|(_, &var)| solution.value(var) > 0.5)
            .map(|(&(i, day, start, r), _)| SolvedAssignment {
                section_id: request.courses[i].section_id.clone(),
                subject_id: request.courses[i].subject_id.clone(),
                day,
                start_period: start,
                end_period: start + block - 1,
                room_id: request.rooms[r].id.clone(),
            })
            .collect();

        Ok(finish_response(assignments, started, self.theory_deadline))
    }
}

/// Run the blocking HiGHS solve on a worker thread, polling the
/// cancellation flag from the caller. Returns None when cancellation
/// aborts the call; the orphaned worker finishes in the background and
/// its result is dropped.
fn solve_abortable(
    problem: HighsProblem,
    cancel: &CancelFlag,
) -> Option<Result<HighsSolution, good_lp::ResolutionError>> {
    if cancel.is_cancelled() {
        return None;
    }

    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let _ = tx.send(problem.solve());
    });

    loop {
        match rx.recv_timeout(Duration::from_millis(50)) {
            Ok(result) => return Some(result),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if cancel.is_cancelled() {
                    return None;
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Some(Err(good_lp::ResolutionError::Other("solver worker died")))
            }
        }
    }
}

/// Morning and afternoon lab blocks as inclusive ranges
fn half_day_blocks(lab_periods: u8) -> [(u8, u8); 2] {
    [
        (1, lab_periods),
        (grid::AFTERNOON_START, grid::AFTERNOON_START + lab_periods - 1),
    ]
}

/// Legal theory block starts on one day: both halves on weekdays,
/// morning only on Saturday
fn theory_starts(day: u8, block: u8) -> Vec<u8> {
    let mut starts: Vec<u8> = (1..=grid::MORNING_END + 1 - block).collect();
    if day != grid::SATURDAY {
        starts.extend(grid::AFTERNOON_START..=grid::PERIODS_PER_DAY + 1 - block);
    }
    starts
}

/// Add at-most-one-per-(day, half) constraints over the vars selected by
/// `belongs`, used for lab rooms, faculty and sections alike
fn add_block_exclusions<F>(
    mut problem: HighsProblem,
    x: &BTreeMap<(usize, u8, u8, usize), Variable>,
    days: u8,
    belongs: F,
) -> HighsProblem
where
    F: Fn(&(usize, u8, u8, usize)) -> bool,
{
    for day in 0..days {
        for half in 0..2u8 {
            let members: Vec<Variable> = x
                .iter()
                .filter(|(key, _)| key.1 == day && key.2 == half && belongs(key))
                .map(|(_, &v)| v)
                .collect();
            if members.len() > 1 {
                let sum: Expression = members.into_iter().map(Expression::from).sum();
                problem = problem.with(constraint!(sum <= 1));
            }
        }
    }
    problem
}

/// Per-(day, period) exclusivity for every room, faculty and section in
/// a theory request, plus the section daily load cap on top of existing
/// assignments
fn add_cell_exclusions(
    mut problem: HighsProblem,
    request: &TheorySolveRequest,
    x: &BTreeMap<(usize, u8, u8, usize), Variable>,
    block: u8,
) -> HighsProblem {
    let covers = |start: u8, p: u8| start <= p && p < start + block;

    for (r, _) in request.rooms.iter().enumerate() {
        for day in 0..request.rules.days_per_week {
            for p in 1..=request.rules.periods_per_day {
                let members: Vec<Variable> = x
                    .iter()
                    .filter(|(&(_, d, s, ri), _)| d == day && ri == r && covers(s, p))
                    .map(|(_, &v)| v)
                    .collect();
                if members.len() > 1 {
                    let sum: Expression = members.into_iter().map(Expression::from).sum();
                    problem = problem.with(constraint!(sum <= 1));
                }
            }
        }
    }

    let faculty_ids: HashSet<&FacultyId> = request.courses.iter().map(|c| &c.faculty_id).collect();
    for fid in faculty_ids {
        let members: HashSet<usize> = request
            .courses
            .iter()
            .enumerate()
            .filter(|(_, c)| &c.faculty_id == fid)
            .map(|(i, _)| i)
            .collect();
        for day in 0..request.rules.days_per_week {
            for p in 1..=request.rules.periods_per_day {
                let cell_vars: Vec<Variable> = x
                    .iter()
                    .filter(|(&(i, d, s, _), _)| d == day && members.contains(&i) && covers(s, p))
                    .map(|(_, &v)| v)
                    .collect();
                if cell_vars.len() > 1 {
                    let sum: Expression = cell_vars.into_iter().map(Expression::from).sum();
                    problem = problem.with(constraint!(sum <= 1));
                }
            }
        }
    }

    let mut existing_section_load: HashMap<(&SectionId, u8), u8> = HashMap::new();
    for a in &request.existing_assignments {
        *existing_section_load.entry((&a.section_id, a.day)).or_insert(0) +=
            a.end_period - a.start_period + 1;
    }
    let section_ids: HashSet<&SectionId> = request.courses.iter().map(|c| &c.section_id).collect();
    for sid in section_ids {
        let members: HashSet<usize> = request
            .courses
            .iter()
            .enumerate()
            .filter(|(_, c)| &c.section_id == sid)
            .map(|(i, _)| i)
            .collect();
        for day in 0..request.rules.days_per_week {
            for p in 1..=request.rules.periods_per_day {
                let cell_vars: Vec<Variable> = x
                    .iter()
                    .filter(|(&(i, d, s, _), _)| d == day && members.contains(&i) && covers(s, p))
                    .map(|(_, &v)| v)
                    .collect();
                if cell_vars.len() > 1 {
                    let sum: Expression = cell_vars.into_iter().map(Expression::from).sum();
                    problem = problem.with(constraint!(sum <= 1));
                }
            }

            let day_vars: Vec<Variable> = x
                .iter()
                .filter(|(&(i, d, _, _), _)| d == day && members.contains(&i))
                .map(|(_, &v)| v)
                .collect();
            if !day_vars.is_empty() {
                let existing = existing_section_load.get(&(sid, day)).copied().unwrap_or(0);
                let cap = (grid::MAX_SECTION_PERIODS_PER_DAY.saturating_sub(existing)) as f64;
                let load: Expression =
                    day_vars.into_iter().map(|v| (block as f64) * v).sum();
                problem = problem.with(constraint!(load <= cap));
            }
        }
    }

    problem
}

fn finish_response(
    assignments: Vec<SolvedAssignment>,
    started: Instant,
    deadline: Duration,
) -> SolveResponse {
    let elapsed = started.elapsed();
    SolveResponse {
        success: true,
        status: if elapsed > deadline {
            SolveStatus::Timeout
        } else {
            SolveStatus::Optimal
        },
        message: None,
        assignments,
        solve_time_ms: elapsed.as_millis() as u64,
    }
}
