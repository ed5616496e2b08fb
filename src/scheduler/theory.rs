use super::priority::{theory_difficulty, TheoryContext};
use super::tracker::OccupancyTracker;
use super::CancelFlag;
use crate::types::{grid, CourseInstance, EngineConfig, Room, RoomKind, ScheduledSlot};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;

/// Theory classes meet as 2-period blocks; a 1-period residual is never
/// placed
pub const THEORY_BLOCK: u8 = 2;
/// Extra theory periods a faculty may take on one day beyond the even
/// split of their weekly workload
const DAY_BALANCE_SLACK: u8 = 3;

/// (start, end) spans tried per day, morning-heavy; filtered to the
/// block length before use
const PREFERRED_SPANS: [(u8, u8); 12] = [
    (1, 2),
    (1, 3),
    (2, 3),
    (2, 4),
    (1, 4),
    (3, 4),
    (5, 6),
    (5, 7),
    (6, 7),
    (6, 8),
    (5, 8),
    (7, 8),
];

/// The closed set of course orderings the multi-start loop cycles
/// through. New strategies are additive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingStrategy {
    /// Sections grouped together, busiest-faculty sections and courses first
    SectionFirst,
    /// Fewest free slots per needed period first
    MostConstrained,
    /// One course per faculty per round, busiest faculty first
    FacultyRoundRobin,
    /// Difficulty score, hardest first
    Priority,
    ReverseSectionFirst,
    /// Seeded random permutation
    Shuffled(u64),
}

impl OrderingStrategy {
    pub fn label(&self) -> String {
        match self {
            OrderingStrategy::SectionFirst => "section-first".to_string(),
            OrderingStrategy::MostConstrained => "most-constrained".to_string(),
            OrderingStrategy::FacultyRoundRobin => "faculty-round-robin".to_string(),
            OrderingStrategy::Priority => "priority".to_string(),
            OrderingStrategy::ReverseSectionFirst => "reverse-section-first".to_string(),
            OrderingStrategy::Shuffled(salt) => format!("shuffle-{salt}"),
        }
    }

    /// Produce the order course indices are attempted in
    pub fn order(
        &self,
        courses: &[CourseInstance],
        ctx: &TheoryContext,
        tracker: &OccupancyTracker,
        seed: u64,
    ) -> Vec<usize> {
        match self {
            OrderingStrategy::SectionFirst => section_first(courses, ctx),
            OrderingStrategy::ReverseSectionFirst => {
                let mut order = section_first(courses, ctx);
                order.reverse();
                order
            }
            OrderingStrategy::MostConstrained => most_constrained(courses, tracker),
            OrderingStrategy::FacultyRoundRobin => faculty_round_robin(courses, ctx),
            OrderingStrategy::Priority => by_difficulty(courses, ctx),
            OrderingStrategy::Shuffled(salt) => {
                let mut order: Vec<usize> = (0..courses.len()).collect();
                let mut rng = StdRng::seed_from_u64(seed ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15));
                order.shuffle(&mut rng);
                order
            }
        }
    }
}

fn section_first(courses: &[CourseInstance], ctx: &TheoryContext) -> Vec<usize> {
    let mut section_weight: HashMap<&crate::types::SectionId, u32> = HashMap::new();
    for c in courses {
        *section_weight.entry(&c.section_id).or_insert(0) += ctx.workload(&c.faculty_id);
    }
    let mut order: Vec<usize> = (0..courses.len()).collect();
    order.sort_by_key(|&i| {
        let c = &courses[i];
        (
            std::cmp::Reverse(section_weight.get(&c.section_id).copied().unwrap_or(0)),
            c.section_id.clone(),
            std::cmp::Reverse(ctx.workload(&c.faculty_id)),
        )
    });
    order
}

fn most_constrained(courses: &[CourseInstance], tracker: &OccupancyTracker) -> Vec<usize> {
    let mut order: Vec<usize> = (0..courses.len()).collect();
    order.sort_by(|&a, &b| {
        let tightness = |i: usize| {
            let c = &courses[i];
            let free = tracker
                .faculty_free_total(&c.faculty_id)
                .min(tracker.section_free_total(&c.section_id));
            free as f64 / c.periods_per_week.max(1) as f64
        };
        tightness(a).total_cmp(&tightness(b))
    });
    order
}

fn faculty_round_robin(courses: &[CourseInstance], ctx: &TheoryContext) -> Vec<usize> {
    let mut by_faculty: Vec<(&crate::types::FacultyId, Vec<usize>)> = Vec::new();
    for (i, c) in courses.iter().enumerate() {
        match by_faculty.iter_mut().find(|(fid, _)| *fid == &c.faculty_id) {
            Some((_, list)) => list.push(i),
            None => by_faculty.push((&c.faculty_id, vec![i])),
        }
    }
    by_faculty.sort_by_key(|(fid, _)| std::cmp::Reverse(ctx.workload(fid)));

    let mut order = Vec::with_capacity(courses.len());
    let mut round = 0;
    loop {
        let mut any = false;
        for (_, list) in &by_faculty {
            if let Some(&idx) = list.get(round) {
                order.push(idx);
                any = true;
            }
        }
        if !any {
            break;
        }
        round += 1;
    }
    order
}

fn by_difficulty(courses: &[CourseInstance], ctx: &TheoryContext) -> Vec<usize> {
    let mut order: Vec<usize> = (0..courses.len()).collect();
    order.sort_by(|&a, &b| {
        theory_difficulty(&courses[b], ctx).total_cmp(&theory_difficulty(&courses[a], ctx))
    });
    order
}

/// One multi-start attempt: which ordering, and whether the
/// day-balancing cap is waived
#[derive(Debug, Clone, Copy)]
pub struct AttemptPlan {
    pub strategy: OrderingStrategy,
    pub relaxed: bool,
}

/// The attempt schedule: five deterministic orderings, five seeded
/// shuffles, then relaxed-mode repeats of the two strongest orderings
/// plus three more shuffles
pub fn attempt_plan(config: &EngineConfig) -> Vec<AttemptPlan> {
    let strict = [
        OrderingStrategy::SectionFirst,
        OrderingStrategy::MostConstrained,
        OrderingStrategy::FacultyRoundRobin,
        OrderingStrategy::Priority,
        OrderingStrategy::ReverseSectionFirst,
    ];
    let relaxed_lead = [OrderingStrategy::SectionFirst, OrderingStrategy::MostConstrained];

    (1..=config.multistart_attempts)
        .map(|n| {
            if n < config.relaxed_from_attempt {
                let strategy = strict
                    .get(n - 1)
                    .copied()
                    .unwrap_or(OrderingStrategy::Shuffled(n as u64));
                AttemptPlan { strategy, relaxed: false }
            } else {
                let offset = n - config.relaxed_from_attempt;
                let strategy = relaxed_lead
                    .get(offset)
                    .copied()
                    .unwrap_or(OrderingStrategy::Shuffled(n as u64));
                AttemptPlan { strategy, relaxed: true }
            }
        })
        .collect()
}

/// What the winning attempt achieved
#[derive(Debug, Clone)]
pub struct TheoryOutcome {
    pub strategy: String,
    pub attempt: usize,
    pub relaxed: bool,
    pub placed: u32,
    pub required: u32,
}

impl TheoryOutcome {
    pub fn ratio(&self) -> f64 {
        if self.required == 0 {
            1.0
        } else {
            self.placed as f64 / self.required as f64
        }
    }
}

/// Phase 2: multi-start greedy theory placement.
///
/// Restores the post-lab snapshot before each attempt, keeps the
/// attempt with the best coverage ratio, and leaves the tracker in that
/// winning state. Stops early on full coverage or cancellation.
pub fn run_multistart(
    theory: &[CourseInstance],
    rooms: &[Room],
    ctx: &TheoryContext,
    tracker: &mut OccupancyTracker,
    config: &EngineConfig,
    cancel: &CancelFlag,
) -> TheoryOutcome {
    let required: u32 = theory.iter().map(|c| c.periods_per_week as u32).sum();
    let theory_rooms: Vec<&Room> = rooms.iter().filter(|r| r.kind == RoomKind::Theory).collect();

    let mut best = TheoryOutcome {
        strategy: "none".to_string(),
        attempt: 0,
        relaxed: false,
        placed: 0,
        required,
    };
    if theory.is_empty() {
        return best;
    }

    let base = tracker.snapshot();
    let mut best_state = tracker.snapshot();

    for (i, plan) in attempt_plan(config).into_iter().enumerate() {
        if cancel.is_cancelled() {
            break;
        }
        tracker.restore(&base);

        let order = plan.strategy.order(theory, ctx, tracker, config.seed);
        let mut placed: u32 = 0;
        for idx in order {
            placed += place_course(&theory[idx], &theory_rooms, ctx, tracker, plan.relaxed) as u32;
        }

        if placed > best.placed || best.attempt == 0 {
            best = TheoryOutcome {
                strategy: plan.strategy.label(),
                attempt: i + 1,
                relaxed: plan.relaxed,
                placed,
                required,
            };
            best_state = tracker.snapshot();
            if placed >= required {
                break;
            }
        }
    }

    tracker.restore(&best_state);
    best
}

/// Place one theory course as 2-period blocks until its weekly quota is
/// met; returns the periods actually placed
pub fn place_course(
    course: &CourseInstance,
    theory_rooms: &[&Room],
    ctx: &TheoryContext,
    tracker: &mut OccupancyTracker,
    relaxed: bool,
) -> u8 {
    let workload = ctx.workload(&course.faculty_id);
    let day_cap = workload.div_ceil(grid::DAYS_PER_WEEK as u32) as u8 + DAY_BALANCE_SLACK;

    let mut placed: u8 = 0;
    while course.periods_per_week - placed >= THEORY_BLOCK {
        if !place_block(course, theory_rooms, tracker, day_cap, relaxed) {
            break;
        }
        placed += THEORY_BLOCK;
    }
    placed
}

fn place_block(
    course: &CourseInstance,
    theory_rooms: &[&Room],
    tracker: &mut OccupancyTracker,
    day_cap: u8,
    relaxed: bool,
) -> bool {
    // Even spreading: least-loaded days for this section and faculty first
    let mut days: Vec<u8> = (0..grid::DAYS_PER_WEEK).collect();
    days.sort_by_key(|&d| {
        tracker.section_load_on(&course.section_id, d) + tracker.faculty_load_on(&course.faculty_id, d)
    });

    for day in days {
        if tracker.section_load_on(&course.section_id, day) + THEORY_BLOCK
            > grid::MAX_SECTION_PERIODS_PER_DAY
        {
            continue;
        }
        if tracker.section_subject_load_on(&course.section_id, &course.subject_id, day)
            + THEORY_BLOCK
            > grid::MAX_THEORY_PERIODS_PER_DAY
        {
            continue;
        }
        if !relaxed
            && tracker.faculty_theory_load_on(&course.faculty_id, day) + THEORY_BLOCK > day_cap
        {
            continue;
        }

        for (start, end) in PREFERRED_SPANS {
            if end - start + 1 != THEORY_BLOCK {
                continue;
            }
            // Saturday afternoons never host theory
            if day == grid::SATURDAY && start >= grid::AFTERNOON_START {
                continue;
            }
            if !tracker.section_free(&course.section_id, day, start, end) {
                continue;
            }
            if !tracker.faculty_admits(&course.faculty_id, day, start, end) {
                continue;
            }

            for room in theory_rooms {
                if !grid::fits_capacity(room.capacity, course.student_count, false) {
                    continue;
                }
                if !tracker.room_admits(&room.id, day, start, end) {
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
