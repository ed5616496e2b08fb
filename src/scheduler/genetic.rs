use super::CancelFlag;
use crate::types::{
    grid, AvailabilityWindow, FacultyId, GaConfig, Schedule, ScheduledSlot, Section, SectionId,
    Subject, SubjectId,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Mutation attempts before an operator gives up and keeps the parent
const MUTATION_RETRIES: usize = 10;
/// Fraction of slots nudged when seeding the initial population
const SEED_SHAKE: f64 = 0.10;

/// Immutable lookups the operators need to keep a chromosome legal
#[derive(Debug)]
pub struct GaContext {
    lab_subjects: HashSet<SubjectId>,
    year_by_section: HashMap<SectionId, u8>,
    /// Only faculty that declared windows appear here; the rest are
    /// unrestricted
    faculty_windows: HashMap<FacultyId, HashSet<(u8, u8)>>,
}

impl GaContext {
    pub fn new(subjects: &[Subject], sections: &[Section], windows: &[AvailabilityWindow]) -> Self {
        let mut faculty_windows: HashMap<FacultyId, HashSet<(u8, u8)>> = HashMap::new();
        for w in windows {
            let cells = faculty_windows.entry(w.faculty_id.clone()).or_default();
            for p in w.start_period..=w.end_period {
                cells.insert((w.day, p));
            }
        }
        Self {
            lab_subjects: subjects.iter().filter(|s| s.is_lab()).map(|s| s.id.clone()).collect(),
            year_by_section: sections.iter().map(|s| (s.id.clone(), s.year_level)).collect(),
            faculty_windows,
        }
    }

    fn is_lab(&self, subject_id: &SubjectId) -> bool {
        self.lab_subjects.contains(subject_id)
    }
}

/// Soft-constraint fitness in [0, 1]; the weighted sum of the five
/// quality terms
pub fn fitness(slots: &[ScheduledSlot], ctx: &GaContext, cfg: &GaConfig) -> f64 {
    let w = &cfg.weights;
    w.faculty_gaps * gap_score(slots, |s| &s.faculty_id.0)
        + w.student_gaps * gap_score(slots, |s| &s.section_id.0)
        + w.workload_balance * balance_score(slots)
        + w.morning_preference * morning_score(slots)
        + w.lab_compactness * lab_compactness_score(slots, ctx)
}

/// 1 minus the mean idle-gap fraction of per-(resource, day) timelines.
/// Ordered grouping keeps the floating sums identical across runs.
pub fn gap_score<'a, K, F>(slots: &'a [ScheduledSlot], key: F) -> f64
where
    K: Ord + ?Sized + 'a,
    F: Fn(&'a ScheduledSlot) -> &'a K,
{
    let mut days: BTreeMap<(&K, u8), std::collections::BTreeSet<u8>> = BTreeMap::new();
    for slot in slots {
        let periods = days.entry((key(slot), slot.day)).or_default();
        periods.extend(slot.periods());
    }
    if days.is_empty() {
        return 1.0;
    }

    let total_gap_fraction: f64 = days
        .values()
        .map(|periods| {
            let min = *periods.first().unwrap_or(&1);
            let max = *periods.last().unwrap_or(&1);
            let gap = (max - min + 1) as usize - periods.len();
            gap as f64 / grid::PERIODS_PER_DAY as f64
        })
        .sum();
    1.0 - total_gap_fraction / days.len() as f64
}

/// How evenly each faculty's load spreads over the week
pub fn balance_score(slots: &[ScheduledSlot]) -> f64 {
    let mut daily_load: BTreeMap<&FacultyId, [f64; grid::DAYS_PER_WEEK as usize]> = BTreeMap::new();
    for slot in slots {
        daily_load.entry(&slot.faculty_id).or_insert([0.0; 6])[slot.day as usize] +=
            slot.span() as f64;
    }
    if daily_load.is_empty() {
        return 1.0;
    }

    let mean_variance: f64 = daily_load
        .values()
        .map(|loads| {
            let mean = loads.iter().sum::<f64>() / loads.len() as f64;
            loads.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / loads.len() as f64
        })
        .sum::<f64>()
        / daily_load.len() as f64;
    (1.0 - mean_variance / 16.0).max(0.0)
}

/// Fraction of scheduled periods sitting in the morning half
pub fn morning_score(slots: &[ScheduledSlot]) -> f64 {
    let total: u32 = slots.iter().map(|s| s.span() as u32).sum();
    if total == 0 {
        return 1.0;
    }
    let morning: u32 = slots.iter().filter(|s| s.is_morning()).map(|s| s.span() as u32).sum();
    morning as f64 / total as f64
}

/// Labs early in the week score higher
pub fn lab_compactness_score(slots: &[ScheduledSlot], ctx: &GaContext) -> f64 {
    let labs: Vec<&ScheduledSlot> =
        slots.iter().filter(|s| ctx.is_lab(&s.subject_id)).collect();
    if labs.is_empty() {
        return 1.0;
    }
    labs.iter().map(|s| (5.0 - s.day as f64) / 5.0).sum::<f64>() / labs.len() as f64
}

/// Check whether `candidate` may replace the slot at `idx` without
/// breaking any hard invariant: structural legality, the Saturday rule,
/// faculty windows, pairwise conflicts, and the per-day caps.
fn placement_is_valid(
    slots: &[ScheduledSlot],
    idx: usize,
    candidate: &ScheduledSlot,
    ctx: &GaContext,
) -> bool {
    if !grid::valid_slot(candidate) {
        return false;
    }
    let is_lab = ctx.is_lab(&candidate.subject_id);
    let year = ctx.year_by_section.get(&candidate.section_id).copied().unwrap_or(1);
    if !grid::saturday_allowed(candidate.day, candidate.start_period, is_lab, year) {
        return false;
    }
    if let Some(cells) = ctx.faculty_windows.get(&candidate.faculty_id) {
        if !candidate.periods().all(|p| cells.contains(&(candidate.day, p))) {
            return false;
        }
    }

    let mut section_day_load = candidate.span();
    let mut subject_day_load = candidate.span();
    for (j, other) in slots.iter().enumerate() {
        if j == idx {
            continue;
        }
        if candidate.conflicts_with(other) {
            return false;
        }
        if other.section_id == candidate.section_id && other.day == candidate.day {
            section_day_load += other.span();
            if other.subject_id == candidate.subject_id {
                subject_day_load += other.span();
            }
        }
    }
    if section_day_load > grid::MAX_SECTION_PERIODS_PER_DAY {
        return false;
    }
    if !is_lab && subject_day_load > grid::MAX_THEORY_PERIODS_PER_DAY {
        return false;
    }
    true
}

/// Try to move one slot to a fresh (day, start) of the same length;
/// keeps the chromosome unchanged when no retry lands a legal move
fn mutate(slots: &mut [ScheduledSlot], ctx: &GaContext, rng: &mut StdRng) -> bool {
    if slots.is_empty() {
        return false;
    }
    let idx = rng.gen_range(0..slots.len());
    let span = slots[idx].span();

    for _ in 0..MUTATION_RETRIES {
        let day = rng.gen_range(0..grid::DAYS_PER_WEEK);
        let Some(start) = random_start(span, rng) else {
            return false;
        };
        let mut candidate = slots[idx].clone();
        candidate.day = day;
        candidate.start_period = start;
        candidate.end_period = start + span - 1;

        if placement_is_valid(slots, idx, &candidate, ctx) {
            slots[idx] = candidate;
            return true;
        }
    }
    false
}

/// A uniformly chosen legal start for a block of `span` periods,
/// respecting the lunch break
fn random_start(span: u8, rng: &mut StdRng) -> Option<u8> {
    let mut starts: Vec<u8> = Vec::new();
    if span <= grid::MORNING_END {
        starts.extend(1..=grid::MORNING_END + 1 - span);
        starts.extend(grid::AFTERNOON_START..=grid::PERIODS_PER_DAY + 1 - span);
    }
    if starts.is_empty() {
        return None;
    }
    Some(starts[rng.gen_range(0..starts.len())])
}

/// Single-point crossover. Past the point the child adopts the second
/// parent's placement for the same course wherever that stays legal.
fn crossover(
    parent1: &[ScheduledSlot],
    parent2: &[ScheduledSlot],
    ctx: &GaContext,
    rng: &mut StdRng,
) -> Vec<ScheduledSlot> {
    let mut child: Vec<ScheduledSlot> = parent1.to_vec();
    if child.len() < 2 {
        return child;
    }
    let point = rng.gen_range(1..child.len());
    for i in point..child.len() {
        let candidate = &parent2[i];
        if placement_is_valid(&child, i, candidate, ctx) {
            child[i] = candidate.clone();
        }
    }
    child
}

/// Tournament selection: best fitness among `size` random picks, ties
/// going to the earlier chromosome
fn tournament(fitnesses: &[f64], size: usize, rng: &mut StdRng) -> usize {
    let mut winner = rng.gen_range(0..fitnesses.len());
    for _ in 1..size {
        let challenger = rng.gen_range(0..fitnesses.len());
        if fitnesses[challenger] > fitnesses[winner] {
            winner = challenger;
        }
    }
    winner
}

/// Improve a feasible schedule's soft-constraint fitness without ever
/// breaking feasibility.
///
/// Every operator falls back to the parent when it cannot produce a
/// legal child, and the input schedule itself seeds the population, so
/// the returned fitness is never below the input's. Returns the best
/// chromosome observed across all generations.
pub fn optimize_schedule(
    schedule: &Schedule,
    ctx: &GaContext,
    cfg: &GaConfig,
    seed: u64,
    cancel: &CancelFlag,
) -> Schedule {
    let base = &schedule.slots;
    let mut result = schedule.clone();
    if base.is_empty() || cfg.population < 2 || cfg.generations == 0 {
        result.metadata.fitness = fitness(base, ctx, cfg);
        return result;
    }

    let mut rng = StdRng::seed_from_u64(seed);

    // Generation 0: the input verbatim plus shaken copies
    let mut population: Vec<Vec<ScheduledSlot>> = Vec::with_capacity(cfg.population);
    population.push(base.clone());
    while population.len() < cfg.population {
        let mut chromosome = base.clone();
        let shakes = ((base.len() as f64 * SEED_SHAKE).ceil() as usize).max(1);
        for _ in 0..shakes {
            mutate(&mut chromosome, ctx, &mut rng);
        }
        population.push(chromosome);
    }

    let mut fitnesses: Vec<f64> = population.iter().map(|c| fitness(c, ctx, cfg)).collect();

    let mut best = base.clone();
    let mut best_fitness = fitness(base, ctx, cfg);
    track_best(&population, &fitnesses, &mut best, &mut best_fitness);

    let elite_count = ((cfg.population as f64 * cfg.elite_fraction).round() as usize).max(1);

    for _ in 0..cfg.generations {
        if cancel.is_cancelled() {
            break;
        }

        let mut ranked: Vec<usize> = (0..population.len()).collect();
        ranked.sort_by(|&a, &b| fitnesses[b].total_cmp(&fitnesses[a]));

        let mut next: Vec<Vec<ScheduledSlot>> = ranked[..elite_count.min(ranked.len())]
            .iter()
            .map(|&i| population[i].clone())
            .collect();

        while next.len() < cfg.population {
            let p1 = tournament(&fitnesses, cfg.tournament_size, &mut rng);
            let p2 = tournament(&fitnesses, cfg.tournament_size, &mut rng);

            let mut child = if rng.gen_bool(cfg.crossover_rate) {
                crossover(&population[p1], &population[p2], ctx, &mut rng)
            } else {
                population[p1].clone()
            };
            if rng.gen_bool(cfg.mutation_rate) {
                mutate(&mut child, ctx, &mut rng);
            }
            next.push(child);
        }

        population = next;
        fitnesses = population.iter().map(|c| fitness(c, ctx, cfg)).collect();
        track_best(&population, &fitnesses, &mut best, &mut best_fitness);
    }

    result.slots = best;
    result.metadata.fitness = best_fitness;
    result
}

fn track_best(
    population: &[Vec<ScheduledSlot>],
    fitnesses: &[f64],
    best: &mut Vec<ScheduledSlot>,
    best_fitness: &mut f64,
) {
    for (chromosome, &f) in population.iter().zip(fitnesses) {
        if f > *best_fitness {
            *best = chromosome.clone();
            *best_fitness = f;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RoomId, SubjectKind};

    fn slot(section: &str, subject: &str, faculty: &str, room: &str, day: u8, start: u8, end: u8) -> ScheduledSlot {
        ScheduledSlot {
            section_id: SectionId(section.to_string()),
            subject_id: SubjectId(subject.to_string()),
            faculty_id: FacultyId(faculty.to_string()),
            room_id: RoomId(room.to_string()),
            day,
            start_period: start,
            end_period: end,
        }
    }

    fn ctx_with(labs: &[&str]) -> GaContext {
        let subjects: Vec<Subject> = labs
            .iter()
            .map(|&id| Subject {
                id: SubjectId(id.to_string()),
                code: id.to_uppercase(),
                name: id.to_string(),
                kind: SubjectKind::Lab,
                periods_per_week: 4,
            })
            .collect();
        let sections = vec![
            Section::new("sec-a", "A", 2, 40),
            Section::new("sec-b", "B", 2, 40),
        ];
        GaContext::new(&subjects, &sections, &[])
    }

    #[test]
    fn test_gap_score_penalizes_idle_middles() {
        // Faculty teaches periods 1-2 and 5-6 on one day: gap of 2
        let gappy = vec![
            slot("sec-a", "t1", "f1", "r1", 0, 1, 2),
            slot("sec-b", "t2", "f1", "r1", 0, 5, 6),
        ];
        let tight = vec![
            slot("sec-a", "t1", "f1", "r1", 0, 1, 2),
            slot("sec-b", "t2", "f1", "r1", 0, 3, 4),
        ];
        let gappy_score = gap_score(&gappy, |s| &s.faculty_id.0);
        let tight_score = gap_score(&tight, |s| &s.faculty_id.0);
        assert!(tight_score > gappy_score);
        assert!((tight_score - 1.0).abs() < 1e-9);
        assert!((gappy_score - (1.0 - 2.0 / 8.0)).abs() < 1e-9);
    }

    #[test]
    fn test_morning_and_compactness_scores() {
        let slots = vec![
            slot("sec-a", "phy-lab", "f1", "l1", 0, 1, 4),
            slot("sec-a", "t1", "f2", "r1", 1, 5, 6),
        ];
        let ctx = ctx_with(&["phy-lab"]);

        assert!((morning_score(&slots) - 4.0 / 6.0).abs() < 1e-9);
        // One lab on day 0 scores (5-0)/5 = 1
        assert!((lab_compactness_score(&slots, &ctx) - 1.0).abs() < 1e-9);
        assert!((lab_compactness_score(&[], &ctx) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_mutation_never_breaks_validity() {
        let base = vec![
            slot("sec-a", "t1", "f1", "r1", 0, 1, 2),
            slot("sec-a", "t2", "f2", "r1", 0, 3, 4),
            slot("sec-b", "t1", "f1", "r2", 1, 1, 2),
            slot("sec-b", "phy-lab", "f3", "l1", 2, 5, 8),
        ];
        let ctx = ctx_with(&["phy-lab"]);
        let mut rng = StdRng::seed_from_u64(7);

        for round in 0..200 {
            let mut chromosome = base.clone();
            mutate(&mut chromosome, &ctx, &mut rng);
            for (i, s) in chromosome.iter().enumerate() {
                assert!(grid::valid_slot(s), "round {round}: structurally broken slot");
                for (j, t) in chromosome.iter().enumerate() {
                    assert!(i == j || !s.conflicts_with(t), "round {round}: conflict introduced");
                }
            }
        }
    }

    #[test]
    fn test_optimizer_never_regresses() {
        // A deliberately gappy but valid schedule
        let slots = vec![
            slot("sec-a", "t1", "f1", "r1", 0, 1, 2),
            slot("sec-a", "t2", "f2", "r1", 0, 5, 6),
            slot("sec-a", "t1", "f1", "r1", 1, 7, 8),
            slot("sec-b", "t3", "f1", "r2", 2, 5, 6),
            slot("sec-b", "phy-lab", "f3", "l1", 4, 5, 8),
        ];
        let ctx = ctx_with(&["phy-lab"]);
        let cfg = GaConfig {
            population: 20,
            generations: 30,
            ..GaConfig::default()
        };

        let mut schedule = Schedule::new();
        schedule.slots = slots.clone();
        let before = fitness(&slots, &ctx, &cfg);

        let optimized = optimize_schedule(&schedule, &ctx, &cfg, 42, &CancelFlag::default());

        assert!(optimized.metadata.fitness >= before);
        assert_eq!(optimized.slots.len(), slots.len());
        // Same courses, possibly different placements
        for (a, b) in optimized.slots.iter().zip(&slots) {
            assert_eq!(a.section_id, b.section_id);
            assert_eq!(a.subject_id, b.subject_id);
            assert_eq!(a.span(), b.span());
        }
        // Still conflict-free
        for (i, s) in optimized.slots.iter().enumerate() {
            for (j, t) in optimized.slots.iter().enumerate() {
                assert!(i == j || !s.conflicts_with(t));
            }
        }
    }

    #[test]
    fn test_optimizer_is_deterministic_per_seed() {
        let slots = vec![
            slot("sec-a", "t1", "f1", "r1", 0, 1, 2),
            slot("sec-a", "t2", "f2", "r1", 0, 5, 6),
            slot("sec-b", "t1", "f1", "r2", 1, 5, 6),
        ];
        let ctx = ctx_with(&[]);
        let cfg = GaConfig {
            population: 10,
            generations: 10,
            ..GaConfig::default()
        };
        let mut schedule = Schedule::new();
        schedule.slots = slots;

        let a = optimize_schedule(&schedule, &ctx, &cfg, 1, &CancelFlag::default());
        let b = optimize_schedule(&schedule, &ctx, &cfg, 1, &CancelFlag::default());
        assert_eq!(a.slots, b.slots);
        assert_eq!(a.metadata.fitness, b.metadata.fitness);
    }
}
