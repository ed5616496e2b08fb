use crate::types::{grid, AvailabilityWindow, CourseInstance, FacultyId, SectionId};
use std::collections::HashMap;

/// Static lookups shared by the ordering heuristics. Built once per run
/// from the immutable inputs.
#[derive(Debug)]
pub struct TheoryContext {
    /// Total theory periods per week assigned to each faculty
    pub faculty_workload: HashMap<FacultyId, u32>,
    /// Theory courses carried by each section
    pub section_course_count: HashMap<SectionId, usize>,
    /// Declared windows per faculty
    pub window_count: HashMap<FacultyId, usize>,
    /// Periods per week the declared windows admit (full grid if none)
    pub window_slots: HashMap<FacultyId, usize>,
}

impl TheoryContext {
    pub fn new(theory: &[CourseInstance], windows: &[AvailabilityWindow]) -> Self {
        let mut faculty_workload: HashMap<FacultyId, u32> = HashMap::new();
        let mut section_course_count: HashMap<SectionId, usize> = HashMap::new();
        for c in theory {
            *faculty_workload.entry(c.faculty_id.clone()).or_insert(0) += c.periods_per_week as u32;
            *section_course_count.entry(c.section_id.clone()).or_insert(0) += 1;
        }

        let mut window_count: HashMap<FacultyId, usize> = HashMap::new();
        let mut window_slots: HashMap<FacultyId, usize> = HashMap::new();
        for w in windows {
            *window_count.entry(w.faculty_id.clone()).or_insert(0) += 1;
            *window_slots.entry(w.faculty_id.clone()).or_insert(0) += w.len() as usize;
        }

        Self {
            faculty_workload,
            section_course_count,
            window_count,
            window_slots,
        }
    }

    pub fn workload(&self, faculty_id: &FacultyId) -> u32 {
        self.faculty_workload.get(faculty_id).copied().unwrap_or(0)
    }

    /// Periods the faculty's windows admit; the whole grid when the
    /// faculty declared no windows
    pub fn available_slots(&self, faculty_id: &FacultyId) -> usize {
        self.window_slots
            .get(faculty_id)
            .copied()
            .unwrap_or(grid::TOTAL_GRID_SLOTS)
    }
}

/// Order lab courses hardest-first: sections dense with labs, then lower
/// year levels (year 1 keeps the Saturday-afternoon escape hatch), then
/// tighter faculty windows. Unrestricted faculty sort last.
pub fn prioritize_labs(labs: &[CourseInstance], windows: &[AvailabilityWindow]) -> Vec<usize> {
    let mut labs_per_section: HashMap<&SectionId, usize> = HashMap::new();
    for lab in labs {
        *labs_per_section.entry(&lab.section_id).or_insert(0) += 1;
    }
    let mut windows_per_faculty: HashMap<&FacultyId, usize> = HashMap::new();
    for w in windows {
        *windows_per_faculty.entry(&w.faculty_id).or_insert(0) += 1;
    }

    let mut order: Vec<usize> = (0..labs.len()).collect();
    order.sort_by_key(|&i| {
        let lab = &labs[i];
        let section_labs = labs_per_section.get(&lab.section_id).copied().unwrap_or(0);
        let faculty_windows = windows_per_faculty
            .get(&lab.faculty_id)
            .copied()
            .unwrap_or(usize::MAX);
        (std::cmp::Reverse(section_labs), lab.year_level, faculty_windows)
    });
    order
}

/// Weighted difficulty of placing one theory course; higher is harder
pub fn theory_difficulty(course: &CourseInstance, ctx: &TheoryContext) -> f64 {
    let available = ctx.available_slots(&course.faculty_id);
    let scarcity = grid::TOTAL_GRID_SLOTS.saturating_sub(available) as f64;
    let section_courses = ctx
        .section_course_count
        .get(&course.section_id)
        .copied()
        .unwrap_or(0) as f64;
    let year_bump = if course.year_level == 1 { 5.0 } else { 0.0 };

    course.periods_per_week as f64 * 10.0
        + course.student_count as f64 * 0.1
        + scarcity * 0.5
        + section_courses * 3.0
        + year_bump
        + ctx.workload(&course.faculty_id) as f64 * 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SubjectId, SubjectKind};

    fn course(section: &str, subject: &str, faculty: &str, kind: SubjectKind, ppw: u8, year: u8) -> CourseInstance {
        CourseInstance {
            section_id: SectionId(section.to_string()),
            subject_id: SubjectId(subject.to_string()),
            faculty_id: FacultyId(faculty.to_string()),
            kind,
            periods_per_week: ppw,
            student_count: 40,
            year_level: year,
        }
    }

    fn window(faculty: &str, day: u8, start: u8, end: u8) -> AvailabilityWindow {
        AvailabilityWindow {
            faculty_id: FacultyId(faculty.to_string()),
            day,
            start_period: start,
            end_period: end,
        }
    }

    #[test]
    fn test_lab_order_prefers_lab_heavy_sections_then_year() {
        let labs = vec![
            course("a", "lab1", "f1", SubjectKind::Lab, 4, 3),
            course("b", "lab2", "f2", SubjectKind::Lab, 4, 1),
            course("b", "lab3", "f3", SubjectKind::Lab, 4, 1),
            course("c", "lab4", "f4", SubjectKind::Lab, 4, 2),
        ];
        let order = prioritize_labs(&labs, &[]);
        // Section b has two labs, so its courses come first
        assert_eq!(&order[..2], &[1, 2]);
        // Year 2 before year 3 among the singles
        assert_eq!(&order[2..], &[3, 0]);
    }

    #[test]
    fn test_lab_order_puts_tight_windows_first() {
        let labs = vec![
            course("a", "lab1", "free", SubjectKind::Lab, 4, 2),
            course("b", "lab2", "tight", SubjectKind::Lab, 4, 2),
        ];
        let windows = vec![window("tight", 0, 1, 4)];
        let order = prioritize_labs(&labs, &windows);
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn test_difficulty_grows_with_load_and_scarcity() {
        let theory = vec![
            course("a", "t1", "busy", SubjectKind::Theory, 4, 2),
            course("a", "t2", "busy", SubjectKind::Theory, 4, 2),
            course("b", "t3", "idle", SubjectKind::Theory, 4, 2),
        ];
        let windows = vec![window("busy", 0, 1, 8)];
        let ctx = TheoryContext::new(&theory, &windows);

        let hard = theory_difficulty(&theory[0], &ctx);
        let easy = theory_difficulty(&theory[2], &ctx);
        assert!(hard > easy);
    }
}
