use crate::types::{grid, AvailabilityWindow, CourseInstance, FacultyId, ReducedCourse, SectionId};
use std::collections::HashMap;

/// Pre-flight demand over supply for the theory pipeline, as a fraction
pub fn theory_utilization(theory: &[CourseInstance], theory_room_count: usize) -> f64 {
    let needed: u32 = theory.iter().map(|c| c.periods_per_week as u32).sum();
    if needed == 0 {
        return 0.0;
    }
    let available = theory_room_count * grid::TOTAL_GRID_SLOTS;
    if available == 0 {
        return f64::INFINITY;
    }
    needed as f64 / available as f64
}

/// The capacity fallback: trim exactly one 4-period theory course per
/// section down to 2 periods. Within a section the course whose faculty
/// declared the most availability windows goes first, as the easiest to
/// reschedule. One pass only; the caller decides whether the relief was
/// enough.
pub fn reduce_one_per_section(
    theory: &mut [CourseInstance],
    windows: &[AvailabilityWindow],
) -> Vec<ReducedCourse> {
    let mut windows_per_faculty: HashMap<&FacultyId, usize> = HashMap::new();
    for w in windows {
        *windows_per_faculty.entry(&w.faculty_id).or_insert(0) += 1;
    }

    let mut section_order: Vec<SectionId> = Vec::new();
    for c in theory.iter() {
        if !section_order.contains(&c.section_id) {
            section_order.push(c.section_id.clone());
        }
    }

    let mut reductions = Vec::new();
    for section_id in section_order {
        let pick = theory
            .iter()
            .enumerate()
            .filter(|(_, c)| c.section_id == section_id && c.periods_per_week >= 4)
            .max_by_key(|(i, c)| {
                (
                    windows_per_faculty.get(&c.faculty_id).copied().unwrap_or(0),
                    std::cmp::Reverse(*i),
                )
            })
            .map(|(i, _)| i);

        if let Some(i) = pick {
            let course = &mut theory[i];
            reductions.push(ReducedCourse {
                section_id: course.section_id.clone(),
                subject_id: course.subject_id.clone(),
                original: course.periods_per_week,
                new: 2,
            });
            course.periods_per_week = 2;
        }
    }
    reductions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SubjectId, SubjectKind};

    fn course(section: &str, subject: &str, faculty: &str, ppw: u8) -> CourseInstance {
        CourseInstance {
            section_id: SectionId(section.to_string()),
            subject_id: SubjectId(subject.to_string()),
            faculty_id: FacultyId(faculty.to_string()),
            kind: SubjectKind::Theory,
            periods_per_week: ppw,
            student_count: 40,
            year_level: 2,
        }
    }

    fn window(faculty: &str, day: u8) -> AvailabilityWindow {
        AvailabilityWindow {
            faculty_id: FacultyId(faculty.to_string()),
            day,
            start_period: 1,
            end_period: 8,
        }
    }

    #[test]
    fn test_utilization_ratio() {
        let theory = vec![course("a", "t1", "f1", 4), course("a", "t2", "f2", 4)];
        // 8 periods over 48
        assert!((theory_utilization(&theory, 1) - 8.0 / 48.0).abs() < 1e-9);
        assert_eq!(theory_utilization(&[], 1), 0.0);
        assert!(theory_utilization(&theory, 0).is_infinite());
    }

    #[test]
    fn test_one_reduction_per_section() {
        let mut theory = vec![
            course("a", "t1", "f1", 4),
            course("a", "t2", "f2", 4),
            course("b", "t1", "f1", 4),
            course("b", "t3", "f3", 2),
        ];
        let reductions = reduce_one_per_section(&mut theory, &[]);

        assert_eq!(reductions.len(), 2);
        assert!(reductions.iter().all(|r| r.original == 4 && r.new == 2));
        // Exactly one course per section was touched
        assert_eq!(theory.iter().filter(|c| c.periods_per_week == 2).count(), 3);
        // The 2-period course was never a candidate
        assert_eq!(theory[3].periods_per_week, 2);
    }

    #[test]
    fn test_prefers_most_windowed_faculty() {
        let mut theory = vec![course("a", "t1", "f1", 4), course("a", "t2", "f2", 4)];
        let windows = vec![window("f2", 0), window("f2", 1), window("f1", 0)];

        let reductions = reduce_one_per_section(&mut theory, &windows);
        assert_eq!(reductions.len(), 1);
        assert_eq!(reductions[0].subject_id.0, "t2");
        assert_eq!(theory[1].periods_per_week, 2);
        assert_eq!(theory[0].periods_per_week, 4);
    }

    #[test]
    fn test_sections_without_reducible_course_are_skipped() {
        let mut theory = vec![course("a", "t1", "f1", 2), course("a", "t2", "f2", 2)];
        let reductions = reduce_one_per_section(&mut theory, &[]);
        assert!(reductions.is_empty());
        assert!(theory.iter().all(|c| c.periods_per_week == 2));
    }
}
