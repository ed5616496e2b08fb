use crate::types::{grid, GenerationResult, ScheduleInput, SubjectId};
use crate::validator::ValidationReport;
use std::collections::HashMap;

/// Render the schedule as a markdown document: one weekly grid per
/// section, the faculty load table, reductions and quality scores
pub fn generate_markdown_report(
    result: &GenerationResult,
    input: &ScheduleInput,
    validation: &ValidationReport,
) -> String {
    let schedule = &result.schedule;
    let codes: HashMap<&SubjectId, &str> = input
        .subjects
        .iter()
        .map(|s| (&s.id, s.code.as_str()))
        .collect();

    let mut lines = vec![
        "# Weekly Timetable".to_string(),
        String::new(),
        format!("Generated: {}", schedule.metadata.generated_at),
        format!("Quality score: {:.1}/100", validation.total_score),
        format!(
            "Strategy: {}",
            schedule.metadata.best_strategy.as_deref().unwrap_or("-")
        ),
        String::new(),
    ];

    for section in &input.sections {
        lines.push(format!("## {} (year {})", section.name, section.year_level));
        lines.push(String::new());

        let header: Vec<String> = (1..=grid::PERIODS_PER_DAY).map(|p| format!("P{p}")).collect();
        lines.push(format!("| Day | {} |", header.join(" | ")));
        lines.push(format!("|---|{}", "---|".repeat(grid::PERIODS_PER_DAY as usize)));

        for day in 0..grid::DAYS_PER_WEEK {
            let mut cells = vec![String::new(); grid::PERIODS_PER_DAY as usize];
            for slot in schedule.slots.iter().filter(|s| s.section_id == section.id && s.day == day) {
                for p in slot.periods() {
                    cells[(p - 1) as usize] =
                        codes.get(&slot.subject_id).unwrap_or(&slot.subject_id.0.as_str()).to_string();
                }
            }
            lines.push(format!("| {} | {} |", grid::day_name(day), cells.join(" | ")));
        }
        lines.push(String::new());
    }

    lines.push("## Faculty load".to_string());
    lines.push(String::new());
    lines.push("| Faculty | Periods/week | Days used |".to_string());
    lines.push("|---|---|---|".to_string());
    for faculty in &input.faculty {
        let own: Vec<_> = schedule.faculty_slots(&faculty.id);
        if own.is_empty() {
            continue;
        }
        let periods: u32 = own.iter().map(|s| s.span() as u32).sum();
        let days: std::collections::HashSet<u8> = own.iter().map(|s| s.day).collect();
        lines.push(format!("| {} | {} | {} |", faculty.code, periods, days.len()));
    }
    lines.push(String::new());

    if !result.reduced_courses.is_empty() {
        lines.push("## Reduced courses".to_string());
        lines.push(String::new());
        for r in &result.reduced_courses {
            lines.push(format!(
                "- {}/{}: {} periods reduced to {}",
                r.section_id, r.subject_id, r.original, r.new
            ));
        }
        lines.push(String::new());
    }

    lines.push("## Quality".to_string());
    lines.push(String::new());
    for score in &validation.soft_scores {
        let pct = if score.max_score > 0.0 {
            score.score / score.max_score * 100.0
        } else {
            100.0
        };
        lines.push(format!("- {}: {:.1}% ({})", score.constraint, pct, score.details));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        EngineConfig, Faculty, FacultyId, GenerationResult, Room, RoomId, RoomKind, Schedule,
        ScheduledSlot, Section, SectionId, Subject, SubjectKind,
    };
    use crate::validator::validate_schedule;

    #[test]
    fn test_markdown_contains_grid_and_codes() {
        let input = ScheduleInput {
            sections: vec![Section::new("sec-a", "CSE-A", 2, 40)],
            subjects: vec![Subject {
                id: SubjectId("th1".to_string()),
                code: "MATH".to_string(),
                name: "Mathematics".to_string(),
                kind: SubjectKind::Theory,
                periods_per_week: 2,
            }],
            faculty: vec![Faculty {
                id: FacultyId("f1".to_string()),
                code: "JDO".to_string(),
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
        };

        let mut schedule = Schedule::new();
        schedule.slots = vec![ScheduledSlot {
            section_id: SectionId("sec-a".to_string()),
            subject_id: SubjectId("th1".to_string()),
            faculty_id: FacultyId("f1".to_string()),
            room_id: RoomId("r1".to_string()),
            day: 0,
            start_period: 1,
            end_period: 2,
        }];
        let result = GenerationResult {
            schedule,
            reduced_courses: Vec::new(),
            diagnostics: Default::default(),
            base_time_ms: 0,
        };
        let validation = validate_schedule(&result.schedule, &input, &[]);

        let md = generate_markdown_report(&result, &input, &validation);
        assert!(md.contains("## CSE-A (year 2)"));
        assert!(md.contains("| Monday | MATH | MATH |"));
        assert!(md.contains("| JDO | 2 | 1 |"));
    }
}
