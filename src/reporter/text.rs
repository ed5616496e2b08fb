use crate::types::{grid, GenerationResult, ScheduleInput};
use crate::validator::{Severity, ValidationReport};
use colored::Colorize;
use std::collections::HashMap;

/// Plain-text rendition of the timetable, one section per block
pub fn generate_text_report(
    result: &GenerationResult,
    input: &ScheduleInput,
    validation: &ValidationReport,
) -> String {
    let schedule = &result.schedule;
    let subject_names: HashMap<_, _> = input
        .subjects
        .iter()
        .map(|s| (&s.id, s.name.as_str()))
        .collect();
    let faculty_codes: HashMap<_, _> = input
        .faculty
        .iter()
        .map(|f| (&f.id, f.code.as_str()))
        .collect();

    let mut lines = vec![
        "WEEKLY TIMETABLE".to_string(),
        "=".repeat(40),
        format!("Score: {:.1}/100", validation.total_score),
        String::new(),
    ];

    for section in &input.sections {
        lines.push(format!("Section {} (year {})", section.name, section.year_level));
        lines.push("-".repeat(40));

        for day in 0..grid::DAYS_PER_WEEK {
            let mut day_slots: Vec<_> = schedule
                .slots
                .iter()
                .filter(|s| s.section_id == section.id && s.day == day)
                .collect();
            if day_slots.is_empty() {
                continue;
            }
            day_slots.sort_by_key(|s| s.start_period);

            lines.push(format!("  {}:", grid::day_name(day)));
            for slot in day_slots {
                lines.push(format!(
                    "    P{}-{}  {}  ({}, {})",
                    slot.start_period,
                    slot.end_period,
                    subject_names.get(&slot.subject_id).unwrap_or(&slot.subject_id.0.as_str()),
                    faculty_codes.get(&slot.faculty_id).unwrap_or(&slot.faculty_id.0.as_str()),
                    slot.room_id,
                ));
            }
        }
        lines.push(String::new());
    }

    if !result.reduced_courses.is_empty() {
        lines.push("Reduced courses:".to_string());
        for r in &result.reduced_courses {
            lines.push(format!(
                "  {}/{}: {} -> {} periods",
                r.section_id, r.subject_id, r.original, r.new
            ));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Console summary printed after a run
pub fn print_summary(result: &GenerationResult, validation: &ValidationReport) {
    println!();
    println!("{}", "Generation Summary".bold());
    println!("{}", "─".repeat(40));

    let stats = &validation.statistics;
    println!(
        "Slots: {} ({} lab, {} theory), {} periods",
        stats.total_slots, stats.lab_slots, stats.theory_slots, stats.total_periods
    );
    println!(
        "Morning periods: {}/{}",
        stats.morning_periods, stats.total_periods
    );
    println!("Base generation: {} ms", result.base_time_ms);

    if !result.reduced_courses.is_empty() {
        println!(
            "{}",
            format!("{} course(s) reduced to fit capacity", result.reduced_courses.len()).yellow()
        );
    }
    if let Some(strategy) = &result.schedule.metadata.best_strategy {
        println!("Winning ordering: {strategy}");
    }

    if validation.is_valid {
        println!("{}", "✓ All hard constraints hold".green());
    } else {
        println!("{}", "✗ Hard constraint violations:".red().bold());
        for v in validation
            .hard_violations
            .iter()
            .filter(|v| v.severity == Severity::Error)
        {
            println!("  - {}: {}", v.constraint.red(), v.message);
        }
    }

    println!("Overall score: {:.1}/100", validation.total_score);
}
