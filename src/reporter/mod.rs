mod json;
mod markdown;
mod text;

pub use json::*;
pub use markdown::*;
pub use text::*;

use crate::error::Result;
use crate::types::{FacultyId, GenerationResult, ScheduleInput};
use crate::validator::ValidationReport;
use std::fs;
use std::path::Path;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Json,
    Markdown,
    Text,
}

/// Generate all reports and write to output directory
pub fn generate_reports(
    result: &GenerationResult,
    input: &ScheduleInput,
    validation: &ValidationReport,
    output_dir: &Path,
    formats: &[OutputFormat],
) -> Result<()> {
    fs::create_dir_all(output_dir)?;

    // Carry the validated score in the written artifact
    let mut scored = result.clone();
    scored.schedule.metadata.fitness = validation.total_score / 100.0;

    for format in formats {
        match format {
            OutputFormat::Json => {
                let json = generate_json_report(&scored)?;
                fs::write(output_dir.join("schedule.json"), json)?;
            }
            OutputFormat::Markdown => {
                let md = generate_markdown_report(&scored, input, validation);
                fs::write(output_dir.join("schedule.md"), md)?;
            }
            OutputFormat::Text => {
                let txt = generate_text_report(&scored, input, validation);
                fs::write(output_dir.join("schedule.txt"), txt)?;
            }
        }
    }

    Ok(())
}

/// Generate one faculty member's weekly schedule
pub fn generate_faculty_schedule(
    result: &GenerationResult,
    input: &ScheduleInput,
    faculty_id: &FacultyId,
) -> Option<String> {
    let faculty = input.faculty.iter().find(|f| &f.id == faculty_id)?;

    let mut lines = vec![format!("# Schedule for {} ({})", faculty.code, faculty.id), String::new()];

    let mut own: Vec<_> = result.schedule.faculty_slots(faculty_id);
    if own.is_empty() {
        lines.push("No classes assigned.".to_string());
        return Some(lines.join("\n"));
    }
    own.sort_by_key(|s| (s.day, s.start_period));

    for slot in own {
        let subject = input
            .subjects
            .iter()
            .find(|s| s.id == slot.subject_id)
            .map(|s| s.name.as_str())
            .unwrap_or("Unknown");
        lines.push(format!(
            "- **{}** P{}-{}: {} with {} in {}",
            crate::types::grid::day_name(slot.day),
            slot.start_period,
            slot.end_period,
            subject,
            slot.section_id,
            slot.room_id
        ));
    }

    Some(lines.join("\n"))
}
