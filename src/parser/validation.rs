use crate::error::Result;
use crate::types::{grid, FacultyId, RoomId, RoomKind, ScheduleInput, SectionId, SubjectId};
use std::collections::HashSet;

/// Validation result with collected errors
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }
}

/// Validate all input data before generation
pub fn validate_input(input: &ScheduleInput) -> Result<ValidationResult> {
    let mut result = ValidationResult::default();

    let section_ids: HashSet<&SectionId> = input.sections.iter().map(|s| &s.id).collect();
    let subject_ids: HashSet<&SubjectId> = input.subjects.iter().map(|s| &s.id).collect();
    let faculty_ids: HashSet<&FacultyId> = input.faculty.iter().map(|f| &f.id).collect();

    check_duplicates(input, &mut result);

    if !matches!(input.config.lab_block, 3 | 4) {
        result.add_error(format!(
            "lab_block must be 3 or 4, got {}",
            input.config.lab_block
        ));
    }

    // Every binding must resolve by identifier lookup
    for binding in &input.bindings {
        if !section_ids.contains(&binding.section_id) {
            result.add_error(format!(
                "Binding references unknown section '{}'",
                binding.section_id
            ));
        }
        if !subject_ids.contains(&binding.subject_id) {
            result.add_error(format!(
                "Binding references unknown subject '{}'",
                binding.subject_id
            ));
        }
        if !faculty_ids.contains(&binding.faculty_id) {
            result.add_error(format!(
                "Binding references unknown faculty '{}'",
                binding.faculty_id
            ));
        }
    }

    for section in &input.sections {
        if !(1..=4).contains(&section.year_level) {
            result.add_error(format!(
                "Section '{}' has year level {} outside 1-4",
                section.id, section.year_level
            ));
        }
    }

    for window in &input.availability {
        if !faculty_ids.contains(&window.faculty_id) {
            result.add_warning(format!(
                "Availability window for unknown faculty '{}'",
                window.faculty_id
            ));
        }
        if window.day >= grid::DAYS_PER_WEEK
            || window.start_period < 1
            || window.end_period > grid::PERIODS_PER_DAY
            || window.is_empty()
        {
            result.add_error(format!(
                "Malformed availability window for '{}': day {} periods {}-{}",
                window.faculty_id, window.day, window.start_period, window.end_period
            ));
        }
    }

    // Labs meet as one block; their weekly quota must equal the block
    for subject in input.subjects.iter().filter(|s| s.is_lab()) {
        if subject.periods_per_week != input.config.lab_block {
            result.add_error(format!(
                "Lab subject '{}' needs {} periods but the lab block is {}",
                subject.id, subject.periods_per_week, input.config.lab_block
            ));
        }
    }

    // Capacity sanity
    let max_theory_capacity = input
        .rooms
        .iter()
        .filter(|r| r.kind == RoomKind::Theory)
        .map(|r| r.capacity)
        .max()
        .unwrap_or(0);
    for section in &input.sections {
        if section.student_count > max_theory_capacity {
            result.add_warning(format!(
                "Section '{}' ({} students) exceeds the largest theory room ({})",
                section.id, section.student_count, max_theory_capacity
            ));
        }
    }

    if !result.is_valid() {
        return Err(anyhow::anyhow!(
            "Validation failed with {} errors:\n{}",
            result.errors.len(),
            result.errors.join("\n")
        ));
    }

    Ok(result)
}

fn check_duplicates(input: &ScheduleInput, result: &mut ValidationResult) {
    let mut seen_sections: HashSet<&SectionId> = HashSet::new();
    for section in &input.sections {
        if !seen_sections.insert(&section.id) {
            result.add_error(format!("Duplicate section ID: '{}'", section.id));
        }
    }

    let mut seen_subjects: HashSet<&SubjectId> = HashSet::new();
    for subject in &input.subjects {
        if !seen_subjects.insert(&subject.id) {
            result.add_error(format!("Duplicate subject ID: '{}'", subject.id));
        }
    }

    let mut seen_faculty: HashSet<&FacultyId> = HashSet::new();
    for faculty in &input.faculty {
        if !seen_faculty.insert(&faculty.id) {
            result.add_error(format!("Duplicate faculty ID: '{}'", faculty.id));
        }
    }

    let mut seen_rooms: HashSet<&RoomId> = HashSet::new();
    for room in &input.rooms {
        if !seen_rooms.insert(&room.id) {
            result.add_error(format!("Duplicate room ID: '{}'", room.id));
        }
    }

    let mut seen_bindings: HashSet<(&SectionId, &SubjectId)> = HashSet::new();
    for binding in &input.bindings {
        if !seen_bindings.insert((&binding.section_id, &binding.subject_id)) {
            result.add_error(format!(
                "Duplicate binding: section '{}' subject '{}'",
                binding.section_id, binding.subject_id
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        AvailabilityWindow, CourseBinding, EngineConfig, Faculty, Room, Section, Subject,
        SubjectKind,
    };

    fn valid_input() -> ScheduleInput {
        ScheduleInput {
            sections: vec![Section::new("sec-a", "A", 2, 40)],
            subjects: vec![Subject {
                id: SubjectId("th1".to_string()),
                code: "TH1".to_string(),
                name: "Theory 1".to_string(),
                kind: SubjectKind::Theory,
                periods_per_week: 4,
            }],
            faculty: vec![Faculty {
                id: FacultyId("f1".to_string()),
                code: "F1".to_string(),
                name: String::new(),
            }],
            rooms: vec![Room {
                id: RoomId("r1".to_string()),
                name: "R1".to_string(),
                capacity: 60,
                kind: RoomKind::Theory,
            }],
            availability: vec![AvailabilityWindow {
                faculty_id: FacultyId("f1".to_string()),
                day: 0,
                start_period: 1,
                end_period: 8,
            }],
            bindings: vec![CourseBinding {
                section_id: SectionId("sec-a".to_string()),
                subject_id: SubjectId("th1".to_string()),
                faculty_id: FacultyId("f1".to_string()),
            }],
            config: EngineConfig::default(),
        }
    }

    #[test]
    fn test_valid_input_passes() {
        let result = validate_input(&valid_input()).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_dangling_binding_fails() {
        let mut input = valid_input();
        input.bindings[0].subject_id = SubjectId("ghost".to_string());
        assert!(validate_input(&input).is_err());
    }

    #[test]
    fn test_inverted_window_fails() {
        let mut input = valid_input();
        input.availability[0].start_period = 6;
        input.availability[0].end_period = 2;
        assert!(validate_input(&input).is_err());
    }

    #[test]
    fn test_lab_quota_must_match_block() {
        let mut input = valid_input();
        input.subjects.push(Subject {
            id: SubjectId("lab1".to_string()),
            code: "LAB1".to_string(),
            name: "Lab 1".to_string(),
            kind: SubjectKind::Lab,
            periods_per_week: 3,
        });
        assert!(validate_input(&input).is_err());
    }

    #[test]
    fn test_oversized_section_warns() {
        let mut input = valid_input();
        input.sections[0].student_count = 100;
        let result = validate_input(&input).unwrap();
        assert_eq!(result.warnings.len(), 1);
    }
}
