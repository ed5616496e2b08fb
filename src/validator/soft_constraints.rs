use crate::scheduler::{
    balance_score, gap_score, lab_compactness_score, morning_score, GaContext,
};
use crate::types::{Schedule, ScheduleInput};
use crate::validator::SoftScore;

/// Score the five soft-quality terms the optimizer also drives
pub fn calculate_soft_scores(schedule: &Schedule, input: &ScheduleInput) -> Vec<SoftScore> {
    let ctx = GaContext::new(&input.subjects, &input.sections, &input.availability);
    let weights = &input.config.ga.weights;
    let slots = &schedule.slots;

    let faculty_gaps = gap_score(slots, |s| &s.faculty_id.0);
    let student_gaps = gap_score(slots, |s| &s.section_id.0);
    let balance = balance_score(slots);
    let morning = morning_score(slots);
    let compact = lab_compactness_score(slots, &ctx);

    vec![
        SoftScore {
            constraint: "FacultyGaps".to_string(),
            score: faculty_gaps * weights.faculty_gaps,
            max_score: weights.faculty_gaps,
            details: format!("{:.0}% gap-free faculty timelines", faculty_gaps * 100.0),
        },
        SoftScore {
            constraint: "StudentGaps".to_string(),
            score: student_gaps * weights.student_gaps,
            max_score: weights.student_gaps,
            details: format!("{:.0}% gap-free section timelines", student_gaps * 100.0),
        },
        SoftScore {
            constraint: "WorkloadBalance".to_string(),
            score: balance * weights.workload_balance,
            max_score: weights.workload_balance,
            details: format!("{:.0}% evenly spread faculty load", balance * 100.0),
        },
        SoftScore {
            constraint: "MorningPreference".to_string(),
            score: morning * weights.morning_preference,
            max_score: weights.morning_preference,
            details: format!("{:.0}% of periods before lunch", morning * 100.0),
        },
        SoftScore {
            constraint: "LabCompactness".to_string(),
            score: compact * weights.lab_compactness,
            max_score: weights.lab_compactness,
            details: format!("{:.0}% early-week lab placement", compact * 100.0),
        },
    ]
}
