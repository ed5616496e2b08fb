use crate::error::Result;
use crate::types::GenerationResult;

/// Generate JSON report of the full generation result
pub fn generate_json_report(result: &GenerationResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Summary statistics as JSON
#[derive(serde::Serialize)]
pub struct JsonSummary {
    pub total_slots: usize,
    pub total_periods: u32,
    pub coverage: f64,
    pub fitness: f64,
    pub reduced_count: usize,
    pub base_time_ms: u64,
}

pub fn generate_json_summary(result: &GenerationResult) -> Result<String> {
    let summary = JsonSummary {
        total_slots: result.schedule.slots.len(),
        total_periods: result.schedule.total_periods(),
        coverage: result.schedule.metadata.coverage,
        fitness: result.schedule.metadata.fitness,
        reduced_count: result.reduced_courses.len(),
        base_time_ms: result.base_time_ms,
    };

    Ok(serde_json::to_string_pretty(&summary)?)
}
