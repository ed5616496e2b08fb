use crate::scheduler::Conflict;
use crate::types::{LabFailure, MissingCoverage, ScheduleDiagnostics};
use thiserror::Error;

/// Domain-specific errors for the scheduler
#[derive(Error, Debug)]
pub enum SchedulerError {
    // Input/Parse errors
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON in '{file}': {message}")]
    JsonParse { file: String, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Solver errors, recovered by the generator's fallback paths
    #[error("Solver unavailable: {0}")]
    SolverUnavailable(String),

    #[error("Solver reported the sub-problem infeasible: {0}")]
    SolverInfeasible(String),

    // Fatal generation errors
    #[error("{} lab course(s) have no feasible (day, block, room)", .failures.len())]
    LabInfeasible {
        failures: Vec<LabFailure>,
        diagnostics: Box<ScheduleDiagnostics>,
    },

    #[error("{} course(s) short of required periods", .missing.len())]
    CoverageShortfall {
        missing: Vec<MissingCoverage>,
        diagnostics: Box<ScheduleDiagnostics>,
    },

    #[error("Post-generation validation found {} conflict(s)", .conflicts.len())]
    OverlapDetected { conflicts: Vec<Conflict> },

    #[error("Generation cancelled before a feasible schedule was found")]
    Cancelled,
}

impl SchedulerError {
    /// The diagnostics block attached to fatal generation failures
    pub fn diagnostics(&self) -> Option<&ScheduleDiagnostics> {
        match self {
            SchedulerError::LabInfeasible { diagnostics, .. }
            | SchedulerError::CoverageShortfall { diagnostics, .. } => Some(diagnostics),
            _ => None,
        }
    }
}

/// Use anyhow::Result at application boundaries
pub type Result<T> = anyhow::Result<T>;
