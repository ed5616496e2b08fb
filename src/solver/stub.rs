use super::{LabSolveRequest, SatSolver, SolveResponse, TheorySolveRequest};
use crate::error::SchedulerError;
use crate::scheduler::CancelFlag;

/// A solver that is never reachable. Selecting it forces the generator
/// down its pure-greedy fallback paths end to end, which is useful on
/// machines without a solver toolchain and in fallback tests.
pub struct OfflineSolver;

impl SatSolver for OfflineSolver {
    fn solve_labs(
        &self,
        _request: &LabSolveRequest,
        _cancel: &CancelFlag,
    ) -> Result<SolveResponse, SchedulerError> {
        Err(SchedulerError::SolverUnavailable("solver disabled".to_string()))
    }

    fn solve_theory(
        &self,
        _request: &TheorySolveRequest,
        _cancel: &CancelFlag,
    ) -> Result<SolveResponse, SchedulerError> {
        Err(SchedulerError::SolverUnavailable("solver disabled".to_string()))
    }
}

/// A solver that deems every sub-problem infeasible. Exercises the
/// infeasibility recovery paths (greedy labs, theory period reduction)
/// without a real model.
pub struct InfeasibleSolver;

impl SatSolver for InfeasibleSolver {
    fn solve_labs(
        &self,
        _request: &LabSolveRequest,
        _cancel: &CancelFlag,
    ) -> Result<SolveResponse, SchedulerError> {
        Err(SchedulerError::SolverInfeasible("stub verdict".to_string()))
    }

    fn solve_theory(
        &self,
        _request: &TheorySolveRequest,
        _cancel: &CancelFlag,
    ) -> Result<SolveResponse, SchedulerError> {
        Err(SchedulerError::SolverInfeasible("stub verdict".to_string()))
    }
}
