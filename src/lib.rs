//! Timetable Scheduler - Two-phase weekly timetable generator
//!
//! This library builds class timetables for (sections x subjects x
//! faculty x rooms x time) and improves them with a genetic optimizer.
//!
//! # Algorithm Overview
//!
//! A generation run works in phases:
//! 1. **Lab placement**: the full lab set goes to the constraint solver,
//!    with a deterministic greedy fallback when it is unavailable or
//!    reports infeasibility
//! 2. **Capacity pre-flight**: saturated theory grids trigger a one-shot
//!    period reduction (one 4-period course per section down to 2)
//! 3. **Multi-start theory placement**: up to 15 greedy passes under
//!    different course orderings, best coverage wins; a solver fallback
//!    takes over below 80% coverage
//! 4. **Validation**: the finished schedule is re-checked pairwise
//! 5. **Genetic optimization**: soft-constraint fitness (gaps, balance,
//!    morning preference, lab compactness) improves under
//!    validity-preserving operators
//!
//! # Example
//!
//! ```no_run
//! use timetable_scheduler::parser::load_input_from_dir;
//! use timetable_scheduler::scheduler::{generate_schedule, CancelFlag};
//! use timetable_scheduler::solver::IlpSolver;
//! use timetable_scheduler::validator::validate_schedule;
//! use std::path::Path;
//!
//! let input = load_input_from_dir(Path::new("./data/demo")).unwrap();
//! let result =
//!     generate_schedule(&input, &IlpSolver::new(), &CancelFlag::default(), false).unwrap();
//! let report = validate_schedule(&result.schedule, &input, &result.reduced_courses);
//! println!("Score: {:.1}", report.total_score);
//! ```

pub mod error;
pub mod parser;
pub mod reporter;
pub mod scheduler;
pub mod solver;
pub mod types;
pub mod validator;

pub use error::{Result, SchedulerError};
