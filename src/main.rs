use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use timetable_scheduler::parser::{load_input_from_dir, validate_input};
use timetable_scheduler::reporter::{
    generate_faculty_schedule, generate_json_summary, generate_reports, print_summary,
    OutputFormat,
};
use timetable_scheduler::scheduler::{
    generate_schedule, optimize_schedule, CancelFlag, GaContext,
};
use timetable_scheduler::solver::{IlpSolver, OfflineSolver, SatSolver};
use timetable_scheduler::types::{FacultyId, GenerationResult, ScheduleInput};
use timetable_scheduler::validator::validate_schedule;

#[derive(Parser)]
#[command(name = "timetable-scheduler")]
#[command(about = "Two-phase weekly timetable generator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run demo with sample data
    Demo {
        /// Only save if fitness matches or improves the previous best
        #[arg(long)]
        monotonic: bool,

        /// Skip the constraint solver and use pure greedy placement
        #[arg(long)]
        greedy_only: bool,
    },

    /// Generate a timetable from input data
    Generate {
        /// Directory containing input JSON files
        #[arg(short, long)]
        data: PathBuf,

        /// Output directory for schedule files
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Output format(s): json, markdown, text, or all
        #[arg(short, long, default_value = "all")]
        format: String,

        /// Suppress progress output, print JSON summary only
        #[arg(short, long)]
        quiet: bool,

        /// Only save if fitness matches or improves the previous best
        #[arg(long)]
        monotonic: bool,

        /// Skip the constraint solver and use pure greedy placement
        #[arg(long)]
        greedy_only: bool,

        /// Skip the genetic optimization pass
        #[arg(long)]
        no_optimize: bool,
    },

    /// Validate an existing schedule
    Validate {
        /// Path to schedule.json file
        #[arg(short, long)]
        schedule: PathBuf,

        /// Directory containing input data for validation
        #[arg(short, long)]
        data: PathBuf,

        /// Show detailed validation results
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print one faculty member's weekly schedule
    Faculty {
        /// Path to schedule.json file
        #[arg(short, long)]
        schedule: PathBuf,

        /// Directory containing input data
        #[arg(short, long)]
        data: PathBuf,

        /// Faculty ID
        #[arg(long)]
        id: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Demo {
            monotonic,
            greedy_only,
        } => run_demo(monotonic, greedy_only),
        Commands::Generate {
            data,
            output,
            format,
            quiet,
            monotonic,
            greedy_only,
            no_optimize,
        } => run_generate(&data, &output, &format, quiet, monotonic, greedy_only, no_optimize),
        Commands::Validate {
            schedule,
            data,
            verbose,
        } => run_validate(&schedule, &data, verbose),
        Commands::Faculty { schedule, data, id } => run_faculty(&schedule, &data, &id),
    }
}

fn pick_solver(greedy_only: bool) -> Box<dyn SatSolver> {
    if greedy_only {
        Box::new(OfflineSolver)
    } else {
        Box::new(IlpSolver::new())
    }
}

fn run_demo(monotonic: bool, greedy_only: bool) -> Result<()> {
    println!("{}", "Timetable Scheduler Demo".bold().cyan());
    println!("{}", "─".repeat(40));

    let demo_path = PathBuf::from("data/demo");
    let output_path = PathBuf::from("output");

    if !demo_path.join("sections.json").exists() {
        println!("{}", "Demo data not found. Creating sample data...".yellow());
        create_demo_data(&demo_path)?;
    }

    println!("Loading demo data from: {}", demo_path.display());
    let input = load_input_from_dir(&demo_path).context("Failed to load demo data")?;

    let validation_result = validate_input(&input)?;
    for warning in &validation_result.warnings {
        println!("{} {}", "Warning:".yellow(), warning);
    }

    println!(
        "Loaded {} sections, {} subjects, {} faculty, {} rooms",
        input.sections.len(),
        input.subjects.len(),
        input.faculty.len(),
        input.rooms.len()
    );

    println!("\nGenerating timetable...\n");
    run_pipeline(&input, &output_path, "all", false, monotonic, greedy_only, false)
}

#[allow(clippy::too_many_arguments)]
fn run_generate(
    data: &PathBuf,
    output: &PathBuf,
    format: &str,
    quiet: bool,
    monotonic: bool,
    greedy_only: bool,
    no_optimize: bool,
) -> Result<()> {
    let input = load_input_from_dir(data).context("Failed to load input data")?;

    if !quiet {
        let validation_result = validate_input(&input)?;
        for warning in &validation_result.warnings {
            println!("{} {}", "Warning:".yellow(), warning);
        }
        println!(
            "Loaded {} sections, {} subjects, {} faculty, {} rooms",
            input.sections.len(),
            input.subjects.len(),
            input.faculty.len(),
            input.rooms.len()
        );
    } else {
        validate_input(&input)?;
    }

    run_pipeline(&input, output, format, quiet, monotonic, greedy_only, no_optimize)
}

/// Generate, optimize, validate, and (conditionally) persist
fn run_pipeline(
    input: &ScheduleInput,
    output: &PathBuf,
    format: &str,
    quiet: bool,
    monotonic: bool,
    greedy_only: bool,
    no_optimize: bool,
) -> Result<()> {
    let solver = pick_solver(greedy_only);
    let cancel = CancelFlag::default();

    let mut result = generate_schedule(input, solver.as_ref(), &cancel, quiet)?;

    if !no_optimize {
        if !quiet {
            println!("Optimizing with the genetic pass...");
        }
        let ctx = GaContext::new(&input.subjects, &input.sections, &input.availability);
        result.schedule = optimize_schedule(
            &result.schedule,
            &ctx,
            &input.config.ga,
            input.config.seed,
            &cancel,
        );
    }

    let validation = validate_schedule(&result.schedule, input, &result.reduced_courses);

    let baseline = if monotonic {
        load_baseline_fitness(&output.join("schedule.json"))
    } else {
        None
    };
    let should_save = match baseline {
        Some(baseline) => {
            let current = validation.total_score / 100.0;
            if current >= baseline {
                if !quiet {
                    if current > baseline {
                        println!(
                            "{}",
                            format!("✓ Improved: {baseline:.3} → {current:.3}").green().bold()
                        );
                    } else {
                        println!("{}", format!("= Matched: {current:.3}").cyan());
                    }
                }
                true
            } else {
                if !quiet {
                    println!(
                        "{}",
                        format!("✗ Regression: {baseline:.3} → {current:.3} (not saving)")
                            .red()
                            .bold()
                    );
                }
                false
            }
        }
        None => true,
    };

    if should_save {
        generate_reports(&result, input, &validation, output, &parse_formats(format))?;
    }

    if quiet {
        println!("{}", generate_json_summary(&result)?);
    } else {
        print_summary(&result, &validation);
        if should_save {
            println!("Reports written to: {}", output.display().to_string().green());
        }
    }

    Ok(())
}

/// Fitness recorded in an existing schedule file
fn load_baseline_fitness(path: &PathBuf) -> Option<f64> {
    if !path.exists() {
        return None;
    }
    let content = std::fs::read_to_string(path).ok()?;
    let result: GenerationResult = serde_json::from_str(&content).ok()?;
    Some(result.schedule.metadata.fitness)
}

fn run_validate(schedule_path: &PathBuf, data: &PathBuf, verbose: bool) -> Result<()> {
    let input = load_input_from_dir(data)?;

    let schedule_json = std::fs::read_to_string(schedule_path)?;
    let result: GenerationResult = serde_json::from_str(&schedule_json)?;

    let validation = validate_schedule(&result.schedule, &input, &result.reduced_courses);

    if validation.is_valid {
        println!("{}", "✓ Schedule is valid".green().bold());
    } else {
        println!("{}", "✗ Schedule has violations".red().bold());
        for v in &validation.hard_violations {
            println!("  - {}: {}", v.constraint.red(), v.message);
        }
    }

    if verbose {
        println!("\n{}", "Soft Constraint Scores:".bold());
        for score in &validation.soft_scores {
            let pct = if score.max_score > 0.0 {
                (score.score / score.max_score) * 100.0
            } else {
                100.0
            };
            println!("  {}: {:.1}%", score.constraint, pct);
        }

        println!("\n{}", "Statistics:".bold());
        println!("  Slots: {}", validation.statistics.total_slots);
        println!("  Periods: {}", validation.statistics.total_periods);
        println!(
            "  Lab/theory: {}/{}",
            validation.statistics.lab_slots, validation.statistics.theory_slots
        );
        if validation.statistics.reduced_count > 0 {
            println!("  Reduced courses: {}", validation.statistics.reduced_count);
        }
    }

    println!("\nOverall Score: {:.1}/100", validation.total_score);

    Ok(())
}

fn run_faculty(schedule_path: &PathBuf, data: &PathBuf, id: &str) -> Result<()> {
    let input = load_input_from_dir(data)?;

    let schedule_json = std::fs::read_to_string(schedule_path)?;
    let result: GenerationResult = serde_json::from_str(&schedule_json)?;

    match generate_faculty_schedule(&result, &input, &FacultyId(id.to_string())) {
        Some(report) => println!("{report}"),
        None => println!("Faculty not found"),
    }

    Ok(())
}

fn parse_formats(format: &str) -> Vec<OutputFormat> {
    if format == "all" {
        return vec![OutputFormat::Json, OutputFormat::Markdown, OutputFormat::Text];
    }

    format
        .split(',')
        .filter_map(|f| match f.trim().to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            "text" | "txt" => Some(OutputFormat::Text),
            _ => None,
        })
        .collect()
}

fn create_demo_data(path: &PathBuf) -> Result<()> {
    std::fs::create_dir_all(path)?;

    let sections = serde_json::json!([
        {"id": "cse1a", "name": "CSE 1-A", "year_level": 1, "student_count": 58},
        {"id": "cse2a", "name": "CSE 2-A", "year_level": 2, "student_count": 55},
        {"id": "cse3a", "name": "CSE 3-A", "year_level": 3, "student_count": 52},
        {"id": "cse4a", "name": "CSE 4-A", "year_level": 4, "student_count": 47}
    ]);
    std::fs::write(path.join("sections.json"), serde_json::to_string_pretty(&sections)?)?;

    let subjects = serde_json::json!([
        {"id": "math1", "code": "MA101", "name": "Calculus", "kind": "theory", "periods_per_week": 4},
        {"id": "phys", "code": "PH101", "name": "Physics", "kind": "theory", "periods_per_week": 4},
        {"id": "eng", "code": "EN101", "name": "English", "kind": "theory", "periods_per_week": 2},
        {"id": "prog", "code": "CS101", "name": "Programming", "kind": "theory", "periods_per_week": 4},
        {"id": "prog-lab", "code": "CS101L", "name": "Programming Lab", "kind": "lab", "periods_per_week": 4},
        {"id": "math2", "code": "MA201", "name": "Linear Algebra", "kind": "theory", "periods_per_week": 4},
        {"id": "ds", "code": "CS201", "name": "Data Structures", "kind": "theory", "periods_per_week": 4},
        {"id": "dld", "code": "EC201", "name": "Digital Logic", "kind": "theory", "periods_per_week": 4},
        {"id": "oop", "code": "CS202", "name": "OOP Concepts", "kind": "theory", "periods_per_week": 2},
        {"id": "ds-lab", "code": "CS201L", "name": "Data Structures Lab", "kind": "lab", "periods_per_week": 4},
        {"id": "os", "code": "CS301", "name": "Operating Systems", "kind": "theory", "periods_per_week": 4},
        {"id": "db", "code": "CS302", "name": "Databases", "kind": "theory", "periods_per_week": 4},
        {"id": "cn", "code": "CS303", "name": "Computer Networks", "kind": "theory", "periods_per_week": 2},
        {"id": "se", "code": "CS304", "name": "Software Engineering", "kind": "theory", "periods_per_week": 4},
        {"id": "os-lab", "code": "CS301L", "name": "OS Lab", "kind": "lab", "periods_per_week": 4},
        {"id": "ai", "code": "CS401", "name": "Artificial Intelligence", "kind": "theory", "periods_per_week": 4},
        {"id": "ml", "code": "CS402", "name": "Machine Learning", "kind": "theory", "periods_per_week": 4},
        {"id": "sec", "code": "CS403", "name": "Security", "kind": "theory", "periods_per_week": 2},
        {"id": "cc", "code": "CS404", "name": "Cloud Computing", "kind": "theory", "periods_per_week": 4},
        {"id": "ai-lab", "code": "CS401L", "name": "AI Lab", "kind": "lab", "periods_per_week": 4}
    ]);
    std::fs::write(path.join("subjects.json"), serde_json::to_string_pretty(&subjects)?)?;

    let faculty = serde_json::json!([
        {"id": "f-rao", "code": "RAO", "name": "Dr. Rao"},
        {"id": "f-iyer", "code": "IYR", "name": "Prof. Iyer"},
        {"id": "f-khan", "code": "KHN", "name": "Dr. Khan"},
        {"id": "f-das", "code": "DAS", "name": "Prof. Das"},
        {"id": "f-mehta", "code": "MHT", "name": "Dr. Mehta"},
        {"id": "f-nair", "code": "NAI", "name": "Prof. Nair"},
        {"id": "f-sen", "code": "SEN", "name": "Dr. Sen"},
        {"id": "f-bose", "code": "BOS", "name": "Prof. Bose"}
    ]);
    std::fs::write(path.join("faculty.json"), serde_json::to_string_pretty(&faculty)?)?;

    let rooms = serde_json::json!([
        {"id": "r101", "name": "Room 101", "capacity": 60, "kind": "theory"},
        {"id": "r102", "name": "Room 102", "capacity": 60, "kind": "theory"},
        {"id": "r103", "name": "Room 103", "capacity": 60, "kind": "theory"},
        {"id": "lab-1", "name": "Computing Lab 1", "capacity": 60, "kind": "lab"},
        {"id": "lab-2", "name": "Computing Lab 2", "capacity": 55, "kind": "lab"}
    ]);
    std::fs::write(path.join("rooms.json"), serde_json::to_string_pretty(&rooms)?)?;

    // Dr. Sen only teaches mornings
    let availability = serde_json::json!([
        {"faculty_id": "f-sen", "day": 0, "start_period": 1, "end_period": 4},
        {"faculty_id": "f-sen", "day": 1, "start_period": 1, "end_period": 4},
        {"faculty_id": "f-sen", "day": 2, "start_period": 1, "end_period": 4},
        {"faculty_id": "f-sen", "day": 3, "start_period": 1, "end_period": 4},
        {"faculty_id": "f-sen", "day": 4, "start_period": 1, "end_period": 4},
        {"faculty_id": "f-sen", "day": 5, "start_period": 1, "end_period": 4}
    ]);
    std::fs::write(path.join("availability.json"), serde_json::to_string_pretty(&availability)?)?;

    let courses = serde_json::json!([
        {"section_id": "cse1a", "subject_id": "math1", "faculty_id": "f-rao"},
        {"section_id": "cse1a", "subject_id": "phys", "faculty_id": "f-iyer"},
        {"section_id": "cse1a", "subject_id": "eng", "faculty_id": "f-sen"},
        {"section_id": "cse1a", "subject_id": "prog", "faculty_id": "f-khan"},
        {"section_id": "cse1a", "subject_id": "prog-lab", "faculty_id": "f-khan"},
        {"section_id": "cse2a", "subject_id": "math2", "faculty_id": "f-rao"},
        {"section_id": "cse2a", "subject_id": "ds", "faculty_id": "f-das"},
        {"section_id": "cse2a", "subject_id": "dld", "faculty_id": "f-iyer"},
        {"section_id": "cse2a", "subject_id": "oop", "faculty_id": "f-sen"},
        {"section_id": "cse2a", "subject_id": "ds-lab", "faculty_id": "f-das"},
        {"section_id": "cse3a", "subject_id": "os", "faculty_id": "f-mehta"},
        {"section_id": "cse3a", "subject_id": "db", "faculty_id": "f-nair"},
        {"section_id": "cse3a", "subject_id": "cn", "faculty_id": "f-sen"},
        {"section_id": "cse3a", "subject_id": "se", "faculty_id": "f-bose"},
        {"section_id": "cse3a", "subject_id": "os-lab", "faculty_id": "f-mehta"},
        {"section_id": "cse4a", "subject_id": "ai", "faculty_id": "f-bose"},
        {"section_id": "cse4a", "subject_id": "ml", "faculty_id": "f-nair"},
        {"section_id": "cse4a", "subject_id": "sec", "faculty_id": "f-mehta"},
        {"section_id": "cse4a", "subject_id": "cc", "faculty_id": "f-khan"},
        {"section_id": "cse4a", "subject_id": "ai-lab", "faculty_id": "f-nair"}
    ]);
    std::fs::write(path.join("courses.json"), serde_json::to_string_pretty(&courses)?)?;

    println!("{}", "Demo data created successfully!".green());
    Ok(())
}
