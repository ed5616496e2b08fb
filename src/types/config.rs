use serde::{Deserialize, Serialize};

/// Engine configuration with every tuning knob and its default
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Consecutive periods per lab session, 3 or 4
    #[serde(default = "default_lab_block")]
    pub lab_block: u8,
    /// Theory multi-start attempts before giving up
    #[serde(default = "default_multistart_attempts")]
    pub multistart_attempts: usize,
    /// 1-based attempt number from which the day-balancing cap is dropped
    #[serde(default = "default_relaxed_from_attempt")]
    pub relaxed_from_attempt: usize,
    /// Coverage ratio below which the theory solver fallback kicks in
    #[serde(default = "default_solver_fallback_cutoff")]
    pub solver_fallback_cutoff: f64,
    /// Theory room utilization above which one course per section is reduced
    #[serde(default = "default_utilization_threshold")]
    pub utilization_threshold: f64,
    /// Seed for shuffled orderings and the genetic optimizer
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub ga: GaConfig,
}

fn default_lab_block() -> u8 {
    4
}

fn default_multistart_attempts() -> usize {
    15
}

fn default_relaxed_from_attempt() -> usize {
    11
}

fn default_solver_fallback_cutoff() -> f64 {
    0.80
}

fn default_utilization_threshold() -> f64 {
    0.95
}

fn default_seed() -> u64 {
    42
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lab_block: default_lab_block(),
            multistart_attempts: default_multistart_attempts(),
            relaxed_from_attempt: default_relaxed_from_attempt(),
            solver_fallback_cutoff: default_solver_fallback_cutoff(),
            utilization_threshold: default_utilization_threshold(),
            seed: default_seed(),
            ga: GaConfig::default(),
        }
    }
}

/// Genetic optimizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaConfig {
    #[serde(default = "default_population")]
    pub population: usize,
    #[serde(default = "default_generations")]
    pub generations: usize,
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    #[serde(default = "default_crossover_rate")]
    pub crossover_rate: f64,
    #[serde(default = "default_elite_fraction")]
    pub elite_fraction: f64,
    #[serde(default = "default_tournament_size")]
    pub tournament_size: usize,
    #[serde(default)]
    pub weights: FitnessWeights,
}

fn default_population() -> usize {
    50
}

fn default_generations() -> usize {
    100
}

fn default_mutation_rate() -> f64 {
    0.10
}

fn default_crossover_rate() -> f64 {
    0.80
}

fn default_elite_fraction() -> f64 {
    0.10
}

fn default_tournament_size() -> usize {
    5
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population: default_population(),
            generations: default_generations(),
            mutation_rate: default_mutation_rate(),
            crossover_rate: default_crossover_rate(),
            elite_fraction: default_elite_fraction(),
            tournament_size: default_tournament_size(),
            weights: FitnessWeights::default(),
        }
    }
}

/// Weights of the soft-constraint fitness terms; they sum to 1.0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessWeights {
    #[serde(default = "default_w_faculty_gaps")]
    pub faculty_gaps: f64,
    #[serde(default = "default_w_student_gaps")]
    pub student_gaps: f64,
    #[serde(default = "default_w_workload_balance")]
    pub workload_balance: f64,
    #[serde(default = "default_w_morning_preference")]
    pub morning_preference: f64,
    #[serde(default = "default_w_lab_compactness")]
    pub lab_compactness: f64,
}

fn default_w_faculty_gaps() -> f64 {
    0.30
}

fn default_w_student_gaps() -> f64 {
    0.25
}

fn default_w_workload_balance() -> f64 {
    0.20
}

fn default_w_morning_preference() -> f64 {
    0.15
}

fn default_w_lab_compactness() -> f64 {
    0.10
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            faculty_gaps: default_w_faculty_gaps(),
            student_gaps: default_w_student_gaps(),
            workload_balance: default_w_workload_balance(),
            morning_preference: default_w_morning_preference(),
            lab_compactness: default_w_lab_compactness(),
        }
    }
}
