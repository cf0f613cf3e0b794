//! Trial tracking and optimization run bookkeeping.

use chrono::{DateTime, Utc};
use ps_graph::OperatorSettings;
use ps_types::{config_error, ParameterConfiguration, ParameterValue, PsResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Unique optimization run identifier.
pub type OptimizationId = Uuid;

/// Whether we are maximizing or minimizing the objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveDirection {
    Maximize,
    Minimize,
}

impl ObjectiveDirection {
    /// Strict improvement of `candidate` over `incumbent`.
    pub fn is_better(&self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Self::Maximize => candidate > incumbent,
            Self::Minimize => candidate < incumbent,
        }
    }
}

impl Default for ObjectiveDirection {
    fn default() -> Self {
        // solver cost: runtime, penalized runtime, ...
        Self::Minimize
    }
}

/// Which search strategy drives a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Random,
    Local,
    Evolution,
}

impl StrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Local => "local",
            Self::Evolution => "evolution",
        }
    }
}

/// Top-level configuration for an optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    pub id: OptimizationId,
    pub name: String,
    pub description: String,

    pub strategy: StrategyKind,

    /// Seed of the run's random generator.
    pub seed: u64,

    /// Maximum number of trials to run.
    pub max_trials: usize,

    /// Population size of the evolution strategy.
    pub population_size: usize,

    /// Recombine parents before mutating (evolution strategy only).
    pub crossover: bool,

    /// Local search moves to gaussian rather than uniform neighbours.
    pub gaussian_moves: bool,

    /// Direction of optimization.
    pub direction: ObjectiveDirection,

    pub operators: OperatorSettings,

    pub created_at: DateTime<Utc>,
}

impl OptimizationConfig {
    pub fn new(name: impl Into<String>, strategy: StrategyKind) -> Self {
        Self {
            name: name.into(),
            strategy,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> PsResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_trials(mut self, n: usize) -> Self {
        self.max_trials = n;
        self
    }

    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_crossover(mut self, crossover: bool) -> Self {
        self.crossover = crossover;
        self
    }

    pub fn with_gaussian_moves(mut self, gaussian: bool) -> Self {
        self.gaussian_moves = gaussian;
        self
    }

    pub fn with_objective(mut self, direction: ObjectiveDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_operators(mut self, operators: OperatorSettings) -> Self {
        self.operators = operators;
        self
    }

    pub fn validate(&self) -> PsResult<()> {
        if self.max_trials == 0 {
            return Err(config_error!("max_trials must be positive"));
        }
        if self.strategy == StrategyKind::Evolution && self.population_size == 0 {
            return Err(config_error!("Evolution strategy needs a positive population size"));
        }
        self.operators.validate()
    }
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            description: String::new(),
            strategy: StrategyKind::Random,
            seed: 0,
            max_trials: 100,
            population_size: 10,
            crossover: false,
            gaussian_moves: false,
            direction: ObjectiveDirection::default(),
            operators: OperatorSettings::default(),
            created_at: Utc::now(),
        }
    }
}

/// Lifecycle state for an optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Aggregate status of an optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationStatus {
    pub id: OptimizationId,
    pub config: OptimizationConfig,
    pub state: OptimizationState,
    pub trials_completed: usize,
    pub trials_failed: usize,
    pub best_trial: Option<TrialResult>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl OptimizationStatus {
    pub fn new(config: OptimizationConfig) -> Self {
        Self {
            id: config.id,
            config,
            state: OptimizationState::Pending,
            trials_completed: 0,
            trials_failed: 0,
            best_trial: None,
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.state = OptimizationState::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_completed(&mut self) {
        self.state = OptimizationState::Completed;
        self.finished_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, error: String) {
        self.state = OptimizationState::Failed;
        self.finished_at = Some(Utc::now());
        self.error = Some(error);
    }

    /// Update the best trial if `result` improves on the current best.
    pub fn update_best(&mut self, result: &TrialResult) {
        let improved = match &self.best_trial {
            None => true,
            Some(current_best) => self
                .config
                .direction
                .is_better(result.objective, current_best.objective),
        };
        if improved {
            self.best_trial = Some(result.clone());
        }
    }

    pub fn trials_finished(&self) -> usize {
        self.trials_completed + self.trials_failed
    }
}

// ---------------------------------------------------------------------------
// Individual trial
// ---------------------------------------------------------------------------

/// One configuration evaluated by the caller's objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub id: Uuid,
    pub optimization_id: OptimizationId,
    pub trial_number: usize,
    pub parameters: BTreeMap<String, ParameterValue>,
    /// Hex checksum of the configuration.
    pub checksum: String,
    pub status: TrialStatus,
    pub result: Option<TrialResult>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl Trial {
    pub fn new(
        optimization_id: OptimizationId,
        trial_number: usize,
        config: &ParameterConfiguration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            optimization_id,
            trial_number,
            parameters: config.assignments(),
            checksum: config.checksum().to_hex(),
            status: TrialStatus::Pending,
            result: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.status = TrialStatus::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_completed(&mut self, result: TrialResult) {
        self.status = TrialStatus::Completed;
        self.finished_at = Some(Utc::now());
        self.result = Some(result);
    }

    pub fn mark_failed(&mut self, error: String) {
        self.status = TrialStatus::Failed;
        self.finished_at = Some(Utc::now());
        self.error = Some(error);
    }

    /// Wall time between start and finish, in milliseconds.
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Result of a single trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial_id: Uuid,
    pub objective: f64,
    pub metrics: HashMap<String, f64>,
    pub parameters: BTreeMap<String, ParameterValue>,
}

impl TrialResult {
    pub fn new(trial: &Trial, objective: f64) -> Self {
        Self {
            trial_id: trial.id,
            objective,
            metrics: HashMap::new(),
            parameters: trial.parameters.clone(),
        }
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }
}
