//! In-memory optimization loop.

use ps_graph::ParameterGraph;
use ps_types::{ParameterConfiguration, PsResult};
use std::sync::Arc;
use tracing::{info, warn};

use crate::search::{build_strategy, SearchStrategy};
use crate::trial::{OptimizationConfig, OptimizationStatus, Trial, TrialResult};

/// Drives one strategy against a caller-supplied objective.
///
/// Evaluation happens in the caller's closure; the run only suggests,
/// records trials and tracks the best result.
pub struct OptimizationRun {
    graph: Arc<ParameterGraph>,
    strategy: Box<dyn SearchStrategy>,
    status: OptimizationStatus,
    trials: Vec<Trial>,
}

impl OptimizationRun {
    pub fn new(config: OptimizationConfig, graph: Arc<ParameterGraph>) -> PsResult<Self> {
        config.validate()?;
        let strategy = build_strategy(&config, graph.clone());
        Ok(Self {
            graph,
            strategy,
            status: OptimizationStatus::new(config),
            trials: Vec::new(),
        })
    }

    pub fn status(&self) -> &OptimizationStatus {
        &self.status
    }

    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    pub fn graph(&self) -> &Arc<ParameterGraph> {
        &self.graph
    }

    pub fn is_finished(&self) -> bool {
        self.trials.len() >= self.status.config.max_trials
    }

    /// Evaluate one suggested configuration. Returns `false` once the trial
    /// budget is spent.
    pub fn step<F>(&mut self, objective: &mut F) -> bool
    where
        F: FnMut(&ParameterConfiguration) -> Result<f64, String>,
    {
        if self.is_finished() {
            return false;
        }
        let Some(config) = self.strategy.suggest(1).into_iter().next() else {
            return false;
        };

        let mut trial = Trial::new(self.status.id, self.trials.len(), &config);
        trial.mark_running();
        match objective(&config) {
            Ok(value) => {
                let result = TrialResult::new(&trial, value);
                self.strategy.report(&config, value);
                self.status.update_best(&result);
                self.status.trials_completed += 1;
                trial.mark_completed(result);
            }
            Err(error) => {
                warn!(trial = trial.trial_number, %error, "Trial failed");
                self.status.trials_failed += 1;
                trial.mark_failed(error);
            }
        }
        self.trials.push(trial);
        true
    }

    /// Run until the trial budget is spent.
    pub fn run<F>(&mut self, mut objective: F) -> &OptimizationStatus
    where
        F: FnMut(&ParameterConfiguration) -> Result<f64, String>,
    {
        info!(
            strategy = self.strategy.name(),
            max_trials = self.status.config.max_trials,
            "Starting optimization run"
        );
        self.status.mark_running();
        while self.step(&mut objective) {}

        if self.status.trials_completed == 0 {
            self.status.mark_failed("No trial completed".to_string());
        } else {
            self.status.mark_completed();
        }
        info!(
            completed = self.status.trials_completed,
            failed = self.status.trials_failed,
            best = ?self.status.best_trial.as_ref().map(|t| t.objective),
            "Optimization run finished"
        );
        &self.status
    }
}
