//! # ps-optimizer
//!
//! Search drivers on top of the parameter graph.
//!
//! Provides random, local and evolutionary search strategies that propose
//! configurations from a [`ps_graph::ParameterGraph`], plus in-memory trial
//! tracking for a run against a caller-supplied objective.

mod run;
mod search;
mod trial;

pub use run::OptimizationRun;
pub use search::{build_strategy, EvolutionStrategy, LocalSearch, RandomSearch, SearchStrategy};
pub use trial::{
    ObjectiveDirection, OptimizationConfig, OptimizationId, OptimizationState, OptimizationStatus,
    StrategyKind, Trial, TrialResult, TrialStatus,
};
