//! Search strategies over a parameter graph.

use ps_graph::{GaussianNeighbourhood, OperatorSettings, ParameterGraph};
use ps_types::ParameterConfiguration;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::trial::{ObjectiveDirection, OptimizationConfig, StrategyKind};

/// Common trait for all search strategies.
pub trait SearchStrategy: Send + Sync {
    /// Generate the next batch of configurations to evaluate.
    fn suggest(&mut self, count: usize) -> Vec<ParameterConfiguration>;

    /// Report completed trial results so adaptive strategies can learn.
    fn report(&mut self, _config: &ParameterConfiguration, _objective: f64) {}

    /// Human-readable strategy name.
    fn name(&self) -> &str;
}

/// Instantiate the strategy named by `config`.
pub fn build_strategy(
    config: &OptimizationConfig,
    graph: Arc<ParameterGraph>,
) -> Box<dyn SearchStrategy> {
    match config.strategy {
        StrategyKind::Random => Box::new(RandomSearch::new(graph, config.seed)),
        StrategyKind::Local => {
            let mut local = LocalSearch::new(graph, config.seed, config.direction);
            if config.gaussian_moves {
                local = local.with_gaussian(config.operators.gaussian.clone());
            }
            Box::new(local)
        }
        StrategyKind::Evolution => Box::new(
            EvolutionStrategy::new(graph, config.seed, config.direction, config.population_size)
                .with_operators(config.operators.clone())
                .with_crossover(config.crossover),
        ),
    }
}

// ---- Random search ----

/// Independent random configurations.
#[derive(Debug, Clone)]
pub struct RandomSearch {
    graph: Arc<ParameterGraph>,
    rng: ChaCha8Rng,
}

impl RandomSearch {
    pub fn new(graph: Arc<ParameterGraph>, seed: u64) -> Self {
        Self {
            graph,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl SearchStrategy for RandomSearch {
    fn suggest(&mut self, count: usize) -> Vec<ParameterConfiguration> {
        (0..count)
            .map(|_| self.graph.get_random_configuration(&mut self.rng))
            .collect()
    }

    fn name(&self) -> &str {
        "random"
    }
}

// ---- Local search ----

/// First-improvement local search around an incumbent.
///
/// Until a result is reported, suggestions are random configurations. After
/// that they are random neighbours of the best configuration seen; a random
/// restart replaces a neighbour when the incumbent has none.
#[derive(Debug, Clone)]
pub struct LocalSearch {
    graph: Arc<ParameterGraph>,
    rng: ChaCha8Rng,
    direction: ObjectiveDirection,
    gaussian: Option<GaussianNeighbourhood>,
    incumbent: Option<(ParameterConfiguration, f64)>,
}

impl LocalSearch {
    pub fn new(graph: Arc<ParameterGraph>, seed: u64, direction: ObjectiveDirection) -> Self {
        Self {
            graph,
            rng: ChaCha8Rng::seed_from_u64(seed),
            direction,
            gaussian: None,
            incumbent: None,
        }
    }

    /// Move to gaussian neighbours instead of uniform ones.
    pub fn with_gaussian(mut self, settings: GaussianNeighbourhood) -> Self {
        self.gaussian = Some(settings);
        self
    }

    pub fn incumbent(&self) -> Option<(&ParameterConfiguration, f64)> {
        self.incumbent.as_ref().map(|(config, objective)| (config, *objective))
    }

    fn next_move(&mut self) -> ParameterConfiguration {
        let Some((current, _)) = &self.incumbent else {
            return self.graph.get_random_configuration(&mut self.rng);
        };
        let neighbour = match &self.gaussian {
            Some(settings) => self
                .graph
                .get_gaussian_random_neighbour(current, &mut self.rng, settings),
            None => self.graph.get_random_neighbour(current, &mut self.rng),
        };
        neighbour.unwrap_or_else(|| {
            debug!("Incumbent has no neighbour, restarting");
            self.graph.get_random_configuration(&mut self.rng)
        })
    }
}

impl SearchStrategy for LocalSearch {
    fn suggest(&mut self, count: usize) -> Vec<ParameterConfiguration> {
        (0..count).map(|_| self.next_move()).collect()
    }

    fn report(&mut self, config: &ParameterConfiguration, objective: f64) {
        let improved = match &self.incumbent {
            None => true,
            Some((_, best)) => self.direction.is_better(objective, *best),
        };
        if improved {
            trace!(objective, "New incumbent");
            self.incumbent = Some((config.clone(), objective));
        }
    }

    fn name(&self) -> &str {
        "local"
    }
}

// ---- Evolution strategy ----

#[derive(Debug, Clone)]
struct Individual {
    config: ParameterConfiguration,
    fitness: Option<f64>,
    suggested: bool,
}

/// (μ+μ) evolution strategy over a population of configurations.
///
/// Every slot breeds one child per generation by optional component
/// crossover with another evaluated member followed by mutation. A child
/// replaces its parent when it is at least as good.
#[derive(Debug, Clone)]
pub struct EvolutionStrategy {
    graph: Arc<ParameterGraph>,
    rng: ChaCha8Rng,
    direction: ObjectiveDirection,
    operators: OperatorSettings,
    crossover: bool,
    population_size: usize,
    population: Vec<Individual>,
    pending: Vec<(usize, ParameterConfiguration)>,
    next_slot: usize,
}

impl EvolutionStrategy {
    pub fn new(
        graph: Arc<ParameterGraph>,
        seed: u64,
        direction: ObjectiveDirection,
        population_size: usize,
    ) -> Self {
        Self {
            graph,
            rng: ChaCha8Rng::seed_from_u64(seed),
            direction,
            operators: OperatorSettings::default(),
            crossover: false,
            population_size: population_size.max(1),
            population: Vec::new(),
            pending: Vec::new(),
            next_slot: 0,
        }
    }

    pub fn with_operators(mut self, operators: OperatorSettings) -> Self {
        self.operators = operators;
        self
    }

    pub fn with_crossover(mut self, crossover: bool) -> Self {
        self.crossover = crossover;
        self
    }

    /// Evaluated members, best first.
    pub fn ranked(&self) -> Vec<(&ParameterConfiguration, f64)> {
        let mut ranked: Vec<(&ParameterConfiguration, f64)> = self
            .population
            .iter()
            .filter_map(|i| i.fitness.map(|f| (&i.config, f)))
            .collect();
        let direction = self.direction;
        ranked.sort_by(|a, b| {
            let order = a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal);
            match direction {
                ObjectiveDirection::Minimize => order,
                ObjectiveDirection::Maximize => order.reverse(),
            }
        });
        ranked
    }

    fn seed_population(&mut self) {
        while self.population.len() < self.population_size {
            let config = self.graph.get_random_configuration(&mut self.rng);
            self.population.push(Individual {
                config,
                fitness: None,
                suggested: false,
            });
        }
        debug!(size = self.population.len(), "Seeded population");
    }

    fn breed(&mut self) -> ParameterConfiguration {
        let slot = self.next_slot % self.population.len();
        self.next_slot = slot + 1;
        let parent = &self.population[slot].config;

        let mut child = parent.clone();
        if self.crossover {
            let mates: Vec<usize> = (0..self.population.len())
                .filter(|&i| i != slot && self.population[i].fitness.is_some())
                .collect();
            if !mates.is_empty() {
                let mate = mates[self.rng.gen_range(0..mates.len())];
                let (first, _) = self
                    .graph
                    .crossover(parent, &self.population[mate].config, &mut self.rng);
                child = first;
            }
        }
        self.graph.mutate_parameter_configuration(
            &mut self.rng,
            &mut child,
            self.operators.mutation_std_dev_factor,
            self.operators.mutation_probability,
        );
        if child == self.population[slot].config {
            if let Some(neighbour) = self.graph.get_random_neighbour(&child, &mut self.rng) {
                child = neighbour;
            }
        }

        self.pending.push((slot, child.clone()));
        child
    }
}

impl SearchStrategy for EvolutionStrategy {
    fn suggest(&mut self, count: usize) -> Vec<ParameterConfiguration> {
        if self.population.is_empty() {
            self.seed_population();
        }
        let mut batch = Vec::with_capacity(count);
        for individual in self.population.iter_mut().filter(|i| !i.suggested) {
            if batch.len() == count {
                break;
            }
            individual.suggested = true;
            batch.push(individual.config.clone());
        }
        while batch.len() < count {
            batch.push(self.breed());
        }
        batch
    }

    fn report(&mut self, config: &ParameterConfiguration, objective: f64) {
        if let Some(individual) = self
            .population
            .iter_mut()
            .find(|i| i.fitness.is_none() && i.config == *config)
        {
            individual.fitness = Some(objective);
            return;
        }
        let Some(position) = self.pending.iter().position(|(_, child)| child == config) else {
            trace!("Reported configuration is not part of this population");
            return;
        };
        let (slot, child) = self.pending.swap_remove(position);
        let parent = &mut self.population[slot];
        let replace = match parent.fitness {
            None => true,
            Some(fitness) => !self.direction.is_better(fitness, objective),
        };
        if replace {
            trace!(slot, objective, "Child replaces parent");
            *parent = Individual {
                config: child,
                fitness: Some(objective),
                suggested: true,
            };
        }
    }

    fn name(&self) -> &str {
        "evolution"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps_graph::GraphBuilder;
    use ps_types::{Domain, ParameterValue};

    /// `noise` exists only for `heuristic = walk`.
    fn solver_space() -> Arc<ParameterGraph> {
        let graph = GraphBuilder::new()
            .start("start")
            .parameter("heuristic", Domain::categorical(["tabu", "walk"]))
            .parameter("noise", Domain::real(0.0, 1.0))
            .or_node("heuristic", "heuristic")
            .and_node("heuristic_tabu", "heuristic", Domain::categorical(["tabu"]))
            .and_node("heuristic_walk", "heuristic", Domain::categorical(["walk"]))
            .or_node("noise", "noise")
            .and_node("noise_vals", "noise", Domain::real(0.0, 1.0))
            .edge("start", "heuristic")
            .edge("heuristic", "heuristic_tabu")
            .edge("heuristic", "heuristic_walk")
            .edge("heuristic_walk", "noise")
            .edge("noise", "noise_vals")
            .unconditional("cutoff", Domain::integer(0, 100))
            .build()
            .unwrap();
        Arc::new(graph)
    }

    fn cost(config: &ParameterConfiguration) -> f64 {
        let cutoff = config
            .parameter_value("cutoff")
            .unwrap()
            .and_then(ParameterValue::as_f64)
            .unwrap_or(100.0);
        let noise = config
            .parameter_value("noise")
            .unwrap()
            .and_then(ParameterValue::as_f64)
            .unwrap_or(1.0);
        (cutoff - 30.0).abs() + 10.0 * noise
    }

    #[test]
    fn random_search_is_valid_and_reproducible() {
        let graph = solver_space();
        let mut a = RandomSearch::new(graph.clone(), 5);
        let mut b = RandomSearch::new(graph.clone(), 5);
        let first = a.suggest(20);
        assert_eq!(first, b.suggest(20));
        for config in &first {
            assert!(graph.validate_parameter_configuration(config).is_valid());
        }
    }

    #[test]
    fn local_search_moves_around_incumbent() {
        let graph = Arc::new(
            GraphBuilder::new()
                .start("start")
                .unconditional("cutoff", Domain::integer(0, 100))
                .unconditional("noise", Domain::real(0.0, 1.0))
                .build()
                .unwrap(),
        );
        let mut local = LocalSearch::new(graph.clone(), 11, ObjectiveDirection::Minimize);
        assert!(local.incumbent().is_none());

        let start = local.suggest(1).remove(0);
        local.report(&start, cost(&start));

        let neighbourhood = graph.get_neighbourhood(&start);
        for step in local.suggest(10) {
            assert_ne!(step, start);
            assert!(graph.validate_parameter_configuration(&step).is_valid());
            assert!(neighbourhood.contains(&step));
        }
    }

    #[test]
    fn local_search_improves() {
        let graph = solver_space();
        let mut local = LocalSearch::new(graph, 3, ObjectiveDirection::Minimize)
            .with_gaussian(GaussianNeighbourhood::new(0.2, 6));
        let first = local.suggest(1).remove(0);
        let initial = cost(&first);
        local.report(&first, initial);
        for _ in 0..200 {
            for config in local.suggest(1) {
                local.report(&config, cost(&config));
            }
        }
        let (_, best) = local.incumbent().unwrap();
        assert!(best <= initial);
    }

    #[test]
    fn evolution_first_suggests_the_population() {
        let graph = solver_space();
        let mut es = EvolutionStrategy::new(graph.clone(), 1, ObjectiveDirection::Minimize, 4);
        let initial = es.suggest(4);
        assert_eq!(initial.len(), 4);
        assert!(es.ranked().is_empty());
        for config in &initial {
            es.report(config, cost(config));
        }
        assert_eq!(es.ranked().len(), 4);
    }

    #[test]
    fn evolution_never_gets_worse() {
        let graph = solver_space();
        let mut es = EvolutionStrategy::new(graph.clone(), 9, ObjectiveDirection::Minimize, 6)
            .with_operators(OperatorSettings::default().with_mutation(0.2, 0.5))
            .with_crossover(true);

        let mut best = f64::INFINITY;
        for generation in 0..30 {
            for config in es.suggest(6) {
                assert!(graph.validate_parameter_configuration(&config).is_valid());
                es.report(&config, cost(&config));
            }
            let current = es.ranked()[0].1;
            if generation > 0 {
                assert!(current <= best);
            }
            best = current;
        }
    }

    #[test]
    fn strategies_built_from_config() {
        let graph = solver_space();
        let config = OptimizationConfig::new("es", StrategyKind::Evolution).with_seed(2);
        assert_eq!(build_strategy(&config, graph.clone()).name(), "evolution");
        let config = OptimizationConfig::new("ls", StrategyKind::Local).with_gaussian_moves(true);
        assert_eq!(build_strategy(&config, graph.clone()).name(), "local");
        let mut random = build_strategy(&OptimizationConfig::default(), graph);
        assert_eq!(random.suggest(3).len(), 3);
    }
}
