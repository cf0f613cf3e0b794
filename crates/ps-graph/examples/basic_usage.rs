//! Load a small conditional solver space, sample it and walk around it.
//!
//! Run with `RUST_LOG=ps_graph=debug` to see the operator logs.

use ps_graph::{GaussianNeighbourhood, ParameterGraph};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SOLVER_SPACE: &str = r#"{
  "parameters": [
    { "name": "heuristic", "domain": { "kind": "categorical", "categories": ["tabu", "walk"] } },
    { "name": "tenure", "domain": { "kind": "integer", "low": 1, "high": 50 } },
    { "name": "noise", "domain": { "kind": "real", "low": 0.0, "high": 1.0 } },
    { "name": "restarts", "domain": { "kind": "flag", "on": true, "off": true } }
  ],
  "nodes": [
    { "type": "start", "id": "start" },
    { "type": "or", "id": "heuristic", "parameter": "heuristic" },
    { "type": "and", "id": "heuristic_tabu", "parameter": "heuristic",
      "domain": { "kind": "categorical", "categories": ["tabu"] } },
    { "type": "and", "id": "heuristic_walk", "parameter": "heuristic",
      "domain": { "kind": "categorical", "categories": ["walk"] } },
    { "type": "or", "id": "tenure", "parameter": "tenure" },
    { "type": "and", "id": "tenure_vals", "parameter": "tenure",
      "domain": { "kind": "integer", "low": 1, "high": 50 } },
    { "type": "or", "id": "noise", "parameter": "noise" },
    { "type": "and", "id": "noise_vals", "parameter": "noise",
      "domain": { "kind": "real", "low": 0.0, "high": 1.0 } },
    { "type": "or", "id": "restarts", "parameter": "restarts" },
    { "type": "and", "id": "restarts_vals", "parameter": "restarts",
      "domain": { "kind": "flag", "on": true, "off": true } }
  ],
  "edges": [
    { "source": "start", "target": "heuristic" },
    { "source": "heuristic", "target": "heuristic_tabu" },
    { "source": "heuristic", "target": "heuristic_walk" },
    { "source": "heuristic_tabu", "target": "tenure" },
    { "source": "tenure", "target": "tenure_vals" },
    { "source": "heuristic_walk", "target": "noise" },
    { "source": "noise", "target": "noise_vals" },
    { "source": "start", "target": "restarts" },
    { "source": "restarts", "target": "restarts_vals" }
  ]
}"#;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let graph = ParameterGraph::from_json(SOLVER_SPACE)?;
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let mut config = graph.get_random_configuration(&mut rng);
    info!(%config, checksum = %config.checksum(), "Sampled configuration");

    let report = graph.validate_parameter_configuration(&config);
    info!(valid = report.is_valid(), "Validated configuration");

    let neighbourhood = graph.get_neighbourhood(&config);
    info!(size = neighbourhood.len(), "Full neighbourhood");

    let gaussian = GaussianNeighbourhood::new(0.1, 5);
    if let Some(neighbour) = graph.get_gaussian_random_neighbour(&config, &mut rng, &gaussian) {
        info!(%neighbour, "Gaussian neighbour");
    }

    graph.mutate_parameter_configuration(&mut rng, &mut config, 0.2, 0.5);
    info!(%config, "Mutated configuration");

    let other = graph.get_random_configuration(&mut rng);
    let (left, right) = graph.crossover(&config, &other, &mut rng);
    info!(%left, %right, "Crossover children");

    let parents = graph.conditional_parents(&["heuristic", "tenure", "noise", "restarts"])?;
    info!(?parents, "Conditional parents");

    Ok(())
}
