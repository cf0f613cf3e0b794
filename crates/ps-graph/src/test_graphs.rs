//! Graphs shared by the unit tests.

use ps_types::Domain;

use crate::{GraphBuilder, ParameterGraph};

/// Four unconditional numeric parameters.
pub(crate) fn sparrow() -> ParameterGraph {
    GraphBuilder::new()
        .start("start")
        .unconditional("ps", Domain::real(0.0, 9.9))
        .unconditional("c1", Domain::integer(0, 50))
        .unconditional("c2", Domain::integer(0, 50))
        .unconditional("c3", Domain::integer(0, 20))
        .build()
        .unwrap()
}

/// `tenure` exists only for `heuristic = tabu`, `noise` only for `walk`.
pub(crate) fn conditional() -> ParameterGraph {
    GraphBuilder::new()
        .start("start")
        .parameter("heuristic", Domain::categorical(["tabu", "walk"]))
        .parameter("tenure", Domain::integer(1, 20))
        .parameter("noise", Domain::real(0.0, 1.0))
        .or_node("heuristic", "heuristic")
        .and_node("heuristic_tabu", "heuristic", Domain::categorical(["tabu"]))
        .and_node("heuristic_walk", "heuristic", Domain::categorical(["walk"]))
        .or_node("tenure", "tenure")
        .and_node("tenure_vals", "tenure", Domain::integer(1, 20))
        .or_node("noise", "noise")
        .and_node("noise_vals", "noise", Domain::real(0.0, 1.0))
        .edge("start", "heuristic")
        .edge("heuristic", "heuristic_tabu")
        .edge("heuristic", "heuristic_walk")
        .edge("heuristic_tabu", "tenure")
        .edge("tenure", "tenure_vals")
        .edge("heuristic_walk", "noise")
        .edge("noise", "noise_vals")
        .unconditional("restarts", Domain::flag(true, true))
        .build()
        .unwrap()
}

/// `depth` needs both flags switched on.
pub(crate) fn conjunctive() -> ParameterGraph {
    let mut builder = GraphBuilder::new()
        .start("start")
        .parameter("depth", Domain::integer(1, 5));
    for flag in ["restarts", "learning"] {
        builder = builder
            .parameter(flag, Domain::flag(true, true))
            .or_node(flag, flag)
            .and_node(format!("{flag}_on"), flag, Domain::flag(true, false))
            .and_node(format!("{flag}_off"), flag, Domain::flag(false, true))
            .edge("start", flag)
            .edge(flag, format!("{flag}_on"))
            .edge(flag, format!("{flag}_off"))
            .grouped_edge(format!("{flag}_on"), "depth", 1);
    }
    builder
        .or_node("depth", "depth")
        .and_node("depth_vals", "depth", Domain::integer(1, 5))
        .edge("depth", "depth_vals")
        .build()
        .unwrap()
}

/// `budget` is decided under both `alpha = ON` and `beta = ON`; `tuning`
/// hangs below the `beta` sub-domain of `budget`.
pub(crate) fn shared() -> ParameterGraph {
    let mut builder = GraphBuilder::new()
        .start("start")
        .parameter("budget", Domain::integer(1, 20))
        .parameter("tuning", Domain::integer(1, 3));
    for flag in ["alpha", "beta"] {
        builder = builder
            .parameter(flag, Domain::flag(true, true))
            .or_node(flag, flag)
            .and_node(format!("{flag}_on"), flag, Domain::flag(true, false))
            .and_node(format!("{flag}_off"), flag, Domain::flag(false, true))
            .edge("start", flag)
            .edge(flag, format!("{flag}_on"))
            .edge(flag, format!("{flag}_off"));
    }
    builder
        .or_node("budget_alpha", "budget")
        .and_node("budget_low", "budget", Domain::integer(1, 10))
        .and_node("budget_high", "budget", Domain::integer(11, 20))
        .or_node("budget_beta", "budget")
        .and_node("budget_all", "budget", Domain::integer(1, 20))
        .or_node("tuning", "tuning")
        .and_node("tuning_vals", "tuning", Domain::integer(1, 3))
        .edge("alpha_on", "budget_alpha")
        .edge("budget_alpha", "budget_low")
        .edge("budget_alpha", "budget_high")
        .edge("beta_on", "budget_beta")
        .edge("budget_beta", "budget_all")
        .edge("budget_all", "tuning")
        .edge("tuning", "tuning_vals")
        .build()
        .unwrap()
}
