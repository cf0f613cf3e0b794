//! # ps-graph
//!
//! AND/OR parameter graphs: loading, sampling, neighbourhoods, mutation,
//! crossover and validation of configurations in conditional parameter
//! spaces.

pub mod builder;
pub mod conditional;
pub mod definition;
pub mod graph;
pub mod node;
pub mod settings;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_graphs;

pub use builder::GraphBuilder;
pub use conditional::ConditionalParent;
pub use definition::{EdgeDefinition, GraphDefinition, NodeDefinition};
pub use graph::ParameterGraph;
pub use node::{DoneSet, Edge, Node, NodeId};
pub use settings::{
    GaussianNeighbourhood, OperatorSettings, DEFAULT_GAUSSIAN_SAMPLES, DEFAULT_MUTATION_PROBABILITY,
    DEFAULT_STD_DEV_FACTOR,
};
pub use validation::{ValidationProblem, ValidationReport};
