//! Structural checks of a configuration against the graph.

use ps_types::{ParameterConfiguration, ParameterValue};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;

use crate::graph::ParameterGraph;
use crate::node::NodeId;

/// One reason a configuration does not fit the graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "problem", rename_all = "snake_case")]
pub enum ValidationProblem {
    /// An active OR node has no AND child holding the parameter's value.
    MissingValue {
        parameter: String,
        node: String,
        value: Option<ParameterValue>,
    },
    /// A parameter is set although none of its OR nodes is reachable.
    SetButInactive {
        parameter: String,
        value: ParameterValue,
    },
}

impl fmt::Display for ValidationProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingValue {
                parameter,
                node,
                value: Some(value),
            } => write!(
                f,
                "{parameter} is active at {node} but {value} lies outside every sub-domain"
            ),
            Self::MissingValue {
                parameter, node, ..
            } => write!(f, "{parameter} is active at {node} but has no value"),
            Self::SetButInactive { parameter, value } => {
                write!(f, "{parameter} is set to {value} but should not be")
            }
        }
    }
}

/// Outcome of [`ParameterGraph::validate_parameter_configuration`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    problems: Vec<ValidationProblem>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn problems(&self) -> &[ValidationProblem] {
        &self.problems
    }

    pub fn into_problems(self) -> Vec<ValidationProblem> {
        self.problems
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            return write!(f, "valid");
        }
        let lines: Vec<String> = self.problems.iter().map(ToString::to_string).collect();
        write!(f, "{}", lines.join("; "))
    }
}

impl ParameterGraph {
    /// Walk the graph from the start node and check that every reachable
    /// parameter holds a value of a reachable sub-domain, and that nothing
    /// unreachable is set. Fixed parameters are exempt from the second check.
    ///
    /// Never fails; problems are collected in the report.
    pub fn validate_parameter_configuration(
        &self,
        config: &ParameterConfiguration,
    ) -> ValidationReport {
        let mut problems = Vec::new();
        let mut done = self.done_set();
        let mut visited = vec![false; self.parameters.len()];
        let mut handled = vec![false; self.nodes.len()];
        let mut frontier: BTreeSet<NodeId> = self.children(self.start).iter().copied().collect();

        while let Some(or_node) = frontier.iter().copied().find(|id| self.is_active(*id, &done)) {
            frontier.remove(&or_node);
            handled[or_node.index()] = true;
            let Some(parameter) = self.node(or_node).and_then(|n| n.parameter()) else {
                continue;
            };
            visited[parameter] = true;

            let value = config.value_at(parameter);
            let matches: Vec<NodeId> = match value {
                Some(value) => self
                    .children(or_node)
                    .iter()
                    .copied()
                    .filter(|id| {
                        self.node(*id)
                            .and_then(|n| n.domain())
                            .is_some_and(|d| d.contains(value))
                    })
                    .collect(),
                None => Vec::new(),
            };
            if matches.is_empty() {
                let problem = ValidationProblem::MissingValue {
                    parameter: self.parameter_label(parameter),
                    node: self.node_label(or_node).unwrap_or_default().to_string(),
                    value: value.cloned(),
                };
                warn!(%problem, "Configuration failed validation");
                problems.push(problem);
                continue;
            }
            for and_node in matches {
                done.insert(and_node);
                for child in self.children(and_node) {
                    if !handled[child.index()] {
                        frontier.insert(*child);
                    }
                }
            }
        }

        for (index, seen) in visited.iter().enumerate() {
            if *seen || self.fixed.contains_key(&index) {
                continue;
            }
            if let Some(value) = config.value_at(index).filter(|v| !v.is_absent_equivalent()) {
                let problem = ValidationProblem::SetButInactive {
                    parameter: self.parameter_label(index),
                    value: value.clone(),
                };
                warn!(%problem, "Configuration failed validation");
                problems.push(problem);
            }
        }

        ValidationReport { problems }
    }

    fn parameter_label(&self, index: usize) -> String {
        self.parameters
            .get(index)
            .map(|p| p.name().to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_graphs;
    use ps_types::FlagValue;

    fn conditional_config(heuristic: &str) -> ParameterConfiguration {
        let graph = test_graphs::conditional();
        let mut config = ParameterConfiguration::new(graph.parameter_set().clone());
        config.set_parameter_value("heuristic", Some(heuristic.into())).unwrap();
        config.set_parameter_value("restarts", Some(FlagValue::Off.into())).unwrap();
        config
    }

    #[test]
    fn accepts_complete_configuration() {
        let graph = test_graphs::conditional();
        let mut config = conditional_config("tabu");
        config.set_parameter_value("tenure", Some(ParameterValue::Integer(3))).unwrap();
        let report = graph.validate_parameter_configuration(&config);
        assert!(report.is_valid());
        assert_eq!(report.to_string(), "valid");
    }

    #[test]
    fn reports_missing_values() {
        let graph = test_graphs::conditional();
        let config = conditional_config("walk");
        let report = graph.validate_parameter_configuration(&config);
        assert!(!report.is_valid());
        assert_eq!(
            report.problems(),
            &[ValidationProblem::MissingValue {
                parameter: "noise".to_string(),
                node: "noise".to_string(),
                value: None,
            }]
        );
    }

    #[test]
    fn reports_values_of_inactive_parameters() {
        let graph = test_graphs::conditional();
        let mut config = conditional_config("walk");
        config.set_parameter_value("noise", Some(ParameterValue::Real(0.5))).unwrap();
        config.set_parameter_value("tenure", Some(ParameterValue::Integer(4))).unwrap();
        let report = graph.validate_parameter_configuration(&config);
        assert_eq!(
            report.into_problems(),
            vec![ValidationProblem::SetButInactive {
                parameter: "tenure".to_string(),
                value: ParameterValue::Integer(4),
            }]
        );
    }

    #[test]
    fn switched_off_flags_count_as_unset() {
        let graph = test_graphs::conjunctive();
        let mut config = ParameterConfiguration::new(graph.parameter_set().clone());
        config.set_parameter_value("restarts", Some(FlagValue::On.into())).unwrap();
        config.set_parameter_value("learning", Some(FlagValue::Off.into())).unwrap();
        assert!(graph.validate_parameter_configuration(&config).is_valid());

        config.set_parameter_value("depth", Some(ParameterValue::Integer(2))).unwrap();
        assert!(!graph.validate_parameter_configuration(&config).is_valid());

        config.set_parameter_value("learning", Some(FlagValue::On.into())).unwrap();
        assert!(graph.validate_parameter_configuration(&config).is_valid());
    }

    #[test]
    fn empty_configuration_misses_every_root_parameter() {
        let graph = test_graphs::sparrow();
        let config = ParameterConfiguration::new(graph.parameter_set().clone());
        let report = graph.validate_parameter_configuration(&config);
        assert_eq!(report.problems().len(), 4);
        assert!(report.to_string().contains("c1 is active at c1 but has no value"));
    }
}
