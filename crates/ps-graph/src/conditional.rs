//! Export of conditional dependencies for surrogate models that consume
//! parameters as a fixed-order feature vector.

use ps_types::{ConfigurationError, Domain, FlagValue, GraphError, ParameterValue, PsResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::graph::ParameterGraph;
use crate::node::Node;

/// One AND-node parent of a conditional parameter.
///
/// `parent` indexes the ordered parameter list; `values` are the 1-based
/// codes of the parent values that enable the child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalParent {
    pub parent: usize,
    pub values: Vec<u32>,
}

impl ParameterGraph {
    /// Conditional parents of each parameter in `ordered`, in that order.
    ///
    /// An entry is `None` for an unconditional parameter (its OR node hangs
    /// off the start node) and for parameters without an OR node. Parents
    /// outside `ordered` are left out. Parent values are coded as their
    /// position in the sorted categories or in the ordinal list, and as
    /// 1 for OFF and 2 for ON.
    pub fn conditional_parents<S: AsRef<str>>(
        &self,
        ordered: &[S],
    ) -> PsResult<Vec<Option<Vec<ConditionalParent>>>> {
        let mut position = HashMap::with_capacity(ordered.len());
        for (i, name) in ordered.iter().enumerate() {
            let name = name.as_ref();
            let index = self
                .parameters
                .index_of(name)
                .ok_or_else(|| ConfigurationError::UnknownParameter { name: name.to_string() })?;
            position.insert(index, i);
        }

        let mut result = Vec::with_capacity(ordered.len());
        for name in ordered {
            let index = self.parameters.index_of(name.as_ref()).unwrap_or_default();
            let Some(&or_node) = self.or_nodes[index].first() else {
                result.push(None);
                continue;
            };
            let parents = self.parents(or_node);
            if parents.contains(&self.start) {
                result.push(None);
                continue;
            }

            let mut entries = Vec::with_capacity(parents.len());
            for parent in parents {
                let Some(Node::And { parameter, domain }) = self.node(*parent) else {
                    continue;
                };
                let Some(&slot) = position.get(parameter) else {
                    continue;
                };
                let values = self.parent_codes(*parameter, domain).ok_or_else(|| {
                    GraphError::NonCategoricalParent {
                        parameter: name.as_ref().to_string(),
                        parent: self
                            .parameters
                            .get(*parameter)
                            .map(|p| p.name().to_string())
                            .unwrap_or_default(),
                    }
                })?;
                entries.push(ConditionalParent { parent: slot, values });
            }
            result.push(Some(entries));
        }

        debug!(
            conditional = result.iter().filter(|e| e.is_some()).count(),
            "Exported conditional parents"
        );
        Ok(result)
    }

    fn parent_codes(&self, parameter: usize, constrained: &Domain) -> Option<Vec<u32>> {
        let full = self.parameters.get(parameter)?.domain();
        let code_of = |value: &ParameterValue| -> Option<u32> {
            let text = value.as_text()?;
            let index = match full {
                Domain::Categorical { categories } => categories.iter().position(|c| c == text),
                Domain::Ordinal { ordered } => ordered.iter().position(|o| o == text),
                _ => None,
            }?;
            u32::try_from(index + 1).ok()
        };
        match full {
            Domain::Categorical { .. } | Domain::Ordinal { .. } => Some(
                constrained
                    .discrete_values()
                    .iter()
                    .filter_map(code_of)
                    .collect(),
            ),
            Domain::Flag { .. } => {
                let off = constrained.contains(&ParameterValue::Flag(FlagValue::Off));
                let on = constrained.contains(&ParameterValue::Flag(FlagValue::On));
                Some(match (off, on) {
                    (true, true) => vec![1, 2],
                    (true, false) => vec![1],
                    _ => vec![2],
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_graphs;
    use crate::GraphBuilder;
    use ps_types::PsError;

    #[test]
    fn categorical_parent_codes() {
        let graph = test_graphs::conditional();
        let parents = graph
            .conditional_parents(&["heuristic", "noise", "restarts", "tenure"])
            .unwrap();
        assert_eq!(
            parents,
            vec![
                None,
                Some(vec![ConditionalParent { parent: 0, values: vec![2] }]),
                None,
                Some(vec![ConditionalParent { parent: 0, values: vec![1] }]),
            ]
        );
    }

    #[test]
    fn flag_parents_and_skipped_parents() {
        let graph = test_graphs::conjunctive();
        let parents = graph.conditional_parents(&["depth", "learning", "restarts"]).unwrap();
        assert_eq!(
            parents[0],
            Some(vec![
                ConditionalParent { parent: 2, values: vec![2] },
                ConditionalParent { parent: 1, values: vec![2] },
            ])
        );

        let partial = graph.conditional_parents(&["depth", "restarts"]).unwrap();
        assert_eq!(partial[0], Some(vec![ConditionalParent { parent: 1, values: vec![2] }]));
    }

    #[test]
    fn ordinal_parent_codes() {
        let graph = GraphBuilder::new()
            .start("start")
            .parameter("level", Domain::ordinal(["low", "mid", "high"]))
            .parameter("boost", Domain::integer(0, 3))
            .or_node("level", "level")
            .and_node("level_low", "level", Domain::ordinal(["low"]))
            .and_node("level_up", "level", Domain::ordinal(["mid", "high"]))
            .or_node("boost", "boost")
            .and_node("boost_vals", "boost", Domain::integer(0, 3))
            .edge("start", "level")
            .edge("level", "level_low")
            .edge("level", "level_up")
            .edge("level_up", "boost")
            .edge("boost", "boost_vals")
            .build()
            .unwrap();

        let parents = graph.conditional_parents(&["level", "boost"]).unwrap();
        assert_eq!(parents[1], Some(vec![ConditionalParent { parent: 0, values: vec![2, 3] }]));
    }

    #[test]
    fn numeric_parents_are_rejected() {
        let graph = GraphBuilder::new()
            .start("start")
            .unconditional("size", Domain::integer(1, 10))
            .parameter("extra", Domain::real(0.0, 1.0))
            .or_node("extra", "extra")
            .and_node("extra_vals", "extra", Domain::real(0.0, 1.0))
            .edge("size_vals", "extra")
            .edge("extra", "extra_vals")
            .build()
            .unwrap();

        let err = graph.conditional_parents(&["size", "extra"]).unwrap_err();
        assert!(matches!(err, PsError::Graph(GraphError::NonCategoricalParent { .. })));
        assert!(graph.conditional_parents(&["size", "ghost"]).is_err());
    }
}
