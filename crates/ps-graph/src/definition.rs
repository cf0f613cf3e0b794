//! Serializable graph definitions.
//!
//! A definition refers to nodes by string id and to parameters by name. It is
//! what an external loader hands to [`ParameterGraph::from_definition`].
//!
//! [`ParameterGraph::from_definition`]: crate::ParameterGraph::from_definition

use ps_types::{Domain, Parameter, PsResult};
use serde::{Deserialize, Serialize};

/// One node of a definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeDefinition {
    Start {
        id: String,
    },
    And {
        id: String,
        parameter: String,
        #[serde(default)]
        domain: Option<Domain>,
    },
    Or {
        id: String,
        parameter: String,
    },
}

impl NodeDefinition {
    pub fn id(&self) -> &str {
        match self {
            Self::Start { id } | Self::And { id, .. } | Self::Or { id, .. } => id,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::And { .. } => "AND",
            Self::Or { .. } => "OR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDefinition {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub group: i32,
}

/// Parameters, nodes and edges of a parameter graph. A missing edge list
/// deserializes as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDefinition {
    pub parameters: Vec<Parameter>,
    pub nodes: Vec<NodeDefinition>,
    #[serde(default)]
    pub edges: Vec<EdgeDefinition>,
}

impl GraphDefinition {
    pub fn from_json(json: &str) -> PsResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> PsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "parameters": [
            { "name": "lookahead",
              "domain": { "kind": "categorical", "categories": ["atom", "body", "hybrid", "no"] } }
        ],
        "nodes": [
            { "type": "start", "id": "start" },
            { "type": "or", "id": "lookahead_or", "parameter": "lookahead" },
            { "type": "and", "id": "lookahead_vals", "parameter": "lookahead",
              "domain": { "kind": "categorical", "categories": ["atom", "body", "hybrid", "no"] } }
        ],
        "edges": [
            { "source": "start", "target": "lookahead_or" },
            { "source": "lookahead_or", "target": "lookahead_vals", "group": 0 }
        ]
    }"#;

    #[test]
    fn parses_json_definitions() {
        let def = GraphDefinition::from_json(MINIMAL).unwrap();
        assert_eq!(def.parameters.len(), 1);
        assert_eq!(def.nodes.len(), 3);
        assert_eq!(def.nodes[1].id(), "lookahead_or");
        assert_eq!(def.nodes[2].kind_name(), "AND");
        assert_eq!(def.edges[0].group, 0);
    }

    #[test]
    fn missing_edge_list_is_empty() {
        let def = GraphDefinition::from_json(
            r#"{ "parameters": [], "nodes": [ { "type": "start", "id": "s" } ] }"#,
        )
        .unwrap();
        assert!(def.edges.is_empty());
    }

    #[test]
    fn json_round_trip_preserves_definition() {
        let def = GraphDefinition::from_json(MINIMAL).unwrap();
        let again = GraphDefinition::from_json(&def.to_json().unwrap()).unwrap();
        assert_eq!(def, again);
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = GraphDefinition::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ps_types::PsError::Serialization(_)));
    }
}
