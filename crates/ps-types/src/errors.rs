use thiserror::Error;

/// Main error type for the parameter-space engine
#[derive(Error, Debug)]
pub enum PsError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Settings error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Malformed value domains
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Inverted integer range: [{low},{high}]")]
    InvertedIntegerRange { low: i64, high: i64 },

    #[error("Invalid real range: [{low},{high}]")]
    InvalidRealRange { low: f64, high: f64 },

    #[error("{kind} domain has no values")]
    Empty { kind: String },

    #[error("Ordinal domain lists {value} more than once")]
    DuplicateOrdinal { value: String },
}

/// Errors raised while assigning values to a configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Parameter {name} is not part of this configuration")]
    UnknownParameter { name: String },

    #[error(
        "Domain of parameter {parameter} does not contain the given value {value} Domain: {domain}"
    )]
    ValueOutOfDomain {
        parameter: String,
        value: String,
        domain: String,
    },

    #[error("Duplicate parameter name: {name}")]
    DuplicateParameter { name: String },
}

/// Errors raised while building a parameter graph from a definition
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Duplicate node id: {id}")]
    DuplicateNode { id: String },

    #[error("Unknown node id: {id}")]
    UnknownNode { id: String },

    #[error("Node {node} references unknown parameter {parameter}")]
    UnknownParameter { node: String, parameter: String },

    #[error("Graph has no start node")]
    MissingStartNode,

    #[error("Graph has more than one start node: {id}")]
    DuplicateStartNode { id: String },

    #[error("AND node {node} has no domain")]
    MissingDomain { node: String },

    #[error("Invalid domain on node {node}: {source}")]
    InvalidDomain {
        node: String,
        #[source]
        source: DomainError,
    },

    #[error("Edge {source_node} -> {target_node} connects {source_kind} to {target_kind}")]
    InvalidEdge {
        source_node: String,
        target_node: String,
        source_kind: String,
        target_kind: String,
    },

    #[error("OR node {node} has no AND node children")]
    EmptyOrNode { node: String },

    #[error("Graph contains a cycle through node {node}")]
    Cycle { node: String },

    #[error("Parameter {parameter} has non-categorical conditional parent {parent}")]
    NonCategoricalParent { parameter: String, parent: String },
}

/// Result type alias for parameter-space operations
pub type PsResult<T> = Result<T, PsError>;

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::PsError::Internal(format!($($arg)*))
    };
}

/// Macro for creating settings errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::PsError::Config(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ConfigurationError::ValueOutOfDomain {
            parameter: "c1".to_string(),
            value: "1001".to_string(),
            domain: "[10,1000]".to_string(),
        };

        assert!(error.to_string().contains("c1"));
        assert!(error.to_string().contains("1001"));
        assert!(error.to_string().contains("[10,1000]"));
    }

    #[test]
    fn test_error_conversion() {
        let graph_error = GraphError::UnknownNode {
            id: "n7".to_string(),
        };
        let ps_error: PsError = graph_error.into();

        match ps_error {
            PsError::Graph(_) => (),
            _ => panic!("Expected Graph error"),
        }
    }

    #[test]
    fn test_macros() {
        let internal_err = internal_error!("Index {} out of range", 7);
        assert!(matches!(internal_err, PsError::Internal(_)));
        let config_err = config_error!("Missing required field: {}", "seed");
        assert!(config_err.to_string().contains("seed"));
    }
}
