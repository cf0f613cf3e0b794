use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::domain::Domain;
use crate::errors::{ConfigurationError, PsResult};

/// A named, domain-typed variable. Identity is the name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub domain: Domain,
}

impl Parameter {
    pub fn new(name: impl Into<String>, domain: Domain) -> Self {
        Self {
            name: name.into(),
            domain,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Parameter {}

impl Hash for Parameter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for Parameter {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Parameter {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl AsRef<str> for Parameter {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Name-sorted parameter list shared by every configuration of one graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterSet {
    parameters: Vec<Parameter>,
}

impl ParameterSet {
    pub fn new<I: IntoIterator<Item = Parameter>>(parameters: I) -> PsResult<Self> {
        let mut parameters: Vec<Parameter> = parameters.into_iter().collect();
        let mut seen = HashSet::new();
        for parameter in &parameters {
            if !seen.insert(parameter.name.as_str()) {
                return Err(ConfigurationError::DuplicateParameter {
                    name: parameter.name.clone(),
                }
                .into());
            }
        }
        parameters.sort();
        Ok(Self { parameters })
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.parameters
            .binary_search_by(|p| p.name.as_str().cmp(name))
            .ok()
    }

    pub fn get(&self, index: usize) -> Option<&Parameter> {
        self.parameters.get(index)
    }

    pub fn by_name(&self, name: &str) -> Option<&Parameter> {
        self.index_of(name).and_then(|i| self.get(i))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.parameters.iter()
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.parameters.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PsError;

    #[test]
    fn parameters_compare_by_name_only() {
        let a = Parameter::new("alpha", Domain::integer(0, 10));
        let b = Parameter::new("alpha", Domain::real(0.0, 1.0));
        let c = Parameter::new("beta", Domain::integer(0, 10));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a < c);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(!set.insert(b));
    }

    #[test]
    fn parameter_set_sorts_and_indexes() {
        let set = ParameterSet::new(vec![
            Parameter::new("c", Domain::optional()),
            Parameter::new("a", Domain::flag(true, true)),
            Parameter::new("b", Domain::integer(1, 2)),
        ])
        .unwrap();

        let names: Vec<&str> = set.iter().map(Parameter::name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(set.index_of("b"), Some(1));
        assert_eq!(set.index_of("z"), None);
        assert_eq!(set.by_name("c").map(|p| p.domain().kind().name()), Some("Optional"));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn parameter_set_rejects_duplicates() {
        let result = ParameterSet::new(vec![
            Parameter::new("a", Domain::optional()),
            Parameter::new("a", Domain::integer(0, 1)),
        ]);
        assert!(matches!(
            result,
            Err(PsError::Configuration(ConfigurationError::DuplicateParameter { .. }))
        ));
    }
}
