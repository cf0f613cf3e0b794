use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::errors::{ConfigurationError, PsResult};
use crate::parameter::ParameterSet;
use crate::value::{format_real, ParameterValue, VALUE_TOLERANCE};

/// SHA-256 digest identifying the active assignments of a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Checksum([u8; 32]);

impl Checksum {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// An assignment of values to the parameters of one [`ParameterSet`].
///
/// Slots are `None` while unset. An OFF flag and `NOT_SPECIFIED` count as
/// unset for equality and for the checksum.
#[derive(Debug, Clone)]
pub struct ParameterConfiguration {
    parameters: Arc<ParameterSet>,
    values: Vec<Option<ParameterValue>>,
    checksum: OnceLock<Checksum>,
}

impl ParameterConfiguration {
    pub fn new(parameters: Arc<ParameterSet>) -> Self {
        let values = vec![None; parameters.len()];
        Self {
            parameters,
            values,
            checksum: OnceLock::new(),
        }
    }

    pub fn parameter_set(&self) -> &Arc<ParameterSet> {
        &self.parameters
    }

    fn index_of(&self, name: &str) -> PsResult<usize> {
        self.parameters.index_of(name).ok_or_else(|| {
            ConfigurationError::UnknownParameter {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Assign `value` to a parameter, or clear it with `None`.
    ///
    /// Integral values given to a real-valued parameter are stored as reals.
    pub fn set_parameter_value<P: AsRef<str>>(
        &mut self,
        parameter: P,
        value: Option<ParameterValue>,
    ) -> PsResult<()> {
        let name = parameter.as_ref();
        let index = self.index_of(name)?;
        let value = match value {
            Some(value) => {
                let domain = match self.parameters.get(index) {
                    Some(p) => p.domain(),
                    None => {
                        return Err(crate::internal_error!("Parameter index {index} out of range"))
                    }
                };
                if !domain.contains(&value) {
                    return Err(ConfigurationError::ValueOutOfDomain {
                        parameter: name.to_string(),
                        value: value.to_string(),
                        domain: domain.to_string(),
                    }
                    .into());
                }
                Some(domain.widen(value))
            }
            None => None,
        };
        self.set_parameter_value_unchecked(index, value);
        Ok(())
    }

    /// Assign by slot index without a domain check.
    ///
    /// Meant for values drawn from the parameter's own domain. Out-of-range
    /// indices are ignored.
    pub fn set_parameter_value_unchecked(&mut self, index: usize, value: Option<ParameterValue>) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value;
            self.checksum.take();
        }
    }

    /// Clear a parameter. Unknown names are ignored.
    pub fn unset_parameter<P: AsRef<str>>(&mut self, parameter: P) {
        if let Some(index) = self.parameters.index_of(parameter.as_ref()) {
            self.set_parameter_value_unchecked(index, None);
        }
    }

    pub fn parameter_value<P: AsRef<str>>(
        &self,
        parameter: P,
    ) -> PsResult<Option<&ParameterValue>> {
        let index = self.index_of(parameter.as_ref())?;
        Ok(self.value_at(index))
    }

    pub fn value_at(&self, index: usize) -> Option<&ParameterValue> {
        self.values.get(index).and_then(Option::as_ref)
    }

    fn active_value_at(&self, index: usize) -> Option<&ParameterValue> {
        self.value_at(index).filter(|v| !v.is_absent_equivalent())
    }

    /// Memoized digest of the active assignments.
    pub fn checksum(&self) -> Checksum {
        *self.checksum.get_or_init(|| self.compute_checksum())
    }

    /// Recompute the digest now.
    pub fn update_checksum(&mut self) -> Checksum {
        self.checksum.take();
        self.checksum()
    }

    fn compute_checksum(&self) -> Checksum {
        let mut hasher = Sha256::new();
        for index in 0..self.values.len() {
            match self.active_value_at(index) {
                Some(ParameterValue::Real(r)) => {
                    // snapped to the equality grid
                    let snapped = (r / VALUE_TOLERANCE).round() * VALUE_TOLERANCE;
                    hasher.update(format_real(snapped).as_bytes());
                }
                Some(value) => hasher.update(value.to_string().as_bytes()),
                None => {}
            }
        }
        Checksum(hasher.finalize().into())
    }

    /// Present values keyed by parameter name.
    pub fn assignments(&self) -> BTreeMap<String, ParameterValue> {
        self.parameters
            .iter()
            .zip(&self.values)
            .filter_map(|(p, v)| v.as_ref().map(|v| (p.name.clone(), v.clone())))
            .collect()
    }
}

impl PartialEq for ParameterConfiguration {
    fn eq(&self, other: &Self) -> bool {
        let same_parameters = Arc::ptr_eq(&self.parameters, &other.parameters)
            || self
                .parameters
                .iter()
                .map(|p| p.name())
                .eq(other.parameters.iter().map(|p| p.name()));
        if !same_parameters {
            return false;
        }
        (0..self.values.len()).all(|i| match (self.active_value_at(i), other.active_value_at(i)) {
            (None, None) => true,
            (Some(a), Some(b)) => a.approx_eq(b),
            _ => false,
        })
    }
}

impl fmt::Display for ParameterConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .parameters
            .iter()
            .zip(&self.values)
            .filter_map(|(p, v)| v.as_ref().map(|v| format!("{}: {}", p.name, v)))
            .collect();
        write!(f, "{}", pairs.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;
    use crate::errors::PsError;
    use crate::parameter::Parameter;
    use crate::value::FlagValue;

    fn parameter_set() -> Arc<ParameterSet> {
        Arc::new(
            ParameterSet::new(vec![
                Parameter::new("c1", Domain::integer(10, 1000)),
                Parameter::new("r", Domain::real(0.0, 10.0)),
                Parameter::new("flag", Domain::flag(true, true)),
                Parameter::new(
                    "opt",
                    Domain::mixed(vec![Domain::optional(), Domain::integer(1, 3)]),
                ),
                Parameter::new("heur", Domain::categorical(["a", "b"])),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn set_and_read_values() {
        let mut config = ParameterConfiguration::new(parameter_set());
        config.set_parameter_value("c1", Some(ParameterValue::Integer(10))).unwrap();
        config.set_parameter_value("heur", Some("b".into())).unwrap();

        assert_eq!(config.parameter_value("c1").unwrap(), Some(&ParameterValue::Integer(10)));
        assert_eq!(config.parameter_value("heur").unwrap(), Some(&"b".into()));
        assert_eq!(config.parameter_value("r").unwrap(), None);

        config.set_parameter_value("c1", None).unwrap();
        assert_eq!(config.parameter_value("c1").unwrap(), None);
    }

    #[test]
    fn rejects_foreign_parameters_and_values() {
        let mut config = ParameterConfiguration::new(parameter_set());
        let foreign = config.set_parameter_value("nope", Some(ParameterValue::Integer(1)));
        assert!(matches!(
            foreign,
            Err(PsError::Configuration(ConfigurationError::UnknownParameter { .. }))
        ));

        let out_of_domain = config.set_parameter_value("c1", Some(ParameterValue::Integer(1001)));
        assert!(matches!(
            out_of_domain,
            Err(PsError::Configuration(ConfigurationError::ValueOutOfDomain { .. }))
        ));
        assert!(config.set_parameter_value("c1", Some(ParameterValue::Real(10.5))).is_err());
        assert!(config.parameter_value("nope").is_err());
    }

    #[test]
    fn integers_widen_on_real_parameters() {
        let mut config = ParameterConfiguration::new(parameter_set());
        config.set_parameter_value("r", Some(ParameterValue::Integer(5))).unwrap();
        assert_eq!(config.parameter_value("r").unwrap(), Some(&ParameterValue::Real(5.0)));
        assert_eq!(config.to_string(), "r: 5.0");
    }

    #[test]
    fn setters_accept_parameters() {
        let set = parameter_set();
        let heur = set.by_name("heur").unwrap().clone();
        let mut config = ParameterConfiguration::new(set);
        config.set_parameter_value(&heur, Some("a".into())).unwrap();
        assert_eq!(config.parameter_value(&heur).unwrap(), Some(&"a".into()));
        config.unset_parameter(&heur);
        assert_eq!(config.parameter_value(&heur).unwrap(), None);
        config.unset_parameter("unknown");
    }

    #[test]
    fn absent_equivalents_compare_equal() {
        let set = parameter_set();
        let mut a = ParameterConfiguration::new(set.clone());
        let mut b = ParameterConfiguration::new(set);
        a.set_parameter_value("c1", Some(ParameterValue::Integer(20))).unwrap();
        b.set_parameter_value("c1", Some(ParameterValue::Integer(20))).unwrap();

        a.set_parameter_value("flag", Some(ParameterValue::Flag(FlagValue::Off))).unwrap();
        b.set_parameter_value("opt", Some(ParameterValue::NotSpecified)).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.update_checksum(), b.update_checksum());

        b.set_parameter_value("flag", Some(ParameterValue::Flag(FlagValue::On))).unwrap();
        assert_ne!(a, b);
        assert_ne!(a.checksum(), b.checksum());
    }

    #[test]
    fn reals_compare_with_tolerance() {
        let set = parameter_set();
        let mut a = ParameterConfiguration::new(set.clone());
        let mut b = ParameterConfiguration::new(set);
        a.set_parameter_value("r", Some(ParameterValue::Real(0.3))).unwrap();
        b.set_parameter_value("r", Some(ParameterValue::Real(0.3 + 1e-12))).unwrap();
        assert_eq!(a, b);
        b.set_parameter_value("r", Some(ParameterValue::Real(0.31))).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn tolerance_equal_reals_share_a_checksum() {
        let set = parameter_set();
        let mut a = ParameterConfiguration::new(set.clone());
        let mut b = ParameterConfiguration::new(set);
        a.set_parameter_value("r", Some(ParameterValue::Real(0.3))).unwrap();
        b.set_parameter_value("r", Some(ParameterValue::Real(0.3 + 1e-12))).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.update_checksum(), b.update_checksum());

        b.set_parameter_value("r", Some(ParameterValue::Real(0.31))).unwrap();
        assert_ne!(a.update_checksum(), b.update_checksum());
    }

    #[test]
    fn checksum_follows_every_mutation() {
        let mut config = ParameterConfiguration::new(parameter_set());
        let empty = config.checksum();
        config.set_parameter_value("c1", Some(ParameterValue::Integer(11))).unwrap();
        let one = config.checksum();
        assert_ne!(empty, one);
        config.unset_parameter("c1");
        assert_eq!(config.checksum(), empty);
        assert_eq!(config.checksum().to_hex().len(), 64);
    }

    #[test]
    fn clone_equals_original() {
        let mut config = ParameterConfiguration::new(parameter_set());
        config.set_parameter_value("c1", Some(ParameterValue::Integer(500))).unwrap();
        config.set_parameter_value("heur", Some("a".into())).unwrap();
        let copy = config.clone();
        assert_eq!(copy, config);
        assert_eq!(copy.checksum(), config.checksum());
    }

    #[test]
    fn display_and_assignments_are_name_sorted() {
        let mut config = ParameterConfiguration::new(parameter_set());
        config.set_parameter_value("heur", Some("a".into())).unwrap();
        config.set_parameter_value("c1", Some(ParameterValue::Integer(42))).unwrap();
        assert_eq!(config.to_string(), "c1: 42 heur: a");

        let names: Vec<String> = config.assignments().into_keys().collect();
        assert_eq!(names, vec!["c1".to_string(), "heur".to_string()]);
    }
}
