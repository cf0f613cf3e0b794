//! Tuning knobs for the search operators.

use ps_types::{config_error, PsResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_STD_DEV_FACTOR: f64 = 0.1;
pub const DEFAULT_MUTATION_PROBABILITY: f64 = 0.05;
pub const DEFAULT_GAUSSIAN_SAMPLES: usize = 10;

/// Settings of the gaussian neighbourhood operators.
///
/// Per-parameter maps override the defaults; parameters missing from a map
/// fall back to `std_dev_factor` and a samples factor of 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaussianNeighbourhood {
    pub std_dev_factor: f64,
    pub std_dev_by_parameter: BTreeMap<String, f64>,
    pub num_samples: usize,
    pub samples_factor_by_parameter: BTreeMap<String, f64>,
    /// Sample ordinal parameters from the gaussian too, instead of
    /// enumerating them.
    pub gaussian_ordinal: bool,
}

impl GaussianNeighbourhood {
    pub fn new(std_dev_factor: f64, num_samples: usize) -> Self {
        Self {
            std_dev_factor,
            num_samples,
            ..Self::default()
        }
    }

    pub fn with_std_dev(mut self, parameter: impl Into<String>, factor: f64) -> Self {
        self.std_dev_by_parameter.insert(parameter.into(), factor);
        self
    }

    pub fn with_samples_factor(mut self, parameter: impl Into<String>, factor: f64) -> Self {
        self.samples_factor_by_parameter.insert(parameter.into(), factor);
        self
    }

    pub fn with_gaussian_ordinal(mut self, gaussian_ordinal: bool) -> Self {
        self.gaussian_ordinal = gaussian_ordinal;
        self
    }

    pub fn std_dev_for(&self, parameter: &str) -> f64 {
        self.std_dev_by_parameter
            .get(parameter)
            .copied()
            .unwrap_or(self.std_dev_factor)
    }

    /// `round(num_samples * samples_factor)` for `parameter`.
    pub fn samples_for(&self, parameter: &str) -> usize {
        let factor = self
            .samples_factor_by_parameter
            .get(parameter)
            .copied()
            .unwrap_or(1.0);
        (self.num_samples as f64 * factor).round().max(0.0) as usize
    }

    pub fn validate(&self) -> PsResult<()> {
        let factors = std::iter::once(("std_dev_factor", self.std_dev_factor))
            .chain(self.std_dev_by_parameter.iter().map(|(k, v)| (k.as_str(), *v)))
            .chain(self.samples_factor_by_parameter.iter().map(|(k, v)| (k.as_str(), *v)));
        for (name, value) in factors {
            if !value.is_finite() || value < 0.0 {
                return Err(config_error!(
                    "Factor for {name} must be finite and non-negative, got {value}"
                ));
            }
        }
        Ok(())
    }
}

impl Default for GaussianNeighbourhood {
    fn default() -> Self {
        Self {
            std_dev_factor: DEFAULT_STD_DEV_FACTOR,
            std_dev_by_parameter: BTreeMap::new(),
            num_samples: DEFAULT_GAUSSIAN_SAMPLES,
            samples_factor_by_parameter: BTreeMap::new(),
            gaussian_ordinal: false,
        }
    }
}

/// Mutation and neighbourhood settings used by search drivers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorSettings {
    pub mutation_std_dev_factor: f64,
    pub mutation_probability: f64,
    pub gaussian: GaussianNeighbourhood,
}

impl OperatorSettings {
    pub fn from_json(json: &str) -> PsResult<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn with_mutation(mut self, std_dev_factor: f64, probability: f64) -> Self {
        self.mutation_std_dev_factor = std_dev_factor;
        self.mutation_probability = probability;
        self
    }

    pub fn with_gaussian(mut self, gaussian: GaussianNeighbourhood) -> Self {
        self.gaussian = gaussian;
        self
    }

    pub fn validate(&self) -> PsResult<()> {
        if !(0.0..=1.0).contains(&self.mutation_probability) {
            return Err(config_error!(
                "Mutation probability must be within [0, 1], got {}",
                self.mutation_probability
            ));
        }
        if !self.mutation_std_dev_factor.is_finite() || self.mutation_std_dev_factor < 0.0 {
            return Err(config_error!(
                "Mutation std-dev factor must be finite and non-negative, got {}",
                self.mutation_std_dev_factor
            ));
        }
        self.gaussian.validate()
    }
}

impl Default for OperatorSettings {
    fn default() -> Self {
        Self {
            mutation_std_dev_factor: DEFAULT_STD_DEV_FACTOR,
            mutation_probability: DEFAULT_MUTATION_PROBABILITY,
            gaussian: GaussianNeighbourhood::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = OperatorSettings::default();
        assert_eq!(settings.mutation_std_dev_factor, 0.1);
        assert_eq!(settings.mutation_probability, 0.05);
        assert!(!settings.gaussian.gaussian_ordinal);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn per_parameter_overrides_fall_back_to_defaults() {
        let gaussian = GaussianNeighbourhood::new(0.2, 8)
            .with_std_dev("c1", 0.05)
            .with_samples_factor("c1", 2.5);

        assert_eq!(gaussian.std_dev_for("c1"), 0.05);
        assert_eq!(gaussian.std_dev_for("ps"), 0.2);
        assert_eq!(gaussian.samples_for("c1"), 20);
        assert_eq!(gaussian.samples_for("ps"), 8);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let json = r#"{ "mutation_probability": 0.2, "gaussian": { "num_samples": 4 } }"#;
        let settings = OperatorSettings::from_json(json).unwrap();
        assert_eq!(settings.mutation_probability, 0.2);
        assert_eq!(settings.mutation_std_dev_factor, DEFAULT_STD_DEV_FACTOR);
        assert_eq!(settings.gaussian.num_samples, 4);
        assert_eq!(settings.gaussian.std_dev_factor, DEFAULT_STD_DEV_FACTOR);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(OperatorSettings::from_json(r#"{ "mutation_probability": 1.5 }"#).is_err());
        let bad = OperatorSettings::default()
            .with_gaussian(GaussianNeighbourhood::default().with_std_dev("x", -1.0));
        assert!(bad.validate().is_err());
    }
}
