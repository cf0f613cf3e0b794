//! Value domains.
//!
//! A [`Domain`] describes a value space, never a value. Every kind supports
//! membership tests, uniform sampling, gaussian perturbation, discrete
//! enumeration and midpoint computation.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::errors::DomainError;
use crate::value::{format_real, FlagValue, ParameterValue};

/// Number of grid points used to enumerate a real interval.
pub const REAL_DISCRETE_SAMPLES: usize = 100;

/// Draw budget per requested sample in [`Domain::gaussian_discrete_values`].
pub const GAUSSIAN_TRIES_PER_SAMPLE: usize = 10;

/// The kind of a [`Domain`], without its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DomainKind {
    Integer,
    Real,
    Categorical,
    Ordinal,
    Flag,
    Optional,
    Mixed,
}

impl DomainKind {
    pub const ALL: [DomainKind; 7] = [
        Self::Categorical,
        Self::Flag,
        Self::Integer,
        Self::Mixed,
        Self::Optional,
        Self::Ordinal,
        Self::Real,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Integer => "Integer",
            Self::Real => "Real",
            Self::Categorical => "Categorical",
            Self::Ordinal => "Ordinal",
            Self::Flag => "Flag",
            Self::Optional => "Optional",
            Self::Mixed => "Mixed",
        }
    }
}

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value space for a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Domain {
    /// Whole numbers in `[low, high]`.
    Integer { low: i64, high: i64 },
    /// Continuous interval `[low, high]`.
    Real { low: f64, high: f64 },
    /// Unordered set of labels.
    Categorical { categories: BTreeSet<String> },
    /// Ordered list of labels.
    Ordinal { ordered: Vec<String> },
    /// Subset of `{ON, OFF}`.
    Flag { on: bool, off: bool },
    /// The single value `NOT_SPECIFIED`.
    Optional,
    /// Union of sub-domains.
    Mixed { domains: Vec<Domain> },
}

fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    StandardNormal.sample(rng)
}

/// `n` evenly spaced points across `[low, high]`, both ends included.
fn evenly_spaced(low: f64, high: f64, n: usize) -> Vec<ParameterValue> {
    match n {
        0 => Vec::new(),
        1 => vec![ParameterValue::Real(low)],
        _ => (0..n)
            .map(|i| {
                let t = i as f64 / (n - 1) as f64;
                ParameterValue::Real(low * (1.0 - t) + high * t)
            })
            .collect(),
    }
}

impl Domain {
    pub fn integer(low: i64, high: i64) -> Self {
        Self::Integer { low, high }
    }

    pub fn real(low: f64, high: f64) -> Self {
        Self::Real { low, high }
    }

    pub fn categorical<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Categorical {
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    pub fn ordinal<I, S>(ordered: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Ordinal {
            ordered: ordered.into_iter().map(Into::into).collect(),
        }
    }

    pub fn flag(on: bool, off: bool) -> Self {
        Self::Flag { on, off }
    }

    pub fn optional() -> Self {
        Self::Optional
    }

    pub fn mixed(domains: Vec<Domain>) -> Self {
        Self::Mixed { domains }
    }

    pub fn kind(&self) -> DomainKind {
        match self {
            Self::Integer { .. } => DomainKind::Integer,
            Self::Real { .. } => DomainKind::Real,
            Self::Categorical { .. } => DomainKind::Categorical,
            Self::Ordinal { .. } => DomainKind::Ordinal,
            Self::Flag { .. } => DomainKind::Flag,
            Self::Optional => DomainKind::Optional,
            Self::Mixed { .. } => DomainKind::Mixed,
        }
    }

    /// Reject empty or inverted value spaces.
    pub fn validate(&self) -> Result<(), DomainError> {
        match self {
            Self::Integer { low, high } => {
                if low > high {
                    return Err(DomainError::InvertedIntegerRange {
                        low: *low,
                        high: *high,
                    });
                }
            }
            Self::Real { low, high } => {
                if !(low.is_finite() && high.is_finite() && low <= high) {
                    return Err(DomainError::InvalidRealRange {
                        low: *low,
                        high: *high,
                    });
                }
            }
            Self::Categorical { categories } => {
                if categories.is_empty() {
                    return Err(self.empty_error());
                }
            }
            Self::Ordinal { ordered } => {
                if ordered.is_empty() {
                    return Err(self.empty_error());
                }
                let mut seen = BTreeSet::new();
                for value in ordered {
                    if !seen.insert(value) {
                        return Err(DomainError::DuplicateOrdinal {
                            value: value.clone(),
                        });
                    }
                }
            }
            Self::Flag { on, off } => {
                if !on && !off {
                    return Err(self.empty_error());
                }
            }
            Self::Optional => {}
            Self::Mixed { domains } => {
                if domains.is_empty() {
                    return Err(self.empty_error());
                }
                for domain in domains {
                    domain.validate()?;
                }
            }
        }
        Ok(())
    }

    fn empty_error(&self) -> DomainError {
        DomainError::Empty {
            kind: self.kind().name().to_string(),
        }
    }

    /// Store integral values given to a real interval as reals.
    pub fn widen(&self, value: ParameterValue) -> ParameterValue {
        match (self, value) {
            (Self::Real { .. }, ParameterValue::Integer(i)) => ParameterValue::Real(i as f64),
            (_, value) => value,
        }
    }

    /// Number of discrete values, `None` for continuous domains.
    pub fn size(&self) -> Option<usize> {
        match self {
            Self::Integer { low, high } => {
                if high < low {
                    Some(0)
                } else {
                    usize::try_from(high.abs_diff(*low)).ok()?.checked_add(1)
                }
            }
            Self::Real { .. } => None,
            Self::Categorical { categories } => Some(categories.len()),
            Self::Ordinal { ordered } => Some(ordered.len()),
            Self::Flag { .. } => Some(self.flag_values().len()),
            Self::Optional => Some(1),
            Self::Mixed { domains } => domains.iter().map(Domain::size).sum(),
        }
    }

    fn flag_values(&self) -> Vec<FlagValue> {
        match self {
            Self::Flag { on, off } => {
                let mut values = Vec::with_capacity(2);
                if *on {
                    values.push(FlagValue::On);
                }
                if *off {
                    values.push(FlagValue::Off);
                }
                values
            }
            _ => Vec::new(),
        }
    }

    pub fn contains(&self, value: &ParameterValue) -> bool {
        match (self, value) {
            (Self::Integer { low, high }, ParameterValue::Integer(i)) => low <= i && i <= high,
            (Self::Real { low, high }, ParameterValue::Integer(i)) => {
                let d = *i as f64;
                d >= *low && d <= *high
            }
            (Self::Real { low, high }, ParameterValue::Real(r)) => r >= low && r <= high,
            (Self::Categorical { categories }, ParameterValue::Text(s)) => categories.contains(s),
            (Self::Ordinal { ordered }, ParameterValue::Text(s)) => ordered.contains(s),
            (Self::Flag { on, off }, ParameterValue::Flag(flag)) => match flag {
                FlagValue::On => *on,
                FlagValue::Off => *off,
            },
            (Self::Optional, ParameterValue::NotSpecified) => true,
            (Self::Mixed { domains }, v) => domains.iter().any(|d| d.contains(v)),
            _ => false,
        }
    }

    /// Draw a value uniformly at random.
    ///
    /// # Panics
    ///
    /// Panics on an empty domain; [`Domain::validate`] rules those out.
    pub fn random_value<R: Rng + ?Sized>(&self, rng: &mut R) -> ParameterValue {
        match self {
            Self::Integer { low, high } => ParameterValue::Integer(rng.gen_range(*low..=*high)),
            Self::Real { low, high } => ParameterValue::Real(rng.gen_range(*low..=*high)),
            Self::Categorical { categories } => {
                let idx = rng.gen_range(0..categories.len());
                categories
                    .iter()
                    .nth(idx)
                    .map(|c| ParameterValue::Text(c.clone()))
                    .unwrap_or(ParameterValue::NotSpecified)
            }
            Self::Ordinal { ordered } => {
                ParameterValue::Text(ordered[rng.gen_range(0..ordered.len())].clone())
            }
            Self::Flag { .. } => {
                let values = self.flag_values();
                ParameterValue::Flag(values[rng.gen_range(0..values.len())])
            }
            Self::Optional => ParameterValue::NotSpecified,
            Self::Mixed { domains } => domains[rng.gen_range(0..domains.len())].random_value(rng),
        }
    }

    /// Perturb `value` within the domain.
    ///
    /// Numeric kinds add a gaussian offset whose standard deviation is the
    /// domain span times `std_dev_factor`; unordered kinds re-roll. Values
    /// outside the domain are returned unchanged.
    pub fn mutated_value<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        value: &ParameterValue,
        std_dev_factor: f64,
    ) -> ParameterValue {
        if !self.contains(value) {
            return value.clone();
        }
        match self {
            Self::Integer { low, high } => {
                let Some(current) = value.as_f64() else {
                    return value.clone();
                };
                let offset = standard_normal(rng) * ((high - low) as f64 * std_dev_factor);
                let mutated = (current + offset).round().clamp(*low as f64, *high as f64);
                ParameterValue::Integer(mutated as i64)
            }
            Self::Real { low, high } => {
                let Some(current) = value.as_f64() else {
                    return value.clone();
                };
                let offset = standard_normal(rng) * ((high - low) * std_dev_factor);
                ParameterValue::Real((current + offset).clamp(*low, *high))
            }
            Self::Categorical { .. } | Self::Flag { .. } => self.random_value(rng),
            Self::Optional => ParameterValue::NotSpecified,
            Self::Ordinal { ordered } => {
                let Some(idx) = value
                    .as_text()
                    .and_then(|s| ordered.iter().position(|o| o == s))
                else {
                    return value.clone();
                };
                let step = (standard_normal(rng) * (ordered.len() as f64 * std_dev_factor)).round();
                let last = (ordered.len() - 1) as f64;
                let next = (idx as f64 + step).clamp(0.0, last) as usize;
                ParameterValue::Text(ordered[next].clone())
            }
            Self::Mixed { domains } => {
                let holders: Vec<&Domain> = domains.iter().filter(|d| d.contains(value)).collect();
                let chosen = holders[rng.gen_range(0..holders.len())];
                chosen.mutated_value(rng, value, std_dev_factor)
            }
        }
    }

    /// Enumerate the domain. Real intervals yield
    /// [`REAL_DISCRETE_SAMPLES`] evenly spaced points.
    pub fn discrete_values(&self) -> Vec<ParameterValue> {
        match self {
            Self::Integer { low, high } => (*low..=*high).map(ParameterValue::Integer).collect(),
            Self::Real { low, high } => {
                if low < high {
                    evenly_spaced(*low, *high, REAL_DISCRETE_SAMPLES)
                } else {
                    vec![ParameterValue::Real(*low)]
                }
            }
            Self::Categorical { categories } => categories
                .iter()
                .map(|c| ParameterValue::Text(c.clone()))
                .collect(),
            Self::Ordinal { ordered } => ordered
                .iter()
                .map(|o| ParameterValue::Text(o.clone()))
                .collect(),
            Self::Flag { .. } => self
                .flag_values()
                .into_iter()
                .map(ParameterValue::Flag)
                .collect(),
            Self::Optional => vec![ParameterValue::NotSpecified],
            Self::Mixed { domains } => domains.iter().flat_map(Domain::discrete_values).collect(),
        }
    }

    /// Sample `number_samples` values from the mutation distribution around
    /// `value`. Finite numeric and ordinal domains return distinct values and
    /// fall back to full enumeration when they hold no more than
    /// `number_samples` values.
    pub fn gaussian_discrete_values<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        value: &ParameterValue,
        std_dev_factor: f64,
        number_samples: usize,
    ) -> Vec<ParameterValue> {
        match self {
            Self::Integer { .. } | Self::Ordinal { .. } => {
                let size = self.size().unwrap_or(usize::MAX);
                if number_samples == 0 {
                    return Vec::new();
                }
                if number_samples == 1 || std_dev_factor == 0.0 {
                    return vec![self.mutated_value(rng, value, std_dev_factor)];
                }
                if number_samples >= size {
                    return self.discrete_values();
                }
                let mut values: Vec<ParameterValue> = Vec::with_capacity(number_samples);
                let max_tries = GAUSSIAN_TRIES_PER_SAMPLE * number_samples;
                for _ in 0..max_tries {
                    if values.len() == number_samples {
                        break;
                    }
                    let candidate = self.mutated_value(rng, value, std_dev_factor);
                    if !values.contains(&candidate) {
                        values.push(candidate);
                    }
                }
                values
            }
            Self::Real { .. } => (0..number_samples)
                .map(|_| self.mutated_value(rng, value, std_dev_factor))
                .collect(),
            _ => self.discrete_values(),
        }
    }

    /// `number_samples` evenly spaced values, both ends included.
    pub fn uniform_distributed_values(&self, number_samples: usize) -> Vec<ParameterValue> {
        if number_samples == 0 {
            return Vec::new();
        }
        match self {
            Self::Integer { low, high } => {
                if number_samples >= self.size().unwrap_or(usize::MAX) {
                    return self.discrete_values();
                }
                if number_samples == 1 {
                    return vec![ParameterValue::Integer(*low)];
                }
                let span = (*high - *low) as f64;
                (0..number_samples)
                    .map(|i| {
                        let offset = i as f64 * span / (number_samples - 1) as f64;
                        ParameterValue::Integer(low + offset.round() as i64)
                    })
                    .collect()
            }
            Self::Real { low, high } => evenly_spaced(*low, *high, number_samples),
            Self::Ordinal { ordered } => {
                if number_samples >= ordered.len() {
                    return self.discrete_values();
                }
                if number_samples == 1 {
                    return vec![ParameterValue::Text(ordered[0].clone())];
                }
                let last = (ordered.len() - 1) as f64;
                (0..number_samples)
                    .map(|i| {
                        let idx = (i as f64 * last / (number_samples - 1) as f64).round() as usize;
                        ParameterValue::Text(ordered[idx].clone())
                    })
                    .collect()
            }
            _ => self.discrete_values(),
        }
    }

    /// The domain-specific point strictly between `a` and `b`, if any.
    pub fn mid_value(&self, a: &ParameterValue, b: &ParameterValue) -> Option<ParameterValue> {
        match self {
            Self::Integer { .. } => {
                let (ParameterValue::Integer(x), ParameterValue::Integer(y)) = (a, b) else {
                    return None;
                };
                let mid = ((*x as i128 + *y as i128) / 2) as i64;
                if mid == *x || mid == *y {
                    None
                } else {
                    Some(ParameterValue::Integer(mid))
                }
            }
            Self::Real { .. } => {
                let (x, y) = (a.as_f64()?, b.as_f64()?);
                let mid = x / 2.0 + y / 2.0;
                if mid == x || mid == y {
                    None
                } else {
                    Some(ParameterValue::Real(mid))
                }
            }
            Self::Ordinal { ordered } => {
                let position = |v: &ParameterValue| {
                    v.as_text()
                        .and_then(|s| ordered.iter().position(|o| o == s))
                };
                let (i, j) = (position(a)?, position(b)?);
                let mid = (i + j) / 2;
                if i == j || mid == i || mid == j {
                    None
                } else {
                    Some(ParameterValue::Text(ordered[mid].clone()))
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer { low, high } => write!(f, "[{low},{high}]"),
            Self::Real { low, high } => write!(f, "[{},{}]", format_real(*low), format_real(*high)),
            Self::Categorical { categories } => {
                let joined: Vec<&str> = categories.iter().map(String::as_str).collect();
                write!(f, "{{{}}}", joined.join(", "))
            }
            Self::Ordinal { ordered } => write!(f, "[{}]", ordered.join(",")),
            Self::Flag { .. } => {
                let joined: Vec<String> =
                    self.flag_values().iter().map(|v| v.to_string()).collect();
                write!(f, "{{{}}}", joined.join(", "))
            }
            Self::Optional => write!(f, "{{<not specified>}}"),
            Self::Mixed { domains } => {
                let joined: Vec<String> = domains.iter().map(|d| d.to_string()).collect();
                write!(f, "{}", joined.join("+"))
            }
        }
    }
}
