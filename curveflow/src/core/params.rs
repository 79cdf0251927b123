//! Scalar parameter bag carried by every stage.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::StageKind;
use crate::errors::ParameterError;

/// An ordered mapping of parameter names to scalar JSON values.
///
/// Only scalars (bool, number, string, null) are accepted. Keys the stage
/// does not declare are kept and handed to the handler unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters {
    values: BTreeMap<String, Value>,
}

impl Parameters {
    /// Creates an empty parameter bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a bag from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns `ParameterError::NotScalar` if any value is an array or object.
    pub fn from_json(object: &serde_json::Map<String, Value>) -> Result<Self, ParameterError> {
        let mut params = Self::new();
        for (key, value) in object {
            params.insert(key.clone(), value.clone())?;
        }
        Ok(params)
    }

    /// Inserts a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `ParameterError::NotScalar` if the value is an array or object.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Result<(), ParameterError> {
        let key = key.into();
        if value.is_array() || value.is_object() {
            return Err(ParameterError::NotScalar { key });
        }
        self.values.insert(key, value);
        Ok(())
    }

    /// Inserts a value that is a scalar by construction.
    pub fn insert_scalar(&mut self, key: impl Into<String>, value: impl Into<ScalarValue>) {
        self.values.insert(key.into(), value.into().0);
    }

    /// Builder-style variant of [`Parameters::insert_scalar`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        self.insert_scalar(key, value);
        self
    }

    /// Gets a raw value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Gets a value as `f64` (integers are widened).
    #[must_use]
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(Value::as_f64)
    }

    /// Gets a value as `i64`. Floats with no fractional part are accepted.
    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        let value = self.values.get(key)?;
        value.as_i64().or_else(|| {
            value
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        })
    }

    /// Gets a value as `bool`.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }

    /// Gets a value as a string slice.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Checks if a key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Overwrites this bag's keys with the other bag's values.
    pub fn merge(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the bag is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Returns the bag as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

/// A JSON value known to be a scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarValue(Value);

macro_rules! scalar_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ScalarValue {
                fn from(value: $ty) -> Self {
                    Self(Value::from(value))
                }
            }
        )*
    };
}

scalar_from!(bool, i32, i64, u32, u64, usize, f64, &str, String);

enum Expect {
    Int { min: i64, max: i64 },
    Float { min: f64, max: f64 },
    Text,
    Flag,
}

fn declared(kind: StageKind) -> &'static [(&'static str, Expect)] {
    match kind {
        StageKind::Load => &[("file_path", Expect::Text), ("file_format", Expect::Text)],
        StageKind::Optimize => &[
            ("optimization_level", Expect::Int { min: 1, max: 10 }),
            ("target_point_count", Expect::Int { min: 0, max: i64::MAX }),
            ("smoothness_factor", Expect::Float { min: 0.0, max: 1.0 }),
            ("complexity_reduction", Expect::Float { min: 0.0, max: 1.0 }),
        ],
        StageKind::Offset => &[
            (
                "offset_distance",
                Expect::Float {
                    min: f64::MIN,
                    max: f64::MAX,
                },
            ),
            ("offset_algorithm", Expect::Text),
            ("quality_level", Expect::Int { min: 1, max: 10 }),
            ("corner_handling", Expect::Text),
        ],
        StageKind::Validate => &[("validation_level", Expect::Text)],
        StageKind::Export => &[
            ("output_format", Expect::Text),
            ("output_path", Expect::Text),
            ("include_metadata", Expect::Flag),
        ],
    }
}

impl StageKind {
    /// Checks the declared parameter keys of this stage against their ranges.
    ///
    /// Keys the stage does not declare are not checked.
    ///
    /// # Errors
    ///
    /// Returns the first `ParameterError` found.
    pub fn validate_parameters(self, params: &Parameters) -> Result<(), ParameterError> {
        for (key, expect) in declared(self) {
            let Some(value) = params.get(key) else {
                continue;
            };
            let wrong_type = |expected| ParameterError::WrongType {
                stage: self,
                key: (*key).to_string(),
                expected,
            };
            match expect {
                Expect::Int { min, max } => {
                    let n = params
                        .get_i64(key)
                        .ok_or_else(|| wrong_type("an integer"))?;
                    if n < *min || n > *max {
                        return Err(ParameterError::OutOfRange {
                            stage: self,
                            key: (*key).to_string(),
                            value: n as f64,
                            min: *min as f64,
                            max: *max as f64,
                        });
                    }
                }
                Expect::Float { min, max } => {
                    let f = value
                        .as_f64()
                        .filter(|f| f.is_finite())
                        .ok_or_else(|| wrong_type("a finite number"))?;
                    if f < *min || f > *max {
                        return Err(ParameterError::OutOfRange {
                            stage: self,
                            key: (*key).to_string(),
                            value: f,
                            min: *min,
                            max: *max,
                        });
                    }
                }
                Expect::Text => {
                    if !value.is_string() {
                        return Err(wrong_type("a string"));
                    }
                }
                Expect::Flag => {
                    if !value.is_boolean() {
                        return Err(wrong_type("a boolean"));
                    }
                }
            }
        }
        Ok(())
    }
}
