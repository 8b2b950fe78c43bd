//! Rule specifications and their parameter bag.
//!
//! A `RuleSpec` is the declarative form a config file produces; rule
//! constructors pull typed parameters out of it and reject anything missing
//! or ill-typed with a `RuleError`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::RuleError;
use crate::results::Severity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<ParamValue>),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Integers widen to float, the common case for range bounds.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::List(values.into_iter().map(ParamValue::Str).collect())
    }
}

/// Ordered parameter map. BTreeMap keeps serialized output deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamMap(BTreeMap<String, ParamValue>);

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn require(&self, key: &str) -> Result<&ParamValue, RuleError> {
        self.get(key)
            .ok_or_else(|| RuleError::MissingParameter(key.to_string()))
    }

    pub fn require_str(&self, key: &str) -> Result<&str, RuleError> {
        self.require(key)?
            .as_str()
            .ok_or_else(|| RuleError::invalid_parameter(key, "expected a string"))
    }

    pub fn require_i64(&self, key: &str) -> Result<i64, RuleError> {
        self.require(key)?
            .as_i64()
            .ok_or_else(|| RuleError::invalid_parameter(key, "expected an integer"))
    }

    pub fn require_f64(&self, key: &str) -> Result<f64, RuleError> {
        self.require(key)?
            .as_f64()
            .ok_or_else(|| RuleError::invalid_parameter(key, "expected a number"))
    }

    pub fn require_string_list(&self, key: &str) -> Result<Vec<String>, RuleError> {
        match self.require(key)? {
            ParamValue::List(values) => values
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| RuleError::invalid_parameter(key, "expected a list of strings"))
                })
                .collect(),
            _ => Err(RuleError::invalid_parameter(key, "expected a list")),
        }
    }

    pub fn optional_f64(&self, key: &str) -> Result<Option<f64>, RuleError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| RuleError::invalid_parameter(key, "expected a number")),
        }
    }

    pub fn optional_i64(&self, key: &str) -> Result<Option<i64>, RuleError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| RuleError::invalid_parameter(key, "expected an integer")),
        }
    }

    pub fn optional_bool(&self, key: &str) -> Result<Option<bool>, RuleError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_bool()
                .map(Some)
                .ok_or_else(|| RuleError::invalid_parameter(key, "expected a boolean")),
        }
    }
}

/// Declarative rule description: type name, severity, and free-form
/// parameters. The registry turns a spec into an executable rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub rule_type: String,
    pub severity: Severity,
    pub params: ParamMap,
}

impl RuleSpec {
    pub fn new(rule_type: impl Into<String>, severity: Severity) -> Self {
        Self {
            rule_type: rule_type.into(),
            severity,
            params: ParamMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key, value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let spec = RuleSpec::new("RangeCheck", Severity::Warning)
            .with_param("field", "amount")
            .with_param("min", 0i64)
            .with_param("max", 100.5);
        assert_eq!(spec.params.require_str("field").unwrap(), "amount");
        assert_eq!(spec.params.require_f64("min").unwrap(), 0.0);
        assert_eq!(spec.params.require_f64("max").unwrap(), 100.5);
    }

    #[test]
    fn test_missing_parameter() {
        let spec = RuleSpec::new("RangeCheck", Severity::Warning);
        assert!(matches!(
            spec.params.require_str("field"),
            Err(RuleError::MissingParameter(p)) if p == "field"
        ));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let spec = RuleSpec::new("RangeCheck", Severity::Warning).with_param("min", "zero");
        assert!(matches!(
            spec.params.require_f64("min"),
            Err(RuleError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_string_list() {
        let spec = RuleSpec::new("ValidValuesCheck", Severity::Error)
            .with_param("values", vec!["A".to_string(), "B".to_string()]);
        assert_eq!(
            spec.params.require_string_list("values").unwrap(),
            vec!["A", "B"]
        );
    }

    #[test]
    fn test_spec_serializes_deterministically() {
        let spec = RuleSpec::new("RangeCheck", Severity::Warning)
            .with_param("min", 1i64)
            .with_param("field", "x");
        let a = serde_json::to_string(&spec).unwrap();
        let b = serde_json::to_string(&spec).unwrap();
        assert_eq!(a, b);
        assert!(a.find("\"field\"").unwrap() < a.find("\"min\"").unwrap());
    }
}
