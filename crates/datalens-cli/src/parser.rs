//! TOML job configuration.
//!
//! ```toml
//! fail_fast = false
//!
//! [[file]]
//! path = "data/orders.csv"
//!
//!   [[file.rule]]
//!   type = "RangeCheck"
//!   severity = "WARNING"
//!   field = "amount"
//!   min = 0
//!   max = 10000
//! ```
//!
//! Everything in a rule table other than `type` and `severity` is passed to
//! the rule as a parameter.

use std::collections::BTreeMap;

use serde::Deserialize;

use datalens_core::rules::{ParamValue, RuleSpec};
use datalens_core::Severity;

use crate::errors::CliError;

fn default_max_samples() -> usize {
    10
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fail_fast: bool,
    #[serde(default = "default_max_samples")]
    pub max_sample_failures: usize,
    #[serde(default, rename = "file")]
    pub files: Vec<FileConfig>,
}

#[derive(Debug, Deserialize)]
pub struct FileConfig {
    pub path: String,
    /// Name other files use to reference this one. Defaults to the file name
    /// component of `path`.
    pub name: Option<String>,
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Deserialize)]
pub struct RuleConfig {
    #[serde(rename = "type")]
    pub rule_type: String,
    pub severity: Option<String>,
    #[serde(flatten)]
    pub params: BTreeMap<String, toml::Value>,
}

fn parse_severity(value: &str, rule_type: &str) -> Result<Severity, CliError> {
    match value.to_ascii_uppercase().as_str() {
        "ERROR" => Ok(Severity::Error),
        "WARNING" => Ok(Severity::Warning),
        "INFO" => Ok(Severity::Info),
        _ => Err(CliError::UnknownSeverity {
            severity: value.to_string(),
            rule_type: rule_type.to_string(),
        }),
    }
}

fn param_from_toml(value: &toml::Value, param: &str, rule_type: &str) -> Result<ParamValue, CliError> {
    match value {
        toml::Value::Boolean(v) => Ok(ParamValue::Bool(*v)),
        toml::Value::Integer(v) => Ok(ParamValue::Int(*v)),
        toml::Value::Float(v) => Ok(ParamValue::Float(*v)),
        toml::Value::String(v) => Ok(ParamValue::Str(v.clone())),
        toml::Value::Datetime(v) => Ok(ParamValue::Str(v.to_string())),
        toml::Value::Array(values) => values
            .iter()
            .map(|v| param_from_toml(v, param, rule_type))
            .collect::<Result<Vec<_>, _>>()
            .map(ParamValue::List),
        toml::Value::Table(_) => Err(CliError::UnsupportedParam {
            param: param.to_string(),
            rule_type: rule_type.to_string(),
        }),
    }
}

impl RuleConfig {
    /// Default severity when the config omits it.
    pub fn to_spec(&self) -> Result<RuleSpec, CliError> {
        let severity = match &self.severity {
            Some(value) => parse_severity(value, &self.rule_type)?,
            None => Severity::Error,
        };
        let mut spec = RuleSpec::new(self.rule_type.clone(), severity);
        for (key, value) in &self.params {
            spec = spec.with_param(key.clone(), param_from_toml(value, key, &self.rule_type)?);
        }
        Ok(spec)
    }
}

/// Render suggested specs back into the config format `validate` consumes.
pub fn specs_to_toml(path: &str, specs: &[RuleSpec]) -> toml::Value {
    let mut rules = Vec::with_capacity(specs.len());
    for spec in specs {
        let mut table = toml::map::Map::new();
        table.insert("type".to_string(), toml::Value::String(spec.rule_type.clone()));
        let severity = match spec.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        };
        table.insert("severity".to_string(), toml::Value::String(severity.to_string()));
        for (key, value) in spec.params.entries() {
            table.insert(key.to_string(), param_to_toml(value));
        }
        rules.push(toml::Value::Table(table));
    }

    let mut file = toml::map::Map::new();
    file.insert("path".to_string(), toml::Value::String(path.to_string()));
    file.insert("rule".to_string(), toml::Value::Array(rules));

    let mut root = toml::map::Map::new();
    root.insert(
        "file".to_string(),
        toml::Value::Array(vec![toml::Value::Table(file)]),
    );
    toml::Value::Table(root)
}

fn param_to_toml(value: &ParamValue) -> toml::Value {
    match value {
        ParamValue::Bool(v) => toml::Value::Boolean(*v),
        ParamValue::Int(v) => toml::Value::Integer(*v),
        ParamValue::Float(v) => toml::Value::Float(*v),
        ParamValue::Str(v) => toml::Value::String(v.clone()),
        ParamValue::List(values) => {
            toml::Value::Array(values.iter().map(param_to_toml).collect())
        }
    }
}
