//! Rule registry: rule type name to constructor.
//!
//! The dispatcher resolves every rule type against the registry before any
//! file is touched, so an unknown type aborts the job instead of surfacing
//! halfway through a run. Constructor failures (bad parameters) are scoped
//! to their rule and reported as failed results at execution time.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::errors::RuleError;
use crate::rules::cross_file::{CrossFileDuplicateCheck, ReferentialIntegrityCheck};
use crate::rules::field::{
    DateFormatCheck, MandatoryFieldCheck, RangeCheck, UniqueKeyCheck, ValidValuesCheck,
};
use crate::rules::file_level::{EmptyFileCheck, RowCountRangeCheck};
use crate::rules::{CompiledRule, RuleSpec};

/// Execution phase of a rule type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    File,
    Data,
}

type Constructor = fn(&RuleSpec) -> Result<CompiledRule, RuleError>;

struct RuleEntry {
    kind: RuleKind,
    ctor: Constructor,
}

pub struct Registry {
    entries: HashMap<String, RuleEntry>,
}

impl Registry {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// All built-in rule types.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("EmptyFileCheck", RuleKind::File, |spec| {
            Ok(CompiledRule::File(Box::new(EmptyFileCheck::from_spec(spec)?)))
        });
        registry.register("RowCountRangeCheck", RuleKind::File, |spec| {
            Ok(CompiledRule::File(Box::new(RowCountRangeCheck::from_spec(spec)?)))
        });
        registry.register("MandatoryFieldCheck", RuleKind::Data, |spec| {
            Ok(CompiledRule::Data(Box::new(MandatoryFieldCheck::from_spec(spec)?)))
        });
        registry.register("UniqueKeyCheck", RuleKind::Data, |spec| {
            Ok(CompiledRule::Data(Box::new(UniqueKeyCheck::from_spec(spec)?)))
        });
        registry.register("ValidValuesCheck", RuleKind::Data, |spec| {
            Ok(CompiledRule::Data(Box::new(ValidValuesCheck::from_spec(spec)?)))
        });
        registry.register("RangeCheck", RuleKind::Data, |spec| {
            Ok(CompiledRule::Data(Box::new(RangeCheck::from_spec(spec)?)))
        });
        registry.register("DateFormatCheck", RuleKind::Data, |spec| {
            Ok(CompiledRule::Data(Box::new(DateFormatCheck::from_spec(spec)?)))
        });
        registry.register("ReferentialIntegrityCheck", RuleKind::Data, |spec| {
            Ok(CompiledRule::Data(Box::new(ReferentialIntegrityCheck::from_spec(spec)?)))
        });
        registry.register("CrossFileDuplicateCheck", RuleKind::Data, |spec| {
            Ok(CompiledRule::Data(Box::new(CrossFileDuplicateCheck::from_spec(spec)?)))
        });
        registry
    }

    /// Add or replace a rule type. Custom registries extend `builtin()`
    /// before handing the registry to a job runner.
    pub fn register(&mut self, rule_type: impl Into<String>, kind: RuleKind, ctor: Constructor) {
        self.entries.insert(rule_type.into(), RuleEntry { kind, ctor });
    }

    pub fn contains(&self, rule_type: &str) -> bool {
        self.entries.contains_key(rule_type)
    }

    pub fn kind_of(&self, rule_type: &str) -> Option<RuleKind> {
        self.entries.get(rule_type).map(|e| e.kind)
    }

    /// Build an executable rule from its spec.
    pub fn compile(&self, spec: &RuleSpec) -> Result<CompiledRule, RuleError> {
        let entry = self
            .entries
            .get(&spec.rule_type)
            .ok_or_else(|| RuleError::invalid_parameter("rule_type", "unknown rule type"))?;
        (entry.ctor)(spec)
    }

    pub fn rule_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

static BUILTIN: Lazy<Registry> = Lazy::new(Registry::builtin);

/// The shared built-in registry.
pub fn builtin() -> &'static Registry {
    &BUILTIN
}

#[cfg(test)]
mod tests {
    use crate::results::Severity;

    use super::*;

    #[test]
    fn test_builtin_covers_all_rule_types() {
        let registry = builtin();
        for rule_type in [
            "EmptyFileCheck",
            "RowCountRangeCheck",
            "MandatoryFieldCheck",
            "UniqueKeyCheck",
            "ValidValuesCheck",
            "RangeCheck",
            "DateFormatCheck",
            "ReferentialIntegrityCheck",
            "CrossFileDuplicateCheck",
        ] {
            assert!(registry.contains(rule_type), "missing {}", rule_type);
        }
    }

    #[test]
    fn test_kinds() {
        let registry = builtin();
        assert_eq!(registry.kind_of("EmptyFileCheck"), Some(RuleKind::File));
        assert_eq!(registry.kind_of("RangeCheck"), Some(RuleKind::Data));
        assert_eq!(registry.kind_of("NoSuchCheck"), None);
    }

    #[test]
    fn test_compile_reports_constructor_errors() {
        let registry = builtin();
        // RangeCheck without bounds
        let spec = RuleSpec::new("RangeCheck", Severity::Warning).with_param("field", "x");
        assert!(registry.compile(&spec).is_err());
    }

    #[test]
    fn test_custom_registration() {
        let mut registry = Registry::builtin();
        registry.register("AlwaysPass", RuleKind::File, |spec| {
            Ok(CompiledRule::File(Box::new(
                crate::rules::file_level::EmptyFileCheck::from_spec(spec)?,
            )))
        });
        assert!(registry.contains("AlwaysPass"));
    }
}
