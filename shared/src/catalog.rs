//! Rule catalog
//!
//! Declarative TOML rule definitions compiled into [`Rule`] values. A catalog
//! is immutable once built; extending it produces a new catalog.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, PolicyResult};
use crate::models::{Category, Comparison, ConditionCode, Predicate, Rule, Severity, SnapshotField};
use crate::validation::{validate_priority_base, validate_rule_id, validate_template};

/// Rules shipped with the crate
pub const BUILTIN_CATALOG: &str = include_str!("../catalog/default.toml");

/// A rule as written in a catalog file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDef {
    pub id: String,
    pub category: String,
    pub severity: String,
    #[serde(default)]
    pub priority_base: i32,
    pub text: String,
    pub when: PredicateDef,
    #[serde(default)]
    pub enabled: Option<bool>,
}

/// A predicate as written in a catalog file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredicateDef {
    Threshold {
        field: String,
        op: String,
        value: Decimal,
    },
    Condition {
        condition: Vec<String>,
    },
    All {
        all: Vec<PredicateDef>,
    },
    Any {
        any: Vec<PredicateDef>,
    },
    Not {
        not: Box<PredicateDef>,
    },
}

/// A catalog file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub rules: Vec<RuleDef>,
}

/// Ordered, duplicate-free set of rules
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleCatalog {
    version: Option<String>,
    rules: Vec<Rule>,
}

impl RuleCatalog {
    /// Build a catalog, rejecting duplicate ids and invalid rules
    pub fn new(rules: Vec<Rule>) -> PolicyResult<Self> {
        let mut seen = HashSet::new();
        for rule in &rules {
            validate_rule(rule)?;
            if !seen.insert(rule.id.as_str()) {
                return Err(PolicyError::DuplicateRuleId(rule.id.clone()));
            }
        }
        Ok(Self {
            version: None,
            rules,
        })
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Parse and compile a TOML catalog document
    pub fn from_toml_str(source: &str) -> PolicyResult<Self> {
        let file: CatalogFile =
            toml::from_str(source).map_err(|e| PolicyError::CatalogParse(e.to_string()))?;
        Self::from_file(file)
    }

    /// Compile a parsed catalog file. Disabled rules are skipped.
    pub fn from_file(file: CatalogFile) -> PolicyResult<Self> {
        let rules = file
            .rules
            .into_iter()
            .filter(|def| def.enabled != Some(false))
            .map(compile_rule)
            .collect::<PolicyResult<Vec<_>>>()?;

        let catalog = Self::new(rules)?;
        Ok(match file.version {
            Some(version) => catalog.with_version(version),
            None => catalog,
        })
    }

    /// The rules embedded in the crate
    pub fn builtin() -> PolicyResult<Self> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    /// A new catalog holding these rules followed by `overlay`'s rules.
    ///
    /// Overlay ids must not collide with existing ones.
    pub fn append(&self, overlay: RuleCatalog) -> PolicyResult<Self> {
        let mut rules = self.rules.clone();
        rules.extend(overlay.rules);
        let catalog = Self::new(rules)?;
        Ok(Self {
            version: overlay.version.or_else(|| self.version.clone()),
            ..catalog
        })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.id.as_str()).collect()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn validate_rule(rule: &Rule) -> PolicyResult<()> {
    validate_rule_id(&rule.id).map_err(|reason| PolicyError::invalid_rule(&rule.id, reason))?;
    validate_template(&rule.text).map_err(|reason| PolicyError::invalid_rule(&rule.id, reason))?;
    validate_priority_base(rule.priority_base)
        .map_err(|reason| PolicyError::invalid_rule(&rule.id, reason))?;
    validate_predicate(&rule.id, &rule.predicate)
}

fn validate_predicate(rule_id: &str, predicate: &Predicate) -> PolicyResult<()> {
    match predicate {
        Predicate::Threshold { .. } => Ok(()),
        Predicate::Condition { any_of } => {
            if any_of.is_empty() {
                return Err(PolicyError::invalid_rule(rule_id, "condition list is empty"));
            }
            if any_of.contains(&ConditionCode::Unknown) {
                return Err(PolicyError::invalid_rule(
                    rule_id,
                    "'unknown' is a missing condition and cannot be matched",
                ));
            }
            Ok(())
        }
        Predicate::All(parts) | Predicate::Any(parts) => {
            if parts.is_empty() {
                return Err(PolicyError::invalid_rule(rule_id, "empty predicate group"));
            }
            parts.iter().try_for_each(|p| validate_predicate(rule_id, p))
        }
        Predicate::Not(inner) => validate_predicate(rule_id, inner),
    }
}

fn compile_rule(def: RuleDef) -> PolicyResult<Rule> {
    let category = Category::parse_str(&def.category).ok_or_else(|| {
        PolicyError::invalid_rule(&def.id, format!("unknown category '{}'", def.category))
    })?;
    let severity = Severity::parse_str(&def.severity).ok_or_else(|| {
        PolicyError::invalid_rule(&def.id, format!("unknown severity '{}'", def.severity))
    })?;
    let predicate = compile_predicate(&def.id, def.when)?;

    Ok(Rule {
        id: def.id,
        category,
        severity,
        priority_base: def.priority_base,
        text: def.text,
        predicate,
    })
}

fn compile_predicate(rule_id: &str, def: PredicateDef) -> PolicyResult<Predicate> {
    match def {
        PredicateDef::Threshold { field, op, value } => {
            let field = SnapshotField::parse_str(&field).ok_or_else(|| {
                PolicyError::invalid_rule(rule_id, format!("unknown field '{}'", field))
            })?;
            let op = Comparison::parse_str(&op).ok_or_else(|| {
                PolicyError::invalid_rule(rule_id, format!("unknown operator '{}'", op))
            })?;
            Ok(Predicate::Threshold { field, op, value })
        }
        PredicateDef::Condition { condition } => {
            let any_of = condition
                .iter()
                .map(|label| {
                    ConditionCode::parse_str(label).ok_or_else(|| {
                        PolicyError::invalid_rule(rule_id, format!("unknown condition '{}'", label))
                    })
                })
                .collect::<PolicyResult<Vec<_>>>()?;
            Ok(Predicate::Condition { any_of })
        }
        PredicateDef::All { all } => Ok(Predicate::All(compile_group(rule_id, all)?)),
        PredicateDef::Any { any } => Ok(Predicate::Any(compile_group(rule_id, any)?)),
        PredicateDef::Not { not } => Ok(Predicate::Not(Box::new(compile_predicate(rule_id, *not)?))),
    }
}

fn compile_group(rule_id: &str, defs: Vec<PredicateDef>) -> PolicyResult<Vec<Predicate>> {
    defs.into_iter()
        .map(|d| compile_predicate(rule_id, d))
        .collect()
}
