use regex::RegexBuilder;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use crate::domain::{OperatorKind, Policy, PolicyRule};
use crate::rules::RuleBook;

/// Errors that can occur during policy loading.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid pattern in rule {rule}: {source}")]
    Pattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Load a policy from a YAML file.
pub fn load_policy(path: impl AsRef<Path>) -> Result<Policy, PolicyError> {
    let content = fs::read_to_string(path)?;
    parse_policy(&content)
}

/// Parse and validate a policy from YAML text.
pub fn parse_policy(content: &str) -> Result<Policy, PolicyError> {
    let policy: Policy = serde_yaml::from_str(content)?;

    validate_policy(&policy)?;
    lint_policy(&policy);

    Ok(policy)
}

/// Validate policy configuration.
fn validate_policy(policy: &Policy) -> Result<(), PolicyError> {
    if policy.version.is_empty() {
        return Err(PolicyError::Validation(
            "Policy version cannot be empty".to_string(),
        ));
    }

    let mut seen_names = HashSet::new();
    for rule in &policy.rules {
        if rule.name.trim().is_empty() {
            return Err(PolicyError::Validation(
                "Rule name cannot be empty".to_string(),
            ));
        }

        if !seen_names.insert(&rule.name) {
            return Err(PolicyError::Validation(format!(
                "Duplicate rule name: {}",
                rule.name
            )));
        }

        validate_conditions(rule)?;
    }

    Ok(())
}

fn validate_conditions(rule: &PolicyRule) -> Result<(), PolicyError> {
    for condition in &rule.conditions {
        if condition.field.trim().is_empty() {
            return Err(PolicyError::Validation(format!(
                "Rule {} has a condition without a field",
                rule.name
            )));
        }

        if condition.value.is_empty() {
            return Err(PolicyError::Validation(format!(
                "Rule {} has an empty value for {} {}",
                rule.name, condition.field, condition.operator
            )));
        }

        if condition.operator == OperatorKind::Matches {
            RegexBuilder::new(&condition.value)
                .case_insensitive(true)
                .build()
                .map_err(|source| PolicyError::Pattern {
                    rule: rule.name.clone(),
                    source,
                })?;
        }
    }

    Ok(())
}

/// Warn about rules that load fine but probably don't do what was meant.
fn lint_policy(policy: &Policy) {
    for rule in &policy.rules {
        if rule.is_catch_all() {
            warn!(
                rule = %rule.name,
                priority = rule.priority,
                "Rule has no conditions and matches every request"
            );
        }

        for condition in &rule.conditions {
            if condition.operator == OperatorKind::Unknown {
                warn!(
                    rule = %rule.name,
                    field = %condition.field,
                    "Rule uses an unknown operator; condition never matches"
                );
            }
        }
    }
}

/// Policy loader bound to a policy file.
pub struct PolicyLoader {
    policy_path: String,
}

impl PolicyLoader {
    /// Create a new policy loader.
    pub fn new(policy_path: impl Into<String>) -> Self {
        PolicyLoader {
            policy_path: policy_path.into(),
        }
    }

    /// Load the policy, returning it with its rule book.
    pub fn load(&self) -> Result<(Policy, RuleBook), PolicyError> {
        let policy = load_policy(&self.policy_path)?;
        let book = RuleBook::from_policy(&policy);

        Ok((policy, book))
    }

    /// Load only the policy document.
    pub fn load_policy(&self) -> Result<Policy, PolicyError> {
        load_policy(&self.policy_path)
    }

    /// Get the policy file path.
    pub fn policy_path(&self) -> &str {
        &self.policy_path
    }
}
