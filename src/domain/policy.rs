use serde::{Deserialize, Serialize};

use super::rule::PolicyRule;

/// Version string of the placeholder policy used before anything loads.
pub const EMPTY_POLICY_VERSION: &str = "0.0.0";

/// Policy document: a versioned, ordered list of routing rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// Policy version identifier
    #[serde(rename = "policy_version")]
    pub version: String,

    /// Rules in authoring order
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

impl Policy {
    /// Create an empty policy.
    pub fn empty() -> Self {
        Policy {
            version: EMPTY_POLICY_VERSION.to_string(),
            rules: Vec::new(),
        }
    }

    /// Number of enabled rules.
    pub fn enabled_count(&self) -> usize {
        self.rules.iter().filter(|r| r.enabled).count()
    }
}
