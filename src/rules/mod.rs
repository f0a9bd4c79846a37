pub mod evaluator;
pub mod traits;

pub use evaluator::{evaluate, explain, Evaluation, MatchedRule};
pub use traits::{RuleProvider, StaticRuleProvider, WatchRuleProvider};

use std::sync::Arc;

use crate::domain::policy::EMPTY_POLICY_VERSION;
use crate::domain::{Policy, PolicyRule};

/// Loaded rules ready for evaluation, tagged with their policy version.
///
/// Rules keep authoring order; precedence is applied at evaluation time.
/// The rule slice is shared, so handing it to a request is a refcount bump.
#[derive(Debug, Clone)]
pub struct RuleBook {
    pub rules: Arc<[PolicyRule]>,
    pub policy_version: String,
    loaded: bool,
}

impl RuleBook {
    /// Build a rule book from a policy, compiling its patterns.
    pub fn from_policy(policy: &Policy) -> Self {
        let rules: Arc<[PolicyRule]> = policy.rules.clone().into();
        for rule in rules.iter() {
            rule.compile();
        }

        RuleBook {
            rules,
            policy_version: policy.version.clone(),
            loaded: true,
        }
    }

    /// Create an empty rule book.
    pub fn empty() -> Self {
        RuleBook {
            rules: Arc::from(Vec::new()),
            policy_version: EMPTY_POLICY_VERSION.to_string(),
            loaded: false,
        }
    }

    /// Number of enabled rules.
    pub fn enabled_count(&self) -> usize {
        self.rules.iter().filter(|r| r.enabled).count()
    }

    /// True until a real policy has been loaded.
    pub fn is_placeholder(&self) -> bool {
        !self.loaded
    }
}
