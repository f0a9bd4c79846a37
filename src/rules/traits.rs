use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::watch;

use crate::domain::PolicyRule;

use super::RuleBook;

/// Source of the active routing rules.
///
/// Called once per request on the request path, so implementations must
/// not block. Returning an empty list routes every request automatically.
pub trait RuleProvider: Send + Sync + Debug {
    /// Current rules in authoring order.
    fn policy_rules(&self) -> Arc<[PolicyRule]>;
}

/// Fixed rule list, mainly for tests and embedding.
#[derive(Debug, Clone)]
pub struct StaticRuleProvider {
    rules: Arc<[PolicyRule]>,
}

impl StaticRuleProvider {
    /// Create a provider, compiling the rules' patterns up front.
    pub fn new(rules: Vec<PolicyRule>) -> Self {
        for rule in &rules {
            rule.compile();
        }
        StaticRuleProvider {
            rules: rules.into(),
        }
    }
}

impl Default for StaticRuleProvider {
    fn default() -> Self {
        StaticRuleProvider::new(Vec::new())
    }
}

impl RuleProvider for StaticRuleProvider {
    fn policy_rules(&self) -> Arc<[PolicyRule]> {
        self.rules.clone()
    }
}

/// Provider that follows the rule book published by the policy watcher.
#[derive(Debug, Clone)]
pub struct WatchRuleProvider {
    rx: watch::Receiver<Arc<RuleBook>>,
}

impl WatchRuleProvider {
    pub fn new(rx: watch::Receiver<Arc<RuleBook>>) -> Self {
        WatchRuleProvider { rx }
    }

    /// Snapshot of the current rule book.
    pub fn current(&self) -> Arc<RuleBook> {
        self.rx.borrow().clone()
    }
}

impl RuleProvider for WatchRuleProvider {
    fn policy_rules(&self) -> Arc<[PolicyRule]> {
        self.rx.borrow().rules.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Policy, RuleAction};

    #[test]
    fn test_static_provider() {
        let provider = StaticRuleProvider::new(vec![PolicyRule::new(
            "r1",
            1,
            RuleAction::ForceLocal,
        )]);

        let rules = provider.policy_rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].name, "r1");

        assert!(StaticRuleProvider::default().policy_rules().is_empty());
    }

    #[test]
    fn test_watch_provider_follows_updates() {
        let (tx, rx) = watch::channel(Arc::new(RuleBook::empty()));
        let provider = WatchRuleProvider::new(rx);

        assert!(provider.policy_rules().is_empty());

        let policy = Policy {
            version: "v2".to_string(),
            rules: vec![PolicyRule::new("cloud", 1, RuleAction::ForceCloud)],
        };
        tx.send(Arc::new(RuleBook::from_policy(&policy))).unwrap();

        assert_eq!(provider.policy_rules().len(), 1);
        assert_eq!(provider.current().policy_version, "v2");
    }

    #[test]
    fn test_providers_share_rules_between_requests() {
        let policy = Policy {
            version: "v1".to_string(),
            rules: vec![PolicyRule::new("local", 1, RuleAction::ForceLocal)],
        };
        let (_tx, rx) = watch::channel(Arc::new(RuleBook::from_policy(&policy)));
        let provider = WatchRuleProvider::new(rx);

        assert!(Arc::ptr_eq(&provider.policy_rules(), &provider.policy_rules()));

        let fixed = StaticRuleProvider::new(policy.rules.clone());
        assert!(Arc::ptr_eq(&fixed.policy_rules(), &fixed.policy_rules()));
    }
}
