use serde::Serialize;

use crate::domain::{PolicyRule, QueryRequest, RoutingDecision, RuleCategory};

/// The rule that decided an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedRule {
    pub name: String,
    pub category: RuleCategory,
    pub priority: i32,
}

impl From<&PolicyRule> for MatchedRule {
    fn from(rule: &PolicyRule) -> Self {
        MatchedRule {
            name: rule.name.clone(),
            category: rule.category.clone(),
            priority: rule.priority,
        }
    }
}

/// Decision together with how it was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub decision: RoutingDecision,

    /// `None` when no rule matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_rule: Option<MatchedRule>,

    /// Enabled rules checked before the scan stopped
    pub rules_checked: usize,
}

/// Evaluate rules against a request and report the deciding rule.
///
/// Disabled rules are dropped, the rest are ordered by ascending priority
/// (stable, so list order breaks ties) and the first full match decides.
/// Lower-precedence rules are never checked once a match is found.
pub fn explain(rules: &[PolicyRule], request: &QueryRequest) -> Evaluation {
    let mut active: Vec<&PolicyRule> = rules.iter().filter(|r| r.enabled).collect();
    active.sort_by_key(|r| r.priority);

    for (idx, rule) in active.iter().enumerate() {
        if rule.matches(request) {
            return Evaluation {
                decision: RoutingDecision::from(&rule.action),
                matched_rule: Some(MatchedRule::from(*rule)),
                rules_checked: idx + 1,
            };
        }
    }

    Evaluation {
        decision: RoutingDecision::Auto,
        matched_rule: None,
        rules_checked: active.len(),
    }
}

/// Evaluate rules against a request.
///
/// Pure and deterministic; an empty rule set yields `Auto`.
#[inline]
pub fn evaluate(rules: &[PolicyRule], request: &QueryRequest) -> RoutingDecision {
    explain(rules, request).decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConditionRule, RuleAction};

    fn block(name: &str, priority: i32, keyword: &str, reason: &str) -> PolicyRule {
        PolicyRule::new(
            name,
            priority,
            RuleAction::Block {
                reason: reason.to_string(),
            },
        )
        .with_condition(ConditionRule::content_contains(keyword))
    }

    fn warn(name: &str, priority: i32, keyword: &str, message: &str) -> PolicyRule {
        PolicyRule::new(
            name,
            priority,
            RuleAction::Warn {
                message: message.to_string(),
            },
        )
        .with_condition(ConditionRule::content_contains(keyword))
    }

    #[test]
    fn test_empty_rules_is_auto() {
        let req = QueryRequest::new("anything");
        let eval = explain(&[], &req);

        assert_eq!(eval.decision, RoutingDecision::Auto);
        assert!(eval.matched_rule.is_none());
        assert_eq!(eval.rules_checked, 0);
    }

    #[test]
    fn test_no_match_is_auto() {
        let rules = vec![block("pw", 1, "password", "Sensitive data detected")];
        let req = QueryRequest::new("What is the weather?");

        assert_eq!(evaluate(&rules, &req), RoutingDecision::Auto);
    }

    #[test]
    fn test_lower_priority_value_wins_regardless_of_order() {
        let req = QueryRequest::new("Send my data");
        let high = block("high", 1, "data", "Blocked by high priority");
        let low = warn("low", 10, "data", "data mentioned");

        let expected = RoutingDecision::Block {
            reason: "Blocked by high priority".to_string(),
        };

        assert_eq!(evaluate(&[low.clone(), high.clone()], &req), expected);
        assert_eq!(evaluate(&[high, low], &req), expected);
    }

    #[test]
    fn test_equal_priority_first_listed_wins() {
        let req = QueryRequest::new("route me");
        let rules = vec![
            PolicyRule::new("first", 5, RuleAction::ForceCloud),
            PolicyRule::new("second", 5, RuleAction::ForceLocal),
        ];

        let eval = explain(&rules, &req);
        assert_eq!(eval.decision, RoutingDecision::ForceCloud);
        assert_eq!(eval.matched_rule.unwrap().name, "first");
    }

    #[test]
    fn test_disabled_rule_is_ignored() {
        let req = QueryRequest::new("What's my password?");
        let rules = vec![block("pw", 1, "password", "Sensitive data detected").disabled()];

        assert_eq!(evaluate(&rules, &req), RoutingDecision::Auto);
    }

    #[test]
    fn test_removing_disabled_rule_changes_nothing() {
        let req = QueryRequest::new("please analyze my password");
        let with_disabled = vec![
            block("pw", 0, "password", "nope").disabled(),
            PolicyRule::new("cloud", 3, RuleAction::ForceCloud)
                .with_condition(ConditionRule::content_contains("analyze")),
            warn("late", 9, "password", "late warning"),
        ];
        let without: Vec<PolicyRule> = with_disabled.iter().filter(|r| r.enabled).cloned().collect();

        assert_eq!(evaluate(&with_disabled, &req), evaluate(&without, &req));
        assert_eq!(evaluate(&with_disabled, &req), RoutingDecision::ForceCloud);
    }

    #[test]
    fn test_stops_at_first_match() {
        let req = QueryRequest::new("hello");
        let rules = vec![
            PolicyRule::new("a", 1, RuleAction::ForceLocal),
            PolicyRule::new("b", 2, RuleAction::ForceCloud),
            PolicyRule::new("c", 3, RuleAction::ForceCloud),
        ];

        let eval = explain(&rules, &req);
        assert_eq!(eval.rules_checked, 1);
        assert_eq!(eval.decision, RoutingDecision::ForceLocal);
    }

    #[test]
    fn test_negative_priorities_sort_first() {
        let req = QueryRequest::new("hello");
        let rules = vec![
            PolicyRule::new("zero", 0, RuleAction::ForceLocal),
            PolicyRule::new("negative", -5, RuleAction::ForceCloud),
        ];

        assert_eq!(evaluate(&rules, &req), RoutingDecision::ForceCloud);
    }

    #[test]
    fn test_warn_decision_carries_message() {
        let req = QueryRequest::new("my data please");
        let rules = vec![warn("w", 1, "data", "Personal data mentioned")];

        assert_eq!(
            evaluate(&rules, &req),
            RoutingDecision::Warn {
                message: "Personal data mentioned".to_string()
            }
        );
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let req = QueryRequest::new("Send my data");
        let rules = vec![
            warn("w", 10, "data", "x"),
            block("b", 1, "data", "y"),
            PolicyRule::new("c", 1, RuleAction::ForceCloud),
        ];

        let first = explain(&rules, &req);
        for _ in 0..10 {
            assert_eq!(explain(&rules, &req), first);
        }
    }
}
