use serde::{Deserialize, Serialize};
use std::fmt;

use super::rule::RuleAction;

/// Backend a request is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchTarget {
    /// On-device model
    Local,
    /// Remote inference service
    Cloud,
}

impl fmt::Display for DispatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchTarget::Local => write!(f, "local"),
            DispatchTarget::Cloud => write!(f, "cloud"),
        }
    }
}

/// Routing outcome for a single request.
///
/// Produced once by the evaluator and consumed once by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoutingDecision {
    /// Refuse without inference
    Block { reason: String },
    /// Continue as `Auto` after logging the message
    Warn { message: String },
    ForceLocal,
    ForceCloud,
    /// No rule matched
    Auto,
}

impl RoutingDecision {
    /// Backend this decision dispatches to, or `None` for a block.
    ///
    /// Warnings and automatic routing are local-first.
    pub fn target(&self) -> Option<DispatchTarget> {
        match self {
            RoutingDecision::Block { .. } => None,
            RoutingDecision::Warn { .. } | RoutingDecision::ForceLocal | RoutingDecision::Auto => {
                Some(DispatchTarget::Local)
            }
            RoutingDecision::ForceCloud => Some(DispatchTarget::Cloud),
        }
    }

    #[inline]
    pub fn is_blocked(&self) -> bool {
        matches!(self, RoutingDecision::Block { .. })
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RoutingDecision::Block { .. } => "block",
            RoutingDecision::Warn { .. } => "warn",
            RoutingDecision::ForceLocal => "force_local",
            RoutingDecision::ForceCloud => "force_cloud",
            RoutingDecision::Auto => "auto",
        }
    }
}

impl Default for RoutingDecision {
    fn default() -> Self {
        RoutingDecision::Auto
    }
}

impl From<&RuleAction> for RoutingDecision {
    fn from(action: &RuleAction) -> Self {
        match action {
            RuleAction::Block { reason } => RoutingDecision::Block {
                reason: reason.clone(),
            },
            RuleAction::Warn { message } => RoutingDecision::Warn {
                message: message.clone(),
            },
            RuleAction::ForceLocal => RoutingDecision::ForceLocal,
            RuleAction::ForceCloud => RoutingDecision::ForceCloud,
        }
    }
}

impl fmt::Display for RoutingDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingDecision::Block { reason } => write!(f, "BLOCK({})", reason),
            RoutingDecision::Warn { message } => write!(f, "WARN({})", message),
            RoutingDecision::ForceLocal => write!(f, "FORCE_LOCAL"),
            RoutingDecision::ForceCloud => write!(f, "FORCE_CLOUD"),
            RoutingDecision::Auto => write!(f, "AUTO"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets() {
        let block = RoutingDecision::Block {
            reason: "no".to_string(),
        };
        let warn = RoutingDecision::Warn {
            message: "careful".to_string(),
        };

        assert_eq!(block.target(), None);
        assert_eq!(warn.target(), Some(DispatchTarget::Local));
        assert_eq!(RoutingDecision::Auto.target(), Some(DispatchTarget::Local));
        assert_eq!(RoutingDecision::ForceLocal.target(), Some(DispatchTarget::Local));
        assert_eq!(RoutingDecision::ForceCloud.target(), Some(DispatchTarget::Cloud));
    }

    #[test]
    fn test_from_action() {
        let decision = RoutingDecision::from(&RuleAction::Block {
            reason: "Sensitive".to_string(),
        });
        assert!(decision.is_blocked());
        assert_eq!(decision.kind(), "block");

        assert_eq!(
            RoutingDecision::from(&RuleAction::ForceCloud),
            RoutingDecision::ForceCloud
        );
    }

    #[test]
    fn test_decision_serialization() {
        let json = serde_json::to_string(&RoutingDecision::Warn {
            message: "heads up".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"warn","message":"heads up"}"#);

        let parsed: RoutingDecision = serde_json::from_str(r#"{"type":"auto"}"#).unwrap();
        assert_eq!(parsed, RoutingDecision::Auto);
    }
}
