pub mod decision;
pub mod policy;
pub mod query;
pub mod rule;

pub use decision::{DispatchTarget, RoutingDecision};
pub use policy::Policy;
pub use query::{QueryRequest, QueryResponse, SessionId, BLOCKED_MARKER};
pub use rule::{ConditionRule, OperatorKind, PolicyRule, RuleAction, RuleCategory};
