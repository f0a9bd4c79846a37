use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::sync::{Arc, OnceLock};

use super::query::QueryRequest;

/// Request field holding the user's query text.
pub const CONTENT_FIELD: &str = "content";

/// Comparison applied by a condition.
///
/// Unrecognized operator names deserialize to `Unknown`, which never matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorKind {
    Contains,
    NotContains,
    Equals,
    StartsWith,
    EndsWith,
    /// Case-insensitive regular expression search
    Matches,
    #[serde(other)]
    Unknown,
}

impl OperatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatorKind::Contains => "contains",
            OperatorKind::NotContains => "not_contains",
            OperatorKind::Equals => "equals",
            OperatorKind::StartsWith => "starts_with",
            OperatorKind::EndsWith => "ends_with",
            OperatorKind::Matches => "matches",
            OperatorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Compiled form of a `matches` pattern, shared between clones.
///
/// `None` once compiled means the pattern is invalid.
#[derive(Clone, Default)]
struct CompiledPattern(Arc<OnceLock<Option<Regex>>>);

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.0.get() {
            None => "pending",
            Some(Some(_)) => "compiled",
            Some(None) => "invalid",
        };
        write!(f, "CompiledPattern({})", state)
    }
}

// Derived from `value`, so it never distinguishes two conditions.
impl PartialEq for CompiledPattern {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for CompiledPattern {}

/// A single predicate over one field of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionRule {
    /// Request field to inspect (currently only `content`)
    pub field: String,

    /// Comparison to apply
    pub operator: OperatorKind,

    /// Operand compared against the field value
    pub value: String,

    /// Regex for `matches`, built once from `value` on first use
    #[serde(skip)]
    pattern: CompiledPattern,
}

impl ConditionRule {
    pub fn new(field: impl Into<String>, operator: OperatorKind, value: impl Into<String>) -> Self {
        ConditionRule {
            field: field.into(),
            operator,
            value: value.into(),
            pattern: CompiledPattern::default(),
        }
    }

    /// Condition on the query text containing `value`.
    pub fn content_contains(value: impl Into<String>) -> Self {
        ConditionRule::new(CONTENT_FIELD, OperatorKind::Contains, value)
    }

    /// Condition on the query text equaling `value`.
    pub fn content_equals(value: impl Into<String>) -> Self {
        ConditionRule::new(CONTENT_FIELD, OperatorKind::Equals, value)
    }

    /// Compile a `matches` pattern ahead of the first request.
    ///
    /// No-op for other operators. The compiled regex is shared by every
    /// clone of this condition.
    pub fn compile(&self) {
        if self.operator == OperatorKind::Matches {
            self.regex();
        }
    }

    fn regex(&self) -> Option<&Regex> {
        self.pattern
            .0
            .get_or_init(|| {
                RegexBuilder::new(&self.value)
                    .case_insensitive(true)
                    .build()
                    .ok()
            })
            .as_ref()
    }

    /// Resolve the named field against a request.
    fn field_value<'a>(&self, request: &'a QueryRequest) -> Option<&'a str> {
        if self.field.eq_ignore_ascii_case(CONTENT_FIELD) {
            Some(request.query.as_str())
        } else {
            None
        }
    }

    /// Check whether this condition holds for the request.
    ///
    /// Text comparisons are case-insensitive. Unknown fields, unknown
    /// operators and invalid patterns never hold.
    pub fn holds(&self, request: &QueryRequest) -> bool {
        let Some(actual) = self.field_value(request) else {
            return false;
        };

        match self.operator {
            OperatorKind::Matches => self.regex().is_some_and(|re| re.is_match(actual)),
            OperatorKind::Unknown => false,
            op => {
                let actual = actual.to_lowercase();
                let expected = self.value.to_lowercase();
                match op {
                    OperatorKind::Contains => actual.contains(&expected),
                    OperatorKind::NotContains => !actual.contains(&expected),
                    OperatorKind::Equals => actual == expected,
                    OperatorKind::StartsWith => actual.starts_with(&expected),
                    OperatorKind::EndsWith => actual.ends_with(&expected),
                    OperatorKind::Matches | OperatorKind::Unknown => false,
                }
            }
        }
    }
}

/// Reporting label for a rule (privacy, performance, ...).
///
/// Never consulted during matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleCategory(pub String);

impl RuleCategory {
    pub fn new(category: impl Into<String>) -> Self {
        RuleCategory(category.into())
    }

    pub fn privacy() -> Self {
        RuleCategory::new("privacy")
    }

    pub fn performance() -> Self {
        RuleCategory::new("performance")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RuleCategory {
    fn default() -> Self {
        RuleCategory::new("general")
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Action taken when a rule matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleAction {
    /// Refuse the request without running inference
    Block { reason: String },
    /// Log a message and continue with automatic routing
    Warn { message: String },
    /// Run on the local model only
    ForceLocal,
    /// Run on the cloud backend only
    ForceCloud,
}

fn default_enabled() -> bool {
    true
}

/// A prioritized routing rule.
///
/// Lower `priority` values take precedence. All conditions must hold for
/// the rule to match; a rule with no conditions matches every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Unique rule name
    pub name: String,

    #[serde(default)]
    pub category: RuleCategory,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Precedence (lower wins)
    pub priority: i32,

    /// Conditions combined with logical AND
    #[serde(default)]
    pub conditions: SmallVec<[ConditionRule; 2]>,

    pub action: RuleAction,
}

impl PolicyRule {
    /// Create an enabled rule with no conditions.
    pub fn new(name: impl Into<String>, priority: i32, action: RuleAction) -> Self {
        PolicyRule {
            name: name.into(),
            category: RuleCategory::default(),
            enabled: true,
            priority,
            conditions: SmallVec::new(),
            action,
        }
    }

    pub fn with_condition(mut self, condition: ConditionRule) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_category(mut self, category: RuleCategory) -> Self {
        self.category = category;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Compile every `matches` condition of this rule.
    pub fn compile(&self) {
        for condition in &self.conditions {
            condition.compile();
        }
    }

    /// Check whether every condition holds for the request.
    ///
    /// Does not consult `enabled`; filtering disabled rules is the
    /// evaluator's job.
    #[inline]
    pub fn matches(&self, request: &QueryRequest) -> bool {
        self.conditions.iter().all(|c| c.holds(request))
    }

    /// True for an enabled rule that matches unconditionally.
    pub fn is_catch_all(&self) -> bool {
        self.enabled && self.conditions.is_empty()
    }
}
