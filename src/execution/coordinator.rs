use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::backend::{BackendError, ModelService};
use crate::domain::{DispatchTarget, QueryRequest, QueryResponse, RoutingDecision};
use crate::observability::{MetricsRegistry, TimingGuard};
use crate::rules::{explain, Evaluation, RuleProvider};

use super::context::ExecutionContext;
use super::error::ExecutionError;

/// Default time allowed for a cloud answer.
pub const DEFAULT_CLOUD_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of a successful execution, with routing details.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub response: QueryResponse,
    pub decision: RoutingDecision,
    pub context: ExecutionContext,
}

/// Routes queries through the policy rules and dispatches them.
///
/// Holds only shared, immutable references to its capabilities, so one
/// instance can serve any number of concurrent requests without locking.
pub struct ExecutionCoordinator {
    rule_provider: Option<Arc<dyn RuleProvider>>,
    local: Arc<dyn ModelService>,
    cloud: Option<Arc<dyn ModelService>>,
    cloud_timeout: Duration,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl ExecutionCoordinator {
    /// Create a coordinator with a local backend, no rules and no cloud.
    pub fn new(local: Arc<dyn ModelService>) -> Self {
        ExecutionCoordinator {
            rule_provider: None,
            local,
            cloud: None,
            cloud_timeout: DEFAULT_CLOUD_TIMEOUT,
            metrics: None,
        }
    }

    pub fn with_rule_provider(mut self, provider: Arc<dyn RuleProvider>) -> Self {
        self.rule_provider = Some(provider);
        self
    }

    pub fn with_cloud(mut self, cloud: Arc<dyn ModelService>) -> Self {
        self.cloud = Some(cloud);
        self
    }

    pub fn with_cloud_timeout(mut self, timeout: Duration) -> Self {
        self.cloud_timeout = timeout;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn has_cloud(&self) -> bool {
        self.cloud.is_some()
    }

    /// Evaluate the current rules against a request without dispatching.
    ///
    /// With no rule provider every request evaluates to `Auto`.
    pub fn evaluate(&self, request: &QueryRequest) -> Evaluation {
        let rules = self
            .rule_provider
            .as_ref()
            .map(|p| p.policy_rules())
            .unwrap_or_else(|| Arc::from(Vec::new()));

        explain(&rules, request)
    }

    /// Route and answer a query.
    pub async fn execute(&self, request: QueryRequest) -> Result<QueryResponse, ExecutionError> {
        self.execute_detailed(request).await.map(|o| o.response)
    }

    /// Route and answer a query, returning the decision and context too.
    ///
    /// Blocked queries are answered without touching any backend. Every
    /// other decision dispatches exactly once; there is no retry and no
    /// fallback between backends.
    pub async fn execute_detailed(
        &self,
        request: QueryRequest,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let _timer = self.metrics.as_deref().map(TimingGuard::new);

        let Evaluation {
            decision,
            matched_rule,
            rules_checked,
        } = self.evaluate(&request);

        if let Some(metrics) = &self.metrics {
            metrics.record_decision(&decision);
        }

        let mut ctx = ExecutionContext::new(
            request.session_id.clone(),
            matched_rule.map(|r| r.name),
        );

        debug!(
            session_id = %request.session_id,
            decision = %decision,
            rule = ?ctx.matched_rule,
            rules_checked,
            "Policy evaluated"
        );

        let target = match &decision {
            RoutingDecision::Block { reason } => {
                info!(
                    session_id = %request.session_id,
                    rule = ?ctx.matched_rule,
                    reason = %reason,
                    "Query blocked by policy"
                );
                ctx.complete();
                return Ok(ExecutionOutcome {
                    response: QueryResponse::blocked(reason, request.session_id),
                    decision: decision.clone(),
                    context: ctx,
                });
            }
            RoutingDecision::Warn { message } => {
                warn!(
                    session_id = %request.session_id,
                    rule = ?ctx.matched_rule,
                    message = %message,
                    "Policy warning"
                );
                ctx.add_warning(message.clone());
                DispatchTarget::Local
            }
            RoutingDecision::ForceLocal | RoutingDecision::Auto => DispatchTarget::Local,
            RoutingDecision::ForceCloud => DispatchTarget::Cloud,
        };

        ctx.begin_dispatch(target);
        let result = self.dispatch(target, &request.query).await;
        ctx.complete();

        match result {
            Ok(text) => {
                info!(
                    session_id = %request.session_id,
                    decision = decision.kind(),
                    target = %target,
                    latency_ms = ctx.elapsed_ms(),
                    "Query completed"
                );
                Ok(ExecutionOutcome {
                    response: QueryResponse::new(text, request.session_id),
                    decision,
                    context: ctx,
                })
            }
            Err(e) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_failure(e.is_cloud_unavailable());
                }
                warn!(
                    session_id = %request.session_id,
                    decision = decision.kind(),
                    target = %target,
                    error = %e,
                    "Query failed"
                );
                Err(e)
            }
        }
    }

    /// Invoke the backend for `target` once.
    async fn dispatch(&self, target: DispatchTarget, query: &str) -> Result<String, ExecutionError> {
        match target {
            DispatchTarget::Local => {
                self.record_dispatch(target);
                self.local
                    .generate_answer(query)
                    .await
                    .map_err(|source| ExecutionError::Backend { target, source })
            }
            DispatchTarget::Cloud => {
                let Some(cloud) = &self.cloud else {
                    return Err(ExecutionError::CloudUnavailable {
                        reason: "no cloud backend configured".to_string(),
                    });
                };

                self.record_dispatch(target);
                match tokio::time::timeout(self.cloud_timeout, cloud.generate_answer(query)).await {
                    Ok(Ok(text)) => Ok(text),
                    Ok(Err(BackendError::Unavailable(reason))) => {
                        Err(ExecutionError::CloudUnavailable { reason })
                    }
                    Ok(Err(source)) => Err(ExecutionError::Backend { target, source }),
                    Err(_) => Err(ExecutionError::CloudUnavailable {
                        reason: format!(
                            "{} did not answer within {}ms",
                            cloud.name(),
                            self.cloud_timeout.as_millis()
                        ),
                    }),
                }
            }
        }
    }

    fn record_dispatch(&self, target: DispatchTarget) {
        if let Some(metrics) = &self.metrics {
            metrics.record_dispatch(target);
        }
    }
}
