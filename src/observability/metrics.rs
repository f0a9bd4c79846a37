use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::domain::{DispatchTarget, RoutingDecision};

/// Metrics registry for the application.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Total queries received
    pub requests_total: AtomicU64,

    /// Routing decisions by outcome
    pub decisions_block: AtomicU64,
    pub decisions_warn: AtomicU64,
    pub decisions_force_local: AtomicU64,
    pub decisions_force_cloud: AtomicU64,
    pub decisions_auto: AtomicU64,

    /// Backend dispatches by target
    pub dispatch_local: AtomicU64,
    pub dispatch_cloud: AtomicU64,

    /// Failed executions
    pub backend_failures: AtomicU64,
    pub cloud_unavailable: AtomicU64,

    /// End-to-end latency buckets
    pub latency_under_10ms: AtomicU64,
    pub latency_10_100ms: AtomicU64,
    pub latency_100ms_1s: AtomicU64,
    pub latency_1_10s: AtomicU64,
    pub latency_over_10s: AtomicU64,

    /// Policy reloads
    pub policy_reloads_total: AtomicU64,
    pub policy_reload_errors: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry.
    pub fn new() -> Self {
        MetricsRegistry::default()
    }

    /// Record a routing decision for an incoming query.
    pub fn record_decision(&self, decision: &RoutingDecision) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        let counter = match decision {
            RoutingDecision::Block { .. } => &self.decisions_block,
            RoutingDecision::Warn { .. } => &self.decisions_warn,
            RoutingDecision::ForceLocal => &self.decisions_force_local,
            RoutingDecision::ForceCloud => &self.decisions_force_cloud,
            RoutingDecision::Auto => &self.decisions_auto,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a backend dispatch.
    pub fn record_dispatch(&self, target: DispatchTarget) {
        match target {
            DispatchTarget::Local => self.dispatch_local.fetch_add(1, Ordering::Relaxed),
            DispatchTarget::Cloud => self.dispatch_cloud.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Record a failed execution.
    pub fn record_failure(&self, cloud_unavailable: bool) {
        if cloud_unavailable {
            self.cloud_unavailable.fetch_add(1, Ordering::Relaxed);
        } else {
            self.backend_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record request latency.
    pub fn record_latency(&self, start: Instant) {
        let millis = start.elapsed().as_millis() as u64;

        if millis < 10 {
            self.latency_under_10ms.fetch_add(1, Ordering::Relaxed);
        } else if millis < 100 {
            self.latency_10_100ms.fetch_add(1, Ordering::Relaxed);
        } else if millis < 1_000 {
            self.latency_100ms_1s.fetch_add(1, Ordering::Relaxed);
        } else if millis < 10_000 {
            self.latency_1_10s.fetch_add(1, Ordering::Relaxed);
        } else {
            self.latency_over_10s.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a policy reload.
    pub fn record_policy_reload(&self, success: bool) {
        self.policy_reloads_total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.policy_reload_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        format!(
            r#"# HELP routegate_requests_total Total number of queries received
# TYPE routegate_requests_total counter
routegate_requests_total {}

# HELP routegate_decisions Routing decisions by outcome
# TYPE routegate_decisions counter
routegate_decisions{{outcome="block"}} {}
routegate_decisions{{outcome="warn"}} {}
routegate_decisions{{outcome="force_local"}} {}
routegate_decisions{{outcome="force_cloud"}} {}
routegate_decisions{{outcome="auto"}} {}

# HELP routegate_dispatches Backend dispatches by target
# TYPE routegate_dispatches counter
routegate_dispatches{{target="local"}} {}
routegate_dispatches{{target="cloud"}} {}

# HELP routegate_failures Failed executions by kind
# TYPE routegate_failures counter
routegate_failures{{kind="backend"}} {}
routegate_failures{{kind="cloud_unavailable"}} {}

# HELP routegate_latency_bucket Query latency histogram
# TYPE routegate_latency_bucket counter
routegate_latency_bucket{{le="0.01"}} {}
routegate_latency_bucket{{le="0.1"}} {}
routegate_latency_bucket{{le="1"}} {}
routegate_latency_bucket{{le="10"}} {}
routegate_latency_bucket{{le="+Inf"}} {}

# HELP routegate_policy_reloads_total Policy reload operations
# TYPE routegate_policy_reloads_total counter
routegate_policy_reloads_total {}

# HELP routegate_policy_reload_errors_total Policy reload errors
# TYPE routegate_policy_reload_errors_total counter
routegate_policy_reload_errors_total {}
"#,
            self.requests_total.load(Ordering::Relaxed),
            self.decisions_block.load(Ordering::Relaxed),
            self.decisions_warn.load(Ordering::Relaxed),
            self.decisions_force_local.load(Ordering::Relaxed),
            self.decisions_force_cloud.load(Ordering::Relaxed),
            self.decisions_auto.load(Ordering::Relaxed),
            self.dispatch_local.load(Ordering::Relaxed),
            self.dispatch_cloud.load(Ordering::Relaxed),
            self.backend_failures.load(Ordering::Relaxed),
            self.cloud_unavailable.load(Ordering::Relaxed),
            self.latency_under_10ms.load(Ordering::Relaxed),
            self.latency_10_100ms.load(Ordering::Relaxed),
            self.latency_100ms_1s.load(Ordering::Relaxed),
            self.latency_1_10s.load(Ordering::Relaxed),
            self.latency_over_10s.load(Ordering::Relaxed),
            self.policy_reloads_total.load(Ordering::Relaxed),
            self.policy_reload_errors.load(Ordering::Relaxed),
        )
    }
}

/// Guard that records latency when dropped.
pub struct TimingGuard<'a> {
    registry: &'a MetricsRegistry,
    start: Instant,
}

impl<'a> TimingGuard<'a> {
    pub fn new(registry: &'a MetricsRegistry) -> Self {
        TimingGuard {
            registry,
            start: Instant::now(),
        }
    }
}

impl<'a> Drop for TimingGuard<'a> {
    fn drop(&mut self) {
        self.registry.record_latency(self.start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_decision() {
        let metrics = MetricsRegistry::new();

        metrics.record_decision(&RoutingDecision::Auto);
        metrics.record_decision(&RoutingDecision::Auto);
        metrics.record_decision(&RoutingDecision::Block {
            reason: "x".to_string(),
        });

        assert_eq!(metrics.requests_total.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.decisions_auto.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.decisions_block.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_record_dispatch_and_failure() {
        let metrics = MetricsRegistry::new();

        metrics.record_dispatch(DispatchTarget::Local);
        metrics.record_dispatch(DispatchTarget::Cloud);
        metrics.record_failure(true);
        metrics.record_failure(false);

        assert_eq!(metrics.dispatch_local.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.dispatch_cloud.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.cloud_unavailable.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.backend_failures.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_timing_guard() {
        let metrics = MetricsRegistry::new();
        {
            let _guard = TimingGuard::new(&metrics);
        }

        assert_eq!(metrics.latency_under_10ms.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_prometheus_format() {
        let metrics = MetricsRegistry::new();
        metrics.record_decision(&RoutingDecision::ForceCloud);

        let output = metrics.to_prometheus();

        assert!(output.contains("routegate_requests_total 1"));
        assert!(output.contains("routegate_decisions{outcome=\"force_cloud\"} 1"));
    }
}
