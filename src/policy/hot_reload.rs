use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::observability::MetricsRegistry;
use crate::rules::RuleBook;

use super::loader::{PolicyError, PolicyLoader};

/// Watch the policy file and broadcast new rule books.
pub struct PolicyWatcher {
    loader: PolicyLoader,
    check_interval: Duration,
    last_version: Option<String>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl PolicyWatcher {
    /// Create a new policy watcher.
    pub fn new(loader: PolicyLoader, check_interval: Duration) -> Self {
        PolicyWatcher {
            loader,
            check_interval,
            last_version: None,
            metrics: None,
        }
    }

    /// Record reload outcomes in the given registry.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Start watching for policy changes.
    ///
    /// Returns a receiver that always holds the latest good rule book. If
    /// the initial load fails the receiver starts with an empty book, which
    /// routes every request automatically.
    pub fn start(mut self) -> (watch::Receiver<Arc<RuleBook>>, tokio::task::JoinHandle<()>) {
        let initial = match self.loader.load() {
            Ok((policy, book)) => {
                self.last_version = Some(policy.version.clone());
                info!(
                    version = %policy.version,
                    rules = book.rules.len(),
                    enabled = book.enabled_count(),
                    "Loaded initial policy"
                );
                self.record_reload(true);
                Arc::new(book)
            }
            Err(e) => {
                error!(path = %self.loader.policy_path(), error = %e, "Failed to load initial policy");
                self.record_reload(false);
                Arc::new(RuleBook::empty())
            }
        };

        let (tx, rx) = watch::channel(initial);

        let handle = tokio::spawn(async move {
            let mut interval = interval(self.check_interval);

            loop {
                interval.tick().await;

                match self.check_for_updates(&tx) {
                    Ok(true) => {
                        self.record_reload(true);
                        info!("Policy reloaded successfully");
                    }
                    Ok(false) => {}
                    Err(e) => {
                        self.record_reload(false);
                        warn!(error = %e, "Error checking for policy updates, keeping previous rules");
                    }
                }
            }
        });

        (rx, handle)
    }

    /// Check for policy updates and broadcast if the version changed.
    fn check_for_updates(&mut self, tx: &watch::Sender<Arc<RuleBook>>) -> Result<bool, PolicyError> {
        let policy = self.loader.load_policy()?;

        if self.last_version.as_ref() == Some(&policy.version) {
            return Ok(false);
        }

        let book = RuleBook::from_policy(&policy);

        info!(
            from = ?self.last_version,
            to = %policy.version,
            rules = book.rules.len(),
            "Policy version changed"
        );

        self.last_version = Some(policy.version);
        let _ = tx.send(Arc::new(book));

        Ok(true)
    }

    fn record_reload(&self, success: bool) {
        if let Some(metrics) = &self.metrics {
            metrics.record_policy_reload(success);
        }
    }
}
