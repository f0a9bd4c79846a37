use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Query router configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "routegate")]
#[command(about = "Policy-gated query router for local and cloud model backends")]
pub struct Config {
    /// HTTP server listen address
    #[arg(long, default_value = "0.0.0.0:8080", env = "ROUTEGATE_LISTEN_ADDR")]
    pub listen_addr: String,

    /// Path to policy YAML file
    #[arg(long, default_value = "policy.yaml", env = "ROUTEGATE_POLICY_PATH")]
    pub policy_path: PathBuf,

    /// Policy reload check interval in seconds
    #[arg(long, default_value = "30", env = "ROUTEGATE_POLICY_RELOAD_SECS")]
    pub policy_reload_secs: u64,

    /// Base URL of the local model backend
    #[arg(
        long,
        default_value = "http://127.0.0.1:11434",
        env = "ROUTEGATE_LOCAL_BACKEND_URL"
    )]
    pub local_backend_url: String,

    /// Model served by the local backend
    #[arg(long, default_value = "llama3.2", env = "ROUTEGATE_LOCAL_MODEL")]
    pub local_model: String,

    /// Local backend request timeout in seconds
    #[arg(long, default_value = "120", env = "ROUTEGATE_LOCAL_TIMEOUT_SECS")]
    pub local_timeout_secs: u64,

    /// Base URL of the cloud model backend (cloud path disabled if not set)
    #[arg(long, env = "ROUTEGATE_CLOUD_BACKEND_URL")]
    pub cloud_backend_url: Option<String>,

    /// Model served by the cloud backend
    #[arg(long, default_value = "llama3.1:70b", env = "ROUTEGATE_CLOUD_MODEL")]
    pub cloud_model: String,

    /// Cloud dispatch timeout in seconds
    #[arg(long, default_value = "30", env = "ROUTEGATE_CLOUD_TIMEOUT_SECS")]
    pub cloud_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, default_value = "false", env = "ROUTEGATE_LOG_JSON")]
    pub log_json: bool,

    /// Enable graceful shutdown
    #[arg(long, default_value = "true", env = "ROUTEGATE_GRACEFUL_SHUTDOWN")]
    pub graceful_shutdown: bool,

    /// Graceful shutdown timeout in seconds
    #[arg(long, default_value = "30", env = "ROUTEGATE_SHUTDOWN_TIMEOUT_SECS")]
    pub shutdown_timeout_secs: u64,
}

impl Config {
    /// Get policy reload interval as Duration.
    pub fn policy_reload_interval(&self) -> Duration {
        Duration::from_secs(self.policy_reload_secs)
    }

    pub fn local_timeout(&self) -> Duration {
        Duration::from_secs(self.local_timeout_secs)
    }

    pub fn cloud_timeout(&self) -> Duration {
        Duration::from_secs(self.cloud_timeout_secs)
    }

    /// Get shutdown timeout as Duration.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_addr: "0.0.0.0:8080".to_string(),
            policy_path: PathBuf::from("policy.yaml"),
            policy_reload_secs: 30,
            local_backend_url: "http://127.0.0.1:11434".to_string(),
            local_model: "llama3.2".to_string(),
            local_timeout_secs: 120,
            cloud_backend_url: None,
            cloud_model: "llama3.1:70b".to_string(),
            cloud_timeout_secs: 30,
            log_level: "info".to_string(),
            log_json: false,
            graceful_shutdown: true,
            shutdown_timeout_secs: 30,
        }
    }
}
