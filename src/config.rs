use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::policy::PollPolicy;

/// Harness-facing polling configuration.
///
/// Field names and defaults follow the integration-test configuration the
/// waits consume: attempt budget, inter-attempt sleep, and the per-RPC
/// timeout samplers should apply to their remote calls. The engine itself
/// never reads `rpc_timeout_sec`; it is carried here so every sampler in a
/// test run uses the same value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollConfig {
    pub max_retry_attempts: u32,
    pub sleep_time_sec: f64,
    pub rpc_timeout_sec: f64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_retry_attempts: 40,
            sleep_time_sec: 1.0,
            rpc_timeout_sec: 10.0,
        }
    }
}

impl PollConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_retry_attempts == 0 {
            return Err(anyhow::anyhow!("max_retry_attempts must be at least 1"));
        }

        if !self.sleep_time_sec.is_finite() || self.sleep_time_sec < 0.0 {
            return Err(anyhow::anyhow!(
                "sleep_time_sec must be finite and non-negative, got {}",
                self.sleep_time_sec
            ));
        }

        if !self.rpc_timeout_sec.is_finite() || self.rpc_timeout_sec <= 0.0 {
            return Err(anyhow::anyhow!(
                "rpc_timeout_sec must be finite and positive, got {}",
                self.rpc_timeout_sec
            ));
        }

        Ok(())
    }

    // Accessors assume a validated config.
    pub fn sleep_time(&self) -> Duration {
        Duration::from_secs_f64(self.sleep_time_sec)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.rpc_timeout_sec)
    }

    /// Engine-facing view of this configuration.
    pub fn policy(&self) -> PollPolicy {
        PollPolicy::new(self.max_retry_attempts, self.sleep_time())
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(attempts_str) = std::env::var("GOALSTATE_MAX_RETRY_ATTEMPTS") {
            if let Ok(attempts) = attempts_str.parse::<u32>() {
                self.max_retry_attempts = attempts;
            }
        }

        if let Ok(sleep_str) = std::env::var("GOALSTATE_SLEEP_TIME_SEC") {
            if let Ok(sleep) = sleep_str.parse::<f64>() {
                self.sleep_time_sec = sleep;
            }
        }

        if let Ok(timeout_str) = std::env::var("GOALSTATE_RPC_TIMEOUT_SEC") {
            if let Ok(timeout) = timeout_str.parse::<f64>() {
                self.rpc_timeout_sec = timeout;
            }
        }
    }
}

/// Load configuration: env vars > config file > defaults
pub fn load_config(config_path: Option<&str>) -> Result<PollConfig> {
    let mut config = PollConfig::default();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            let file_content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {path}"))?;

            config = toml::from_str(&file_content)
                .with_context(|| format!("Failed to parse config file: {path}"))?;

            log::info!("Loaded polling configuration from file: {path}");
        } else {
            log::info!("Config file not found: {path}, using defaults");
        }
    }

    config.apply_env_overrides();

    config
        .validate()
        .with_context(|| "Polling configuration validation failed")?;

    log::debug!("Final polling config: {config:?}");

    Ok(config)
}
