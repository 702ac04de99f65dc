//! Application configuration structures.
//!
//! Loaded by the infra config loader from environment variables or a
//! JSON/TOML file.

use serde::{Deserialize, Serialize};

use crate::constants::{
    CONFIRMATION_SWEEP_INTERVAL_SECS, CONFIRMATION_TTL_SECS, DEFAULT_MODEL_TIMEOUT_SECS,
    DEFAULT_TASK_QUOTA,
};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub confirmation: ConfirmationConfig,
    #[serde(default)]
    pub quota: QuotaConfig,
}

/// SQLite task store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

/// Optional language-model parser settings. When `api_key` is absent the
/// pipeline runs rule-based parsing only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model_name")]
    pub model: String,
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model_name(),
            timeout_secs: default_model_timeout(),
        }
    }
}

/// Confirmation token lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationConfig {
    #[serde(default = "default_confirmation_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_confirmation_ttl(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

/// Per-owner task quota settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    #[serde(default = "default_task_quota")]
    pub max_tasks: usize,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self { max_tasks: default_task_quota() }
    }
}

fn default_model_name() -> String {
    "gpt-4o-mini".to_string()
}

fn default_model_timeout() -> u64 {
    DEFAULT_MODEL_TIMEOUT_SECS
}

fn default_confirmation_ttl() -> u64 {
    CONFIRMATION_TTL_SECS
}

fn default_sweep_interval() -> u64 {
    CONFIRMATION_SWEEP_INTERVAL_SECS
}

fn default_task_quota() -> usize {
    DEFAULT_TASK_QUOTA
}
