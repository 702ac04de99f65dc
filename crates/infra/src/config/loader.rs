//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `TASKLANE_DB_PATH`: Database file path (required)
//! - `TASKLANE_DB_POOL_SIZE`: Connection pool size (required)
//! - `TASKLANE_MODEL_API_KEY`: OpenAI API key; the pipeline runs rule-based
//!   parsing only when unset
//! - `TASKLANE_MODEL_NAME`: Chat model name
//! - `TASKLANE_MODEL_TIMEOUT_SECS`: Model call timeout in seconds
//! - `TASKLANE_CONFIRMATION_TTL_SECS`: Confirmation token lifetime
//! - `TASKLANE_CONFIRMATION_SWEEP_SECS`: Token reaper interval
//! - `TASKLANE_MAX_TASKS`: Per-owner task quota
//!
//! ## File Locations
//! The loader probes `config.{json,toml}` and `tasklane.{json,toml}` in the
//! working directory, up to two parent directories, and next to the
//! executable.

use std::path::{Path, PathBuf};

use tasklane_domain::{
    Config, ConfirmationConfig, DatabaseConfig, ModelConfig, QuotaConfig, Result, TasklaneError,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `TasklaneError::Config` if configuration cannot be loaded from
/// either source or the file format is invalid.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// The database variables are required; everything else falls back to the
/// defaults from the domain config structs.
///
/// # Errors
/// Returns `TasklaneError::Config` if required variables are missing or
/// have invalid values.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("TASKLANE_DB_PATH")?;
    let db_pool_size = env_var("TASKLANE_DB_POOL_SIZE").and_then(|s| {
        s.parse::<u32>().map_err(|e| TasklaneError::Config(format!("Invalid pool size: {e}")))
    })?;

    let defaults = ModelConfig::default();
    let model = ModelConfig {
        api_key: std::env::var("TASKLANE_MODEL_API_KEY").ok(),
        model: std::env::var("TASKLANE_MODEL_NAME").unwrap_or(defaults.model),
        timeout_secs: env_u64("TASKLANE_MODEL_TIMEOUT_SECS", defaults.timeout_secs)?,
    };

    let confirmation_defaults = ConfirmationConfig::default();
    let confirmation = ConfirmationConfig {
        ttl_secs: env_u64("TASKLANE_CONFIRMATION_TTL_SECS", confirmation_defaults.ttl_secs)?,
        sweep_interval_secs: env_u64(
            "TASKLANE_CONFIRMATION_SWEEP_SECS",
            confirmation_defaults.sweep_interval_secs,
        )?,
    };

    let quota_defaults = QuotaConfig::default();
    let quota = QuotaConfig {
        max_tasks: env_u64("TASKLANE_MAX_TASKS", quota_defaults.max_tasks as u64)? as usize,
    };

    Ok(Config {
        database: DatabaseConfig { path: db_path, pool_size: db_pool_size },
        model,
        confirmation,
        quota,
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `TasklaneError::Config` if no file is found or parsing fails.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(TasklaneError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            TasklaneError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| TasklaneError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content; format is detected by file
/// extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| TasklaneError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| TasklaneError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(TasklaneError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("tasklane.json"),
            cwd.join("tasklane.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
            cwd.join("../../config.json"),
            cwd.join("../../config.toml"),
        ]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("tasklane.json"),
                exe_dir.join("tasklane.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        TasklaneError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Parse an optional numeric environment variable with a default.
fn env_u64(key: &str, default: u64) -> Result<u64> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .map_err(|e| TasklaneError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    #[test]
    fn loads_from_env_with_required_vars() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("TASKLANE_DB_PATH", "/tmp/tasks.db");
        std::env::set_var("TASKLANE_DB_POOL_SIZE", "5");
        std::env::set_var("TASKLANE_MODEL_API_KEY", "sk-test");
        std::env::set_var("TASKLANE_CONFIRMATION_TTL_SECS", "120");

        let config = load_from_env().expect("config loads");
        assert_eq!(config.database.path, "/tmp/tasks.db");
        assert_eq!(config.database.pool_size, 5);
        assert_eq!(config.model.api_key, Some("sk-test".to_string()));
        assert_eq!(config.confirmation.ttl_secs, 120);
        // Unset optionals keep their defaults.
        assert_eq!(config.model.model, "gpt-4o-mini");

        std::env::remove_var("TASKLANE_DB_PATH");
        std::env::remove_var("TASKLANE_DB_POOL_SIZE");
        std::env::remove_var("TASKLANE_MODEL_API_KEY");
        std::env::remove_var("TASKLANE_CONFIRMATION_TTL_SECS");
    }

    #[test]
    fn missing_db_path_is_a_config_error() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::remove_var("TASKLANE_DB_PATH");
        std::env::remove_var("TASKLANE_DB_POOL_SIZE");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, TasklaneError::Config(_)));
    }

    #[test]
    fn invalid_pool_size_is_a_config_error() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("TASKLANE_DB_PATH", "/tmp/tasks.db");
        std::env::set_var("TASKLANE_DB_POOL_SIZE", "not-a-number");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, TasklaneError::Config(_)));

        std::env::remove_var("TASKLANE_DB_PATH");
        std::env::remove_var("TASKLANE_DB_POOL_SIZE");
    }

    #[test]
    fn loads_json_config_file() {
        let json_content = r#"{
            "database": {"path": "tasks.db", "pool_size": 4},
            "model": {"api_key": "sk-test"},
            "quota": {"max_tasks": 50}
        }"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("json");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let config = load_from_file(Some(path.clone())).expect("config loads");
        assert_eq!(config.database.path, "tasks.db");
        assert_eq!(config.database.pool_size, 4);
        assert_eq!(config.quota.max_tasks, 50);
        assert_eq!(config.confirmation.ttl_secs, 600);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn loads_toml_config_file() {
        let toml_content = r#"
[database]
path = "tasks.db"
pool_size = 6

[confirmation]
ttl_secs = 300
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("toml");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let config = load_from_file(Some(path.clone())).expect("config loads");
        assert_eq!(config.database.pool_size, 6);
        assert_eq!(config.confirmation.ttl_secs, 300);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = load_from_file(Some(PathBuf::from("/nonexistent/config.json"))).unwrap_err();
        assert!(matches!(err, TasklaneError::Config(_)));
    }

    #[test]
    fn invalid_json_is_a_config_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(br#"{ "this is": "not valid json" "#).unwrap();
        let path = temp_file.path().with_extension("json");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let err = load_from_file(Some(path.clone())).unwrap_err();
        assert!(matches!(err, TasklaneError::Config(_)));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = parse_config("anything", &PathBuf::from("test.yaml")).unwrap_err();
        assert!(matches!(err, TasklaneError::Config(_)));
    }
}
