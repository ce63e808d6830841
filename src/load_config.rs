/// `load_config` module: loads a YAML config file and applies environment overrides,
/// producing the core [`HarvestConfig`].
///
/// This module is the only place where untrusted YAML is parsed.
///
/// # Responsibilities
/// - Parse the user-supplied YAML file into [`HarvestConfig`] (defaults for optional keys)
/// - Apply `CI_HARVEST_BASE_URL` / `CI_HARVEST_STATE_DIR` from the environment when set
/// - Validate the merged result so the CLI fails before any request is made
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
///
/// Accepted YAML keys: `base_url`, `state_dir`, `concurrency`,
/// `request_timeout_secs`, `projects`, `export_path`.
use anyhow::{Context, Result};
use ci_harvest_core::config::HarvestConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const BASE_URL_ENV: &str = "CI_HARVEST_BASE_URL";
pub const STATE_DIR_ENV: &str = "CI_HARVEST_STATE_DIR";

fn env_override(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<HarvestConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: HarvestConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if let Some(base_url) = env_override(BASE_URL_ENV) {
        info!(base_url = %base_url, "Using base_url from {BASE_URL_ENV}");
        config.base_url = base_url;
    }
    if let Some(state_dir) = env_override(STATE_DIR_ENV) {
        info!(state_dir = %state_dir, "Using state_dir from {STATE_DIR_ENV}");
        config.state_dir = PathBuf::from(state_dir);
    }

    config
        .validate()
        .with_context(|| format!("Invalid config in {}", path_ref.display()))?;
    config.trace_loaded();
    Ok(config)
}
