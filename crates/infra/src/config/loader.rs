//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Read the file named by `GAPFINDER_CONFIG`, or the first file found by
//!    [`probe_config_paths`]; use built-in defaults when there is none
//! 2. Apply `GAPFINDER_*` environment overrides on top
//! 3. Validate the result
//!
//! Every configuration value can be overridden from the environment; fields
//! left out of a file keep their defaults.
//!
//! ## Environment Variables
//! - `GAPFINDER_API_BASE_URL`, `GAPFINDER_API_PAGE_SIZE`
//! - `GAPFINDER_MAX_CONCURRENT_REQUESTS`, `GAPFINDER_MAX_RETRY_ATTEMPTS`
//! - `GAPFINDER_INITIAL_RETRY_DELAY_MS`, `GAPFINDER_MAX_RETRY_DELAY_MS`
//! - `GAPFINDER_BACKOFF_MULTIPLIER`, `GAPFINDER_REQUEST_TIMEOUT_MS`
//! - `GAPFINDER_BATCH_SIZE`, `GAPFINDER_INTER_BATCH_DELAY_MS`
//! - `GAPFINDER_CACHE_MAX_SIZE`, `GAPFINDER_CACHE_TTL_MINUTES`
//! - `GAPFINDER_BUFFER_MINUTES`, `GAPFINDER_MIN_SLOT_DURATION_MINUTES`
//! - `GAPFINDER_CORE_TIME_START_HOUR`, `GAPFINDER_CORE_TIME_END_HOUR`
//! - `GAPFINDER_EMPTY_DAY_POLICY` (`omit` or `report_preferred`)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./gapfinder.toml`, `./gapfinder.json`
//! 2. `./config.toml`, `./config.json`
//! 3. The same names in the parent directory

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use gapfinder_domain::{Config, GapfinderError, Result};

/// Names of the files probed in each directory, in order
const CONFIG_FILE_NAMES: [&str; 4] =
    ["gapfinder.toml", "gapfinder.json", "config.toml", "config.json"];

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "GAPFINDER_CONFIG";

/// Load configuration from file (if any), then the environment
///
/// # Errors
/// Returns `GapfinderError::Config` if:
/// - `GAPFINDER_CONFIG` names a file that does not exist
/// - A file has an invalid format
/// - An environment override does not parse
/// - The final configuration fails validation
pub fn load() -> Result<Config> {
    let explicit = std::env::var(CONFIG_PATH_ENV).ok().filter(|p| !p.trim().is_empty());

    let config = match explicit.map(PathBuf::from).or_else(probe_config_paths) {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::info!("No config file found, using defaults");
            Config::default()
        }
    };

    let config = apply_env_overrides(config)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Supports JSON and
/// TOML (detected by file extension). The file is not validated here.
///
/// # Errors
/// Returns `GapfinderError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(GapfinderError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            GapfinderError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| GapfinderError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Override configuration values from `GAPFINDER_*` environment variables
///
/// Unset or empty variables leave the value untouched.
///
/// # Errors
/// Returns `GapfinderError::Config` naming the first variable whose value
/// does not parse.
pub fn apply_env_overrides(mut config: Config) -> Result<Config> {
    let api = &mut config.api;
    env_override("GAPFINDER_API_BASE_URL", &mut api.base_url)?;
    env_override("GAPFINDER_API_PAGE_SIZE", &mut api.page_size)?;

    let requests = &mut config.requests;
    env_override("GAPFINDER_MAX_CONCURRENT_REQUESTS", &mut requests.max_concurrent_requests)?;
    env_override("GAPFINDER_MAX_RETRY_ATTEMPTS", &mut requests.max_retry_attempts)?;
    env_override("GAPFINDER_INITIAL_RETRY_DELAY_MS", &mut requests.initial_retry_delay_ms)?;
    env_override("GAPFINDER_MAX_RETRY_DELAY_MS", &mut requests.max_retry_delay_ms)?;
    env_override("GAPFINDER_BACKOFF_MULTIPLIER", &mut requests.backoff_multiplier)?;
    env_override("GAPFINDER_REQUEST_TIMEOUT_MS", &mut requests.request_timeout_ms)?;

    env_override("GAPFINDER_BATCH_SIZE", &mut config.batch.batch_size)?;
    env_override("GAPFINDER_INTER_BATCH_DELAY_MS", &mut config.batch.inter_batch_delay_ms)?;

    env_override("GAPFINDER_CACHE_MAX_SIZE", &mut config.cache.cache_max_size)?;
    env_override("GAPFINDER_CACHE_TTL_MINUTES", &mut config.cache.cache_ttl_minutes)?;

    let availability = &mut config.availability;
    env_override("GAPFINDER_BUFFER_MINUTES", &mut availability.buffer_minutes)?;
    env_override(
        "GAPFINDER_MIN_SLOT_DURATION_MINUTES",
        &mut availability.min_slot_duration_minutes,
    )?;
    env_override("GAPFINDER_CORE_TIME_START_HOUR", &mut availability.core_time_start_hour)?;
    env_override("GAPFINDER_CORE_TIME_END_HOUR", &mut availability.core_time_end_hour)?;
    env_override("GAPFINDER_EMPTY_DAY_POLICY", &mut availability.empty_day_policy)?;

    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `GapfinderError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| GapfinderError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| GapfinderError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(GapfinderError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    probe_from(&cwd)
}

fn probe_from(dir: &Path) -> Option<PathBuf> {
    let dirs = [Some(dir), dir.parent()];

    dirs.into_iter()
        .flatten()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

/// Replace `target` with the parsed value of `key`, when set
///
/// # Errors
/// Returns `GapfinderError::Config` if the value does not parse.
fn env_override<T>(key: &str, target: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = std::env::var(key).ok().filter(|value| !value.trim().is_empty()) else {
        return Ok(());
    };

    *target = raw.trim().parse().map_err(|e| {
        GapfinderError::Config(format!("Invalid value for {}: {}", key, e))
    })?;
    tracing::debug!(key, "configuration value overridden from environment");
    Ok(())
}
