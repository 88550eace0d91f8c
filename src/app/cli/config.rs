//! TOML configuration file loading
//!
//! Keys mirror the long option names. The file is applied first and the
//! command line overlays it.

use std::path::{Path, PathBuf};

use super::args::Args;
use crate::core::validation::ValidationError;

/// Default configuration path, `<config dir>/Scanpace/scanpace.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("Scanpace").join("scanpace.toml"))
}

/// Load the configuration file into a raw table
///
/// An explicitly named file must exist; the default location is used only
/// when present.
pub async fn load_config_file(
    config_file: Option<PathBuf>,
) -> Result<Option<toml::Table>, ValidationError> {
    let path = match config_file {
        Some(path) => {
            if !path.exists() {
                return Err(ValidationError::new(format!(
                    "The specified configuration file does not exist: {}",
                    path.display()
                )));
            }
            path
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(None),
        },
    };

    read_config_table(&path).await.map(Some)
}

async fn read_config_table(path: &Path) -> Result<toml::Table, ValidationError> {
    let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
        ValidationError::new(format!(
            "Error reading configuration file {}: {}",
            path.display(),
            e
        ))
    })?;
    toml::from_str::<toml::Table>(&contents).map_err(|e| {
        ValidationError::new(format!(
            "Error parsing configuration file {}: {}",
            path.display(),
            e
        ))
    })
}

fn string_value(config: &toml::Table, key: &str) -> Result<Option<String>, ValidationError> {
    match config.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| ValidationError::new(format!("'{}' must be a string", key))),
    }
}

fn bool_value(config: &toml::Table, key: &str) -> Result<Option<bool>, ValidationError> {
    match config.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_bool()
            .map(Some)
            .ok_or_else(|| ValidationError::new(format!("'{}' must be true or false", key))),
    }
}

fn unsigned_value(config: &toml::Table, key: &str) -> Result<Option<u64>, ValidationError> {
    match config.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_integer()
            .and_then(|n| u64::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| {
                ValidationError::new(format!("'{}' must be a non-negative integer", key))
            }),
    }
}

fn count_value(config: &toml::Table, key: &str) -> Result<Option<usize>, ValidationError> {
    match unsigned_value(config, key)? {
        None => Ok(None),
        Some(value) => usize::try_from(value).map(Some).map_err(|_| {
            ValidationError::new(format!("'{}' is too large for this platform", key))
        }),
    }
}

impl Args {
    /// Apply TOML configuration values to Args
    pub fn apply_toml_values(args: &mut Self, config: &toml::Table) -> Result<(), ValidationError> {
        if let Some(url) = string_value(config, "url")? {
            args.url = Some(url);
        }
        if let Some(api_key) = string_value(config, "api-key")? {
            args.api_key = Some(api_key);
        }
        if let Some(targets) = string_value(config, "targets")? {
            args.targets = Some(PathBuf::from(targets));
        }
        if let Some(profile) = string_value(config, "profile")? {
            args.profile = Some(profile);
        }
        if let Some(speed) = string_value(config, "speed")? {
            args.speed = Some(speed);
        }
        if let Some(max_tasks) = count_value(config, "max-tasks")? {
            args.max_tasks = Some(max_tasks);
        }
        if let Some(interval) = unsigned_value(config, "interval")? {
            args.interval = Some(interval);
        }
        if let Some(timeout) = unsigned_value(config, "timeout")? {
            args.timeout = Some(timeout);
        }
        if let Some(criticality) = string_value(config, "criticality")? {
            args.criticality = Some(criticality);
        }
        if let Some(description) = string_value(config, "description")? {
            args.description = Some(description);
        }
        if let Some(insecure) = bool_value(config, "insecure")? {
            args.insecure = insecure;
            args.verify_tls = !insecure;
        }
        if let Some(refresh) = bool_value(config, "refresh-running")? {
            args.refresh_running = refresh;
        }
        if let Some(color) = bool_value(config, "color")? {
            args.color = color;
            args.no_color = !color;
        }
        if let Some(log_level) = string_value(config, "log-level")? {
            args.log_level = Some(log_level);
        }
        if let Some(log_file) = string_value(config, "log-file")? {
            args.log_file = Some(PathBuf::from(log_file));
        }
        if let Some(log_format) = string_value(config, "log-format")? {
            args.log_format = Some(log_format);
        }

        Ok(())
    }
}
