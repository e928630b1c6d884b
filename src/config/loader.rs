//! Configuration loading and environment variable interpolation

use crate::error::{Error, Result};
use regex::Regex;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::Config;

pub const CONFIG_FILENAME: &str = "royalty-desk.toml";

/// Load configuration from royalty-desk.toml
pub fn load_config() -> Result<Config> {
    let config_path = find_config_file()?;
    load_config_from_path(&config_path)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|_| Error::ConfigNotFound)?;
    let content = interpolate_env_vars(&content);
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Load the explicit path if given, otherwise search for the config file,
/// falling back to built-in defaults when none exists
pub fn load_config_or_default(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return load_config_from_path(path);
    }

    match load_config() {
        Ok(config) => Ok(config),
        Err(Error::ConfigNotFound) => {
            tracing::warn!("{} not found, using built-in defaults", CONFIG_FILENAME);
            Ok(Config::default())
        }
        Err(e) => Err(e),
    }
}

/// Find the configuration file, searching upward from current directory
fn find_config_file() -> Result<PathBuf> {
    let mut current = env::current_dir().map_err(|e| Error::Config(e.to_string()))?;

    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(Error::ConfigNotFound);
        }
    }
}

/// Interpolate environment variables in the format ${VAR_NAME} or ${VAR_NAME:-default}
fn interpolate_env_vars(content: &str) -> String {
    // Compile-time constant pattern; a failure here is a bug, not a runtime condition
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
        .expect("Invalid regex pattern - this is a bug in the codebase");

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        env::var(var_name).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}

/// Generate a default configuration file content
pub fn default_config_content() -> &'static str {
    r#"# Royalty Desk Configuration

[server]
host = "127.0.0.1"
port = 8000

[storage]
# Holds session.json for "remember me" logins made from the CLI
data_dir = "./.royalty-desk"

[session]
secret = "${ROYALTY_DESK_SECRET:-royalty-desk-secret-change-in-production}"
cookie_prefix = "royalty_desk"
durable_ttl_days = 30
ephemeral_ttl_hours = 12
secure_cookies = false

[idle]
# Inactivity before the warning dialog appears
threshold_secs = 30
# The countdown shows countdown_secs, countdown_secs - 1, ..., 0
countdown_secs = 10
tick_interval_ms = 1000
# Minimum spacing between activity signals (must be below the threshold)
debounce_ms = 250

[[users]]
username = "admin"
password = "admin123"
role = "administrator"

[[users]]
username = "editor"
password = "editor123"
role = "editor"

[[users]]
username = "viewer"
password = "viewer123"
role = "viewer"
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_interpolation() {
        env::set_var("ROYALTY_TEST_VAR", "hello");
        let content = "value = \"${ROYALTY_TEST_VAR}\"";
        let result = interpolate_env_vars(content);
        assert_eq!(result, "value = \"hello\"");
        env::remove_var("ROYALTY_TEST_VAR");
    }

    #[test]
    fn test_env_interpolation_with_default() {
        let content = "value = \"${NONEXISTENT_ROYALTY_VAR:-default_value}\"";
        let result = interpolate_env_vars(content);
        assert_eq!(result, "value = \"default_value\"");
    }

    #[test]
    fn test_default_content_parses_and_validates() {
        let content = interpolate_env_vars(default_config_content());
        let config: Config = toml::from_str(&content).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.users.len(), 3);
        assert_eq!(config.idle.countdown_secs, 10);
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "[idle]\nthreshold_secs = 60\n").unwrap();

        let config = load_config_from_path(&path).unwrap();
        assert_eq!(config.idle.threshold_secs, 60);
    }

    #[test]
    fn test_load_invalid_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "[idle]\nthreshold_secs = 0\n").unwrap();

        assert!(matches!(load_config_from_path(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_explicit_path() {
        let result = load_config_or_default(Some(Path::new("/nonexistent/royalty-desk.toml")));
        assert!(matches!(result, Err(Error::ConfigNotFound)));
    }
}
