//! Service configuration.
//!
//! Sources are layered, later ones winning: built-in defaults, a TOML file
//! (`customers.toml` or `config/customers.toml`, with `${VAR}` interpolation), `CUSTOMERS_*`
//! environment variables, then [`ConfigOverrides`] supplied by the caller. The merged result
//! is validated before it is returned.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "customers.toml";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// Values set programmatically (CLI flags, tests); they beat every other source.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: "sqlite://customers.db?mode=rwc".to_string(), max_connections: 5, timeout_secs: 30 }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: "127.0.0.1".to_string(), port: 8080, graceful_shutdown_secs: 15 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = match locate_file(options.config_path.as_deref()) {
            Some(path) => Self::from_file(&path)?,
            None if options.require_file => {
                return Err(ConfigError::MissingConfigFile(
                    options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)),
                ));
            }
            None => Self::default(),
        };

        config.apply_env()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.server.validate()?;
        self.logging.validate()
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
        toml::from_str(&interpolate(&raw)?)
            .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        env_override(&["CUSTOMERS_DATABASE_URL"], &mut self.database.url)?;
        env_override(&["CUSTOMERS_DATABASE_MAX_CONNECTIONS"], &mut self.database.max_connections)?;
        env_override(&["CUSTOMERS_DATABASE_TIMEOUT_SECS"], &mut self.database.timeout_secs)?;

        env_override(&["CUSTOMERS_SERVER_BIND_ADDRESS"], &mut self.server.bind_address)?;
        env_override(&["CUSTOMERS_SERVER_PORT"], &mut self.server.port)?;
        env_override(
            &["CUSTOMERS_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            &mut self.server.graceful_shutdown_secs,
        )?;

        env_override(&["CUSTOMERS_LOGGING_LEVEL", "CUSTOMERS_LOG_LEVEL"], &mut self.logging.level)?;
        if let Some((_, value)) = first_env(&["CUSTOMERS_LOGGING_FORMAT", "CUSTOMERS_LOG_FORMAT"]) {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        let ConfigOverrides { database_url, log_level, bind_address, port } = overrides;
        if let Some(url) = database_url {
            self.database.url = url;
        }
        if let Some(level) = log_level {
            self.logging.level = level;
        }
        if let Some(bind_address) = bind_address {
            self.server.bind_address = bind_address;
        }
        self.server.port = port.unwrap_or(self.server.port);
    }
}

impl DatabaseConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let url = self.url.trim();
        if !(url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:") {
            return invalid(
                "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)",
            );
        }
        if self.max_connections == 0 {
            return invalid("database.max_connections must be greater than zero");
        }
        if !(1..=300).contains(&self.timeout_secs) {
            return invalid("database.timeout_secs must be in range 1..=300");
        }
        Ok(())
    }
}

impl ServerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.trim().is_empty() {
            return invalid("server.bind_address must not be empty");
        }
        if self.port == 0 {
            return invalid("server.port must be greater than zero");
        }
        if self.graceful_shutdown_secs == 0 {
            return invalid("server.graceful_shutdown_secs must be greater than zero");
        }
        Ok(())
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if LOG_LEVELS.contains(&self.level.trim().to_ascii_lowercase().as_str()) {
            Ok(())
        } else {
            invalid("logging.level must be one of trace|debug|info|warn|error")
        }
    }
}

fn invalid(message: &str) -> Result<(), ConfigError> {
    Err(ConfigError::Validation(message.to_string()))
}

fn locate_file(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => path.exists().then(|| path.to_path_buf()),
        None => [PathBuf::from(DEFAULT_CONFIG_FILE), Path::new("config").join(DEFAULT_CONFIG_FILE)]
            .into_iter()
            .find(|path| path.exists()),
    }
}

/// Replaces every `${VAR}` with the value of `VAR`; an unset variable is an error.
fn interpolate(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or(ConfigError::UnterminatedInterpolation)?;
        let var = &after[..end];
        let value = env::var(var)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: var.to_string() })?;
        output.push_str(&value);
        rest = &after[end + 1..];
    }
    output.push_str(rest);

    Ok(output)
}

/// First non-blank variable among `keys`, in order.
fn first_env(keys: &[&str]) -> Option<(String, String)> {
    keys.iter().find_map(|key| {
        env::var(key)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(|value| (key.to_string(), value))
    })
}

fn env_override<T: FromStr>(keys: &[&str], target: &mut T) -> Result<(), ConfigError> {
    if let Some((key, value)) = first_env(keys) {
        *target = value.parse().map_err(|_| ConfigError::InvalidEnvOverride { key, value })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{interpolate, AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    const MANAGED_VARS: [&str; 10] = [
        "CUSTOMERS_DATABASE_URL",
        "CUSTOMERS_DATABASE_MAX_CONNECTIONS",
        "CUSTOMERS_DATABASE_TIMEOUT_SECS",
        "CUSTOMERS_SERVER_BIND_ADDRESS",
        "CUSTOMERS_SERVER_PORT",
        "CUSTOMERS_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "CUSTOMERS_LOGGING_LEVEL",
        "CUSTOMERS_LOGGING_FORMAT",
        "CUSTOMERS_LOG_LEVEL",
        "CUSTOMERS_LOG_FORMAT",
    ];

    /// Runs `test_fn` with exactly `vars` set among the service variables, then clears them.
    fn with_env<T>(vars: &[(&str, &str)], test_fn: impl FnOnce() -> T) -> T {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        let _guard = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap_or_else(|e| e.into_inner());

        for key in MANAGED_VARS {
            env::remove_var(key);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }

        let result = test_fn();

        for (key, _) in vars {
            env::remove_var(key);
        }
        result
    }

    fn write_file(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("customers.toml");
        fs::write(&path, contents).expect("write config file");
        path
    }

    fn from_path(path: PathBuf) -> Result<AppConfig, ConfigError> {
        AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
    }

    #[test]
    fn defaults_load_without_file_or_env() {
        let config = with_env(&[], || AppConfig::load(LoadOptions::default())).expect("defaults");

        assert_eq!(config.listen_address(), "127.0.0.1:8080");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.server.graceful_shutdown_secs, 15);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_file(&dir, "[server]\nport = 9090\n\n[logging]\nformat = \"json\"\n");

        let config = with_env(&[], || from_path(path)).expect("load");

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.database.timeout_secs, 30);
    }

    #[test]
    fn file_values_are_interpolated_from_environment() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_file(&dir, "[database]\nurl = \"sqlite://${CUSTOMERS_TEST_DB_PATH}\"\n");

        let config =
            with_env(&[("CUSTOMERS_TEST_DB_PATH", "from-env.db")], || from_path(path)).expect("load");

        assert_eq!(config.database.url, "sqlite://from-env.db");
    }

    #[test]
    fn interpolation_reports_unset_and_unterminated_variables() {
        let missing = with_env(&[], || interpolate("url = \"${CUSTOMERS_TEST_UNSET}\""));
        assert!(matches!(
            missing,
            Err(ConfigError::MissingEnvInterpolation { ref var }) if var == "CUSTOMERS_TEST_UNSET"
        ));

        assert!(matches!(interpolate("url = \"${OPEN"), Err(ConfigError::UnterminatedInterpolation)));
        assert_eq!(interpolate("no variables here").expect("plain"), "no variables here");
    }

    #[test]
    fn environment_beats_file_and_overrides_beat_environment() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_file(
            &dir,
            "[database]\nurl = \"sqlite://from-file.db\"\n\n[server]\nport = 9090\nbind_address = \"0.0.0.0\"\n",
        );
        let vars = [("CUSTOMERS_DATABASE_URL", "sqlite://from-env.db"), ("CUSTOMERS_SERVER_PORT", "7070")];

        let config = with_env(&vars, || {
            AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
        })
        .expect("load");

        assert_eq!(config.database.url, "sqlite://from-override.db");
        assert_eq!(config.server.port, 7070);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn short_logging_aliases_apply_when_long_names_are_unset() {
        let vars = [("CUSTOMERS_LOG_LEVEL", "warn"), ("CUSTOMERS_LOG_FORMAT", "pretty")];

        let config = with_env(&vars, || AppConfig::load(LoadOptions::default())).expect("load");

        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn non_sqlite_url_fails_validation() {
        let error = with_env(&[("CUSTOMERS_DATABASE_URL", "postgres://localhost/customers")], || {
            AppConfig::load(LoadOptions::default())
        })
        .expect_err("postgres url should be rejected");

        assert!(matches!(error, ConfigError::Validation(ref message) if message.contains("database.url")));
    }

    #[test]
    fn unparsable_numeric_variable_names_the_key() {
        let error = with_env(&[("CUSTOMERS_SERVER_PORT", "not-a-port")], || {
            AppConfig::load(LoadOptions::default())
        })
        .expect_err("port should not parse");

        assert!(matches!(
            error,
            ConfigError::InvalidEnvOverride { ref key, ref value }
                if key == "CUSTOMERS_SERVER_PORT" && value == "not-a-port"
        ));
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let error = with_env(&[("CUSTOMERS_LOGGING_LEVEL", "loud")], || {
            AppConfig::load(LoadOptions::default())
        })
        .expect_err("level should be rejected");

        assert!(matches!(error, ConfigError::Validation(ref message) if message.contains("logging.level")));
    }

    #[test]
    fn required_file_must_exist() {
        let dir = TempDir::new().expect("tempdir");

        let result = with_env(&[], || {
            AppConfig::load(LoadOptions {
                config_path: Some(dir.path().join("absent.toml")),
                require_file: true,
                ..LoadOptions::default()
            })
        });

        assert!(matches!(result, Err(ConfigError::MissingConfigFile(_))));
    }
}
