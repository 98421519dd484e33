use crate::core::{DaoError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Names a TOML file to load instead of the default location.
pub const CONFIG_PATH_ENV: &str = "SQLDAO_CONFIG";
/// Overrides `database.path`.
pub const DATABASE_PATH_ENV: &str = "SQLDAO_DATABASE";
/// Overrides `database.read_only`.
pub const READ_ONLY_ENV: &str = "SQLDAO_READ_ONLY";
/// Overrides `database.foreign_keys`.
pub const FOREIGN_KEYS_ENV: &str = "SQLDAO_FOREIGN_KEYS";

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Connection settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file path, or `:memory:`.
    pub path: String,
    pub read_only: bool,
    pub create_if_missing: bool,
    pub foreign_keys: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: "sqldao.db".to_string(),
            read_only: false,
            create_if_missing: true,
            foreign_keys: true,
        }
    }
}

impl DatabaseConfig {
    /// Settings for a private in-memory database.
    pub fn in_memory() -> Self {
        DatabaseConfig {
            path: ":memory:".to_string(),
            ..DatabaseConfig::default()
        }
    }

    /// Settings for a database file at `path`, other options left at their defaults.
    pub fn at_path(path: impl AsRef<Path>) -> Self {
        DatabaseConfig {
            path: path.as_ref().to_string_lossy().into_owned(),
            ..DatabaseConfig::default()
        }
    }

    /// Resolves the settings used by the process-wide instance.
    ///
    /// The file named by `SQLDAO_CONFIG` is loaded if set, otherwise
    /// `<config_dir>/sqldao/config.toml` if it exists, otherwise defaults are
    /// used. Environment overrides are applied last.
    pub fn resolve() -> Result<Self> {
        let config = match env::var_os(CONFIG_PATH_ENV) {
            Some(path) => load_settings_file(&PathBuf::from(path))?,
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(path) => load_settings_file(&path)?,
                None => Config::default(),
            },
        };
        config.database.with_env_overrides()
    }

    /// Applies `SQLDAO_DATABASE`, `SQLDAO_READ_ONLY` and `SQLDAO_FOREIGN_KEYS`.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(path) = env::var(DATABASE_PATH_ENV) {
            self.path = path;
        }
        if let Ok(value) = env::var(READ_ONLY_ENV) {
            self.read_only = parse_bool(READ_ONLY_ENV, &value)?;
        }
        if let Ok(value) = env::var(FOREIGN_KEYS_ENV) {
            self.foreign_keys = parse_bool(FOREIGN_KEYS_ENV, &value)?;
        }
        Ok(self)
    }
}

/// `<config_dir>/sqldao/config.toml`, when the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sqldao").join("config.toml"))
}

/// Loads configuration from a TOML file at the given path.
///
/// # Example
///
/// ```no_run
/// let config = sqldao::config::load_config("sqldao.toml").expect("Failed to load config");
/// println!("{}", config.database.path);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Like [`load_config`], but an unreadable file is a configuration error
/// naming the path, since it was named as the settings source.
fn load_settings_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .map_err(|e| DaoError::Config(format!("{}: {}", path.display(), e)))?;
    parse_config(&content)
}

/// Parses configuration from TOML text.
pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).map_err(|e| DaoError::Config(e.to_string()))
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(DaoError::Config(format!(
            "{} must be a boolean, got {:?}",
            name, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE_CONFIG: &str = r#"
[database]
path = "/var/lib/app/app.db"
read_only = true
create_if_missing = false
foreign_keys = false
"#;

    #[test]
    fn test_load_config_from_str() {
        let config = parse_config(SAMPLE_CONFIG).expect("Failed to parse sample config");
        assert_eq!(config.database.path, "/var/lib/app/app.db");
        assert!(config.database.read_only);
        assert!(!config.database.create_if_missing);
        assert!(!config.database.foreign_keys);
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let config = parse_config("[database]\npath = \"x.db\"\n").unwrap();
        assert_eq!(config.database.path, "x.db");
        assert!(config.database.create_if_missing);
        assert!(config.database.foreign_keys);

        let empty = parse_config("").unwrap();
        assert_eq!(empty.database, DatabaseConfig::default());
    }

    #[test]
    fn test_malformed_config_is_config_error() {
        match parse_config("[database]\nread_only = \"maybe\"\n") {
            Err(DaoError::Config(_)) => {}
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_CONFIG.as_bytes()).unwrap();
        let config = load_config(file.path()).unwrap();
        assert!(config.database.read_only);

        match load_config("/nonexistent/sqldao.toml") {
            Err(DaoError::Io(_)) => {}
            other => panic!("Expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_settings_file_is_config_error() {
        match load_settings_file(Path::new("/nonexistent/sqldao.toml")) {
            Err(DaoError::Config(msg)) => assert!(msg.starts_with("/nonexistent/sqldao.toml: ")),
            other => panic!("Expected Config error, got {:?}", other),
        }

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_CONFIG.as_bytes()).unwrap();
        let config = load_settings_file(file.path()).unwrap();
        assert_eq!(config.database.path, "/var/lib/app/app.db");
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("X", "Yes").unwrap());
        assert!(!parse_bool("X", " off ").unwrap());
        assert!(parse_bool("X", "2").is_err());
    }

    #[test]
    fn test_constructors() {
        assert_eq!(DatabaseConfig::in_memory().path, ":memory:");
        let config = DatabaseConfig::at_path("/tmp/a.db");
        assert_eq!(config.path, "/tmp/a.db");
        assert!(config.foreign_keys);
    }
}
