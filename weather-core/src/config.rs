use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::Deserialize;
use std::{fmt, fs, path::PathBuf, time::Duration};

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Provider settings as written in `config.toml`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct OpenWeatherFileConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Database settings as written in `config.toml`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DatabaseFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

/// On-disk configuration. Every value is optional; the environment fills in
/// or overrides whatever is set here.
///
/// Example TOML:
/// [openweather]
/// api_key = "..."
///
/// [database]
/// host = "localhost"
/// port = 5432
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub openweather: OpenWeatherFileConfig,
    #[serde(default)]
    pub database: DatabaseFileConfig,
}

impl ConfigFile {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: ConfigFile = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-etl", "weather-etl")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Everything the fetcher needs to talk to OpenWeather.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `None` is legal here; the fetcher refuses to run without it.
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Connection parameters for the destination database.
#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
}

impl DatabaseConfig {
    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut cfg = tokio_postgres::Config::new();
        cfg.host(&self.host)
            .port(self.port)
            .user(&self.user)
            .password(&self.password)
            .dbname(&self.dbname);
        cfg
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("dbname", &self.dbname)
            .finish()
    }
}

/// Merge a `.env` file (searched from the working directory upwards) into the
/// process environment. Variables already set are left alone. `Ok(None)`
/// when there is no such file.
pub fn load_dotenv() -> Result<Option<PathBuf>, dotenvy::Error> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Process-wide settings, built once at startup and handed to the fetcher
/// and the store.
#[derive(Debug, Clone)]
pub struct EtlConfig {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
}

impl EtlConfig {
    /// Read `config.toml` (if any) and overlay the process environment.
    pub fn load() -> Result<Self> {
        let file = ConfigFile::load()?;
        let cfg = Self::resolve(file, |key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    /// Merge file values with `lookup`, which wins whenever it returns a
    /// non-empty value.
    pub fn resolve<F>(file: ConfigFile, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut api = ApiConfig::new(var("OPENWEATHER_API_KEY").or(file.openweather.api_key));
        if let Some(url) = var("OPENWEATHER_BASE_URL").or(file.openweather.base_url) {
            api.base_url = url;
        }
        match var("OPENWEATHER_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                    key: "OPENWEATHER_TIMEOUT_SECS",
                    reason: e.to_string(),
                })?;
                api.timeout = Duration::from_secs(secs);
            }
            None => {
                if let Some(secs) = file.openweather.timeout_secs {
                    api.timeout = Duration::from_secs(secs);
                }
            }
        }

        let db = file.database;
        let port = match var("DB_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                key: "DB_PORT",
                reason: e.to_string(),
            })?,
            None => db.port.ok_or(ConfigError::MissingDatabaseSetting("DB_PORT"))?,
        };

        let required = |key: &'static str, fallback: Option<String>| {
            var(key)
                .or(fallback)
                .ok_or(ConfigError::MissingDatabaseSetting(key))
        };

        let database = DatabaseConfig {
            host: required("DB_HOST", db.host)?,
            port,
            user: required("DB_USER", db.user)?,
            password: required("DB_PASSWORD", db.password)?,
            dbname: required("DB_NAME", db.name)?,
        };

        Ok(Self { api, database })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const FULL_DB: &[(&str, &str)] = &[
        ("DB_HOST", "localhost"),
        ("DB_PORT", "5432"),
        ("DB_USER", "etl"),
        ("DB_PASSWORD", "secret"),
        ("DB_NAME", "weather"),
    ];

    #[test]
    fn resolves_everything_from_environment() {
        let mut pairs = FULL_DB.to_vec();
        pairs.push(("OPENWEATHER_API_KEY", "KEY"));

        let cfg = EtlConfig::resolve(ConfigFile::default(), env(&pairs)).unwrap();

        assert_eq!(cfg.api.api_key.as_deref(), Some("KEY"));
        assert_eq!(cfg.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.api.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(cfg.database.host, "localhost");
        assert_eq!(cfg.database.port, 5432);
        assert_eq!(cfg.database.dbname, "weather");
    }

    #[test]
    fn missing_api_key_is_not_fatal() {
        let cfg = EtlConfig::resolve(ConfigFile::default(), env(FULL_DB)).unwrap();
        assert!(cfg.api.api_key.is_none());
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let mut pairs = FULL_DB.to_vec();
        pairs.push(("OPENWEATHER_API_KEY", "   "));

        let cfg = EtlConfig::resolve(ConfigFile::default(), env(&pairs)).unwrap();
        assert!(cfg.api.api_key.is_none());
    }

    #[test]
    fn missing_database_setting_is_an_error() {
        let pairs: Vec<_> = FULL_DB
            .iter()
            .copied()
            .filter(|(k, _)| *k != "DB_PASSWORD")
            .collect();

        let err = EtlConfig::resolve(ConfigFile::default(), env(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingDatabaseSetting("DB_PASSWORD")));
    }

    #[test]
    fn malformed_port_is_rejected() {
        let mut pairs: Vec<_> = FULL_DB
            .iter()
            .copied()
            .filter(|(k, _)| *k != "DB_PORT")
            .collect();
        pairs.push(("DB_PORT", "fifty"));

        let err = EtlConfig::resolve(ConfigFile::default(), env(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "DB_PORT", .. }));
    }

    #[test]
    fn environment_overrides_file_values() {
        let file: ConfigFile = toml::from_str(
            r#"
            [openweather]
            api_key = "FILE_KEY"
            timeout_secs = 3

            [database]
            host = "db.internal"
            port = 6543
            user = "file_user"
            password = "file_pw"
            name = "file_db"
            "#,
        )
        .unwrap();

        let cfg = EtlConfig::resolve(
            file,
            env(&[("DB_HOST", "localhost"), ("OPENWEATHER_API_KEY", "ENV_KEY")]),
        )
        .unwrap();

        assert_eq!(cfg.api.api_key.as_deref(), Some("ENV_KEY"));
        assert_eq!(cfg.api.timeout, Duration::from_secs(3));
        assert_eq!(cfg.database.host, "localhost");
        assert_eq!(cfg.database.port, 6543);
        assert_eq!(cfg.database.user, "file_user");
    }

    #[test]
    fn dotenv_file_resolves_like_the_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(
            &path,
            "OPENWEATHER_API_KEY=DOTENV_KEY\n\
             DB_HOST=localhost\n\
             DB_PORT=5432\n\
             DB_USER=etl\n\
             DB_PASSWORD=\"s3cret with spaces\"\n\
             DB_NAME=weather\n",
        )
        .unwrap();

        let vars: HashMap<String, String> = dotenvy::from_path_iter(&path)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        let cfg = EtlConfig::resolve(ConfigFile::default(), |key| vars.get(key).cloned()).unwrap();

        assert_eq!(cfg.api.api_key.as_deref(), Some("DOTENV_KEY"));
        assert_eq!(cfg.database.password, "s3cret with spaces");
        assert_eq!(cfg.database.port, 5432);
    }

    #[test]
    fn debug_output_hides_password() {
        let cfg = EtlConfig::resolve(ConfigFile::default(), env(FULL_DB)).unwrap();
        let dbg = format!("{:?}", cfg.database);
        assert!(!dbg.contains("secret"));
    }
}
