use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use tracing::Level;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    pub database_url: String,
    pub db_max_connections: u32,

    // Logging
    pub log_dir: String,
    pub log_level: Level,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't have to touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            server_addr: var_or("SERVER_ADDR", "0.0.0.0:3000"),
            database_url: var_or("DATABASE_URL", "sqlite://banco.db"),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", &var_or("DB_MAX_CONNECTIONS", "5"))?,
            log_dir: var_or("LOG_DIR", "logs"),
            log_level: parse_var("LOG_LEVEL", &var_or("LOG_LEVEL", "debug"))?,
        })
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{key} has an invalid value: {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.server_addr, "0.0.0.0:3000");
        assert_eq!(config.database_url, "sqlite://banco.db");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.log_dir, "logs");
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = config_from(&[
            ("SERVER_ADDR", "127.0.0.1:8080"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("DB_MAX_CONNECTIONS", "1"),
            ("LOG_LEVEL", "warn"),
        ])
        .unwrap();

        assert_eq!(config.server_addr, "127.0.0.1:8080");
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.db_max_connections, 1);
        assert_eq!(config.log_level, Level::WARN);
    }

    #[test]
    fn unparsable_values_are_errors() {
        let err = config_from(&[("DB_MAX_CONNECTIONS", "many")]).unwrap_err();
        assert!(err.to_string().contains("DB_MAX_CONNECTIONS"));

        assert!(config_from(&[("LOG_LEVEL", "loud")]).is_err());
    }
}
