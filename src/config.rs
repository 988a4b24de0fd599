use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result};

use crate::date::Locale;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3050";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    /// No URL means the in-memory store.
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub default_locale: Locale,
    pub max_connections: u32,
}

impl Config {
    /// Reads the process environment; call `dotenvy::dotenv()` first to
    /// pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address like 0.0.0.0:3050")?;

        let default_locale = match lookup("DEFAULT_LOCALE") {
            Some(raw) => raw.parse().context("DEFAULT_LOCALE must be 'de' or 'en'")?,
            None => Locale::default(),
        };

        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .context("DB_MAX_CONNECTIONS must be a positive integer")?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url,
            bind_addr,
            default_locale,
            max_connections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert!(config.database_url.is_none());
        assert_eq!(config.bind_addr, "0.0.0.0:3050".parse().unwrap());
        assert_eq!(config.default_locale, Locale::De);
        assert_eq!(config.max_connections, 5);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("DATABASE_URL", "postgres://localhost/joycycles"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("DEFAULT_LOCALE", "en"),
            ("DB_MAX_CONNECTIONS", "12"),
        ])
        .unwrap();
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/joycycles"));
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.default_locale, Locale::En);
        assert_eq!(config.max_connections, 12);
    }

    #[test]
    fn test_blank_database_url_means_memory() {
        assert!(config(&[("DATABASE_URL", "  ")]).unwrap().database_url.is_none());
    }

    #[test]
    fn test_invalid_values_are_reported() {
        assert!(config(&[("BIND_ADDR", "nope")]).is_err());
        assert!(config(&[("DEFAULT_LOCALE", "fr")]).is_err());
        assert!(config(&[("DB_MAX_CONNECTIONS", "-1")]).is_err());
    }
}
