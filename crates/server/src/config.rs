//! Server configuration

use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value '{value}' for {name}")]
    Invalid { name: &'static str, value: String },
}

/// Where patient rows are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(ConfigError::Invalid {
                name: "STORAGE_BACKEND",
                value: s.to_string(),
            }),
        }
    }
}

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub storage_backend: StorageBackend,
    /// HS256 secret used to verify bearer tokens
    pub jwt_secret: String,
    /// Group a principal must belong to before it may create patients
    pub privileged_group: String,
    pub cors_origins: Vec<String>,
    pub rate_limit_rps: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::Postgres,
        };

        let rate_limit_rps = match lookup("RATE_LIMIT_RPS") {
            Some(value) => value
                .parse::<u32>()
                .ok()
                .filter(|rps| *rps > 0)
                .ok_or(ConfigError::Invalid {
                    name: "RATE_LIMIT_RPS",
                    value,
                })?,
            None => 100,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "host=localhost user=postgres dbname=patients".into()),
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8080".into()),
            storage_backend,
            jwt_secret,
            privileged_group: lookup("FHIR_PRIVILEGED_GROUP")
                .unwrap_or_else(|| "fhir_api_users".into()),
            cors_origins: lookup("CORS_ORIGINS")
                .unwrap_or_else(|| "*".into())
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            rate_limit_rps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[("JWT_SECRET", "s3cret")]).unwrap();

        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.storage_backend, StorageBackend::Postgres);
        assert_eq!(config.privileged_group, "fhir_api_users");
        assert_eq!(config.cors_origins, vec!["*".to_string()]);
        assert_eq!(config.rate_limit_rps, 100);
    }

    #[test]
    fn jwt_secret_is_required() {
        assert!(matches!(load(&[]), Err(ConfigError::Missing("JWT_SECRET"))));
    }

    #[test]
    fn parses_overrides() {
        let config = load(&[
            ("JWT_SECRET", "s3cret"),
            ("STORAGE_BACKEND", "Memory"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("RATE_LIMIT_RPS", "5"),
        ])
        .unwrap();

        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert_eq!(config.cors_origins.len(), 2);
        assert_eq!(config.cors_origins[1], "https://b.example");
        assert_eq!(config.rate_limit_rps, 5);
    }

    #[test]
    fn rejects_zero_rate_limit() {
        assert!(load(&[("JWT_SECRET", "s"), ("RATE_LIMIT_RPS", "0")]).is_err());
    }
}
