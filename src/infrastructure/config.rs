use figment::providers::Env;
use figment::Figment;
use serde::Deserialize;

use crate::domain::error::{AppError, Result};

/// Connection settings for the review database, sourced from the
/// `DB_*` environment variables (a `.env` file is loaded at
/// startup).
#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    pub host: String,
    /// Database name (`DB_NAME`).
    pub name: String,
    pub user: String,
    pub password: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    5432
}

impl DbConfig {
    /// Read `DB_HOST`, `DB_NAME`, `DB_USER`, `DB_PASSWORD` and
    /// `DB_PORT` (default 5432). Missing credentials surface as a
    /// connection failure, not a crash.
    pub fn from_env() -> Result<Self> {
        Figment::new()
            .merge(Env::prefixed("DB_"))
            .extract()
            .map_err(|e| AppError::ConnectionFailed(format!("Incomplete DB configuration: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_reads_prefixed_variables() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("DB_HOST", "localhost");
            jail.set_env("DB_NAME", "reviews");
            jail.set_env("DB_USER", "app");
            jail.set_env("DB_PASSWORD", "secret");

            let config = DbConfig::from_env().expect("config should load");
            assert_eq!(config.host, "localhost");
            assert_eq!(config.name, "reviews");
            assert_eq!(config.port, 5432);
            Ok(())
        });
    }

    #[test]
    fn test_missing_credentials_is_connection_failure() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("DB_HOST", "localhost");

            let err = DbConfig::from_env().expect_err("config should be incomplete");
            assert!(matches!(err, AppError::ConnectionFailed(_)));
            Ok(())
        });
    }
}
