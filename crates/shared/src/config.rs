//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Lending policy configuration.
    #[serde(default)]
    pub lending: LendingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT settings as they appear in configuration files.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    3600 // 1 hour
}

/// Lending policy knobs.
///
/// These are turned into a `LendingPolicy` by the server and handed to the
/// lending ledger explicitly; nothing reads them from global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LendingConfig {
    /// Maximum number of simultaneously borrowed books per student.
    #[serde(default = "default_max_borrow_limit")]
    pub max_borrow_limit: u32,
    /// Number of days between the borrow date and the due date.
    #[serde(default = "default_loan_period_days")]
    pub loan_period_days: u32,
}

impl Default for LendingConfig {
    fn default() -> Self {
        Self {
            max_borrow_limit: default_max_borrow_limit(),
            loan_period_days: default_loan_period_days(),
        }
    }
}

fn default_max_borrow_limit() -> u32 {
    5
}

fn default_loan_period_days() -> u32 {
    14
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
    /// then `LIBRIS__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("LIBRIS").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lending_defaults() {
        let lending = LendingConfig::default();
        assert_eq!(lending.max_borrow_limit, 5);
        assert_eq!(lending.loan_period_days, 14);
    }

    #[test]
    fn test_server_defaults() {
        let server = ServerConfig::default();
        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 8080);
    }

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("LIBRIS__DATABASE__URL", Some("sqlite::memory:")),
                ("LIBRIS__JWT__SECRET", Some("test-secret")),
                ("LIBRIS__LENDING__MAX_BORROW_LIMIT", Some("3")),
                ("LIBRIS__LENDING__LOAN_PERIOD_DAYS", None),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "sqlite::memory:");
                assert_eq!(config.jwt.secret, "test-secret");
                assert_eq!(config.jwt.access_token_expiry_secs, 3600);
                assert_eq!(config.lending.max_borrow_limit, 3);
                assert_eq!(config.lending.loan_period_days, 14);
                assert_eq!(config.database.max_connections, 10);
            },
        );
    }

    #[test]
    fn test_load_fails_without_database_url() {
        temp_env::with_vars(
            [
                ("LIBRIS__DATABASE__URL", None::<&str>),
                ("LIBRIS__JWT__SECRET", Some("test-secret")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }
}
