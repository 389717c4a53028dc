//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
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

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("DIVVY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_defaults_apply() {
        let raw = config::Config::builder()
            .set_override("database.url", "postgres://localhost/divvy")
            .unwrap()
            .build()
            .unwrap();

        let app: AppConfig = raw.try_deserialize().unwrap();
        assert_eq!(app.database.url, "postgres://localhost/divvy");
        assert_eq!(app.database.max_connections, 10);
        assert_eq!(app.database.min_connections, 1);
    }

    #[test]
    fn test_explicit_pool_sizes_win_over_defaults() {
        let raw = config::Config::builder()
            .set_override("database.url", "postgres://localhost/divvy")
            .unwrap()
            .set_override("database.max_connections", 32)
            .unwrap()
            .build()
            .unwrap();

        let app: AppConfig = raw.try_deserialize().unwrap();
        assert_eq!(app.database.max_connections, 32);
        assert_eq!(app.database.min_connections, 1);
    }
}
