use serde::{Deserialize, Serialize};

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL. An absent or blank URL means no connection is configured.
    #[serde(default)]
    pub url: Option<String>,

    /// Connection pool size.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Pool checkout timeout in seconds.
    #[serde(default = "default_pool_timeout")]
    pub pool_timeout_secs: u64,

    /// Table recording applied change-sets.
    #[serde(default = "default_migrations_table")]
    pub migrations_table: String,
}

impl DatabaseConfig {
    /// The configured URL, if it is usable.
    pub fn connection_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: default_pool_size(),
            pool_timeout_secs: default_pool_timeout(),
            migrations_table: default_migrations_table(),
        }
    }
}

fn default_pool_size() -> u32 {
    5
}

fn default_pool_timeout() -> u64 {
    30
}

fn default_migrations_table() -> String {
    "trellis_migrations".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_database_config() {
        let config = DatabaseConfig::default();
        assert_eq!(config.pool_size, 5);
        assert_eq!(config.migrations_table, "trellis_migrations");
        assert!(config.connection_url().is_none());
    }

    #[test]
    fn test_blank_url_is_no_connection() {
        let config: DatabaseConfig = toml::from_str(r#"url = "   ""#).unwrap();
        assert!(config.connection_url().is_none());

        let config: DatabaseConfig = toml::from_str(
            r#"
            url = "postgres://localhost/test"
            pool_size = 2
            migrations_table = "app_migrations"
        "#,
        )
        .unwrap();
        assert_eq!(config.connection_url(), Some("postgres://localhost/test"));
        assert_eq!(config.pool_size, 2);
        assert_eq!(config.migrations_table, "app_migrations");
    }
}
