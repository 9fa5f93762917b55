mod database;

pub use database::DatabaseConfig;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, TrellisError};
use crate::module::{Module, ModuleRegistry};

/// Root configuration for a trellis application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrellisConfig {
    /// Project metadata.
    #[serde(default)]
    pub project: ProjectConfig,

    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Application modules, in registration order.
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
}

impl TrellisConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TrellisError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        debug!("Loading configuration from {}", path.display());
        let mut config = Self::parse_toml(&content)?;

        // Relative module paths are resolved against the config file location
        if let Some(base) = path.parent() {
            for module in &mut config.modules {
                if module.path.is_relative() {
                    module.path = base.join(&module.path);
                }
            }
        }

        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let content = substitute_env_vars(content);

        toml::from_str(&content)
            .map_err(|e| TrellisError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Build a registry from the configured modules, after the given built-ins.
    pub fn module_registry(&self, builtin: Vec<Module>) -> Result<ModuleRegistry> {
        let mut registry = ModuleRegistry::new();
        for module in builtin {
            registry.register(module)?;
        }
        for module in &self.modules {
            registry.register(Module::from_dir(&module.name, &module.path))?;
        }
        Ok(registry)
    }
}

/// Project metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name.
    #[serde(default = "default_project_name")]
    pub name: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_project_name(),
        }
    }
}

fn default_project_name() -> String {
    "trellis-app".to_string()
}

/// A module declared in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Module name, used as the change-set name prefix.
    pub name: String,

    /// Module root directory; change-sets live in its `sql/` subdirectory.
    pub path: PathBuf,
}

/// Substitute environment variables in the format ${VAR_NAME}.
fn substitute_env_vars(content: &str) -> String {
    let mut result = content.to_string();
    let re = match regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}") {
        Ok(re) => re,
        Err(_) => return result,
    };

    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}
