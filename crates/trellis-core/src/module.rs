//! Application modules and their change-set sources.
//!
//! Modules are registered explicitly and iterated in registration order.
//! Each module may contribute change-sets, either from a `sql/` directory
//! under its root or from content embedded in the binary.

use std::path::{Path, PathBuf};

use crate::error::{Result, TrellisError};

/// Subdirectory of a module root that holds change-set files.
pub const MIGRATIONS_FOLDER: &str = "sql";

/// Where a module's change-sets come from.
#[derive(Debug, Clone)]
pub enum MigrationSource {
    /// A directory of `*.sql` files. May not exist.
    Directory(PathBuf),
    /// `(filename, content)` pairs compiled into the binary.
    Embedded(Vec<(&'static str, &'static str)>),
}

/// A registered application module.
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    source: MigrationSource,
}

impl Module {
    /// A module rooted at `root`; change-sets are read from `root/sql`.
    pub fn from_dir(name: impl Into<String>, root: impl AsRef<Path>) -> Self {
        Self {
            name: name.into(),
            source: MigrationSource::Directory(root.as_ref().join(MIGRATIONS_FOLDER)),
        }
    }

    /// A module whose change-sets are embedded.
    pub fn embedded(name: impl Into<String>, files: Vec<(&'static str, &'static str)>) -> Self {
        Self {
            name: name.into(),
            source: MigrationSource::Embedded(files),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &MigrationSource {
        &self.source
    }
}

/// Ordered set of application modules.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: Vec<Module>,
}

impl ModuleRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module. Names must be unique.
    pub fn register(&mut self, module: Module) -> Result<()> {
        if module.name.is_empty() {
            return Err(TrellisError::Validation(
                "module name must not be empty".to_string(),
            ));
        }
        if self.get(&module.name).is_some() {
            return Err(TrellisError::Validation(format!(
                "module '{}' is already registered",
                module.name
            )));
        }
        self.modules.push(module);
        Ok(())
    }

    /// Look up a module by name.
    pub fn get(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Modules in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dir_points_at_sql_folder() {
        let module = Module::from_dir("blog", "/srv/app/blog");
        match module.source() {
            MigrationSource::Directory(path) => {
                assert_eq!(path, &PathBuf::from("/srv/app/blog/sql"))
            }
            other => panic!("unexpected source: {:?}", other),
        }
    }

    #[test]
    fn test_registration_order_is_preserved() {
        let mut registry = ModuleRegistry::new();
        registry.register(Module::from_dir("zeta", "/z")).unwrap();
        registry.register(Module::from_dir("alpha", "/a")).unwrap();
        registry.register(Module::from_dir("mid", "/m")).unwrap();

        let names: Vec<_> = registry.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_duplicate_module_rejected() {
        let mut registry = ModuleRegistry::new();
        registry.register(Module::from_dir("blog", "/a")).unwrap();
        let err = registry.register(Module::from_dir("blog", "/b")).unwrap_err();
        assert!(matches!(err, TrellisError::Validation(_)));
        assert_eq!(registry.len(), 1);
    }
}
