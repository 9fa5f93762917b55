//! Change-set discovery.
//!
//! Change-set files are named like:
//! - `0001_create_users.sql`
//! - `0002_add_posts.sql`
//!
//! They are sorted by filename and applied in that order. The tracking name
//! keeps the extension: `<module>/0001_create_users.sql`.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use trellis_core::error::{Result, TrellisError};
use trellis_core::module::{MigrationSource, Module};
use trellis_core::store::ChangeSet;

/// Recognized change-set extension.
pub const CHANGE_SET_EXTENSION: &str = "sql";

/// Load every change-set file in `path`, ordered by filename.
///
/// The caller checks that `path` is an existing directory.
pub fn load_migrations(module_name: &str, path: &Path) -> Result<Vec<ChangeSet>> {
    let mut files = BTreeMap::new();

    for entry in std::fs::read_dir(path)? {
        let path = entry?.path();

        if !path.is_file()
            || path.extension().and_then(|e| e.to_str()) != Some(CHANGE_SET_EXTENSION)
        {
            continue;
        }

        let filename = path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                TrellisError::Config(format!(
                    "Invalid change-set filename: {}",
                    path.display()
                ))
            })?
            .to_string();

        files.insert(filename, path);
    }

    let mut change_sets = Vec::with_capacity(files.len());
    for (filename, path) in files {
        let content = std::fs::read_to_string(&path)?;
        change_sets.push(ChangeSet::new(module_name, &filename, content));
    }

    debug!(
        "Loaded {} change-sets for module {}",
        change_sets.len(),
        module_name
    );
    Ok(change_sets)
}

/// Order embedded `(filename, content)` pairs the same way as files on disk.
pub fn load_embedded(module_name: &str, files: &[(&'static str, &'static str)]) -> Vec<ChangeSet> {
    let ordered: BTreeMap<_, _> = files.iter().copied().collect();
    ordered
        .into_iter()
        .map(|(filename, content)| ChangeSet::new(module_name, filename, content))
        .collect()
}

/// Change-sets contributed by a module, or `None` if it has no `sql/` directory.
pub fn module_change_sets(module: &Module) -> Result<Option<Vec<ChangeSet>>> {
    match module.source() {
        MigrationSource::Directory(path) => {
            if !path.is_dir() {
                debug!(
                    "Module {} has no change-set directory at {}",
                    module.name(),
                    path.display()
                );
                return Ok(None);
            }
            load_migrations(module.name(), path).map(Some)
        }
        MigrationSource::Embedded(files) => Ok(Some(load_embedded(module.name(), files))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_empty_dir() {
        let dir = TempDir::new().unwrap();
        let change_sets = load_migrations("blog", dir.path()).unwrap();
        assert!(change_sets.is_empty());
    }

    #[test]
    fn test_load_sorted_by_filename() {
        let dir = TempDir::new().unwrap();

        fs::write(dir.path().join("b.sql"), "SELECT 2;").unwrap();
        fs::write(dir.path().join("a.sql"), "SELECT 1;").unwrap();
        fs::write(dir.path().join("c.sql"), "SELECT 3;").unwrap();

        let change_sets = load_migrations("blog", dir.path()).unwrap();
        let names: Vec<_> = change_sets.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["blog/a.sql", "blog/b.sql", "blog/c.sql"]);
        assert_eq!(change_sets[0].content, "SELECT 1;");
    }

    #[test]
    fn test_load_ignores_other_files() {
        let dir = TempDir::new().unwrap();

        fs::write(dir.path().join("0001_init.sql"), "SELECT 1;").unwrap();
        fs::write(dir.path().join("readme.txt"), "Not a change-set").unwrap();
        fs::write(dir.path().join("backup.sql.bak"), "Backup").unwrap();
        fs::create_dir(dir.path().join("nested.sql")).unwrap();

        let change_sets = load_migrations("blog", dir.path()).unwrap();
        assert_eq!(change_sets.len(), 1);
        assert_eq!(change_sets[0].name, "blog/0001_init.sql");
    }

    #[test]
    fn test_load_keeps_blank_content() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("0001_blank.sql"), "   \n").unwrap();

        let change_sets = load_migrations("blog", dir.path()).unwrap();
        assert_eq!(change_sets.len(), 1);
        assert!(change_sets[0].is_empty());
    }

    #[test]
    fn test_embedded_sorted_by_filename() {
        let files = [("0002_b.sql", "B"), ("0001_a.sql", "A")];
        let change_sets = load_embedded("trellis", &files);
        assert_eq!(change_sets[0].name, "trellis/0001_a.sql");
        assert_eq!(change_sets[1].name, "trellis/0002_b.sql");
    }

    #[test]
    fn test_module_without_sql_dir_is_skipped() {
        let dir = TempDir::new().unwrap();
        let module = Module::from_dir("bare", dir.path());
        assert!(module_change_sets(&module).unwrap().is_none());

        fs::create_dir(dir.path().join("sql")).unwrap();
        fs::write(dir.path().join("sql/0001.sql"), "SELECT 1;").unwrap();
        let change_sets = module_change_sets(&module).unwrap().unwrap();
        assert_eq!(change_sets[0].name, "bare/0001.sql");
    }
}
