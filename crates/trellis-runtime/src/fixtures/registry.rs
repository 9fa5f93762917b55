use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use trellis_core::error::{Result, TrellisError};

/// Type alias for a boxed fixture handler.
pub type BoxedFixtureHandler = Arc<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Entry in the fixture registry.
pub struct RegisteredFixture {
    /// Namespaced fixture name.
    pub name: String,
    /// Seeding function.
    pub handler: BoxedFixtureHandler,
}

/// Registry of seeding functions contributed by application modules.
///
/// Registration order is kept. Registering a name twice is allowed here so
/// that [`FixtureRegistry::scan`] can surface the conflict before anything runs.
#[derive(Clone, Default)]
pub struct FixtureRegistry {
    fixtures: Vec<Arc<RegisteredFixture>>,
}

impl FixtureRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fixture. Handlers capture whatever they need, typically a pool.
    pub fn register<F, Fut>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let handler: BoxedFixtureHandler = Arc::new(move || Box::pin(handler()));
        self.fixtures.push(Arc::new(RegisteredFixture {
            name: name.into(),
            handler,
        }));
    }

    /// Candidate fixture names, in registration order, duplicates included.
    pub fn scan(&self) -> Vec<String> {
        self.fixtures.iter().map(|f| f.name.clone()).collect()
    }

    /// Get a fixture by name.
    pub fn get(&self, name: &str) -> Option<Arc<RegisteredFixture>> {
        self.fixtures.iter().find(|f| f.name == name).cloned()
    }

    /// Run the seeding function for `name`.
    pub async fn execute(&self, name: &str) -> Result<()> {
        let entry = self
            .get(name)
            .ok_or_else(|| TrellisError::NotFound(format!("fixture '{}'", name)))?;
        (entry.handler)().await
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_register_and_execute() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut registry = FixtureRegistry::new();
        registry.register("blog.posts", move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        registry.execute("blog.posts").await.unwrap();
        registry.execute("blog.posts").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unknown_fixture_is_not_found() {
        let registry = FixtureRegistry::new();
        let err = registry.execute("blog.missing").await.unwrap_err();
        assert!(matches!(err, TrellisError::NotFound(_)));
    }

    #[test]
    fn test_scan_keeps_order_and_duplicates() {
        let mut registry = FixtureRegistry::new();
        registry.register("b.y", || async { Ok(()) });
        registry.register("a.x", || async { Ok(()) });
        registry.register("b.y", || async { Ok(()) });

        assert_eq!(registry.scan(), vec!["b.y", "a.x", "b.y"]);
        assert_eq!(registry.len(), 3);
    }
}
