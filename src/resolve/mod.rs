pub mod reference;

pub use reference::EntityReference;

use crate::context::TestContext;
use crate::failure::{Failure, Result};
use crate::value::{Value, get_path};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

/// Turns an entity name into a record whose fields references can read.
pub trait EntityResolver: Send + Sync {
    fn resolve(&self, entity: &str, context: &TestContext, containing: &Value) -> Option<Value>;
}

struct FnResolver<F>(F);

impl<F> EntityResolver for FnResolver<F>
where
    F: Fn(&str, &TestContext, &Value) -> Option<Value> + Send + Sync,
{
    fn resolve(&self, entity: &str, context: &TestContext, containing: &Value) -> Option<Value> {
        (self.0)(entity, context, containing)
    }
}

/// Built-in `link` resolver reading entries captured by the set verifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct SavedLinkResolver;

impl EntityResolver for SavedLinkResolver {
    fn resolve(&self, entity: &str, context: &TestContext, _containing: &Value) -> Option<Value> {
        context.saved_link(entity).cloned()
    }
}

pub const LINK_RESOLVER_KEY: &str = "link";

/// Resolver key → resolver. Last registration for a key wins.
#[derive(Clone)]
pub struct EntityResolverRegistry {
    resolvers: HashMap<String, Arc<dyn EntityResolver>>,
}

impl EntityResolverRegistry {
    /// Registry holding only the built-in `link` resolver.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_resolver([LINK_RESOLVER_KEY], SavedLinkResolver);
        registry
    }

    pub fn empty() -> Self {
        Self {
            resolvers: HashMap::new(),
        }
    }

    /// Process-wide registry for the composition root. Prefer an owned
    /// registry wherever one can be passed in.
    pub fn shared() -> &'static RwLock<EntityResolverRegistry> {
        static SHARED: OnceLock<RwLock<EntityResolverRegistry>> = OnceLock::new();
        SHARED.get_or_init(|| RwLock::new(EntityResolverRegistry::new()))
    }

    /// Register a closure under one or more keys.
    pub fn register<K, F>(&mut self, keys: K, resolver: F)
    where
        K: IntoIterator,
        K::Item: Into<String>,
        F: Fn(&str, &TestContext, &Value) -> Option<Value> + Send + Sync + 'static,
    {
        self.register_resolver(keys, FnResolver(resolver));
    }

    /// Register a trait implementation under one or more keys.
    pub fn register_resolver<K, R>(&mut self, keys: K, resolver: R)
    where
        K: IntoIterator,
        K::Item: Into<String>,
        R: EntityResolver + 'static,
    {
        let shared: Arc<dyn EntityResolver> = Arc::new(resolver);
        for key in keys {
            let key = key.into();
            tracing::trace!(key = %key, "registered entity resolver");
            self.resolvers.insert(key, Arc::clone(&shared));
        }
    }

    /// Exact key first, then the last segment of a dotted key.
    pub fn get(&self, key: &str) -> Option<&dyn EntityResolver> {
        if let Some(resolver) = self.resolvers.get(key) {
            return Some(resolver.as_ref());
        }

        let (_, last) = key.rsplit_once('.')?;
        self.resolvers.get(last).map(|resolver| resolver.as_ref())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.resolvers.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Resolve `reference`, using its `[key]` prefix or else `field_key`.
    pub fn resolve(
        &self,
        field_key: &str,
        reference: &EntityReference,
        context: &TestContext,
        containing: &Value,
    ) -> Result<Value> {
        let key = reference.resolver_key.as_deref().unwrap_or(field_key);
        let resolver = self.get(key).ok_or_else(|| Failure::MissingResolver {
            key: key.to_owned(),
        })?;

        let entity = resolver
            .resolve(&reference.entity, context, containing)
            .filter(|entity| !entity.is_null())
            .ok_or_else(|| Failure::UnresolvedEntity {
                key: key.to_owned(),
                entity: reference.entity.clone(),
            })?;

        get_path(&entity, &reference.path)
            .cloned()
            .ok_or_else(|| Failure::MissingPath {
                entity: reference.entity.clone(),
                path: reference.path.clone(),
                rendered: entity.to_json_pretty(),
            })
    }
}

impl Default for EntityResolverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EntityResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityResolverRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}
