//! External values injected into unmapped parameters.

use std::{any::Any, collections::HashMap, fmt, sync::Arc};

/// A dependency handed to a constructor, factory, or consumer.
pub type Injected = Arc<dyn Any + Send + Sync>;

/// Resolves parameters that are not mapped from the input.
pub trait DependencySource: Send + Sync {
    /// Dependency for parameter `param` declared with `type_name`.
    fn resolve(&self, param: &str, type_name: &str) -> Option<Injected>;
}

/// Map-backed [`DependencySource`].
///
/// Parameter-name registrations win over type-name registrations.
///
/// # Examples
///
/// ```
/// use mapweave::{DependencySource, ServiceRegistry};
///
/// let registry = ServiceRegistry::new().register("Locale", String::from("en-GB"));
/// assert!(registry.resolve("locale", "Locale").is_some());
/// assert!(registry.resolve("locale", "Clock").is_none());
/// ```
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    by_type: HashMap<String, Injected>,
    by_name: HashMap<String, Injected>,
}

impl ServiceRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide `service` to every parameter declared with `type_name`.
    #[must_use]
    pub fn register<S: Any + Send + Sync>(mut self, type_name: impl Into<String>, service: S) -> Self {
        self.by_type.insert(type_name.into(), Arc::new(service));
        self
    }

    /// Provide `service` to every parameter named `param`.
    #[must_use]
    pub fn register_named<S: Any + Send + Sync>(
        mut self,
        param: impl Into<String>,
        service: S,
    ) -> Self {
        self.by_name.insert(param.into(), Arc::new(service));
        self
    }
}

impl DependencySource for ServiceRegistry {
    fn resolve(&self, param: &str, type_name: &str) -> Option<Injected> {
        self.by_name
            .get(param)
            .or_else(|| self.by_type.get(type_name))
            .cloned()
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("by_type", &self.by_type.keys().collect::<Vec<_>>())
            .field("by_name", &self.by_name.keys().collect::<Vec<_>>())
            .finish()
    }
}
