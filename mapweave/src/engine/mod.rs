//! The mapping engine: untyped data to typed objects and back.
//!
//! [`Mapper`] owns the shared, long-lived state (the plan resolver and the
//! dependency source). Each call builds a short-lived walker that threads the
//! root input or output through the whole recursive descent.

mod config;
mod denormalize;
mod groups;
mod normalize;
mod options;

use std::{any::Any, fmt, sync::Arc};

use serde_json::Value;

pub use config::{ENV_PREFIX, MappingConfig};
pub use groups::ActiveGroups;
pub use options::{CircularReferenceHandler, MappingOptions};

use self::{denormalize::Denormalizer, normalize::Normalizer};
use crate::{
    MapError,
    coerce::Leniency,
    declaration::{DEFAULT_SCENARIO, DeclarationSource, StaticDeclarations},
    instantiate::{DependencySource, Instantiator, ServiceRegistry},
    path::{ReadScope, WriteScope},
    plan::{MemoryPlanCache, MetadataResolver, PlanCache, TypePlan},
    value::{Declared, Mappable, ObjectHandle, TypeRef},
};

/// Whether a method declared for `scenario` runs under `active`.
///
/// A default-scenario method runs unless a sibling of the same name is
/// declared for the active scenario.
pub(crate) fn method_participates(
    name: &str,
    scenario: &str,
    active: &str,
    siblings: &[(&str, &str)],
) -> bool {
    if scenario == active {
        return true;
    }
    scenario == DEFAULT_SCENARIO
        && !siblings
            .iter()
            .any(|(sibling, sibling_scenario)| *sibling == name && *sibling_scenario == active)
}

fn expect_object(plan: &TypePlan, raw: &Value) -> Result<(), MapError> {
    if raw.is_object() || (plan.extractor.is_some() && raw.is_string()) {
        return Ok(());
    }
    Err(MapError::Coercion {
        type_name: plan.type_ref.name().to_owned(),
        field: String::new(),
        path: String::new(),
        value: raw.clone(),
        expected: plan.type_ref.to_string(),
        message: "expected an object".to_owned(),
    })
}

/// Converts between untyped data and declared types.
///
/// # Examples
///
/// ```
/// use mapweave::{
///     Declared, FieldDeclaration, Mapper, MappingOptions, SemanticType, TypeDescriptor,
///     impl_mappable,
/// };
/// use serde_json::json;
///
/// #[derive(Clone, Debug, Default, PartialEq)]
/// struct Point {
///     x: Option<i64>,
///     y: Option<i64>,
/// }
///
/// impl_mappable!(Point { x, y });
///
/// impl Declared for Point {
///     fn declarations() -> TypeDescriptor {
///         TypeDescriptor::new()
///             .default_constructor::<Self>()
///             .field(FieldDeclaration::new("x", SemanticType::Int))
///             .field(FieldDeclaration::new("y", SemanticType::Int).path("coords.y"))
///     }
/// }
///
/// # fn main() -> Result<(), mapweave::MapError> {
/// let mapper = Mapper::new();
/// let options = MappingOptions::new();
/// let point: Point = mapper.denormalize(&json!({"x": 1, "coords": {"y": 2}}), &options)?;
/// assert_eq!(point, Point { x: Some(1), y: Some(2) });
///
/// let raw = mapper.normalize_value(point, &options)?;
/// assert_eq!(raw, json!({"x": 1, "coords": {"y": 2}}));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Mapper {
    resolver: Arc<MetadataResolver>,
    dependencies: Arc<dyn DependencySource>,
}

impl Default for Mapper {
    fn default() -> Self {
        MapperBuilder::default().build()
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl Mapper {
    /// Mapper reading declarations from [`Declared`] types, with an
    /// in-memory plan cache and no injected services.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start configuring a mapper.
    #[must_use]
    pub fn builder() -> MapperBuilder {
        MapperBuilder::default()
    }

    /// Shared plan resolver.
    #[must_use]
    pub fn resolver(&self) -> &MetadataResolver {
        &self.resolver
    }

    /// Resolves, or fetches from the cache, the plan for `type_ref`.
    ///
    /// # Errors
    ///
    /// Returns a definition error when the declarations of `type_ref` or any
    /// type reachable from it are invalid.
    pub fn resolve_plan(&self, type_ref: &TypeRef) -> Result<Arc<TypePlan>, MapError> {
        self.resolver.resolve(type_ref)
    }

    /// Maps `raw` onto a new `T` and returns it by value.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`MapError`] raised while mapping, or
    /// [`MapError::NotInstantiable`] when a discriminator or factory produced
    /// a different concrete type than `T`.
    pub fn denormalize<T>(&self, raw: &Value, options: &MappingOptions) -> Result<T, MapError>
    where
        T: Declared + Any + Clone,
    {
        let type_ref = TypeRef::of::<T>();
        let handle = self.denormalize_type(raw, &type_ref, options)?;
        handle.cloned::<T>().ok_or_else(|| MapError::NotInstantiable {
            type_name: type_ref.name().to_owned(),
            message: format!("mapping produced a {}", handle.type_ref()),
        })
    }

    /// Maps `raw` onto `type_ref`, or onto the options' object to populate.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`MapError`] raised while mapping.
    pub fn denormalize_type(
        &self,
        raw: &Value,
        type_ref: &TypeRef,
        options: &MappingOptions,
    ) -> Result<ObjectHandle, MapError> {
        let plan = self.resolver.resolve(type_ref)?;
        tracing::trace!(type_name = %type_ref, "denormalizing");
        expect_object(&plan, raw)?;
        let denormalizer = self.denormalizer(&plan, options);
        denormalizer.object(
            plan,
            &ReadScope::new(raw),
            options.object_to_populate.clone(),
        )
    }

    /// Maps every item of the list `raw` onto `type_ref`.
    ///
    /// Each item is its own root for root-relative paths.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Coercion`] when `raw` is not a list, otherwise the
    /// first fatal error raised by any item.
    pub fn denormalize_list(
        &self,
        raw: &Value,
        type_ref: &TypeRef,
        options: &MappingOptions,
    ) -> Result<Vec<ObjectHandle>, MapError> {
        let Value::Array(items) = raw else {
            return Err(MapError::Coercion {
                type_name: type_ref.name().to_owned(),
                field: String::new(),
                path: String::new(),
                value: raw.clone(),
                expected: format!("{type_ref}[]"),
                message: "expected a list".to_owned(),
            });
        };
        let plan = self.resolver.resolve(type_ref)?;
        let denormalizer = self.denormalizer(&plan, options);
        items
            .iter()
            .map(|item| {
                expect_object(&plan, item)?;
                denormalizer.object(Arc::clone(&plan), &ReadScope::new(item), None)
            })
            .collect()
    }

    /// Maps `handle` to untyped data.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`MapError`] raised while mapping, including
    /// [`MapError::CircularReference`] when no handler is configured.
    pub fn normalize(
        &self,
        handle: &ObjectHandle,
        options: &MappingOptions,
    ) -> Result<Value, MapError> {
        let plan = self.resolver.resolve(&handle.type_ref())?;
        tracing::trace!(type_name = %handle.type_ref(), "normalizing");
        let mut normalizer = Normalizer {
            resolver: &self.resolver,
            options,
            groups: ActiveGroups::expand(&options.groups, &plan.presets),
            stack: Vec::new(),
        };
        let mut output = Value::Null;
        normalizer.object(handle, &WriteScope::new(), &mut output, None)?;
        Ok(output)
    }

    /// Maps an owned value to untyped data.
    ///
    /// # Errors
    ///
    /// See [`Mapper::normalize`].
    pub fn normalize_value<T>(&self, value: T, options: &MappingOptions) -> Result<Value, MapError>
    where
        T: Mappable + Declared,
    {
        self.normalize(&ObjectHandle::new(value), options)
    }

    /// Maps every handle and collects the results into a list.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error raised by any item.
    pub fn normalize_list(
        &self,
        handles: &[ObjectHandle],
        options: &MappingOptions,
    ) -> Result<Value, MapError> {
        handles
            .iter()
            .map(|handle| self.normalize(handle, options))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    fn denormalizer<'m>(&'m self, plan: &TypePlan, options: &'m MappingOptions) -> Denormalizer<'m> {
        Denormalizer {
            resolver: &self.resolver,
            instantiator: Instantiator {
                resolver: &self.resolver,
                dependencies: self.dependencies.as_ref(),
            },
            options,
            groups: ActiveGroups::expand(&options.groups, &plan.presets),
            leniency: Leniency {
                enforce_types: !options.disable_type_enforcement,
                json_numbers: options.json_numbers,
            },
        }
    }
}

/// Builder for [`Mapper`].
#[derive(Default)]
pub struct MapperBuilder {
    declarations: Option<Arc<dyn DeclarationSource>>,
    cache: Option<Arc<dyn PlanCache>>,
    dependencies: Option<Arc<dyn DependencySource>>,
}

impl fmt::Debug for MapperBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperBuilder")
            .field("declarations", &self.declarations.is_some())
            .field("cache", &self.cache.is_some())
            .field("dependencies", &self.dependencies.is_some())
            .finish()
    }
}

impl MapperBuilder {
    /// Read declarations from `source` instead of the [`Declared`] impls.
    #[must_use]
    pub fn declarations(mut self, source: impl DeclarationSource + 'static) -> Self {
        self.declarations = Some(Arc::new(source));
        self
    }

    /// Share plans through `cache`.
    #[must_use]
    pub fn cache(mut self, cache: Arc<dyn PlanCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Inject services from `source`.
    #[must_use]
    pub fn dependencies(mut self, source: impl DependencySource + 'static) -> Self {
        self.dependencies = Some(Arc::new(source));
        self
    }

    /// Finish the mapper.
    #[must_use]
    pub fn build(self) -> Mapper {
        let declarations = self
            .declarations
            .unwrap_or_else(|| Arc::new(StaticDeclarations));
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(MemoryPlanCache::new()));
        Mapper {
            resolver: Arc::new(MetadataResolver::new(declarations, cache)),
            dependencies: self
                .dependencies
                .unwrap_or_else(|| Arc::new(ServiceRegistry::new())),
        }
    }
}
