//! Type-level declarations: construction strategies, methods, and presets.

use std::{collections::BTreeMap, fmt, sync::Arc};

use super::{DEFAULT_SCENARIO, FieldDeclaration, SemanticType};
use crate::{
    MapError,
    instantiate::Arguments,
    value::{Datum, Declared, Mappable, ObjectHandle, TypeRef},
};

/// Invokes a constructor or factory with resolved arguments.
pub type ConstructFn = Arc<dyn Fn(&mut Arguments) -> Result<ObjectHandle, MapError> + Send + Sync>;

/// Invokes a consumer method on a populated instance.
pub type ConsumeFn =
    Arc<dyn Fn(&ObjectHandle, &mut Arguments) -> Result<(), MapError> + Send + Sync>;

/// Invokes a producer method on an instance being normalized.
pub type ProduceFn = Arc<dyn Fn(&ObjectHandle) -> Result<Datum, MapError> + Send + Sync>;

fn receiver_mismatch<T>(handle: &ObjectHandle, method: &str) -> MapError {
    MapError::InvalidMethodSignature {
        type_name: handle.type_ref().name().to_owned(),
        method: method.to_owned(),
        message: format!("receiver is not a '{}'", std::any::type_name::<T>()),
    }
}

/// A constructor, factory, or consumer parameter.
///
/// Parameters either map from the input through one or more field
/// declarations (one per scenario) or are injected from the dependency
/// source.
#[derive(Clone, Debug)]
pub struct ParamDeclaration {
    pub(crate) name: String,
    pub(crate) variants: Vec<FieldDeclaration>,
    pub(crate) type_name: Option<String>,
    pub(crate) default: Option<Datum>,
}

impl ParamDeclaration {
    /// Parameter with no mapping of its own.
    ///
    /// It picks up a parameter-style field declaration of the same name, or
    /// is injected when none exists.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variants: Vec::new(),
            type_name: None,
            default: None,
        }
    }

    /// Parameter mapped through `declaration`; the parameter takes the
    /// declaration's field name.
    ///
    /// Unless the declaration is parameter-style, the parameter is a promoted
    /// property and is emitted again during normalization.
    #[must_use]
    pub fn mapped(declaration: FieldDeclaration) -> Self {
        let mut param = Self::new(declaration.field());
        param.variants.push(declaration);
        param
    }

    /// Injected parameter resolved by `type_name`.
    #[must_use]
    pub fn injected(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(name).typed(type_name)
    }

    /// Add a declaration for another scenario.
    #[must_use]
    pub fn variant(mut self, declaration: FieldDeclaration) -> Self {
        self.variants.push(declaration);
        self
    }

    /// Value used when the input does not supply the parameter.
    #[must_use]
    pub fn default(mut self, value: impl Into<Datum>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Type name passed to the dependency source.
    #[must_use]
    pub fn typed(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Direct construction of a type.
#[derive(Clone)]
pub struct ConstructorDeclaration {
    pub(crate) params: Vec<ParamDeclaration>,
    pub(crate) invoke: ConstructFn,
}

impl ConstructorDeclaration {
    /// Constructor building a `T` from resolved arguments.
    #[must_use]
    pub fn new<T, F>(build: F) -> Self
    where
        T: Mappable + Declared,
        F: Fn(&mut Arguments) -> Result<T, MapError> + Send + Sync + 'static,
    {
        Self {
            params: Vec::new(),
            invoke: Arc::new(move |args: &mut Arguments| build(args).map(ObjectHandle::new)),
        }
    }

    /// Parameterless constructor using `T::default()`.
    #[must_use]
    pub fn default_of<T>() -> Self
    where
        T: Default + Mappable + Declared,
    {
        Self::new(|_| Ok(T::default()))
    }

    /// Append a parameter.
    #[must_use]
    pub fn param(mut self, param: ParamDeclaration) -> Self {
        self.params.push(param);
        self
    }
}

impl fmt::Debug for ConstructorDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDeclaration")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Named factory tried before the constructor, highest priority first.
#[derive(Clone)]
pub struct FactoryDeclaration {
    pub(crate) name: String,
    pub(crate) priority: i32,
    pub(crate) params: Vec<ParamDeclaration>,
    pub(crate) invoke: ConstructFn,
}

impl FactoryDeclaration {
    /// Factory building a `T`.
    #[must_use]
    pub fn new<T, F>(name: impl Into<String>, build: F) -> Self
    where
        T: Mappable + Declared,
        F: Fn(&mut Arguments) -> Result<T, MapError> + Send + Sync + 'static,
    {
        Self::returning(name, move |args: &mut Arguments| build(args).map(ObjectHandle::new))
    }

    /// Factory returning an arbitrary handle; the engine checks its type.
    #[must_use]
    pub fn returning<F>(name: impl Into<String>, build: F) -> Self
    where
        F: Fn(&mut Arguments) -> Result<ObjectHandle, MapError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            priority: 0,
            params: Vec::new(),
            invoke: Arc::new(build),
        }
    }

    /// Attempt order; higher runs first.
    #[must_use]
    pub const fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Append a parameter.
    #[must_use]
    pub fn param(mut self, param: ParamDeclaration) -> Self {
        self.params.push(param);
        self
    }
}

impl fmt::Debug for FactoryDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryDeclaration")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Post-construction callback receiving mapped or injected arguments.
#[derive(Clone)]
pub struct ConsumerDeclaration {
    pub(crate) name: String,
    pub(crate) params: Vec<ParamDeclaration>,
    pub(crate) groups: Vec<String>,
    pub(crate) scenario: String,
    pub(crate) allow_complex: bool,
    pub(crate) invoke: ConsumeFn,
}

impl ConsumerDeclaration {
    /// Consumer method on `T`.
    #[must_use]
    pub fn new<T, F>(name: impl Into<String>, call: F) -> Self
    where
        T: Mappable,
        F: Fn(&mut T, &mut Arguments) -> Result<(), MapError> + Send + Sync + 'static,
    {
        let name = name.into();
        let method = name.clone();
        Self {
            name,
            params: Vec::new(),
            groups: Vec::new(),
            scenario: DEFAULT_SCENARIO.to_owned(),
            allow_complex: false,
            invoke: Arc::new(move |handle: &ObjectHandle, args: &mut Arguments| {
                handle
                    .with_mut::<T, _>(|target| call(target, args))
                    .unwrap_or_else(|| Err(receiver_mismatch::<T>(handle, &method)))
            }),
        }
    }

    /// Append a parameter.
    #[must_use]
    pub fn param(mut self, param: ParamDeclaration) -> Self {
        self.params.push(param);
        self
    }

    /// Restrict the consumer to calls activating one of `groups`.
    #[must_use]
    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    /// Bind the consumer to `scenario`.
    #[must_use]
    pub fn scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = scenario.into();
        self
    }

    /// Accept object, list, and untyped parameters.
    #[must_use]
    pub const fn allow_complex(mut self) -> Self {
        self.allow_complex = true;
        self
    }
}

impl fmt::Debug for ConsumerDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsumerDeclaration")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("groups", &self.groups)
            .field("scenario", &self.scenario)
            .field("allow_complex", &self.allow_complex)
            .finish_non_exhaustive()
    }
}

/// Method whose result is emitted during normalization.
#[derive(Clone)]
pub struct ProducerDeclaration {
    pub(crate) name: String,
    pub(crate) path: Option<String>,
    pub(crate) groups: Vec<String>,
    pub(crate) scenario: String,
    pub(crate) stringify: bool,
    pub(crate) invoke: ProduceFn,
}

impl ProducerDeclaration {
    /// Producer method on `T`.
    ///
    /// Without a path the result must be an object, whose entries are merged
    /// into the container being emitted.
    #[must_use]
    pub fn new<T, R, F>(name: impl Into<String>, call: F) -> Self
    where
        T: Mappable,
        R: Into<Datum>,
        F: Fn(&T) -> R + Send + Sync + 'static,
    {
        let name = name.into();
        let method = name.clone();
        Self {
            name,
            path: None,
            groups: Vec::new(),
            scenario: DEFAULT_SCENARIO.to_owned(),
            stringify: false,
            invoke: Arc::new(move |handle: &ObjectHandle| {
                handle
                    .with_ref::<T, _>(|source| call(source).into())
                    .ok_or_else(|| receiver_mismatch::<T>(handle, &method))
            }),
        }
    }

    /// Emit the result at `path`.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Restrict the producer to calls activating one of `groups`.
    #[must_use]
    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    /// Bind the producer to `scenario`.
    #[must_use]
    pub fn scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = scenario.into();
        self
    }

    /// Replace the whole normalized object with this producer's string.
    #[must_use]
    pub const fn stringify(mut self) -> Self {
        self.stringify = true;
        self
    }
}

impl fmt::Debug for ProducerDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProducerDeclaration")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("groups", &self.groups)
            .field("scenario", &self.scenario)
            .field("stringify", &self.stringify)
            .finish_non_exhaustive()
    }
}

/// Selects a concrete subtype from a field of the input.
#[derive(Clone, Debug)]
pub struct Discriminator {
    pub(crate) path: String,
    pub(crate) mapping: Vec<(String, TypeRef)>,
}

impl Discriminator {
    /// Discriminator read from `path`.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mapping: Vec::new(),
        }
    }

    /// Map the discriminator value `value` to `T`.
    #[must_use]
    pub fn subtype<T: Declared>(mut self, value: impl Into<String>) -> Self {
        self.mapping.push((value.into(), TypeRef::of::<T>()));
        self
    }
}

/// Complete set of mapping declarations for one type.
///
/// # Examples
///
/// ```
/// use mapweave::{FieldDeclaration, SemanticType, TypeDescriptor};
///
/// let descriptor = TypeDescriptor::new()
///     .field(FieldDeclaration::new("x", SemanticType::Int).path("coords[0]"))
///     .preset("all", ["coords"]);
/// assert_eq!(descriptor.fields().len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct TypeDescriptor {
    pub(crate) fields: Vec<FieldDeclaration>,
    pub(crate) constructor: Option<ConstructorDeclaration>,
    pub(crate) factories: Vec<FactoryDeclaration>,
    pub(crate) discriminator: Option<Discriminator>,
    pub(crate) consumers: Vec<ConsumerDeclaration>,
    pub(crate) producers: Vec<ProducerDeclaration>,
    pub(crate) presets: BTreeMap<String, Vec<String>>,
    pub(crate) extractor: Option<String>,
    pub(crate) element_hints: BTreeMap<String, SemanticType>,
}

impl TypeDescriptor {
    /// Empty descriptor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a mapped field.
    #[must_use]
    pub fn field(mut self, declaration: FieldDeclaration) -> Self {
        self.fields.push(declaration);
        self
    }

    /// Set the constructor.
    #[must_use]
    pub fn constructor(mut self, constructor: ConstructorDeclaration) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// Construct through `T::default()`.
    #[must_use]
    pub fn default_constructor<T>(self) -> Self
    where
        T: Default + Mappable + Declared,
    {
        self.constructor(ConstructorDeclaration::default_of::<T>())
    }

    /// Declare a factory.
    #[must_use]
    pub fn factory(mut self, factory: FactoryDeclaration) -> Self {
        self.factories.push(factory);
        self
    }

    /// Make the type polymorphic.
    #[must_use]
    pub fn discriminator(mut self, discriminator: Discriminator) -> Self {
        self.discriminator = Some(discriminator);
        self
    }

    /// Declare a consumer method.
    #[must_use]
    pub fn consumer(mut self, consumer: ConsumerDeclaration) -> Self {
        self.consumers.push(consumer);
        self
    }

    /// Declare a producer method.
    #[must_use]
    pub fn producer(mut self, producer: ProducerDeclaration) -> Self {
        self.producers.push(producer);
        self
    }

    /// Expand group `name` to `groups`.
    #[must_use]
    pub fn preset<I, S>(mut self, name: impl Into<String>, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.presets
            .insert(name.into(), groups.into_iter().map(Into::into).collect());
        self
    }

    /// Accept a whole-object string matched by `pattern`.
    #[must_use]
    pub fn extractor(mut self, pattern: impl Into<String>) -> Self {
        self.extractor = Some(pattern.into());
        self
    }

    /// Element type for a bare collection field.
    #[must_use]
    pub fn element_hint(mut self, field: impl Into<String>, element: SemanticType) -> Self {
        self.element_hints.insert(field.into(), element);
        self
    }

    /// Declared fields in order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDeclaration] {
        &self.fields
    }

    /// Element-type hint for `field`, if declared.
    #[must_use]
    pub fn hint(&self, field: &str) -> Option<&SemanticType> {
        self.element_hints.get(field)
    }
}
