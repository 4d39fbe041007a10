//! Type identity for declared types.

use std::{
    any::{TypeId, type_name},
    fmt,
    hash::{Hash, Hasher},
};

use crate::declaration::TypeDescriptor;

/// Types that publish mapping declarations.
///
/// Abstract polymorphic bases may implement this trait without implementing
/// [`crate::Mappable`]; they only need a discriminator in their descriptor.
pub trait Declared: 'static {
    /// Returns the declarations describing how the type maps.
    fn declarations() -> TypeDescriptor;
}

/// Process-wide identity of a type, used as the plan cache key.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TypeKey(TypeId);

impl TypeKey {
    /// Key for the Rust type `T`.
    #[must_use]
    pub fn of<T: 'static>() -> Self {
        Self(TypeId::of::<T>())
    }
}

/// Reference to a type together with the source of its declarations.
#[derive(Clone, Copy)]
pub struct TypeRef {
    key: TypeKey,
    name: &'static str,
    describe: Option<fn() -> TypeDescriptor>,
}

impl TypeRef {
    /// Reference a declared type.
    #[must_use]
    pub fn of<T: Declared>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            name: short_name(type_name::<T>()),
            describe: Some(T::declarations),
        }
    }

    /// Reference a type that carries no declarations.
    ///
    /// Resolving a plan for such a type fails with
    /// [`crate::MapError::MissingMappingDeclaration`].
    #[must_use]
    pub fn undeclared<T: 'static>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            name: short_name(type_name::<T>()),
            describe: None,
        }
    }

    /// Cache key of the referenced type.
    #[must_use]
    pub const fn key(&self) -> TypeKey {
        self.key
    }

    /// Readable type name used in diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` when the type publishes declarations.
    #[must_use]
    pub const fn is_declared(&self) -> bool {
        self.describe.is_some()
    }

    /// Invokes the type's declaration function, if any.
    #[must_use]
    pub fn descriptor(&self) -> Option<TypeDescriptor> {
        self.describe.map(|describe| describe())
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeRef").field(&self.name).finish()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Strips the module path from a non-generic type name.
fn short_name(full: &'static str) -> &'static str {
    if full.contains('<') {
        return full;
    }
    full.rsplit_once("::").map_or(full, |(_, name)| name)
}
