//! Shared, lockable object instances.

use std::{any::Any, fmt, sync::Arc};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{Datum, Declared, TypeRef};
use crate::AccessError;

/// Field-level access to a mapped object.
///
/// This is the object half of the generic path accessor: the engine reads and
/// writes declared members by name and never touches the concrete type
/// otherwise. The [`crate::impl_mappable`] macro implements it for plain
/// structs.
pub trait Mappable: Any + Send + Sync + fmt::Debug {
    /// Returns the current value of `field`, or `None` when it is
    /// uninitialised.
    fn read_field(&self, field: &str) -> Option<Datum>;

    /// Stores `value` into `field`.
    ///
    /// # Errors
    ///
    /// Returns an [`AccessError`] when the field is unknown or the value does
    /// not fit its storage type.
    fn write_field(&mut self, field: &str, value: Datum) -> Result<(), AccessError>;
}

/// Shared handle to a mapped object.
///
/// Handles compare by identity. Cloning a handle shares the instance.
#[derive(Clone)]
pub struct ObjectHandle {
    inner: Arc<RwLock<dyn Mappable>>,
    type_ref: TypeRef,
}

impl ObjectHandle {
    /// Wrap a declared value.
    #[must_use]
    pub fn new<T: Mappable + Declared>(value: T) -> Self {
        Self::with_type(value, TypeRef::of::<T>())
    }

    /// Wrap a value under an explicit type reference.
    #[must_use]
    pub fn with_type<T: Mappable>(value: T, type_ref: TypeRef) -> Self {
        let inner: Arc<RwLock<dyn Mappable>> = Arc::new(RwLock::new(value));
        Self { inner, type_ref }
    }

    /// Type the handle was created for.
    #[must_use]
    pub const fn type_ref(&self) -> TypeRef {
        self.type_ref
    }

    /// Acquire shared access to the object.
    pub fn read(&self) -> RwLockReadGuard<'_, dyn Mappable> {
        self.inner.read()
    }

    /// Acquire exclusive access to the object.
    pub fn write(&self) -> RwLockWriteGuard<'_, dyn Mappable> {
        self.inner.write()
    }

    /// Address of the shared instance; stable for the handle's lifetime.
    #[must_use]
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.inner).cast::<()>() as usize
    }

    /// Returns `true` when both handles share one instance.
    #[must_use]
    pub fn same_instance(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }

    /// Returns `true` when the instance is a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        let guard = self.read();
        let any: &dyn Any = &*guard;
        any.is::<T>()
    }

    /// Clone the instance out as a `T`.
    #[must_use]
    pub fn cloned<T: Any + Clone>(&self) -> Option<T> {
        let guard = self.read();
        let any: &dyn Any = &*guard;
        any.downcast_ref::<T>().cloned()
    }

    /// Run `f` against the instance viewed as a `T`.
    pub fn with_ref<T: Any, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let guard = self.read();
        let any: &dyn Any = &*guard;
        any.downcast_ref::<T>().map(f)
    }

    /// Run `f` against the instance viewed as a mutable `T`.
    pub fn with_mut<T: Any, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut guard = self.write();
        let any: &mut dyn Any = &mut *guard;
        any.downcast_mut::<T>().map(f)
    }
}

impl PartialEq for ObjectHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same_instance(other)
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHandle")
            .field("type", &self.type_ref.name())
            .field("identity", &format_args!("{:#x}", self.identity()))
            .finish()
    }
}
