//! Declaration sources consulted when building plans.

use super::{SemanticType, TypeDescriptor};
use crate::value::TypeRef;

/// Supplies declarations for types.
///
/// The resolver only asks a source for the shape of a type; how the records
/// are produced (code, tables, generated metadata) is up to the source.
pub trait DeclarationSource: Send + Sync {
    /// Declarations for `type_ref`, or `None` when the type is not mappable.
    fn describe(&self, type_ref: &TypeRef) -> Option<TypeDescriptor>;

    /// Element type for the bare collection field `field` of `type_ref`.
    fn array_element_hint(&self, type_ref: &TypeRef, field: &str) -> Option<SemanticType> {
        self.describe(type_ref)
            .and_then(|descriptor| descriptor.hint(field).cloned())
    }
}

/// Reads declarations from each type's [`crate::Declared`] implementation.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticDeclarations;

impl DeclarationSource for StaticDeclarations {
    fn describe(&self, type_ref: &TypeRef) -> Option<TypeDescriptor> {
        type_ref.descriptor()
    }
}
