//! Declaration records describing how a type maps.
//!
//! Declarations are plain immutable values. They are produced by a
//! [`DeclarationSource`] (by default, the type's own [`crate::Declared`]
//! implementation) and compiled into executable plans by
//! [`crate::plan::MetadataResolver`].

mod descriptor;
mod field;
mod semantic;
mod source;

pub use descriptor::{
    ConstructFn, ConstructorDeclaration, ConsumeFn, ConsumerDeclaration, Discriminator,
    FactoryDeclaration, ParamDeclaration, ProduceFn, ProducerDeclaration, TypeDescriptor,
};
pub use field::{DEFAULT_DATE_FORMAT, DEFAULT_SCENARIO, FieldDeclaration, ValueMap};
pub use semantic::SemanticType;
pub use source::{DeclarationSource, StaticDeclarations};
