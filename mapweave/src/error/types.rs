//! Primary error enum for mapping flows.

use figment::Error as FigmentError;
use serde_json::Value;
use thiserror::Error;

use super::attempts::FactoryAttempts;

/// Errors raised while resolving type plans or mapping data.
///
/// Every variant names the type and the member involved so a failure can be
/// traced back to its declaration without re-running with extra logging.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MapError {
    /// The type publishes no mapping declaration.
    #[error("type '{type_name}' has no mapping declaration")]
    MissingMappingDeclaration {
        /// Name of the unmappable type.
        type_name: String,
    },

    /// A collection field declares no element type and no hint resolves one.
    #[error("array field '{type_name}.{field}' has no resolvable element type")]
    AmbiguousArrayElementType {
        /// Type declaring the field.
        type_name: String,
        /// Field whose element type is unknown.
        field: String,
    },

    /// A producer or consumer method is declared with an unusable signature.
    #[error("invalid signature for method '{type_name}::{method}': {message}")]
    InvalidMethodSignature {
        /// Type declaring the method.
        type_name: String,
        /// Name of the offending method.
        method: String,
        /// Explanation of the signature problem.
        message: String,
    },

    /// Two declarations claim the same member.
    #[error("conflicting declarations for '{type_name}.{field}': {message}")]
    DuplicateDeclarationConflict {
        /// Type declaring the member.
        type_name: String,
        /// Member declared more than once.
        field: String,
        /// Explanation of the conflict.
        message: String,
    },

    /// A declaration cannot be executed as written.
    #[error("invalid mapping definition for '{type_name}.{field}': {message}")]
    Definition {
        /// Type declaring the member.
        type_name: String,
        /// Member whose declaration is invalid.
        field: String,
        /// Explanation of the definition problem.
        message: String,
    },

    /// A present value does not fit the declared type.
    #[error("cannot map {value} at '{path}' to {expected} for '{type_name}.{field}': {message}")]
    Coercion {
        /// Type declaring the field.
        type_name: String,
        /// Field being populated.
        field: String,
        /// Accessor the value was read from.
        path: String,
        /// Offending raw value.
        value: Value,
        /// Expected semantic type.
        expected: String,
        /// Explanation of the mismatch.
        message: String,
    },

    /// Every candidate of a union type rejected the value.
    #[error(
        "no matching type for '{type_name}.{field}' (tried {}): {source}",
        .attempted.join(", ")
    )]
    NoMatchingType {
        /// Type declaring the field.
        type_name: String,
        /// Field being populated.
        field: String,
        /// Candidate types in declaration order.
        attempted: Vec<String>,
        /// Failure reported by the first candidate.
        #[source]
        source: Box<MapError>,
    },

    /// No construction strategy applies to the type.
    #[error("cannot instantiate '{type_name}': {message}")]
    NotInstantiable {
        /// Type that could not be produced.
        type_name: String,
        /// Explanation of the failure.
        message: String,
    },

    /// A single factory attempt failed.
    #[error("factory '{type_name}::{factory}' failed: {source}")]
    FactoryFailed {
        /// Type the factory should produce.
        type_name: String,
        /// Name of the factory.
        factory: String,
        /// Reason the attempt failed.
        #[source]
        source: Box<MapError>,
    },

    /// Every declared factory failed.
    #[error("no factory could instantiate '{type_name}':\n{attempts}")]
    FactoriesExhausted {
        /// Type that could not be produced.
        type_name: String,
        /// One [`MapError::FactoryFailed`] per attempted factory, in order.
        attempts: Box<FactoryAttempts>,
    },

    /// A required argument has no value and no default.
    #[error("missing required argument '{param}' for '{method}'")]
    MissingArgument {
        /// Constructor, factory, or consumer receiving the argument.
        method: String,
        /// Parameter name.
        param: String,
    },

    /// An argument holds a value of the wrong shape.
    #[error("invalid argument '{param}' for '{method}': expected {expected}")]
    InvalidArgument {
        /// Constructor, factory, or consumer receiving the argument.
        method: String,
        /// Parameter name.
        param: String,
        /// Shape the callee asked for.
        expected: String,
    },

    /// A parameter is neither mapped nor injectable.
    #[error("cannot inject parameter '{param}' of type '{param_type}' into '{method}'")]
    Injection {
        /// Constructor, factory, or consumer receiving the argument.
        method: String,
        /// Parameter name.
        param: String,
        /// Declared parameter type.
        param_type: String,
    },

    /// The polymorphic discriminator is missing or unmapped.
    #[error("cannot select subtype of '{type_name}' from '{path}': {message}")]
    Discriminator {
        /// Polymorphic base type.
        type_name: String,
        /// Accessor of the discriminator field.
        path: String,
        /// Explanation of the failure.
        message: String,
    },

    /// A regular-expression extractor did not match its input.
    #[error("pattern '{pattern}' did not match input '{input}' for '{target}'")]
    ExtractorMismatch {
        /// Type or field owning the extractor.
        target: String,
        /// Pattern source.
        pattern: String,
        /// Unmatched input.
        input: String,
    },

    /// An object was reached again while it was still being normalized.
    #[error("circular reference detected while normalizing '{type_name}' (limit {limit})")]
    CircularReference {
        /// Type of the repeated object.
        type_name: String,
        /// Configured occurrence limit.
        limit: usize,
    },

    /// The object accessor refused a read or write.
    #[error("cannot access '{type_name}.{field}': {source}")]
    Access {
        /// Type owning the field.
        type_name: String,
        /// Field being accessed.
        field: String,
        /// Accessor failure.
        #[source]
        source: AccessError,
    },

    /// Mapping options could not be extracted from configuration providers.
    #[error("failed to load mapping configuration: {0}")]
    Config(#[from] Box<FigmentError>),
}

/// Coarse classification of [`MapError`] values.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Declarations are wrong; the input data is not at fault.
    Definition,
    /// A present value does not fit its declared type.
    Coercion,
    /// No constructor or factory produced an instance.
    Instantiation,
    /// A parameter could not be injected.
    Injection,
    /// A regular-expression extractor did not match.
    Extractor,
    /// A circular object reference was detected.
    CircularReference,
    /// Options could not be loaded.
    Configuration,
}

/// Failure reported by a [`crate::Mappable`] field accessor.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum AccessError {
    /// The object has no field with this name.
    #[error("unknown field '{0}'")]
    UnknownField(String),

    /// The value does not fit the field's storage type.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// Storage type of the field.
        expected: String,
        /// Label of the rejected value.
        found: String,
    },

    /// The object rejected the value for a domain reason.
    #[error("{0}")]
    Rejected(String),
}
