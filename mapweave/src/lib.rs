//! Declarative, bidirectional mapping between untyped data and typed object
//! graphs.
//!
//! Types describe how they map through [`Declared`]: each field names an
//! accessor path into the raw data, its semantic type, and optional groups,
//! scenarios, extractors, value maps, or flag tokens. The [`Mapper`] compiles
//! those declarations once into cached plans and then converts
//! [`serde_json::Value`] trees into typed objects (`denormalize`) and back
//! (`normalize`).
//!
//! Objects live behind [`ObjectHandle`]s so graphs may share or cycle
//! through instances; the [`impl_mappable!`] macro wires a plain struct into
//! the field accessor the engine uses.

mod coerce;
pub mod declaration;
pub mod engine;
pub mod error;
pub mod instantiate;
pub mod path;
pub mod plan;
pub mod value;

pub use declaration::{
    ConstructFn, ConstructorDeclaration, ConsumeFn, ConsumerDeclaration, DEFAULT_DATE_FORMAT,
    DEFAULT_SCENARIO, DeclarationSource, Discriminator, FactoryDeclaration, FieldDeclaration,
    ParamDeclaration, ProduceFn, ProducerDeclaration, SemanticType, StaticDeclarations,
    TypeDescriptor, ValueMap,
};
pub use engine::{
    ActiveGroups, CircularReferenceHandler, ENV_PREFIX, Mapper, MapperBuilder, MappingConfig,
    MappingOptions,
};
pub use error::{AccessError, ErrorKind, FactoryAttempts, MapError};
pub use instantiate::{Arguments, DependencySource, Injected, ServiceRegistry};
pub use plan::{MemoryPlanCache, MetadataResolver, PlanCache, TypePlan};
pub use value::{Datum, Declared, FieldValue, Mappable, ObjectHandle, TypeKey, TypeRef};

/// Result alias used throughout the crate.
pub type MapResult<T> = Result<T, MapError>;
