//! Executable mapping plans and the resolver that builds them.
//!
//! A [`TypePlan`] is the compiled form of a [`crate::TypeDescriptor`]: paths
//! are parsed, patterns compiled, element types resolved, and every check
//! that does not depend on input data has already run. Plans are immutable
//! and shared through a [`PlanCache`]; nested types are referenced by
//! [`TypeKey`] so self-referential graphs need no cycles of owned data.

mod cache;
mod resolver;

use std::collections::BTreeMap;

use regex::Regex;

pub use cache::{MemoryPlanCache, PlanCache};
pub use resolver::MetadataResolver;

use crate::{
    declaration::{
        ConstructFn, ConsumeFn, DEFAULT_SCENARIO, FieldDeclaration, ProduceFn, SemanticType,
    },
    path::PathExpr,
    value::{Datum, TypeKey, TypeRef},
};

/// Sort direction applied to list values after mapping.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortOrder {
    /// Smallest first.
    Asc,
    /// Largest first.
    Desc,
}

/// A field declaration compiled for one scenario.
#[derive(Clone, Debug)]
pub struct FieldPlan {
    pub(crate) declaration: FieldDeclaration,
    pub(crate) path: PathExpr,
    pub(crate) aliases: Vec<(String, PathExpr)>,
    pub(crate) types: Vec<SemanticType>,
    pub(crate) extractor: Option<Regex>,
    pub(crate) flag_group: Option<PathExpr>,
    pub(crate) order: Option<SortOrder>,
}

impl FieldPlan {
    /// Target member name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.declaration.field()
    }

    /// Scenario the plan belongs to.
    #[must_use]
    pub fn scenario(&self) -> &str {
        self.declaration.scenario_name()
    }

    /// Groups the field belongs to.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        self.declaration.group_names()
    }

    /// Resolved union candidates; bare collections carry their hinted element
    /// type.
    #[must_use]
    pub fn types(&self) -> &[SemanticType] {
        &self.types
    }

    /// Primary accessor.
    #[must_use]
    pub const fn path(&self) -> &PathExpr {
        &self.path
    }

    /// Accessor used when `is_active` accepts one of the aliased groups.
    pub fn path_for(&self, is_active: impl Fn(&str) -> bool) -> &PathExpr {
        self.aliases
            .iter()
            .find(|(group, _)| is_active(group))
            .map_or(&self.path, |(_, path)| path)
    }

    /// Original declaration.
    #[must_use]
    pub const fn declaration(&self) -> &FieldDeclaration {
        &self.declaration
    }
}

/// All scenario variants of one member.
#[derive(Clone, Debug)]
pub struct MemberPlan {
    pub(crate) name: String,
    pub(crate) variants: Vec<FieldPlan>,
}

impl MemberPlan {
    /// Member name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Variant for `scenario`, falling back to the default scenario.
    #[must_use]
    pub fn select(&self, scenario: &str) -> Option<&FieldPlan> {
        self.variants
            .iter()
            .find(|variant| variant.scenario() == scenario)
            .or_else(|| {
                self.variants
                    .iter()
                    .find(|variant| variant.scenario() == DEFAULT_SCENARIO)
            })
    }

    /// Every declared variant.
    #[must_use]
    pub fn variants(&self) -> &[FieldPlan] {
        &self.variants
    }
}

/// Where an argument comes from.
#[derive(Clone, Debug)]
pub enum ParamSource {
    /// Read from the input like a field.
    Mapped(MemberPlan),
    /// Resolved from the dependency source.
    Injected {
        /// Type name passed to the dependency source.
        type_name: String,
    },
}

/// One compiled parameter.
#[derive(Clone, Debug)]
pub struct ParamPlan {
    pub(crate) name: String,
    pub(crate) source: ParamSource,
    pub(crate) default: Option<Datum>,
}

impl ParamPlan {
    /// Parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the argument comes from.
    #[must_use]
    pub const fn source(&self) -> &ParamSource {
        &self.source
    }
}

/// Compiled constructor or factory.
#[derive(Clone)]
pub struct InvokerPlan {
    pub(crate) name: String,
    pub(crate) priority: i32,
    pub(crate) params: Vec<ParamPlan>,
    pub(crate) invoke: ConstructFn,
}

impl InvokerPlan {
    /// Factory name, or `new` for the constructor.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attempt priority.
    #[must_use]
    pub const fn priority(&self) -> i32 {
        self.priority
    }

    /// Compiled parameters.
    #[must_use]
    pub fn params(&self) -> &[ParamPlan] {
        &self.params
    }
}

impl std::fmt::Debug for InvokerPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvokerPlan")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Compiled consumer method.
#[derive(Clone)]
pub struct ConsumerPlan {
    pub(crate) name: String,
    pub(crate) params: Vec<ParamPlan>,
    pub(crate) groups: Vec<String>,
    pub(crate) scenario: String,
    pub(crate) invoke: ConsumeFn,
}

impl std::fmt::Debug for ConsumerPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsumerPlan")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("groups", &self.groups)
            .field("scenario", &self.scenario)
            .finish_non_exhaustive()
    }
}

/// Compiled producer method.
#[derive(Clone)]
pub struct ProducerPlan {
    pub(crate) name: String,
    pub(crate) path: Option<PathExpr>,
    pub(crate) groups: Vec<String>,
    pub(crate) scenario: String,
    pub(crate) stringify: bool,
    pub(crate) invoke: ProduceFn,
}

impl std::fmt::Debug for ProducerPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProducerPlan")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("groups", &self.groups)
            .field("scenario", &self.scenario)
            .field("stringify", &self.stringify)
            .finish_non_exhaustive()
    }
}

/// Compiled polymorphic discriminator.
#[derive(Clone, Debug)]
pub struct DiscriminatorPlan {
    pub(crate) path: PathExpr,
    pub(crate) mapping: Vec<(String, TypeRef)>,
}

impl DiscriminatorPlan {
    /// Subtype registered for `value`.
    #[must_use]
    pub fn subtype(&self, value: &str) -> Option<TypeRef> {
        self.mapping
            .iter()
            .find(|(candidate, _)| candidate == value)
            .map(|(_, type_ref)| *type_ref)
    }

    /// Discriminator value registered for `type_ref`.
    #[must_use]
    pub fn value_of(&self, type_ref: &TypeRef) -> Option<&str> {
        self.mapping
            .iter()
            .find(|(_, candidate)| candidate == type_ref)
            .map(|(value, _)| value.as_str())
    }
}

/// Executable mapping plan for one type.
#[derive(Debug)]
pub struct TypePlan {
    pub(crate) type_ref: TypeRef,
    pub(crate) fields: Vec<MemberPlan>,
    pub(crate) promoted: Vec<MemberPlan>,
    pub(crate) constructor: Option<InvokerPlan>,
    pub(crate) factories: Vec<InvokerPlan>,
    pub(crate) discriminator: Option<DiscriminatorPlan>,
    pub(crate) consumers: Vec<ConsumerPlan>,
    pub(crate) producers: Vec<ProducerPlan>,
    pub(crate) presets: BTreeMap<String, Vec<String>>,
    pub(crate) extractor: Option<Regex>,
    pub(crate) nested: Vec<TypeKey>,
}

impl TypePlan {
    /// Type the plan maps.
    #[must_use]
    pub const fn type_ref(&self) -> TypeRef {
        self.type_ref
    }

    /// Plain fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[MemberPlan] {
        &self.fields
    }

    /// Constructor and factory parameters that are also emitted on
    /// normalization.
    #[must_use]
    pub fn promoted(&self) -> &[MemberPlan] {
        &self.promoted
    }

    /// Factories in attempt order.
    #[must_use]
    pub fn factories(&self) -> &[InvokerPlan] {
        &self.factories
    }

    /// Constructor, if the type is directly constructible.
    #[must_use]
    pub const fn constructor(&self) -> Option<&InvokerPlan> {
        self.constructor.as_ref()
    }

    /// Discriminator, if the type is polymorphic.
    #[must_use]
    pub const fn discriminator(&self) -> Option<&DiscriminatorPlan> {
        self.discriminator.as_ref()
    }

    /// Group presets.
    #[must_use]
    pub const fn presets(&self) -> &BTreeMap<String, Vec<String>> {
        &self.presets
    }

    /// Types referenced by this plan.
    #[must_use]
    pub fn nested(&self) -> &[TypeKey] {
        &self.nested
    }
}
