//! Builds [`TypePlan`]s from declarations.

use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use parking_lot::Mutex;
use regex::Regex;

use super::{
    ConsumerPlan, DiscriminatorPlan, FieldPlan, InvokerPlan, MemberPlan, MemoryPlanCache,
    ParamPlan, ParamSource, PlanCache, ProducerPlan, SortOrder, TypePlan,
};
use crate::{
    MapError,
    declaration::{
        DeclarationSource, FieldDeclaration, ParamDeclaration, ProducerDeclaration, SemanticType,
        StaticDeclarations, TypeDescriptor,
    },
    path::PathExpr,
    value::{TypeKey, TypeRef},
};

const CONSTRUCTOR: &str = "new";
const EXTRACTOR: &str = "<extractor>";
const DISCRIMINATOR: &str = "<discriminator>";

/// Resolves types to cached plans.
///
/// Builds are serialised behind one lock and the cache is checked again once
/// the lock is held, so a type is built at most once even under concurrent
/// first use. A build covers every type reachable from the requested one and
/// commits nothing unless all of them succeed.
pub struct MetadataResolver {
    source: Arc<dyn DeclarationSource>,
    cache: Arc<dyn PlanCache>,
    build_lock: Mutex<()>,
}

impl Default for MetadataResolver {
    fn default() -> Self {
        Self::new(
            Arc::new(StaticDeclarations),
            Arc::new(MemoryPlanCache::new()),
        )
    }
}

impl std::fmt::Debug for MetadataResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataResolver").finish_non_exhaustive()
    }
}

impl MetadataResolver {
    /// Resolver over `source`, storing plans in `cache`.
    #[must_use]
    pub fn new(source: Arc<dyn DeclarationSource>, cache: Arc<dyn PlanCache>) -> Self {
        Self {
            source,
            cache,
            build_lock: Mutex::new(()),
        }
    }

    /// Plan for `type_ref`, building it and every type it reaches on first
    /// use.
    ///
    /// # Errors
    ///
    /// Returns a definition error when the type, or any type it reaches, is
    /// not mappable or declares something that cannot be executed.
    pub fn resolve(&self, type_ref: &TypeRef) -> Result<Arc<TypePlan>, MapError> {
        if let Some(plan) = self.cache.get(&type_ref.key()) {
            tracing::debug!(type_name = %type_ref, "plan cache hit");
            return Ok(plan);
        }
        let _guard = self.build_lock.lock();
        if let Some(plan) = self.cache.get(&type_ref.key()) {
            tracing::debug!(type_name = %type_ref, "plan built while waiting for lock");
            return Ok(plan);
        }

        let mut build = PlanBuild {
            source: self.source.as_ref(),
            cache: self.cache.as_ref(),
            in_progress: HashSet::new(),
            finished: Vec::new(),
        };
        build.visit(*type_ref)?;
        tracing::debug!(
            type_name = %type_ref,
            plans = build.finished.len(),
            "built mapping plans"
        );

        let mut requested = None;
        for plan in build.finished {
            let key = plan.type_ref.key();
            let stored = self.cache.put_if_absent(key, Arc::new(plan));
            if key == type_ref.key() {
                requested = Some(stored);
            }
        }
        requested.ok_or_else(|| MapError::MissingMappingDeclaration {
            type_name: type_ref.name().to_owned(),
        })
    }
}

struct PlanBuild<'r> {
    source: &'r dyn DeclarationSource,
    cache: &'r dyn PlanCache,
    in_progress: HashSet<TypeKey>,
    finished: Vec<TypePlan>,
}

impl PlanBuild<'_> {
    fn visit(&mut self, type_ref: TypeRef) -> Result<(), MapError> {
        let key = type_ref.key();
        if self.cache.get(&key).is_some() || !self.in_progress.insert(key) {
            return Ok(());
        }
        let descriptor =
            self.source
                .describe(&type_ref)
                .ok_or_else(|| MapError::MissingMappingDeclaration {
                    type_name: type_ref.name().to_owned(),
                })?;
        tracing::debug!(type_name = %type_ref, "building mapping plan");
        let plan = TypeCompiler {
            build: self,
            type_ref,
            nested: Vec::new(),
        }
        .compile(descriptor)?;
        self.finished.push(plan);
        Ok(())
    }
}

struct TypeCompiler<'b, 'r> {
    build: &'b mut PlanBuild<'r>,
    type_ref: TypeRef,
    nested: Vec<TypeKey>,
}

impl TypeCompiler<'_, '_> {
    fn type_name(&self) -> String {
        self.type_ref.name().to_owned()
    }

    fn definition(&self, field: &str, message: impl Into<String>) -> MapError {
        MapError::definition(self.type_ref.name(), field, message)
    }

    fn conflict(&self, field: &str, message: impl Into<String>) -> MapError {
        MapError::DuplicateDeclarationConflict {
            type_name: self.type_name(),
            field: field.to_owned(),
            message: message.into(),
        }
    }

    fn signature(&self, method: &str, message: impl Into<String>) -> MapError {
        MapError::InvalidMethodSignature {
            type_name: self.type_name(),
            method: method.to_owned(),
            message: message.into(),
        }
    }

    fn reference(&mut self, type_ref: TypeRef) -> Result<(), MapError> {
        if !self.nested.contains(&type_ref.key()) {
            self.nested.push(type_ref.key());
        }
        self.build.visit(type_ref)
    }

    fn compile(mut self, descriptor: TypeDescriptor) -> Result<TypePlan, MapError> {
        let TypeDescriptor {
            fields,
            constructor,
            factories,
            discriminator,
            consumers,
            producers,
            presets,
            extractor,
            element_hints: _,
        } = descriptor;

        let mut param_names: HashSet<String> = HashSet::new();
        let mut mapped_params: HashSet<String> = HashSet::new();
        let all_params = constructor
            .iter()
            .flat_map(|ctor| ctor.params.iter())
            .chain(factories.iter().flat_map(|factory| factory.params.iter()))
            .chain(consumers.iter().flat_map(|consumer| consumer.params.iter()));
        for param in all_params {
            param_names.insert(param.name.clone());
            if !param.variants.is_empty() {
                mapped_params.insert(param.name.clone());
            }
        }

        let mut parameter_style: BTreeMap<String, Vec<FieldDeclaration>> = BTreeMap::new();
        let mut plain: Vec<FieldDeclaration> = Vec::new();
        for declaration in fields {
            let name = declaration.field().to_owned();
            if declaration.is_parameter() {
                if !param_names.contains(&name) {
                    return Err(self.definition(
                        &name,
                        "parameter-style declaration on a property that is not a constructor, \
                         factory, or consumer parameter",
                    ));
                }
                parameter_style.entry(name).or_default().push(declaration);
            } else if mapped_params.contains(&name) {
                return Err(self.conflict(
                    &name,
                    "declared both as a property and as a mapped parameter",
                ));
            } else {
                plain.push(declaration);
            }
        }

        let fields = self.members(plain)?;

        let mut promoted: Vec<MemberPlan> = Vec::new();
        let constructor = match constructor {
            Some(ctor) => Some(InvokerPlan {
                name: CONSTRUCTOR.to_owned(),
                priority: 0,
                params: self.params(ctor.params, &parameter_style, &mut promoted)?,
                invoke: ctor.invoke,
            }),
            None => None,
        };
        let mut factory_plans = Vec::with_capacity(factories.len());
        for factory in factories {
            factory_plans.push(InvokerPlan {
                params: self.params(factory.params, &parameter_style, &mut promoted)?,
                name: factory.name,
                priority: factory.priority,
                invoke: factory.invoke,
            });
        }
        factory_plans.sort_by(|a, b| b.priority.cmp(&a.priority));

        let mut consumer_plans = Vec::with_capacity(consumers.len());
        for consumer in consumers {
            let mut ignored = Vec::new();
            let params = self.params(consumer.params, &parameter_style, &mut ignored)?;
            if !consumer.allow_complex {
                self.check_scalar_params(&consumer.name, &params)?;
            }
            consumer_plans.push(ConsumerPlan {
                name: consumer.name,
                params,
                groups: consumer.groups,
                scenario: consumer.scenario,
                invoke: consumer.invoke,
            });
        }

        let producers = self.producers(producers)?;
        let discriminator = match discriminator {
            Some(declared) => {
                let path = self.parse_path(DISCRIMINATOR, &declared.path)?;
                for (_, subtype) in &declared.mapping {
                    self.reference(*subtype)?;
                }
                Some(DiscriminatorPlan {
                    path,
                    mapping: declared.mapping,
                })
            }
            None => None,
        };
        let extractor = extractor
            .map(|pattern| self.regex(EXTRACTOR, &pattern))
            .transpose()?;

        Ok(TypePlan {
            type_ref: self.type_ref,
            fields,
            promoted,
            constructor,
            factories: factory_plans,
            discriminator,
            consumers: consumer_plans,
            producers,
            presets,
            extractor,
            nested: self.nested,
        })
    }

    fn members(&mut self, declarations: Vec<FieldDeclaration>) -> Result<Vec<MemberPlan>, MapError> {
        let mut members: Vec<MemberPlan> = Vec::new();
        for declaration in declarations {
            let plan = self.field(declaration)?;
            let existing = members.iter_mut().find(|member| member.name == plan.name());
            match existing {
                Some(member) => {
                    if member
                        .variants
                        .iter()
                        .any(|variant| variant.scenario() == plan.scenario())
                    {
                        return Err(self.conflict(
                            plan.name(),
                            format!("scenario '{}' declared twice", plan.scenario()),
                        ));
                    }
                    member.variants.push(plan);
                }
                None => members.push(MemberPlan {
                    name: plan.name().to_owned(),
                    variants: vec![plan],
                }),
            }
        }
        Ok(members)
    }

    fn params(
        &mut self,
        params: Vec<ParamDeclaration>,
        parameter_style: &BTreeMap<String, Vec<FieldDeclaration>>,
        promoted: &mut Vec<MemberPlan>,
    ) -> Result<Vec<ParamPlan>, MapError> {
        let mut plans = Vec::with_capacity(params.len());
        for param in params {
            let ParamDeclaration {
                name,
                variants,
                type_name,
                default,
            } = param;
            let is_promoted = variants
                .iter()
                .any(|declaration| !declaration.is_parameter());
            let mut declarations = variants;
            if let Some(extra) = parameter_style.get(&name) {
                declarations.extend(extra.iter().cloned());
            }
            if let Some(mismatch) = declarations.iter().find(|decl| decl.field() != name) {
                return Err(self.definition(
                    &name,
                    format!(
                        "parameter declares field '{}' instead of its own name",
                        mismatch.field()
                    ),
                ));
            }
            let source = if declarations.is_empty() {
                ParamSource::Injected {
                    type_name: type_name.unwrap_or_else(|| SemanticType::Any.to_string()),
                }
            } else {
                let mut members = self.members(declarations)?;
                let member = members.pop().ok_or_else(|| {
                    self.definition(&name, "parameter has no usable declaration")
                })?;
                if is_promoted && !promoted.iter().any(|existing| existing.name == name) {
                    promoted.push(member.clone());
                }
                ParamSource::Mapped(member)
            };
            plans.push(ParamPlan {
                name,
                source,
                default,
            });
        }
        Ok(plans)
    }

    fn check_scalar_params(&self, method: &str, params: &[ParamPlan]) -> Result<(), MapError> {
        for param in params {
            let ParamSource::Mapped(member) = &param.source else {
                continue;
            };
            let complex = member
                .variants
                .iter()
                .flat_map(|variant| variant.types.iter())
                .find(|ty| !ty.is_scalar());
            if let Some(ty) = complex {
                return Err(self.signature(
                    method,
                    format!(
                        "parameter '{}' has non-scalar type '{ty}' and the method does not \
                         allow complex parameters",
                        param.name
                    ),
                ));
            }
        }
        Ok(())
    }

    fn producers(
        &self,
        producers: Vec<ProducerDeclaration>,
    ) -> Result<Vec<ProducerPlan>, MapError> {
        let mut seen_stringify: Option<String> = None;
        let mut plans = Vec::with_capacity(producers.len());
        for producer in producers {
            if producer.stringify {
                if let Some(first) = &seen_stringify {
                    return Err(self.signature(
                        &producer.name,
                        format!("'{first}' is already the stringify producer"),
                    ));
                }
                if producer.path.is_some() {
                    return Err(self.signature(
                        &producer.name,
                        "a stringify producer replaces the whole object and takes no accessor",
                    ));
                }
                seen_stringify = Some(producer.name.clone());
            }
            let path = producer
                .path
                .as_deref()
                .map(|text| self.parse_path(&producer.name, text))
                .transpose()?;
            plans.push(ProducerPlan {
                name: producer.name,
                path,
                groups: producer.groups,
                scenario: producer.scenario,
                stringify: producer.stringify,
                invoke: producer.invoke,
            });
        }
        Ok(plans)
    }

    fn field(&mut self, declaration: FieldDeclaration) -> Result<FieldPlan, MapError> {
        let name = declaration.field().to_owned();
        tracing::trace!(type_name = %self.type_ref, field = %name, "compiling field");

        if declaration.is_flag() && declaration.types() != [SemanticType::Bool] {
            return Err(self.definition(&name, "flag fields must be declared as bool"));
        }

        let path = self.accessor(&declaration, declaration.path_source())?;
        let mut aliases = Vec::with_capacity(declaration.aliases().len());
        for (group, text) in declaration.aliases() {
            aliases.push((group.clone(), self.accessor(&declaration, text)?));
        }

        let mut types = Vec::with_capacity(declaration.types().len());
        for ty in declaration.types() {
            types.push(self.semantic(&name, ty)?);
        }

        let extractor = declaration
            .extractor_source()
            .map(|pattern| self.regex(&name, pattern))
            .transpose()?;
        let flag_group = declaration
            .flag_group_source()
            .map(|text| self.parse_path(&name, text))
            .transpose()?;
        let order = match declaration.order_source() {
            None => None,
            Some(order) if order.eq_ignore_ascii_case("asc") => Some(SortOrder::Asc),
            Some(order) if order.eq_ignore_ascii_case("desc") => Some(SortOrder::Desc),
            Some(order) => {
                return Err(self.definition(
                    &name,
                    format!("unknown sort order '{order}', expected 'asc' or 'desc'"),
                ));
            }
        };

        Ok(FieldPlan {
            declaration,
            path,
            aliases,
            types,
            extractor,
            flag_group,
            order,
        })
    }

    fn accessor(&self, declaration: &FieldDeclaration, text: &str) -> Result<PathExpr, MapError> {
        let expr = self.parse_path(declaration.field(), text)?;
        if !declaration.is_root() {
            return Ok(expr);
        }
        expr.into_root().map_err(|expr| {
            self.definition(
                declaration.field(),
                format!("root-relative field cannot use accessor '{expr}'"),
            )
        })
    }

    fn parse_path(&self, field: &str, text: &str) -> Result<PathExpr, MapError> {
        PathExpr::parse(text).map_err(|err| self.definition(field, err.to_string()))
    }

    fn regex(&self, field: &str, pattern: &str) -> Result<Regex, MapError> {
        Regex::new(pattern).map_err(|err| {
            self.definition(field, format!("invalid extractor pattern: {err}"))
        })
    }

    fn semantic(&mut self, field: &str, ty: &SemanticType) -> Result<SemanticType, MapError> {
        match ty {
            SemanticType::Object(type_ref) => {
                self.reference(*type_ref)?;
                Ok(ty.clone())
            }
            SemanticType::List(Some(element)) => {
                Ok(SemanticType::list_of(self.semantic(field, element)?))
            }
            SemanticType::List(None) => {
                let hint = self
                    .build
                    .source
                    .array_element_hint(&self.type_ref, field)
                    .filter(|hint| *hint != SemanticType::List(None))
                    .ok_or_else(|| MapError::AmbiguousArrayElementType {
                        type_name: self.type_name(),
                        field: field.to_owned(),
                    })?;
                Ok(SemanticType::list_of(self.semantic(field, &hint)?))
            }
            scalar => Ok(scalar.clone()),
        }
    }
}
