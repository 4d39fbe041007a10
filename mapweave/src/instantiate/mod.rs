//! Producing base instances: populate, discriminate, factory, or construct.

mod arguments;
mod dependencies;

use std::sync::Arc;

use serde_json::Value;

pub use arguments::Arguments;
pub use dependencies::{DependencySource, Injected, ServiceRegistry};

use crate::{
    FactoryAttempts, MapError,
    plan::{FieldPlan, InvokerPlan, MetadataResolver, ParamPlan, ParamSource, TypePlan},
    path::PathExpr,
    value::{Datum, ObjectHandle},
};

/// Read access to the input an instance is built from.
pub(crate) trait InputAccess {
    /// Scenario of the current call.
    fn scenario(&self) -> &str;

    /// Mapped value of `field`, or `None` when absent.
    fn field(&self, owner: &TypePlan, field: &FieldPlan) -> Result<Option<Datum>, MapError>;

    /// Raw value at `path`, or `None` when absent.
    fn lookup(&self, owner: &TypePlan, path: &PathExpr) -> Result<Option<Value>, MapError>;
}

/// Runs the instantiation state machine for one object.
pub(crate) struct Instantiator<'a> {
    pub(crate) resolver: &'a MetadataResolver,
    pub(crate) dependencies: &'a dyn DependencySource,
}

impl Instantiator<'_> {
    /// Produces the instance for `plan` and the plan that describes it.
    ///
    /// The returned plan differs from `plan` when a discriminator or a
    /// factory selects a subtype.
    pub(crate) fn instantiate(
        &self,
        plan: Arc<TypePlan>,
        input: &dyn InputAccess,
        existing: Option<ObjectHandle>,
    ) -> Result<(ObjectHandle, Arc<TypePlan>), MapError> {
        if let Some(handle) = existing {
            let plan = if handle.type_ref() == plan.type_ref {
                plan
            } else {
                self.resolver.resolve(&handle.type_ref())?
            };
            return Ok((handle, plan));
        }

        let mut plan = plan;
        while let Some(subtype) = self.discriminate(&plan, input)? {
            tracing::debug!(
                base = %plan.type_ref,
                subtype = %subtype,
                "discriminator selected subtype"
            );
            plan = self.resolver.resolve(&subtype)?;
        }

        if !plan.factories.is_empty() {
            return self.from_factories(&plan, input);
        }
        if let Some(constructor) = &plan.constructor {
            let mut args = self.arguments(constructor.name(), &constructor.params, &plan, input)?;
            let handle = (constructor.invoke)(&mut args)?;
            return Ok((handle, plan));
        }
        Err(MapError::NotInstantiable {
            type_name: plan.type_ref.name().to_owned(),
            message: "no discriminator, factory, or constructor is declared".to_owned(),
        })
    }

    fn discriminate(
        &self,
        plan: &TypePlan,
        input: &dyn InputAccess,
    ) -> Result<Option<crate::value::TypeRef>, MapError> {
        let Some(discriminator) = &plan.discriminator else {
            return Ok(None);
        };
        let failure = |message: String| MapError::Discriminator {
            type_name: plan.type_ref.name().to_owned(),
            path: discriminator.path.to_string(),
            message,
        };
        let raw = input
            .lookup(plan, &discriminator.path)?
            .filter(|value| !value.is_null())
            .ok_or_else(|| failure("discriminator field is missing".to_owned()))?;
        let key = match raw {
            Value::String(text) => text,
            Value::Bool(_) | Value::Number(_) => raw.to_string(),
            other => return Err(failure(format!("discriminator value {other} is not a scalar"))),
        };
        let subtype = discriminator
            .subtype(&key)
            .ok_or_else(|| failure(format!("value '{key}' is not mapped to a subtype")))?;
        Ok((subtype != plan.type_ref).then_some(subtype))
    }

    fn from_factories(
        &self,
        plan: &Arc<TypePlan>,
        input: &dyn InputAccess,
    ) -> Result<(ObjectHandle, Arc<TypePlan>), MapError> {
        let mut attempts = FactoryAttempts::default();
        for factory in &plan.factories {
            match self.try_factory(plan, factory, input) {
                Ok(found) => return Ok(found),
                Err(err) => {
                    tracing::debug!(
                        type_name = %plan.type_ref,
                        factory = %factory.name,
                        error = %err,
                        "factory failed, trying next"
                    );
                    attempts.push(MapError::FactoryFailed {
                        type_name: plan.type_ref.name().to_owned(),
                        factory: factory.name.clone(),
                        source: Box::new(err),
                    });
                }
            }
        }
        Err(MapError::FactoriesExhausted {
            type_name: plan.type_ref.name().to_owned(),
            attempts: Box::new(attempts),
        })
    }

    fn try_factory(
        &self,
        plan: &Arc<TypePlan>,
        factory: &InvokerPlan,
        input: &dyn InputAccess,
    ) -> Result<(ObjectHandle, Arc<TypePlan>), MapError> {
        let mut args = self.arguments(&factory.name, &factory.params, plan, input)?;
        let handle = (factory.invoke)(&mut args)?;
        let produced = handle.type_ref();
        if produced == plan.type_ref {
            return Ok((handle, Arc::clone(plan)));
        }
        let is_subtype = plan
            .discriminator
            .as_ref()
            .is_some_and(|discriminator| discriminator.value_of(&produced).is_some());
        if !is_subtype {
            return Err(MapError::NotInstantiable {
                type_name: plan.type_ref.name().to_owned(),
                message: format!("factory '{}' returned a '{produced}'", factory.name),
            });
        }
        let subtype_plan = self.resolver.resolve(&produced)?;
        Ok((handle, subtype_plan))
    }

    /// Resolves every parameter of `method` into an argument set.
    pub(crate) fn arguments(
        &self,
        method: &str,
        params: &[ParamPlan],
        owner: &TypePlan,
        input: &dyn InputAccess,
    ) -> Result<Arguments, MapError> {
        let mut args = Arguments::new(method);
        for param in params {
            match &param.source {
                ParamSource::Mapped(member) => {
                    let selected = member.select(input.scenario());
                    let value = match selected {
                        Some(field) => input.field(owner, field)?,
                        None => None,
                    };
                    let resolved = value.or_else(|| param.default.clone()).or_else(|| {
                        selected
                            .filter(|field| field.declaration.is_nullable())
                            .map(|_| Datum::Null)
                    });
                    let Some(resolved) = resolved else {
                        return Err(MapError::MissingArgument {
                            method: method.to_owned(),
                            param: param.name.clone(),
                        });
                    };
                    args.insert(param.name.clone(), resolved);
                }
                ParamSource::Injected { type_name } => {
                    if let Some(service) = self.dependencies.resolve(&param.name, type_name) {
                        args.inject(param.name.clone(), service);
                    } else if let Some(default) = &param.default {
                        args.insert(param.name.clone(), default.clone());
                    } else {
                        return Err(MapError::Injection {
                            method: format!("{}::{method}", owner.type_ref.name()),
                            param: param.name.clone(),
                            param_type: type_name.clone(),
                        });
                    }
                }
            }
        }
        Ok(args)
    }
}
