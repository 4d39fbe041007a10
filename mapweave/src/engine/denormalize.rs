//! Untyped data to typed objects.

use std::sync::Arc;

use serde_json::Value;

use super::{ActiveGroups, MappingOptions, method_participates};
use crate::{
    MapError,
    coerce::{self, Leniency, Site, flags},
    instantiate::{InputAccess, Instantiator},
    path::{PathError, PathExpr, ReadScope},
    plan::{FieldPlan, MetadataResolver, TypePlan},
    value::{Datum, ObjectHandle, TypeRef},
};

fn path_error(type_name: &str, field: &str, err: &PathError) -> MapError {
    MapError::definition(type_name, field, err.to_string())
}

/// State of one `denormalize` call.
pub(crate) struct Denormalizer<'m> {
    pub(crate) resolver: &'m MetadataResolver,
    pub(crate) instantiator: Instantiator<'m>,
    pub(crate) options: &'m MappingOptions,
    pub(crate) groups: ActiveGroups,
    pub(crate) leniency: Leniency,
}

struct Input<'d, 'm, 's> {
    mapper: &'d Denormalizer<'m>,
    scope: &'d ReadScope<'s>,
    leniency: Leniency,
}

impl InputAccess for Input<'_, '_, '_> {
    fn scenario(&self) -> &str {
        &self.mapper.options.scenario
    }

    fn field(&self, owner: &TypePlan, field: &FieldPlan) -> Result<Option<Datum>, MapError> {
        self.mapper
            .read_field(owner, field, self.scope, self.leniency)
    }

    fn lookup(&self, owner: &TypePlan, path: &PathExpr) -> Result<Option<Value>, MapError> {
        self.scope
            .read(path)
            .map(|found| found.cloned())
            .map_err(|err| path_error(owner.type_ref.name(), &path.to_string(), &err))
    }
}

impl Denormalizer<'_> {
    /// Maps `raw` onto `plan`'s type, populating `existing` when given.
    pub(crate) fn object(
        &self,
        plan: Arc<TypePlan>,
        scope: &ReadScope<'_>,
        existing: Option<ObjectHandle>,
    ) -> Result<ObjectHandle, MapError> {
        let extracted;
        let rebound;
        let mut leniency = self.leniency;
        let scope = match (&plan.extractor, scope.current()) {
            (Some(regex), Value::String(text)) => {
                extracted = coerce::captures(regex, text, plan.type_ref.name())?;
                rebound = scope.rebind(&extracted);
                leniency.enforce_types = false;
                &rebound
            }
            _ => scope,
        };

        let input = Input {
            mapper: self,
            scope,
            leniency,
        };
        let (handle, plan) = self.instantiator.instantiate(plan, &input, existing)?;
        self.populate(&handle, &plan, scope, leniency)?;
        self.consume(&handle, &plan, &input)?;
        Ok(handle)
    }

    fn nested(
        &self,
        type_ref: TypeRef,
        scope: &ReadScope<'_>,
        site: &Site<'_>,
    ) -> Result<ObjectHandle, MapError> {
        let plan = self.resolver.resolve(&type_ref)?;
        let raw = scope.current();
        if plan.extractor.is_none() && !raw.is_object() {
            return Err(MapError::Coercion {
                type_name: site.type_name.to_owned(),
                field: site.field.name().to_owned(),
                path: site.path.clone(),
                value: raw.clone(),
                expected: type_ref.to_string(),
                message: "expected an object".to_owned(),
            });
        }
        self.object(plan, scope, None)
    }

    fn populate(
        &self,
        handle: &ObjectHandle,
        plan: &TypePlan,
        scope: &ReadScope<'_>,
        leniency: Leniency,
    ) -> Result<(), MapError> {
        for member in &plan.fields {
            let Some(field) = member.select(&self.options.scenario) else {
                continue;
            };
            if !self.groups.admits(field.groups()) {
                continue;
            }
            let Some(value) = self.read_field(plan, field, scope, leniency)? else {
                continue;
            };
            handle
                .write()
                .write_field(field.name(), value)
                .map_err(|source| MapError::Access {
                    type_name: plan.type_ref.name().to_owned(),
                    field: field.name().to_owned(),
                    source,
                })?;
        }
        Ok(())
    }

    fn consume(
        &self,
        handle: &ObjectHandle,
        plan: &TypePlan,
        input: &Input<'_, '_, '_>,
    ) -> Result<(), MapError> {
        let scenario = self.options.scenario.as_str();
        let siblings: Vec<(&str, &str)> = plan
            .consumers
            .iter()
            .map(|consumer| (consumer.name.as_str(), consumer.scenario.as_str()))
            .collect();
        for consumer in &plan.consumers {
            if !method_participates(&consumer.name, &consumer.scenario, scenario, &siblings)
                || !self.groups.admits(&consumer.groups)
            {
                continue;
            }
            tracing::trace!(
                type_name = %plan.type_ref,
                method = %consumer.name,
                "invoking consumer"
            );
            let mut args =
                self.instantiator
                    .arguments(&consumer.name, &consumer.params, plan, input)?;
            (consumer.invoke)(handle, &mut args)?;
        }
        Ok(())
    }

    /// Mapped value of `field` in `scope`, or `None` when it stays unset.
    pub(crate) fn read_field(
        &self,
        owner: &TypePlan,
        field: &FieldPlan,
        scope: &ReadScope<'_>,
        leniency: Leniency,
    ) -> Result<Option<Datum>, MapError> {
        let type_name = owner.type_ref.name();
        let declaration = field.declaration();
        tracing::trace!(type_name, field = field.name(), "mapping field");

        if declaration.is_flag() {
            let list = match &field.flag_group {
                Some(group) => scope
                    .read(group)
                    .map_err(|err| path_error(type_name, field.name(), &err))?,
                None => Some(scope.current()),
            };
            return Ok(match flags::read(list, declaration.token()) {
                Some(state) => Some(Datum::Bool(state)),
                None if declaration.is_nullable() => Some(Datum::Null),
                None => None,
            });
        }

        let path = field.path_for(|group| self.groups.contains(group));
        let raw = if declaration.is_nested() {
            Some(scope.current())
        } else {
            scope
                .read(path)
                .map_err(|err| path_error(type_name, field.name(), &err))?
        };
        let Some(raw) = raw else {
            return Ok(None);
        };

        let site = Site {
            type_name,
            field,
            path: path.to_string(),
        };
        let nested = |type_ref: TypeRef, value: &Value| -> Result<ObjectHandle, MapError> {
            let child = scope.descend(value);
            self.nested(type_ref, &child, &site)
        };
        coerce::denormalize(raw, &site, leniency, &nested)
    }
}
