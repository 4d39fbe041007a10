//! Typed objects to untyped data.

use serde_json::Value;

use super::{ActiveGroups, MappingOptions, method_participates};
use crate::{
    MapError,
    coerce::{self, flags},
    declaration::SemanticType,
    path::{ConcretePath, PathError, Segment, WriteScope, access},
    plan::{FieldPlan, MetadataResolver, ProducerPlan, TypePlan},
    value::{Datum, ObjectHandle, TypeRef},
};

fn path_error(type_name: &str, field: &str, err: &PathError) -> MapError {
    MapError::definition(type_name, field, err.to_string())
}

/// State of one `normalize` call.
pub(crate) struct Normalizer<'m> {
    pub(crate) resolver: &'m MetadataResolver,
    pub(crate) options: &'m MappingOptions,
    pub(crate) groups: ActiveGroups,
    pub(crate) stack: Vec<usize>,
}

impl Normalizer<'_> {
    /// Emits `handle` at the current location of `scope`.
    ///
    /// `base` is the declared type the object was reached through; a
    /// polymorphic base contributes its discriminator value.
    pub(crate) fn object(
        &mut self,
        handle: &ObjectHandle,
        scope: &WriteScope,
        output: &mut Value,
        base: Option<TypeRef>,
    ) -> Result<(), MapError> {
        let identity = handle.identity();
        let type_name = handle.type_ref().name();
        let occurrences = self.stack.iter().filter(|seen| **seen == identity).count();
        if occurrences >= self.options.circular_reference_limit {
            let Some(handler) = self.options.circular_reference_handler.clone() else {
                return Err(MapError::CircularReference {
                    type_name: type_name.to_owned(),
                    limit: self.options.circular_reference_limit,
                });
            };
            tracing::debug!(type_name, "circular reference handled");
            let replacement = handler(handle)?;
            return access::write(output, scope.current(), replacement)
                .map_err(|err| path_error(type_name, "", &err));
        }

        let plan = self.resolver.resolve(&handle.type_ref())?;
        self.stack.push(identity);
        let outcome = self.emit_object(handle, &plan, scope, output, base);
        self.stack.pop();
        outcome
    }

    fn emit_object(
        &mut self,
        handle: &ObjectHandle,
        plan: &TypePlan,
        scope: &WriteScope,
        output: &mut Value,
        base: Option<TypeRef>,
    ) -> Result<(), MapError> {
        let type_name = plan.type_ref.name();
        let scenario = self.options.scenario.clone();
        let siblings: Vec<(&str, &str)> = plan
            .producers
            .iter()
            .map(|producer| (producer.name.as_str(), producer.scenario.as_str()))
            .collect();
        let producers: Vec<&ProducerPlan> = plan
            .producers
            .iter()
            .filter(|producer| {
                method_participates(&producer.name, &producer.scenario, &scenario, &siblings)
                    && self.groups.admits(&producer.groups)
            })
            .collect();

        if let Some(stringify) = producers.iter().find(|producer| producer.stringify) {
            let text = match (stringify.invoke)(handle)? {
                Datum::String(text) => Value::String(text),
                other => {
                    let raw = coerce::plain_scalar(&other)
                        .map_err(|message| producer_error(type_name, &stringify.name, &message))?;
                    Value::String(match raw {
                        Value::String(text) => text,
                        rendered => rendered.to_string(),
                    })
                }
            };
            return access::write(output, scope.current(), text)
                .map_err(|err| path_error(type_name, &stringify.name, &err));
        }

        access::ensure_object(output, scope.current())
            .map_err(|err| path_error(type_name, "", &err))?;

        if let Some(discriminator) = base
            .filter(|base| *base != plan.type_ref)
            .map(|base| self.resolver.resolve(&base))
            .transpose()?
            .and_then(|base_plan| base_plan.discriminator.clone())
        {
            if let Some(value) = discriminator.value_of(&plan.type_ref) {
                scope
                    .write(output, &discriminator.path, Value::String(value.to_owned()))
                    .map_err(|err| path_error(type_name, "", &err))?;
            }
        }

        for member in &plan.fields {
            let Some(field) = member.select(&scenario) else {
                continue;
            };
            if self.groups.admits(field.groups()) {
                self.field(handle, plan, field, scope, output)?;
            }
        }
        for member in &plan.promoted {
            if let Some(field) = member.select(&scenario) {
                self.field(handle, plan, field, scope, output)?;
            }
        }

        for producer in producers {
            self.produce(handle, plan, producer, scope, output)?;
        }
        Ok(())
    }

    fn field(
        &mut self,
        handle: &ObjectHandle,
        plan: &TypePlan,
        field: &FieldPlan,
        scope: &WriteScope,
        output: &mut Value,
    ) -> Result<(), MapError> {
        let type_name = plan.type_ref.name();
        let declaration = field.declaration();
        let current = handle.read().read_field(field.name());
        let value = match current {
            Some(value) => value,
            None if self.options.skip_uninitialized_values => return Ok(()),
            None => Datum::Null,
        };
        if value.is_null() && self.options.skip_null_values {
            return Ok(());
        }
        tracing::trace!(type_name, field = field.name(), "emitting field");

        if declaration.is_flag() {
            let Datum::Bool(state) = value else {
                return Ok(());
            };
            let location = match &field.flag_group {
                Some(group) => scope
                    .resolve(group)
                    .map(|path| scope.absolute(&path))
                    .map_err(|err| path_error(type_name, field.name(), &err))?,
                None => scope.current().to_vec(),
            };
            return access::push(output, &location, flags::write(declaration.token(), state))
                .map_err(|err| path_error(type_name, field.name(), &err));
        }

        let location = if declaration.is_nested() {
            scope.current().to_vec()
        } else {
            let path = field.path_for(|group| self.groups.contains(group));
            let bound = scope
                .resolve(path)
                .map_err(|err| path_error(type_name, field.name(), &err))?;
            if matches!(bound, ConcretePath::ListItem { .. }) {
                let Some(present) = value.as_bool() else {
                    return Ok(());
                };
                return scope
                    .write_item(output, &bound, present)
                    .map_err(|err| path_error(type_name, field.name(), &err));
            }
            scope.absolute(&bound)
        };
        self.emit(&value, type_name, field, location, scope, output)
    }

    fn emit(
        &mut self,
        value: &Datum,
        type_name: &str,
        field: &FieldPlan,
        location: Vec<Segment>,
        scope: &WriteScope,
        output: &mut Value,
    ) -> Result<(), MapError> {
        match value {
            Datum::Object(child) => {
                let base = field.types().iter().find_map(SemanticType::object_type);
                self.object(child, &scope.descend(location), output, base)
            }
            Datum::List(items) => {
                access::write(output, &location, Value::Array(Vec::new()))
                    .map_err(|err| path_error(type_name, field.name(), &err))?;
                for (index, item) in items.iter().enumerate() {
                    let mut item_location = location.clone();
                    item_location.push(Segment::Index(index));
                    self.emit(item, type_name, field, item_location, scope, output)?;
                }
                Ok(())
            }
            scalar => {
                let raw = coerce::normalize_scalar(
                    scalar,
                    type_name,
                    field,
                    &access::render(&location),
                )?;
                if raw.is_null() && self.options.skip_null_values {
                    return Ok(());
                }
                access::write(output, &location, raw)
                    .map_err(|err| path_error(type_name, field.name(), &err))
            }
        }
    }

    fn produce(
        &mut self,
        handle: &ObjectHandle,
        plan: &TypePlan,
        producer: &ProducerPlan,
        scope: &WriteScope,
        output: &mut Value,
    ) -> Result<(), MapError> {
        let type_name = plan.type_ref.name();
        tracing::trace!(type_name, method = %producer.name, "invoking producer");
        let value = (producer.invoke)(handle)?;
        let location = match &producer.path {
            Some(path) => {
                let bound = scope
                    .resolve(path)
                    .map_err(|err| path_error(type_name, &producer.name, &err))?;
                scope.absolute(&bound)
            }
            None => scope.current().to_vec(),
        };
        match value {
            Datum::Object(child) => self.object(&child, &scope.descend(location), output, None),
            Datum::Raw(raw) if producer.path.is_none() => {
                if !raw.is_object() {
                    return Err(producer_error(
                        type_name,
                        &producer.name,
                        "a producer without an accessor must return an object",
                    ));
                }
                let slot = access::slot(output, &location)
                    .map_err(|err| path_error(type_name, &producer.name, &err))?;
                access::merge_value(slot, raw);
                Ok(())
            }
            _ if producer.path.is_none() => Err(producer_error(
                type_name,
                &producer.name,
                "a producer without an accessor must return an object",
            )),
            other => {
                let raw = self.produced_value(&other, type_name, &producer.name)?;
                if raw.is_null() && self.options.skip_null_values {
                    return Ok(());
                }
                access::write(output, &location, raw)
                    .map_err(|err| path_error(type_name, &producer.name, &err))
            }
        }
    }

    fn produced_value(
        &mut self,
        value: &Datum,
        type_name: &str,
        method: &str,
    ) -> Result<Value, MapError> {
        match value {
            Datum::List(items) => items
                .iter()
                .map(|item| self.produced_value(item, type_name, method))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Datum::Object(child) => {
                let mut nested = Value::Null;
                self.object(child, &WriteScope::new(), &mut nested, None)?;
                Ok(nested)
            }
            scalar => coerce::plain_scalar(scalar)
                .map_err(|message| producer_error(type_name, method, &message)),
        }
    }
}

fn producer_error(type_name: &str, method: &str, message: &str) -> MapError {
    MapError::InvalidMethodSignature {
        type_name: type_name.to_owned(),
        method: method.to_owned(),
        message: message.to_owned(),
    }
}
