//! Resolved arguments handed to constructors, factories, and consumers.

use std::{any::Any, collections::HashMap, sync::Arc};

use crate::{
    MapError,
    value::{Datum, FieldValue},
};

use super::Injected;

/// Arguments resolved for one invocation, keyed by parameter name.
///
/// Values are taken out as they are read, so each argument is consumed at
/// most once.
#[derive(Default)]
pub struct Arguments {
    method: String,
    values: HashMap<String, Datum>,
    services: HashMap<String, Injected>,
}

impl std::fmt::Debug for Arguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arguments")
            .field("method", &self.method)
            .field("values", &self.values)
            .field("services", &self.services.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Arguments {
    /// Empty argument set for `method`.
    #[must_use]
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            values: HashMap::new(),
            services: HashMap::new(),
        }
    }

    /// Method the arguments are resolved for.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Adds a mapped value.
    pub fn insert(&mut self, name: impl Into<String>, value: Datum) {
        self.values.insert(name.into(), value);
    }

    /// Adds an injected dependency.
    pub fn inject(&mut self, name: impl Into<String>, service: Injected) {
        self.services.insert(name.into(), service);
    }

    /// Returns `true` when a value or dependency exists for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name) || self.services.contains_key(name)
    }

    fn missing(&self, name: &str) -> MapError {
        MapError::MissingArgument {
            method: self.method.clone(),
            param: name.to_owned(),
        }
    }

    fn invalid(&self, name: &str, expected: &str) -> MapError {
        MapError::InvalidArgument {
            method: self.method.clone(),
            param: name.to_owned(),
            expected: expected.to_owned(),
        }
    }

    /// Takes the raw value of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::MissingArgument`] when no value was resolved.
    pub fn take(&mut self, name: &str) -> Result<Datum, MapError> {
        self.values.remove(name).ok_or_else(|| self.missing(name))
    }

    /// Takes `name` converted to field storage `T`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::MissingArgument`] when no value was resolved and
    /// [`MapError::InvalidArgument`] when it has the wrong shape.
    pub fn get<T: FieldValue>(&mut self, name: &str) -> Result<T, MapError> {
        let value = self.take(name)?;
        T::from_datum(value).map_err(|err| self.invalid(name, &err.to_string()))
    }

    /// Takes `name` if resolved; null and absent both yield `None`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidArgument`] when the value has the wrong
    /// shape.
    pub fn optional<T: FieldValue>(&mut self, name: &str) -> Result<Option<T>, MapError> {
        match self.values.remove(name) {
            None | Some(Datum::Null) => Ok(None),
            Some(value) => T::from_datum(value)
                .map(Some)
                .map_err(|err| self.invalid(name, &err.to_string())),
        }
    }

    /// Takes the string argument `name`.
    ///
    /// # Errors
    ///
    /// See [`Arguments::get`].
    pub fn string(&mut self, name: &str) -> Result<String, MapError> {
        self.get(name)
    }

    /// Takes the integer argument `name`.
    ///
    /// # Errors
    ///
    /// See [`Arguments::get`].
    pub fn int(&mut self, name: &str) -> Result<i64, MapError> {
        self.get(name)
    }

    /// Takes the float argument `name`.
    ///
    /// # Errors
    ///
    /// See [`Arguments::get`].
    pub fn float(&mut self, name: &str) -> Result<f64, MapError> {
        self.get(name)
    }

    /// Takes the boolean argument `name`.
    ///
    /// # Errors
    ///
    /// See [`Arguments::get`].
    pub fn bool(&mut self, name: &str) -> Result<bool, MapError> {
        self.get(name)
    }

    /// Borrows the injected dependency `name` as an `S`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::MissingArgument`] when nothing was injected and
    /// [`MapError::InvalidArgument`] when the dependency is not an `S`.
    pub fn service<S: Any + Send + Sync>(&self, name: &str) -> Result<Arc<S>, MapError> {
        let service = self
            .services
            .get(name)
            .ok_or_else(|| self.missing(name))?;
        Arc::clone(service)
            .downcast::<S>()
            .map_err(|_| self.invalid(name, std::any::type_name::<S>()))
    }
}
