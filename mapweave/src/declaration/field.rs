//! Per-field mapping declarations.

use std::collections::BTreeMap;

use serde_json::Value;

use super::SemanticType;
use crate::value::Datum;

/// Scenario used when a call does not select one.
pub const DEFAULT_SCENARIO: &str = "default";

/// Date format used when a field does not declare one (extended ISO 8601).
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Literal lookup table translating raw values into mapped values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValueMap {
    entries: Vec<(Value, Datum)>,
    fallback: Option<Datum>,
}

impl ValueMap {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `raw` to `mapped`.
    #[must_use]
    pub fn entry(mut self, raw: impl Into<Value>, mapped: impl Into<Datum>) -> Self {
        self.entries.push((raw.into(), mapped.into()));
        self
    }

    /// Value used when a raw value has no entry.
    #[must_use]
    pub fn fallback(mut self, mapped: impl Into<Datum>) -> Self {
        self.fallback = Some(mapped.into());
        self
    }

    /// Looks up `raw`, falling back to the default entry.
    #[must_use]
    pub fn lookup(&self, raw: &Value) -> Option<&Datum> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == raw)
            .map(|(_, mapped)| mapped)
            .or(self.fallback.as_ref())
    }

    /// Finds the raw value that maps to `mapped`.
    #[must_use]
    pub fn reverse(&self, mapped: &Datum) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(_, candidate)| candidate == mapped)
            .map(|(raw, _)| raw)
    }
}

/// Mapping declaration for one field under one scenario.
///
/// A field may carry several declarations that differ only by scenario.
/// Paths, extractor patterns, and sort orders are kept as written and
/// validated when the owning type's plan is built.
#[derive(Clone, Debug)]
pub struct FieldDeclaration {
    field: String,
    path: Option<String>,
    types: Vec<SemanticType>,
    nullable: bool,
    aliases: BTreeMap<String, String>,
    nested: bool,
    root: bool,
    parameter: bool,
    true_token: Option<Value>,
    false_token: Option<Value>,
    value_map: Option<ValueMap>,
    flag: bool,
    flag_group: Option<String>,
    flag_token: Option<String>,
    default_order: Option<String>,
    extractor: Option<String>,
    scenario: String,
    date_format: String,
    groups: Vec<String>,
}

impl FieldDeclaration {
    /// Declare `field` with semantic type `ty`, read from a key of the same
    /// name.
    #[must_use]
    pub fn new(field: impl Into<String>, ty: SemanticType) -> Self {
        Self {
            field: field.into(),
            path: None,
            types: vec![ty],
            nullable: false,
            aliases: BTreeMap::new(),
            nested: false,
            root: false,
            parameter: false,
            true_token: None,
            false_token: None,
            value_map: None,
            flag: false,
            flag_group: None,
            flag_token: None,
            default_order: None,
            extractor: None,
            scenario: DEFAULT_SCENARIO.to_owned(),
            date_format: DEFAULT_DATE_FORMAT.to_owned(),
            groups: Vec::new(),
        }
    }

    /// Declare a boolean flag stored as a token in a list.
    #[must_use]
    pub fn flag(field: impl Into<String>) -> Self {
        let mut declaration = Self::new(field, SemanticType::Bool);
        declaration.flag = true;
        declaration
    }

    /// Read and write the field through `path` instead of its name.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add a union candidate tried after the existing ones.
    #[must_use]
    pub fn or_type(mut self, ty: SemanticType) -> Self {
        self.types.push(ty);
        self
    }

    /// Allow null and treat unmatched values as absent.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Use `path` instead of the primary path while `group` is active.
    #[must_use]
    pub fn alias(mut self, group: impl Into<String>, path: impl Into<String>) -> Self {
        self.aliases.insert(group.into(), path.into());
        self
    }

    /// Map a nested object against the current container rather than a key.
    #[must_use]
    pub const fn nested(mut self) -> Self {
        self.nested = true;
        self
    }

    /// Resolve the path against the top-level input instead of the current
    /// container.
    #[must_use]
    pub const fn root(mut self) -> Self {
        self.root = true;
        self
    }

    /// Mark this as a parameter-style declaration for a constructor or
    /// factory argument of the same name.
    #[must_use]
    pub const fn parameter(mut self) -> Self {
        self.parameter = true;
        self
    }

    /// Accept exactly `truthy` and `falsy` as boolean tokens.
    #[must_use]
    pub fn tokens(mut self, truthy: impl Into<Value>, falsy: impl Into<Value>) -> Self {
        self.true_token = Some(truthy.into());
        self.false_token = Some(falsy.into());
        self
    }

    /// Translate values through a literal lookup table.
    #[must_use]
    pub fn value_map(mut self, map: ValueMap) -> Self {
        self.value_map = Some(map);
        self
    }

    /// Look the flag token up in the list at `path`.
    #[must_use]
    pub fn flag_group(mut self, path: impl Into<String>) -> Self {
        self.flag_group = Some(path.into());
        self
    }

    /// Use `token` instead of the field name as the flag token.
    #[must_use]
    pub fn flag_token(mut self, token: impl Into<String>) -> Self {
        self.flag_token = Some(token.into());
        self
    }

    /// Sort list values, `"asc"` or `"desc"`.
    #[must_use]
    pub fn default_order(mut self, order: impl Into<String>) -> Self {
        self.default_order = Some(order.into());
        self
    }

    /// Extract the value from a string with a regular expression.
    #[must_use]
    pub fn extractor(mut self, pattern: impl Into<String>) -> Self {
        self.extractor = Some(pattern.into());
        self
    }

    /// Bind the declaration to `scenario`.
    #[must_use]
    pub fn scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = scenario.into();
        self
    }

    /// Parse and format dates with `format` (`chrono` syntax).
    #[must_use]
    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Restrict the field to calls activating one of `groups`.
    #[must_use]
    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    /// Target field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Accessor expression; defaults to the field name.
    #[must_use]
    pub fn path_source(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.field)
    }

    /// Union candidates in declaration order.
    #[must_use]
    pub fn types(&self) -> &[SemanticType] {
        &self.types
    }

    /// Whether null is accepted.
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Group-specific accessor overrides.
    #[must_use]
    pub const fn aliases(&self) -> &BTreeMap<String, String> {
        &self.aliases
    }

    /// Whether a nested object is mapped against the current container.
    #[must_use]
    pub const fn is_nested(&self) -> bool {
        self.nested
    }

    /// Whether the path is root-relative.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.root
    }

    /// Whether this is a parameter-style declaration.
    #[must_use]
    pub const fn is_parameter(&self) -> bool {
        self.parameter
    }

    /// Explicit boolean tokens, if declared.
    #[must_use]
    pub fn boolean_tokens(&self) -> Option<(&Value, &Value)> {
        self.true_token.as_ref().zip(self.false_token.as_ref())
    }

    /// Literal lookup table, if declared.
    #[must_use]
    pub const fn value_table(&self) -> Option<&ValueMap> {
        self.value_map.as_ref()
    }

    /// Whether the field is a flag.
    #[must_use]
    pub const fn is_flag(&self) -> bool {
        self.flag
    }

    /// Accessor of the flag list, if declared.
    #[must_use]
    pub fn flag_group_source(&self) -> Option<&str> {
        self.flag_group.as_deref()
    }

    /// Flag token; defaults to the field name.
    #[must_use]
    pub fn token(&self) -> &str {
        self.flag_token.as_deref().unwrap_or(&self.field)
    }

    /// Sort order as written, if declared.
    #[must_use]
    pub fn order_source(&self) -> Option<&str> {
        self.default_order.as_deref()
    }

    /// Extractor pattern as written, if declared.
    #[must_use]
    pub fn extractor_source(&self) -> Option<&str> {
        self.extractor.as_deref()
    }

    /// Scenario the declaration belongs to.
    #[must_use]
    pub fn scenario_name(&self) -> &str {
        &self.scenario
    }

    /// Date format.
    #[must_use]
    pub fn format(&self) -> &str {
        &self.date_format
    }

    /// Groups the field belongs to.
    #[must_use]
    pub fn group_names(&self) -> &[String] {
        &self.groups
    }
}
