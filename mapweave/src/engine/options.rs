//! Per-call mapping options.

use std::{fmt, sync::Arc};

use serde_json::Value;

use crate::{MapError, declaration::DEFAULT_SCENARIO, value::ObjectHandle};

/// Replaces an object reached again while it is still being normalized.
pub type CircularReferenceHandler =
    Arc<dyn Fn(&ObjectHandle) -> Result<Value, MapError> + Send + Sync>;

/// Options for one `denormalize` or `normalize` call.
///
/// # Examples
///
/// ```
/// use mapweave::MappingOptions;
///
/// let options = MappingOptions::new()
///     .groups(["id", "name"])
///     .scenario("two")
///     .skip_null_values(true);
/// assert_eq!(options.scenario_name(), "two");
/// assert!(options.skips_uninitialized_values());
/// ```
#[derive(Clone)]
pub struct MappingOptions {
    pub(crate) groups: Vec<String>,
    pub(crate) scenario: String,
    pub(crate) skip_null_values: bool,
    pub(crate) skip_uninitialized_values: bool,
    pub(crate) disable_type_enforcement: bool,
    pub(crate) json_numbers: bool,
    pub(crate) circular_reference_handler: Option<CircularReferenceHandler>,
    pub(crate) circular_reference_limit: usize,
    pub(crate) object_to_populate: Option<ObjectHandle>,
}

impl Default for MappingOptions {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            scenario: DEFAULT_SCENARIO.to_owned(),
            skip_null_values: false,
            skip_uninitialized_values: true,
            disable_type_enforcement: false,
            json_numbers: true,
            circular_reference_handler: None,
            circular_reference_limit: 1,
            object_to_populate: None,
        }
    }
}

impl fmt::Debug for MappingOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingOptions")
            .field("groups", &self.groups)
            .field("scenario", &self.scenario)
            .field("skip_null_values", &self.skip_null_values)
            .field("skip_uninitialized_values", &self.skip_uninitialized_values)
            .field("disable_type_enforcement", &self.disable_type_enforcement)
            .field("json_numbers", &self.json_numbers)
            .field(
                "circular_reference_handler",
                &self.circular_reference_handler.is_some(),
            )
            .field("circular_reference_limit", &self.circular_reference_limit)
            .field("object_to_populate", &self.object_to_populate)
            .finish()
    }
}

impl MappingOptions {
    /// Default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate `groups`; no groups means every field participates.
    #[must_use]
    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    /// Select `scenario`.
    #[must_use]
    pub fn scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = scenario.into();
        self
    }

    /// Drop `null` values from normalized output.
    #[must_use]
    pub const fn skip_null_values(mut self, skip: bool) -> Self {
        self.skip_null_values = skip;
        self
    }

    /// Drop uninitialised fields from normalized output instead of emitting
    /// `null`.
    #[must_use]
    pub const fn skip_uninitialized_values(mut self, skip: bool) -> Self {
        self.skip_uninitialized_values = skip;
        self
    }

    /// Accept numeric strings for numbers and stringify scalars for strings.
    #[must_use]
    pub const fn disable_type_enforcement(mut self, disable: bool) -> Self {
        self.disable_type_enforcement = disable;
        self
    }

    /// Accept integral numbers where floats are declared.
    #[must_use]
    pub const fn json_numbers(mut self, accept: bool) -> Self {
        self.json_numbers = accept;
        self
    }

    /// Handle circular references instead of failing.
    #[must_use]
    pub fn circular_reference_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ObjectHandle) -> Result<Value, MapError> + Send + Sync + 'static,
    {
        self.circular_reference_handler = Some(Arc::new(handler));
        self
    }

    /// Times an object may already be on the normalization stack before it
    /// counts as circular. The limit is at least 1, so `0` behaves like `1`.
    #[must_use]
    pub const fn circular_reference_limit(mut self, limit: usize) -> Self {
        self.circular_reference_limit = if limit == 0 { 1 } else { limit };
        self
    }

    /// Populate `target` instead of constructing a new instance.
    #[must_use]
    pub fn object_to_populate(mut self, target: ObjectHandle) -> Self {
        self.object_to_populate = Some(target);
        self
    }

    /// Requested groups.
    #[must_use]
    pub fn group_names(&self) -> &[String] {
        &self.groups
    }

    /// Selected scenario.
    #[must_use]
    pub fn scenario_name(&self) -> &str {
        &self.scenario
    }

    /// Whether `null` outputs are dropped.
    #[must_use]
    pub const fn skips_null_values(&self) -> bool {
        self.skip_null_values
    }

    /// Whether uninitialised fields are dropped.
    #[must_use]
    pub const fn skips_uninitialized_values(&self) -> bool {
        self.skip_uninitialized_values
    }

    /// Whether type enforcement is disabled.
    #[must_use]
    pub const fn type_enforcement_disabled(&self) -> bool {
        self.disable_type_enforcement
    }

    /// Configured circular-reference limit.
    #[must_use]
    pub const fn reference_limit(&self) -> usize {
        self.circular_reference_limit
    }
}
