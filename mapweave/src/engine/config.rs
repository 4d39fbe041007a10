//! Mapping defaults loaded from the environment.

use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};

use super::MappingOptions;
use crate::{MapError, declaration::DEFAULT_SCENARIO};

/// Prefix of the environment variables read by [`MappingConfig::load`].
pub const ENV_PREFIX: &str = "MAPWEAVE_";

/// Serializable subset of [`MappingOptions`].
///
/// Callbacks and instances cannot come from configuration; they are set on
/// the options afterwards.
///
/// # Examples
///
/// ```
/// use mapweave::MappingConfig;
///
/// let options = MappingConfig::default().into_options();
/// assert_eq!(options.scenario_name(), "default");
/// ```
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Groups activated on every call.
    pub groups: Vec<String>,
    /// Scenario selected on every call.
    pub scenario: String,
    /// Drop `null` values from normalized output.
    pub skip_null_values: bool,
    /// Drop uninitialised fields from normalized output.
    pub skip_uninitialized_values: bool,
    /// Relax scalar type checks.
    pub disable_type_enforcement: bool,
    /// Accept integral numbers for float fields.
    pub json_numbers: bool,
    /// Circular-reference limit; at least 1.
    pub circular_reference_limit: usize,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            scenario: DEFAULT_SCENARIO.to_owned(),
            skip_null_values: false,
            skip_uninitialized_values: true,
            disable_type_enforcement: false,
            json_numbers: true,
            circular_reference_limit: 1,
        }
    }
}

impl MappingConfig {
    /// Defaults overlaid with `MAPWEAVE_*` environment variables.
    #[must_use]
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default())).merge(Env::prefixed(ENV_PREFIX))
    }

    /// Loads the configuration from [`MappingConfig::figment`].
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Config`] when a variable cannot be decoded.
    pub fn load() -> Result<Self, MapError> {
        Self::from_figment(&Self::figment())
    }

    /// Extracts the configuration from `figment`.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Config`] when extraction fails or the
    /// circular-reference limit is zero.
    pub fn from_figment(figment: &Figment) -> Result<Self, MapError> {
        let config: Self = figment.extract()?;
        if config.circular_reference_limit == 0 {
            return Err(MapError::config(figment::Error::from(
                "circular_reference_limit must be at least 1".to_owned(),
            )));
        }
        Ok(config)
    }

    /// Options carrying these settings.
    #[must_use]
    pub fn into_options(self) -> MappingOptions {
        MappingOptions::new()
            .groups(self.groups)
            .scenario(self.scenario)
            .skip_null_values(self.skip_null_values)
            .skip_uninitialized_values(self.skip_uninitialized_values)
            .disable_type_enforcement(self.disable_type_enforcement)
            .json_numbers(self.json_numbers)
            .circular_reference_limit(self.circular_reference_limit)
    }
}

impl From<MappingConfig> for MappingOptions {
    fn from(config: MappingConfig) -> Self {
        config.into_options()
    }
}
