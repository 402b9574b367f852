//! Rule configuration threaded into every entry point.
//!
//! A [`RuleConfig`] is built once per session, either directly with the
//! `with_*` builders, from a JSON file, or from a host [`SettingsSource`].
//! Reading from a settings source never fails: any flag that cannot be read
//! is logged and replaced by its default.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sw_core::MetadataValue;

use crate::dice::DiceFormula;
use crate::error::{MechError, MechResult};

/// Settings key: whether characters track sanity.
pub const SANITY_ENABLED: &str = "sanity_enabled";
/// Settings key: armor ruleset name.
pub const ARMOR_RULESET: &str = "armor_ruleset";
/// Settings key: whether the trauma rule is on.
pub const TRAUMA_RULE: &str = "trauma_rule";
/// Settings key: whether skill checks use the custom formula.
pub const USE_CUSTOM_FORMULA: &str = "use_custom_formula";
/// Settings key: the custom skill formula.
pub const CUSTOM_FORMULA: &str = "custom_formula";

/// How armor class is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmorRuleset {
    /// One armor class for every attack.
    #[default]
    Standard,
    /// Separate melee and ranged armor classes.
    SplitMeleeRanged,
}

impl ArmorRuleset {
    /// Parse a ruleset name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Some(Self::Standard),
            "split" | "split_melee_ranged" => Some(Self::SplitMeleeRanged),
            _ => None,
        }
    }
}

impl fmt::Display for ArmorRuleset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::SplitMeleeRanged => write!(f, "split_melee_ranged"),
        }
    }
}

/// Whether weapon hits can be traumatic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraumaRule {
    /// No trauma dice.
    #[default]
    Off,
    /// Weapons with a trauma profile roll their trauma die on attack.
    On,
}

/// Session-wide rule switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Characters track sanity.
    pub sanity_enabled: bool,
    /// Armor class variant.
    pub armor_ruleset: ArmorRuleset,
    /// Trauma rule.
    pub trauma_rule: TraumaRule,
    /// Fixed skill-check formula replacing the rank-tiered pool.
    pub custom_formula: Option<String>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            sanity_enabled: true,
            armor_ruleset: ArmorRuleset::Standard,
            trauma_rule: TraumaRule::Off,
            custom_formula: None,
        }
    }
}

impl RuleConfig {
    /// Enable or disable sanity.
    pub fn with_sanity(mut self, enabled: bool) -> Self {
        self.sanity_enabled = enabled;
        self
    }

    /// Set the armor ruleset.
    pub fn with_armor_ruleset(mut self, ruleset: ArmorRuleset) -> Self {
        self.armor_ruleset = ruleset;
        self
    }

    /// Set the trauma rule.
    pub fn with_trauma_rule(mut self, rule: TraumaRule) -> Self {
        self.trauma_rule = rule;
        self
    }

    /// Replace the tiered skill pool with a fixed formula.
    pub fn with_custom_formula(mut self, formula: impl Into<String>) -> Self {
        self.custom_formula = Some(formula.into());
        self
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_path(path: impl AsRef<Path>) -> MechResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| MechError::InvalidConfig(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| MechError::InvalidConfig(format!("{}: {e}", path.display())))
    }

    /// Read every flag from a settings source, falling back per flag.
    pub fn from_settings(source: &dyn SettingsSource) -> Self {
        let defaults = Self::default();

        let sanity_enabled = source
            .get_bool(SANITY_ENABLED)
            .unwrap_or_else(|e| fallback(SANITY_ENABLED, e, defaults.sanity_enabled));

        let armor_ruleset = match source.get_string(ARMOR_RULESET) {
            Ok(name) => ArmorRuleset::parse(&name).unwrap_or_else(|| {
                fallback(
                    ARMOR_RULESET,
                    SettingsError::Invalid {
                        key: ARMOR_RULESET.to_string(),
                        value: name,
                    },
                    defaults.armor_ruleset,
                )
            }),
            Err(e) => fallback(ARMOR_RULESET, e, defaults.armor_ruleset),
        };

        let trauma_rule = match source.get_bool(TRAUMA_RULE) {
            Ok(true) => TraumaRule::On,
            Ok(false) => TraumaRule::Off,
            Err(e) => fallback(TRAUMA_RULE, e, defaults.trauma_rule),
        };

        let use_custom = source
            .get_bool(USE_CUSTOM_FORMULA)
            .unwrap_or_else(|e| fallback(USE_CUSTOM_FORMULA, e, false));
        let custom_formula = if use_custom {
            match source.get_string(CUSTOM_FORMULA) {
                Ok(formula) => match DiceFormula::parse(&formula) {
                    Ok(_) => Some(formula),
                    Err(e) => fallback(
                        CUSTOM_FORMULA,
                        SettingsError::Invalid {
                            key: CUSTOM_FORMULA.to_string(),
                            value: format!("{formula} ({e})"),
                        },
                        None,
                    ),
                },
                Err(e) => fallback(CUSTOM_FORMULA, e, None),
            }
        } else {
            None
        };

        Self {
            sanity_enabled,
            armor_ruleset,
            trauma_rule,
            custom_formula,
        }
    }
}

fn fallback<T: fmt::Debug>(key: &str, error: SettingsError, default: T) -> T {
    tracing::warn!(key, %error, ?default, "setting unreadable, using default");
    default
}

/// Why a setting could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// The key is not registered.
    #[error("setting {0} is not registered")]
    Missing(String),

    /// The stored value has the wrong type.
    #[error("setting {key} is not a {expected}")]
    WrongType {
        /// Setting key.
        key: String,
        /// Expected type name.
        expected: &'static str,
    },

    /// The stored value is not one of the accepted values.
    #[error("setting {key} has invalid value {value:?}")]
    Invalid {
        /// Setting key.
        key: String,
        /// Offending value.
        value: String,
    },

    /// The settings storage itself failed.
    #[error("settings storage unavailable: {0}")]
    Unavailable(String),
}

/// The host's boolean/string configuration surface.
pub trait SettingsSource {
    /// Read a boolean flag.
    fn get_bool(&self, key: &str) -> Result<bool, SettingsError>;

    /// Read a string setting.
    fn get_string(&self, key: &str) -> Result<String, SettingsError>;
}

/// A settings source backed by a map of metadata values.
#[derive(Debug, Clone, Default)]
pub struct MapSettings {
    values: HashMap<String, MetadataValue>,
}

impl MapSettings {
    /// An empty source; every read falls back.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: store a value.
    pub fn with(mut self, key: impl Into<String>, value: MetadataValue) -> Self {
        self.values.insert(key.into(), value);
        self
    }
}

impl SettingsSource for MapSettings {
    fn get_bool(&self, key: &str) -> Result<bool, SettingsError> {
        match self.values.get(key) {
            Some(MetadataValue::Boolean(b)) => Ok(*b),
            Some(MetadataValue::String(s)) if s == "true" => Ok(true),
            Some(MetadataValue::String(s)) if s == "false" => Ok(false),
            Some(_) => Err(SettingsError::WrongType {
                key: key.to_string(),
                expected: "boolean",
            }),
            None => Err(SettingsError::Missing(key.to_string())),
        }
    }

    fn get_string(&self, key: &str) -> Result<String, SettingsError> {
        match self.values.get(key) {
            Some(MetadataValue::String(s)) => Ok(s.clone()),
            Some(_) => Err(SettingsError::WrongType {
                key: key.to_string(),
                expected: "string",
            }),
            None => Err(SettingsError::Missing(key.to_string())),
        }
    }
}
