//! Rules engine for sci-fi tabletop play.
//!
//! Turns entity attributes and inventories into derived statistics and
//! equipment effects, and resolves dice checks (skill, attribute, save,
//! morale, weapon, asset, initiative) into structured results. Rule
//! switches travel in an explicit [`RuleConfig`]; persistence goes through
//! the [`sw_core::EntityStore`] patch contract.

pub mod attribute;
pub mod check;
pub mod config;
pub mod derived;
pub mod dice;
pub mod equipment;
pub mod error;
pub mod initiative;
pub mod pipeline;
pub mod sink;
pub mod validate;

pub use attribute::modifier_of;
pub use check::{
    CheckKind, CheckOutcome, CheckRequest, CheckResult, ItemCheck, report, resolve_check_for,
};
pub use config::{ArmorRuleset, RuleConfig, SettingsSource, TraumaRule};
pub use derived::compute_derived_stats;
pub use dice::{DiceFormula, DiceRoller, Die, RandomRoller, RollResult, ScriptedRoller};
pub use equipment::{EquipmentEffect, resolve_equipment_effects};
pub use error::{MechError, MechResult, Precondition};
pub use initiative::{Encounter, roll_initiative, select_initiative_formula};
pub use pipeline::{Preparation, prepare_entity};
pub use sink::{MemorySink, ResultSink, TracingSink};
pub use validate::{ValidationIssue, validate_entity};
