//! The closed set of item variants an entity can own.
//!
//! Every item carries a name, an `equipped` flag, and one typed payload.
//! Serialized items are flat objects tagged with a `type` field, so patch
//! paths address payload fields directly (e.g. `items.2.ammo.value`).

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attribute::Attribute;

/// Unique identifier for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    /// Generate a new random item ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// An owned (or template) item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Whether the item is worn or readied. Ignored outside characters and NPCs.
    #[serde(default)]
    pub equipped: bool,
    /// Typed payload.
    #[serde(flatten)]
    pub kind: ItemKind,
}

impl Item {
    /// Create an unequipped item with a random ID.
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            equipped: false,
            kind,
        }
    }

    /// Builder: mark the item equipped.
    pub fn equipped(mut self) -> Self {
        self.equipped = true;
        self
    }

    /// The weapon payload, if this is a weapon.
    pub fn as_weapon(&self) -> Option<&WeaponData> {
        match &self.kind {
            ItemKind::Weapon(w) => Some(w),
            _ => None,
        }
    }

    /// The armor payload, if this is armor.
    pub fn as_armor(&self) -> Option<&ArmorData> {
        match &self.kind {
            ItemKind::Armor(a) => Some(a),
            _ => None,
        }
    }

    /// The cyberware payload, if this is cyberware.
    pub fn as_cyberware(&self) -> Option<&CyberwareData> {
        match &self.kind {
            ItemKind::Cyberware(c) => Some(c),
            _ => None,
        }
    }

    /// The skill payload, if this is a skill.
    pub fn as_skill(&self) -> Option<&SkillData> {
        match &self.kind {
            ItemKind::Skill(s) => Some(s),
            _ => None,
        }
    }

    /// The asset payload, if this is a faction asset.
    pub fn as_asset(&self) -> Option<&AssetData> {
        match &self.kind {
            ItemKind::Asset(a) => Some(a),
            _ => None,
        }
    }
}

/// Typed item payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemKind {
    /// A trained skill.
    Skill(SkillData),
    /// A weapon.
    Weapon(WeaponData),
    /// Worn armor.
    Armor(ArmorData),
    /// Installed cyberware.
    Cyberware(CyberwareData),
    /// General equipment.
    Gear(GearData),
    /// A focus (special talent).
    Focus(FocusData),
    /// A faction asset.
    Asset(AssetData),
    /// A psychic or magical power.
    Power(PowerData),
    /// A vehicle.
    Vehicle(VehicleData),
    /// A drug or consumable.
    Drug(DrugData),
}

impl ItemKind {
    /// Short lowercase name of the variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Skill(_) => "skill",
            Self::Weapon(_) => "weapon",
            Self::Armor(_) => "armor",
            Self::Cyberware(_) => "cyberware",
            Self::Gear(_) => "gear",
            Self::Focus(_) => "focus",
            Self::Asset(_) => "asset",
            Self::Power(_) => "power",
            Self::Vehicle(_) => "vehicle",
            Self::Drug(_) => "drug",
        }
    }
}

/// Skill payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillData {
    /// Trained rank. Untrained skills are usually -1.
    pub rank: i32,
    /// The attribute that governs checks with this skill.
    pub attribute: Attribute,
}

/// How far a weapon reaches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeClass {
    /// Hand-to-hand.
    #[default]
    Melee,
    /// Fired weapons.
    Ranged,
    /// Thrown weapons.
    Thrown,
}

/// What a weapon feeds on. Serialized as a plain string: `"none"` and
/// `"infinite"` are special, anything else names a magazine or cell type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AmmoType {
    /// The weapon needs no ammunition.
    #[default]
    None,
    /// The weapon never runs dry.
    Infinite,
    /// A named, countable ammunition type.
    Typed(String),
}

impl AmmoType {
    /// Returns true for types that are never debited.
    pub fn is_unmetered(&self) -> bool {
        matches!(self, Self::None | Self::Infinite)
    }
}

impl From<String> for AmmoType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "none" => Self::None,
            "infinite" => Self::Infinite,
            _ => Self::Typed(s),
        }
    }
}

impl From<AmmoType> for String {
    fn from(ammo: AmmoType) -> Self {
        match ammo {
            AmmoType::None => "none".to_string(),
            AmmoType::Infinite => "infinite".to_string(),
            AmmoType::Typed(s) => s,
        }
    }
}

impl fmt::Display for AmmoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Infinite => write!(f, "infinite"),
            Self::Typed(s) => write!(f, "{s}"),
        }
    }
}

/// A weapon's ammunition record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ammo {
    /// What the weapon feeds on.
    #[serde(rename = "type")]
    pub ammo_type: AmmoType,
    /// Rounds remaining.
    #[serde(default)]
    pub value: i32,
    /// Whether the weapon may burst fire.
    #[serde(default)]
    pub burst: bool,
}

/// Trauma die and multiplier for the optional trauma rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraumaProfile {
    /// Formula for the trauma die, e.g. `1d6`.
    pub die: String,
    /// Damage multiplier on a traumatic hit.
    pub rating: i32,
}

/// Weapon payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponData {
    /// Damage formula, e.g. `1d8` or `2d6+@str`.
    pub damage: String,
    /// Range class.
    #[serde(default)]
    pub range: RangeClass,
    /// Innate attack bonus.
    #[serde(default)]
    pub attack_bonus: i32,
    /// Ammunition record.
    #[serde(default)]
    pub ammo: Ammo,
    /// Trauma profile, used only when the trauma rule is on.
    #[serde(default)]
    pub trauma: Option<TraumaProfile>,
    /// Name of the skill normally used to attack.
    #[serde(default)]
    pub skill: Option<String>,
    /// Attribute normally used to attack.
    #[serde(default)]
    pub attribute: Option<Attribute>,
}

fn default_true() -> bool {
    true
}

/// Armor payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmorData {
    /// Armor class granted (ranged AC under the split ruleset).
    pub ac: i32,
    /// Melee armor class under the split ruleset; falls back to `ac`.
    #[serde(default)]
    pub melee_ac: Option<i32>,
    /// Whether the dexterity modifier applies on top of the armor.
    #[serde(default = "default_true")]
    pub allow_dex: bool,
    /// Cap on the dexterity modifier; unbounded when absent.
    #[serde(default)]
    pub max_dex: Option<i32>,
}

impl ArmorData {
    /// Plain armor that allows an uncapped dexterity bonus.
    pub fn new(ac: i32) -> Self {
        Self {
            ac,
            melee_ac: None,
            allow_dex: true,
            max_dex: None,
        }
    }
}

/// Cyberware payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CyberwareData {
    /// System strain the implant costs.
    pub system_strain: i32,
    /// Body location.
    #[serde(default)]
    pub location: String,
}

/// Gear payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GearData {
    /// How many are carried.
    #[serde(default)]
    pub quantity: u32,
    /// Encumbrance per unit.
    #[serde(default)]
    pub encumbrance: u32,
    /// Free-form tags reserved for tag-driven effects.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Focus payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusData {
    /// Focus level (1 or 2).
    pub level: u32,
}

/// Which faction rating backs an asset's attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetSource {
    /// Force rating.
    Force,
    /// Cunning rating.
    Cunning,
    /// Wealth rating.
    Wealth,
}

impl fmt::Display for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Force => write!(f, "force"),
            Self::Cunning => write!(f, "cunning"),
            Self::Wealth => write!(f, "wealth"),
        }
    }
}

/// Faction asset payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetData {
    /// Rating used for the hit roll; `None` means the asset cannot attack.
    #[serde(default)]
    pub attack_source: Option<AssetSource>,
    /// Damage formula on attack.
    #[serde(default)]
    pub damage: Option<String>,
    /// Damage formula when countering.
    #[serde(default)]
    pub counter: Option<String>,
    /// Current hit points.
    #[serde(default)]
    pub hp: i32,
    /// Maximum hit points.
    #[serde(default)]
    pub max_hp: i32,
}

/// Power payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerData {
    /// Power level.
    pub level: u32,
    /// Discipline or source.
    #[serde(default)]
    pub source: String,
}

/// Vehicle payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleData {
    /// Hit points.
    pub hp: i32,
    /// Speed rating.
    #[serde(default)]
    pub speed: i32,
    /// Armor rating.
    #[serde(default)]
    pub armor: i32,
}

/// Drug payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugData {
    /// How long a dose lasts.
    #[serde(default)]
    pub duration: String,
}
