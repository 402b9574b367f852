//! Validation of entity rules data.
//!
//! Checks that an entity carries the block its kind requires and that its
//! items hold formulas and values the check engine can use. Validation
//! never fails; it returns the issues it found.

use std::collections::HashSet;

use sw_core::{Entity, EntityKind, ItemKind};

use crate::config::RuleConfig;
use crate::dice::DiceFormula;

/// A warning or error found during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// The entity (or item) where the issue was found.
    pub entity: String,
    /// A human-readable description of the issue.
    pub message: String,
    /// Whether this is an error (true) or a warning (false).
    pub is_error: bool,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = if self.is_error { "error" } else { "warning" };
        write!(f, "{level}: {}: {}", self.entity, self.message)
    }
}

fn error(entity: &str, message: impl Into<String>) -> ValidationIssue {
    ValidationIssue {
        entity: entity.to_string(),
        message: message.into(),
        is_error: true,
    }
}

fn warning(entity: &str, message: impl Into<String>) -> ValidationIssue {
    ValidationIssue {
        entity: entity.to_string(),
        message: message.into(),
        is_error: false,
    }
}

/// Validate one entity.
pub fn validate_entity(entity: &Entity) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    validate_components(entity, &mut issues);
    validate_items(entity, &mut issues);
    issues
}

/// Validate a rule configuration.
pub fn validate_config(config: &RuleConfig) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if let Some(formula) = &config.custom_formula {
        if let Err(e) = DiceFormula::parse(formula) {
            issues.push(error("rule config", format!("custom formula {formula:?}: {e}")));
        }
    }
    issues
}

fn validate_components(entity: &Entity, issues: &mut Vec<ValidationIssue>) {
    let c = &entity.components;
    let present = [
        ("character", c.character.is_some()),
        ("npc", c.npc.is_some()),
        ("faction", c.faction.is_some()),
    ];
    let required = match entity.kind {
        EntityKind::Character => Some("character"),
        EntityKind::Npc => Some("npc"),
        EntityKind::Faction => Some("faction"),
        EntityKind::Custom(_) => None,
    };

    for (name, is_present) in present {
        if Some(name) == required && !is_present {
            issues.push(error(
                &entity.name,
                format!("{} has no {name} data", entity.kind),
            ));
        } else if Some(name) != required && is_present {
            issues.push(warning(
                &entity.name,
                format!("{name} data is ignored on a {}", entity.kind),
            ));
        }
    }

    if let Some(npc) = &c.npc {
        if npc.max_health.is_some_and(|max| max < 1) {
            issues.push(error(&entity.name, "authored max health is below 1"));
        }
    }
}

fn validate_items(entity: &Entity, issues: &mut Vec<ValidationIssue>) {
    let mut skills = HashSet::new();

    for item in &entity.items {
        let place = format!("{} / {}", entity.name, item.name);

        match &item.kind {
            ItemKind::Skill(_) => {
                if !skills.insert(item.name.to_lowercase()) {
                    issues.push(warning(&place, "duplicate skill; checks use the first one"));
                }
            }
            ItemKind::Weapon(weapon) => {
                check_formula(issues, &place, "damage", &weapon.damage);
                if let Some(trauma) = &weapon.trauma {
                    check_formula(issues, &place, "trauma die", &trauma.die);
                }
                if !weapon.ammo.ammo_type.is_unmetered() && weapon.ammo.value < 0 {
                    issues.push(error(&place, "negative ammo count"));
                }
                if let Some(skill) = &weapon.skill {
                    let owned = entity
                        .find_item(skill)
                        .is_some_and(|i| matches!(i.kind, ItemKind::Skill(_)));
                    if entity.kind == EntityKind::Character && !owned {
                        issues.push(warning(&place, format!("uses skill {skill} the owner lacks")));
                    }
                }
            }
            ItemKind::Asset(asset) => {
                if let Some(damage) = &asset.damage {
                    check_formula(issues, &place, "damage", damage);
                }
                if let Some(counter) = &asset.counter {
                    check_formula(issues, &place, "counter", counter);
                }
                if asset.attack_source.is_some() && asset.damage.is_none() {
                    issues.push(warning(&place, "can attack but has no damage formula"));
                }
            }
            ItemKind::Cyberware(cyber) if cyber.system_strain < 0 => {
                issues.push(error(&place, "negative system strain"));
            }
            ItemKind::Armor(armor) if armor.max_dex.is_some_and(|cap| cap < 0) => {
                issues.push(warning(&place, "dexterity cap is negative"));
            }
            _ => {}
        }
    }
}

fn check_formula(issues: &mut Vec<ValidationIssue>, place: &str, label: &str, source: &str) {
    if let Err(e) = DiceFormula::parse(source) {
        issues.push(error(place, format!("{label} {source:?}: {e}")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sw_core::component::{CharacterComponent, NpcComponent};
    use sw_core::item::{Ammo, AmmoType, AssetData, AssetSource, SkillData, WeaponData};
    use sw_core::{Attribute, AttributeSet, Item};

    fn character() -> Entity {
        let mut entity = Entity::new(EntityKind::Character, "Kael");
        entity.components.character = Some(CharacterComponent::new(AttributeSet::default(), 1));
        entity
    }

    fn weapon(damage: &str, skill: Option<&str>) -> Item {
        Item::new(
            "Needler",
            ItemKind::Weapon(WeaponData {
                damage: damage.to_string(),
                range: Default::default(),
                attack_bonus: 0,
                ammo: Ammo {
                    ammo_type: AmmoType::Typed("mag".to_string()),
                    value: 4,
                    burst: false,
                },
                trauma: None,
                skill: skill.map(str::to_string),
                attribute: None,
            }),
        )
    }

    #[test]
    fn clean_entity_has_no_issues() {
        let entity = character().with_item(weapon("1d6 + @dex", None));
        assert!(validate_entity(&entity).is_empty());
    }

    #[test]
    fn missing_block_is_error() {
        let mut entity = Entity::new(EntityKind::Npc, "Ghost");
        entity.components.character = Some(CharacterComponent::new(AttributeSet::default(), 1));
        let issues = validate_entity(&entity);
        assert_eq!(issues.len(), 2);
        assert_eq!(
            issues[0].to_string(),
            "warning: Ghost: character data is ignored on a npc"
        );
        assert_eq!(issues[1].to_string(), "error: Ghost: npc has no npc data");
    }

    #[test]
    fn bad_formulas_are_errors() {
        let entity = character().with_item(weapon("1d6 x 2", None));
        let issues = validate_entity(&entity);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_error);
        assert_eq!(issues[0].entity, "Kael / Needler");
    }

    #[test]
    fn unknown_weapon_skill_is_warning() {
        let entity = character().with_item(weapon("1d6", Some("Shoot")));
        let issues = validate_entity(&entity);
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_error);

        let skilled = character()
            .with_item(weapon("1d6", Some("Shoot")))
            .with_item(Item::new(
                "Shoot",
                ItemKind::Skill(SkillData {
                    rank: 1,
                    attribute: Attribute::Dex,
                }),
            ));
        assert!(validate_entity(&skilled).is_empty());
    }

    #[test]
    fn asset_checks() {
        let mut entity = Entity::new(EntityKind::Faction, "Guild");
        entity.components.faction = Some(Default::default());
        let entity = entity.with_item(Item::new(
            "Thugs",
            ItemKind::Asset(AssetData {
                attack_source: Some(AssetSource::Force),
                counter: Some("1d4 +".to_string()),
                ..AssetData::default()
            }),
        ));
        let issues = validate_entity(&entity);
        assert_eq!(issues.iter().filter(|i| i.is_error).count(), 1);
        assert_eq!(issues.iter().filter(|i| !i.is_error).count(), 1);
    }

    #[test]
    fn npc_health_cap() {
        let mut entity = Entity::new(EntityKind::Npc, "Husk");
        let mut npc = NpcComponent::new(AttributeSet::default(), 6);
        npc.max_health = Some(0);
        entity.components.npc = Some(npc);
        assert_eq!(validate_entity(&entity).len(), 1);
    }

    #[test]
    fn config_formula() {
        assert!(validate_config(&RuleConfig::default()).is_empty());
        let bad = RuleConfig::default().with_custom_formula("3d");
        assert_eq!(validate_config(&bad).len(), 1);
    }
}
