//! Partial updates addressed by dotted field paths.
//!
//! A [`Patch`] maps paths such as `components.character.equipment.ac.value`
//! or `items.2.ammo.value` to new JSON values. Numeric segments index
//! arrays. Applying a patch is all-or-nothing: the entity is serialized,
//! every path is written, and the document is deserialized back. Any failure
//! leaves the original entity untouched.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};

/// Top-level fields a patch may never touch; the store owns them.
const PROTECTED: [&str; 4] = ["id", "version", "created_at", "updated_at"];

/// A set of field writes applied to one entity as a unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    entries: BTreeMap<String, Value>,
}

impl Patch {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `path` to `value`, replacing any earlier write to the same path.
    pub fn set(&mut self, path: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.entries.insert(path.into(), value.into());
        self
    }

    /// Set `path` to the serialized form of `value`.
    pub fn set_serialized<T: Serialize>(
        &mut self,
        path: impl Into<String>,
        value: &T,
    ) -> CoreResult<&mut Self> {
        self.entries
            .insert(path.into(), serde_json::to_value(value)?);
        Ok(self)
    }

    /// The value written to `path`, if any.
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.entries.get(path)
    }

    /// Returns true if the patch writes nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of paths written.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over `(path, value)` pairs in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Fold another patch into this one; `other` wins on shared paths.
    pub fn merge(&mut self, other: Patch) {
        self.entries.extend(other.entries);
    }

    /// Apply every write to a copy of `entity` and return the result.
    pub fn apply_to(&self, entity: &Entity) -> CoreResult<Entity> {
        let mut doc = serde_json::to_value(entity)?;
        for (path, value) in &self.entries {
            write_path(&mut doc, path, value.clone())?;
        }
        Ok(serde_json::from_value(doc)?)
    }

    /// Returns true if applying the patch to `entity` would change nothing.
    pub fn is_noop_for(&self, entity: &Entity) -> CoreResult<bool> {
        let doc = serde_json::to_value(entity)?;
        Ok(self
            .entries
            .iter()
            .all(|(path, value)| read_path(&doc, path) == Some(value)))
    }
}

fn invalid(path: &str, reason: impl Into<String>) -> CoreError {
    CoreError::InvalidPath {
        path: path.to_string(),
        reason: reason.into(),
    }
}

fn write_path(doc: &mut Value, path: &str, value: Value) -> CoreResult<()> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(invalid(path, "empty segment"));
    }
    if PROTECTED.contains(&segments[0]) {
        return Err(invalid(path, "field is managed by the store"));
    }

    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| invalid(path, "empty path"))?;

    let mut cursor = doc;
    for segment in parents {
        if cursor.is_null() {
            *cursor = Value::Object(Map::new());
        }
        cursor = match cursor {
            Value::Object(map) => map
                .entry((*segment).to_string())
                .or_insert(Value::Null),
            Value::Array(items) => {
                let index = parse_index(path, segment)?;
                let len = items.len();
                items
                    .get_mut(index)
                    .ok_or_else(|| invalid(path, format!("index {index} out of {len}")))?
            }
            _ => return Err(invalid(path, format!("\"{segment}\" is not a container"))),
        };
    }

    if cursor.is_null() {
        *cursor = Value::Object(Map::new());
    }
    match cursor {
        Value::Object(map) => {
            map.insert((*last).to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            let index = parse_index(path, last)?;
            let len = items.len();
            let slot = items
                .get_mut(index)
                .ok_or_else(|| invalid(path, format!("index {index} out of {len}")))?;
            *slot = value;
            Ok(())
        }
        _ => Err(invalid(path, format!("\"{last}\" has no container"))),
    }
}

fn read_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |cursor, segment| match cursor {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => items.get(segment.parse::<usize>().ok()?),
        _ => None,
    })
}

fn parse_index(path: &str, segment: &str) -> CoreResult<usize> {
    segment
        .parse()
        .map_err(|_| invalid(path, format!("\"{segment}\" is not an array index")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeSet;
    use crate::component::CharacterComponent;
    use crate::entity::EntityKind;
    use crate::item::{Ammo, AmmoType, Item, ItemKind, WeaponData};
    use serde_json::json;

    fn pistol() -> Item {
        Item::new(
            "Laser Pistol",
            ItemKind::Weapon(WeaponData {
                damage: "1d6".to_string(),
                range: Default::default(),
                attack_bonus: 0,
                ammo: Ammo {
                    ammo_type: AmmoType::Typed("cell".to_string()),
                    value: 10,
                    burst: false,
                },
                trauma: None,
                skill: None,
                attribute: None,
            }),
        )
    }

    fn character() -> Entity {
        let mut entity = Entity::new(EntityKind::Character, "Kael").with_item(pistol());
        entity.components.character = Some(CharacterComponent::new(AttributeSet::default(), 1));
        entity
    }

    #[test]
    fn writes_nested_fields() {
        let entity = character();
        let mut patch = Patch::new();
        patch
            .set("components.character.equipment.ac.value", 14)
            .set("components.character.equipment.ac.from_armor", "Vest");

        let patched = patch.apply_to(&entity).unwrap();
        let equipment = &patched.components.character.unwrap().equipment;
        assert_eq!(equipment.ac.value, 14);
        assert_eq!(equipment.ac.from_armor.as_deref(), Some("Vest"));
    }

    #[test]
    fn writes_array_elements() {
        let entity = character();
        let mut patch = Patch::new();
        patch.set("items.0.ammo.value", 7);

        let patched = patch.apply_to(&entity).unwrap();
        assert_eq!(patched.items[0].as_weapon().unwrap().ammo.value, 7);
    }

    #[test]
    fn rejects_whole_patch_on_bad_path() {
        let entity = character();
        let mut patch = Patch::new();
        patch.set("items.0.ammo.value", 7).set("items.5.ammo.value", 1);
        assert!(matches!(
            patch.apply_to(&entity),
            Err(CoreError::InvalidPath { .. })
        ));
    }

    #[test]
    fn rejects_type_mismatch() {
        let entity = character();
        let mut patch = Patch::new();
        patch.set("components.character.level", "high");
        assert!(matches!(
            patch.apply_to(&entity),
            Err(CoreError::Serialization(_))
        ));
    }

    #[test]
    fn protects_store_managed_fields() {
        let entity = character();
        let mut patch = Patch::new();
        patch.set("version", 99);
        assert!(patch.apply_to(&entity).is_err());
    }

    #[test]
    fn creates_missing_optional_blocks() {
        let entity = character();
        let mut patch = Patch::new();
        patch.set(
            "components.faction",
            json!({"force": 1, "cunning": 2, "wealth": 3}),
        );
        let patched = patch.apply_to(&entity).unwrap();
        assert_eq!(patched.components.faction.unwrap().wealth, 3);
    }

    #[test]
    fn noop_detection() {
        let entity = character();
        let mut patch = Patch::new();
        patch.set("components.character.level", 1);
        assert!(patch.is_noop_for(&entity).unwrap());
        patch.set("components.character.level", 2);
        assert!(!patch.is_noop_for(&entity).unwrap());
    }

    #[test]
    fn merge_prefers_later_writes() {
        let mut a = Patch::new();
        a.set("components.character.level", 1);
        let mut b = Patch::new();
        b.set("components.character.level", 3).set("name", "Vey");
        a.merge(b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.get("components.character.level"), Some(&json!(3)));
    }

    proptest::proptest! {
        #[test]
        fn written_values_read_back(level in -50i32..50, ammo in 0i32..100) {
            let entity = character();
            let mut patch = Patch::new();
            patch
                .set("components.character.level", level)
                .set("items.0.ammo.value", ammo);

            let patched = patch.apply_to(&entity).unwrap();
            proptest::prop_assert_eq!(patched.components.character.as_ref().unwrap().level, level);
            proptest::prop_assert_eq!(patched.items[0].as_weapon().unwrap().ammo.value, ammo);
            proptest::prop_assert!(patch.is_noop_for(&patched).unwrap());
        }
    }
}
