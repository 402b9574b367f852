//! Initiative formulas and encounter turn order.
//!
//! Characters with the advantage flag roll 2d8 and keep the higher die.
//! Other characters roll 1d8 plus their dexterity modifier. NPCs and any
//! other kind roll a flat 1d8.

use sw_core::{Entity, EntityId, EntityKind};

use crate::attribute::modifier_of;
use crate::check::{CheckKind, CheckOutcome, CheckResult};
use crate::derived::require_character;
use crate::dice::{Bindings, DiceFormula, DiceRoller};
use crate::error::{MechError, MechResult};

/// The initiative formula for an entity.
pub fn select_initiative_formula(entity: &Entity) -> &'static str {
    match (&entity.kind, &entity.components.character) {
        (EntityKind::Character, Some(c)) if c.advantage_initiative => "2d8kh",
        (EntityKind::Character, _) => "1d8 + @dex",
        _ => "1d8",
    }
}

/// Roll initiative for an entity.
pub fn roll_initiative(entity: &Entity, roller: &mut impl DiceRoller) -> MechResult<CheckResult> {
    let formula = DiceFormula::parse(select_initiative_formula(entity))?;
    let mut bindings = Bindings::new();
    if formula.binding_names().next().is_some() {
        let dex = require_character(entity)?.attributes.dex;
        bindings.set("dex", modifier_of(dex));
    }

    Ok(CheckResult {
        kind: CheckKind::Initiative,
        label: format!("initiative ({})", entity.name),
        roll: formula.evaluate(&bindings, roller)?,
        outcome: CheckOutcome::Total,
    })
}

/// A combatant in an encounter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// The entity taking part.
    pub entity: EntityId,
    /// Display name.
    pub name: String,
    /// Initiative total (higher goes first).
    pub initiative: i32,
}

/// Turn order and round tracking for one fight.
#[derive(Debug, Clone, Default)]
pub struct Encounter {
    /// Participants in join order.
    pub participants: Vec<Participant>,
    /// Current round (0 before the encounter starts).
    pub round: u32,
    turn_index: usize,
    order: Vec<usize>,
}

impl Encounter {
    /// An empty encounter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a participant with a known initiative total.
    pub fn add(&mut self, entity: &Entity, initiative: i32) {
        self.participants.push(Participant {
            entity: entity.id,
            name: entity.name.clone(),
            initiative,
        });
    }

    /// Roll initiative for an entity and add it.
    pub fn join(&mut self, entity: &Entity, roller: &mut impl DiceRoller) -> MechResult<CheckResult> {
        let roll = roll_initiative(entity, roller)?;
        self.add(entity, roll.total());
        Ok(roll)
    }

    /// Sort by initiative and begin round 1. Ties keep join order.
    pub fn start(&mut self) {
        let mut order: Vec<usize> = (0..self.participants.len()).collect();
        order.sort_by(|&a, &b| {
            self.participants[b]
                .initiative
                .cmp(&self.participants[a].initiative)
        });
        self.order = order;
        self.round = 1;
        self.turn_index = 0;
    }

    /// Whose turn it is.
    pub fn current(&self) -> MechResult<&Participant> {
        let index = self
            .order
            .get(self.turn_index)
            .ok_or_else(|| MechError::Encounter("no active participant".to_string()))?;
        Ok(&self.participants[*index])
    }

    /// Participants in turn order.
    pub fn turn_order(&self) -> impl Iterator<Item = &Participant> {
        self.order.iter().map(|&i| &self.participants[i])
    }

    /// Advance to the next turn. Returns true if a new round started.
    pub fn next_turn(&mut self) -> bool {
        if self.order.is_empty() {
            return false;
        }
        self.turn_index += 1;
        if self.turn_index >= self.order.len() {
            self.turn_index = 0;
            self.round += 1;
            true
        } else {
            false
        }
    }

    /// Returns true before [`Encounter::start`].
    pub fn is_not_started(&self) -> bool {
        self.round == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedRoller;
    use sw_core::component::{CharacterComponent, NpcComponent};
    use sw_core::{Attribute, AttributeSet};

    fn character(name: &str, dex: i32, advantage: bool) -> Entity {
        let mut entity = Entity::new(EntityKind::Character, name);
        let mut c =
            CharacterComponent::new(AttributeSet::uniform(10).with(Attribute::Dex, dex), 1);
        c.advantage_initiative = advantage;
        entity.components.character = Some(c);
        entity
    }

    fn npc(name: &str) -> Entity {
        let mut entity = Entity::new(EntityKind::Npc, name);
        entity.components.npc = Some(NpcComponent::new(
            AttributeSet::uniform(10).with(Attribute::Dex, 18),
            8,
        ));
        entity
    }

    #[test]
    fn formula_per_kind() {
        assert_eq!(select_initiative_formula(&character("A", 10, true)), "2d8kh");
        assert_eq!(select_initiative_formula(&character("B", 10, false)), "1d8 + @dex");
        assert_eq!(select_initiative_formula(&npc("C")), "1d8");
        let vault = Entity::new(EntityKind::Custom("trap".to_string()), "Trap");
        assert_eq!(select_initiative_formula(&vault), "1d8");
    }

    #[test]
    fn advantage_keeps_higher_without_modifier() {
        let mut roller = ScriptedRoller::new([2, 7]);
        let roll = roll_initiative(&character("A", 18, true), &mut roller).unwrap();
        assert_eq!(roll.total(), 7);
        assert_eq!(roll.roll.count(), 2);
    }

    #[test]
    fn plain_characters_add_dex() {
        let mut roller = ScriptedRoller::new([5]);
        let roll = roll_initiative(&character("B", 14, false), &mut roller).unwrap();
        assert_eq!(roll.total(), 7);
    }

    #[test]
    fn npcs_ignore_dex() {
        let mut roller = ScriptedRoller::new([5]);
        let roll = roll_initiative(&npc("C"), &mut roller).unwrap();
        assert_eq!(roll.total(), 5);
    }

    #[test]
    fn encounter_lifecycle() {
        let mut encounter = Encounter::new();
        assert!(encounter.is_not_started());
        assert!(encounter.current().is_err());

        let alice = character("Alice", 10, false);
        let bob = npc("Bob");
        let cara = character("Cara", 10, false);
        encounter.add(&alice, 15);
        encounter.add(&bob, 10);
        encounter.add(&cara, 20);
        encounter.start();
        assert_eq!(encounter.round, 1);

        assert_eq!(encounter.current().unwrap().name, "Cara");
        assert!(!encounter.next_turn());
        assert_eq!(encounter.current().unwrap().name, "Alice");
        assert!(!encounter.next_turn());
        assert_eq!(encounter.current().unwrap().name, "Bob");
        assert!(encounter.next_turn());
        assert_eq!(encounter.round, 2);
        assert_eq!(encounter.current().unwrap().entity, cara.id);
    }

    #[test]
    fn ties_keep_join_order() {
        let mut encounter = Encounter::new();
        encounter.add(&npc("First"), 4);
        encounter.add(&npc("Second"), 4);
        encounter.add(&npc("Third"), 6);
        encounter.start();
        let names: Vec<&str> = encounter.turn_order().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Third", "First", "Second"]);
    }

    #[test]
    fn join_rolls_initiative() {
        let mut encounter = Encounter::new();
        let mut roller = ScriptedRoller::new([3, 8]);
        encounter.join(&npc("Slow"), &mut roller).unwrap();
        encounter.join(&npc("Fast"), &mut roller).unwrap();
        encounter.start();
        assert_eq!(encounter.current().unwrap().name, "Fast");
    }
}
