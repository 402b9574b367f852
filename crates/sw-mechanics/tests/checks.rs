//! Integration tests for check resolution.

use sw_core::component::{CharacterComponent, NpcComponent};
use sw_core::item::{Ammo, AmmoType, GearData, RangeClass, SkillData, TraumaProfile, WeaponData};
use sw_core::{
    Attribute, AttributeSet, CoreError, Entity, EntityKind, EntityStore, Item, ItemId, ItemKind,
    MemoryStore, Patch,
};
use sw_mechanics::check::{
    ItemCheck, resolve_damage_roll, resolve_morale_check, resolve_save_check,
    resolve_skill_check, resolve_weapon_attack,
};
use sw_mechanics::{
    CheckOutcome, CheckRequest, MechError, MemorySink, RuleConfig, ScriptedRoller, TraumaRule,
    report, resolve_check_for,
};

fn laser_rifle(rounds: i32) -> Item {
    Item::new(
        "Laser Rifle",
        ItemKind::Weapon(WeaponData {
            damage: "1d10".to_string(),
            range: RangeClass::Ranged,
            attack_bonus: 1,
            ammo: Ammo {
                ammo_type: AmmoType::Typed("cell".to_string()),
                value: rounds,
                burst: true,
            },
            trauma: Some(TraumaProfile {
                die: "1d6".to_string(),
                rating: 3,
            }),
            skill: Some("Shoot".to_string()),
            attribute: None,
        }),
    )
    .equipped()
}

fn knife() -> Item {
    Item::new(
        "Knife",
        ItemKind::Weapon(WeaponData {
            damage: "1d4 + @str".to_string(),
            range: RangeClass::Melee,
            attack_bonus: 0,
            ammo: Ammo::default(),
            trauma: None,
            skill: None,
            attribute: None,
        }),
    )
}

/// Kael: Dex 14 (+2), Str 12 (+1), Shoot-1.
fn kael(weapon: Item) -> (Entity, ItemId) {
    let mut entity = Entity::new(EntityKind::Character, "Kael");
    entity.components.character = Some(CharacterComponent::new(
        AttributeSet::uniform(10)
            .with(Attribute::Dex, 14)
            .with(Attribute::Str, 12),
        1,
    ));
    let id = weapon.id;
    let entity = entity.with_item(weapon).with_item(Item::new(
        "Shoot",
        ItemKind::Skill(SkillData {
            rank: 1,
            attribute: Attribute::Dex,
        }),
    ));
    (entity, id)
}

async fn setup(weapon: Item) -> (MemoryStore, Entity, ItemId) {
    let store = MemoryStore::new();
    let (entity, weapon) = kael(weapon);
    let id = store.insert(entity).await.unwrap();
    let snapshot = store.get(id).await.unwrap();
    (store, snapshot, weapon)
}

fn rounds_left(entity: &Entity, weapon: ItemId) -> i32 {
    entity.item(weapon).unwrap().as_weapon().unwrap().ammo.value
}

#[tokio::test]
async fn attack_debits_one_round_through_store() {
    let (store, kael, rifle) = setup(laser_rifle(10)).await;
    let mut roller = ScriptedRoller::new([12, 7]);

    let result = resolve_weapon_attack(
        &store,
        &kael,
        rifle,
        &CheckRequest::default(),
        &RuleConfig::default(),
        &mut roller,
    )
    .await
    .unwrap();

    // 12 + dex 2 + skill 1 + attack bonus 1
    assert_eq!(result.attack.total(), 16);
    assert_eq!(result.damage_total(), 7);
    assert_eq!(result.ammo_spent, 1);
    assert!(result.trauma.is_none());

    let after = store.get(kael.id).await.unwrap();
    assert_eq!(rounds_left(&after, rifle), 9);
    assert_eq!(after.version, kael.version + 1);
}

#[tokio::test]
async fn burst_spends_three_and_adds_two() {
    let (store, kael, rifle) = setup(laser_rifle(10)).await;
    let mut roller = ScriptedRoller::new([12, 7]);

    let result = resolve_weapon_attack(
        &store,
        &kael,
        rifle,
        &CheckRequest::default().burst(),
        &RuleConfig::default(),
        &mut roller,
    )
    .await
    .unwrap();

    assert!(result.burst);
    assert_eq!(result.attack.total(), 18);
    assert_eq!(result.damage.total(), 9);
    assert_eq!(result.ammo_spent, 3);
    assert_eq!(rounds_left(&store.get(kael.id).await.unwrap(), rifle), 7);
}

#[tokio::test]
async fn burst_with_two_rounds_aborts_before_anything_happens() {
    let (store, kael, rifle) = setup(laser_rifle(2)).await;
    let mut roller = ScriptedRoller::new([12, 7]);
    let mut sink = MemorySink::new();

    let outcome = report(
        resolve_weapon_attack(
            &store,
            &kael,
            rifle,
            &CheckRequest::default().burst(),
            &RuleConfig::default(),
            &mut roller,
        )
        .await,
        &mut sink,
    )
    .unwrap();

    assert!(outcome.is_none());
    assert_eq!(
        sink.warning_messages(),
        vec!["Laser Rifle cannot burst fire (2 rounds left)".to_string()]
    );
    assert!(sink.results.is_empty());
    assert_eq!(roller.rolled(), 0);

    let after = store.get(kael.id).await.unwrap();
    assert_eq!(rounds_left(&after, rifle), 2);
    assert_eq!(after.version, kael.version);
}

#[tokio::test]
async fn empty_weapon_warns() {
    let (store, kael, rifle) = setup(laser_rifle(0)).await;
    let mut roller = ScriptedRoller::new([12]);
    let mut sink = MemorySink::new();

    let outcome = report(
        resolve_weapon_attack(
            &store,
            &kael,
            rifle,
            &CheckRequest::default(),
            &RuleConfig::default(),
            &mut roller,
        )
        .await,
        &mut sink,
    )
    .unwrap();

    assert!(outcome.is_none());
    assert_eq!(sink.warning_messages(), vec!["Laser Rifle is out of ammo"]);
    assert_eq!(roller.rolled(), 0);
}

#[tokio::test]
async fn unmetered_melee_weapon_spends_nothing() {
    let (store, kael, knife) = setup(knife()).await;
    let mut roller = ScriptedRoller::new([10, 3]);

    let result = resolve_weapon_attack(
        &store,
        &kael,
        knife,
        &CheckRequest::default(),
        &RuleConfig::default(),
        &mut roller,
    )
    .await
    .unwrap();

    // melee falls back to strength
    assert_eq!(result.attack.total(), 11);
    assert_eq!(result.damage.total(), 4);
    assert_eq!(result.ammo_spent, 0);
    assert_eq!(store.get(kael.id).await.unwrap().version, kael.version);
}

#[tokio::test]
async fn stale_snapshot_cannot_spend_ammo() {
    let (store, kael, rifle) = setup(laser_rifle(10)).await;
    let mut rename = Patch::new();
    rename.set("name", "Kael Voss");
    store.apply_patch(kael.id, &rename, None).await.unwrap();

    let mut roller = ScriptedRoller::new([12, 7]);
    let mut sink = MemorySink::new();
    let err = report(
        resolve_weapon_attack(
            &store,
            &kael,
            rifle,
            &CheckRequest::default(),
            &RuleConfig::default(),
            &mut roller,
        )
        .await,
        &mut sink,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        MechError::Store(CoreError::VersionConflict { .. })
    ));
    assert!(sink.warnings.is_empty());
    assert_eq!(roller.rolled(), 0);
    assert_eq!(rounds_left(&store.get(kael.id).await.unwrap(), rifle), 10);
}

#[tokio::test]
async fn trauma_rule_multiplies_damage() {
    let config = RuleConfig::default().with_trauma_rule(TraumaRule::On);

    let (store, kael, rifle) = setup(laser_rifle(10)).await;
    let mut roller = ScriptedRoller::new([12, 7, 6]);
    let request = CheckRequest::default();
    let hit = resolve_weapon_attack(&store, &kael, rifle, &request, &config, &mut roller)
        .await
        .unwrap();
    let trauma = hit.trauma.as_ref().unwrap();
    assert!(trauma.traumatic);
    assert_eq!(trauma.roll.outcome, CheckOutcome::Success { target: 6 });
    assert_eq!(hit.damage_total(), 21);

    let (store, kael, rifle) = setup(laser_rifle(10)).await;
    let mut roller = ScriptedRoller::new([12, 7, 5]);
    let graze = resolve_weapon_attack(&store, &kael, rifle, &request, &config, &mut roller)
        .await
        .unwrap();
    assert!(!graze.trauma.as_ref().unwrap().traumatic);
    assert_eq!(graze.damage_total(), 7);
}

#[tokio::test]
async fn lower_trauma_target_makes_more_hits_traumatic() {
    let config = RuleConfig::default().with_trauma_rule(TraumaRule::On);
    let (store, kael, rifle) = setup(laser_rifle(10)).await;
    let request = CheckRequest {
        trauma_target: 4,
        ..CheckRequest::default()
    };
    let mut roller = ScriptedRoller::new([12, 7, 4]);
    let hit = resolve_weapon_attack(&store, &kael, rifle, &request, &config, &mut roller)
        .await
        .unwrap();
    assert!(hit.trauma.unwrap().traumatic);
}

#[tokio::test]
async fn reported_attack_records_every_roll() {
    let (store, kael, rifle) = setup(laser_rifle(10)).await;
    let item = kael.item(rifle).unwrap().clone();
    let mut roller = ScriptedRoller::new([12, 7, 6]);
    let mut sink = MemorySink::new();
    let config = RuleConfig::default().with_trauma_rule(TraumaRule::On);

    let check = report(
        resolve_check_for(
            &store,
            Some(&kael),
            &item,
            &CheckRequest::default(),
            &config,
            &mut roller,
        )
        .await,
        &mut sink,
    )
    .unwrap()
    .unwrap();

    assert!(matches!(check, ItemCheck::Attack(_)));
    let labels: Vec<&str> = sink.results.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "Laser Rifle (Kael)",
            "Laser Rifle damage (Kael)",
            "Laser Rifle trauma (Kael)"
        ]
    );
}

#[tokio::test]
async fn dispatcher_rolls_skills_and_rejects_gear() {
    let (store, kael, _) = setup(knife()).await;
    let shoot = kael.find_item("shoot").unwrap().clone();
    let mut roller = ScriptedRoller::new([3, 4]);

    let check = resolve_check_for(
        &store,
        Some(&kael),
        &shoot,
        &CheckRequest::default(),
        &RuleConfig::default(),
        &mut roller,
    )
    .await
    .unwrap();
    let ItemCheck::Skill(result) = check else {
        panic!("expected a skill check");
    };
    // 3 + 4 + rank 1 + dex 2
    assert_eq!(result.total(), 10);

    let rope = Item::new("Rope", ItemKind::Gear(GearData::default()));
    let mut sink = MemorySink::new();
    let outcome = report(
        resolve_check_for(
            &store,
            Some(&kael),
            &rope,
            &CheckRequest::default(),
            &RuleConfig::default(),
            &mut roller,
        )
        .await,
        &mut sink,
    )
    .unwrap();
    assert!(outcome.is_none());
    assert_eq!(sink.warning_messages(), vec!["Rope (gear) cannot be rolled"]);
}

#[tokio::test]
async fn ownerless_items_have_no_actor() {
    let store = MemoryStore::new();
    let mut roller = ScriptedRoller::new([10]);
    let mut sink = MemorySink::new();
    let outcome = report(
        resolve_check_for(
            &store,
            None,
            &laser_rifle(10),
            &CheckRequest::default(),
            &RuleConfig::default(),
            &mut roller,
        )
        .await,
        &mut sink,
    )
    .unwrap();
    assert!(outcome.is_none());
    assert_eq!(
        sink.warning_messages(),
        vec!["Laser Rifle has no owner to roll for"]
    );
}

#[test]
fn damage_roll_alone_touches_no_ammo() {
    let (kael, rifle) = kael(laser_rifle(10));
    let mut roller = ScriptedRoller::new([5]);
    let damage = resolve_damage_roll(&kael, rifle, 2, &mut roller).unwrap();
    assert_eq!(damage.total(), 7);
    assert_eq!(rounds_left(&kael, rifle), 10);
}

#[test]
fn morale_holds_at_score_and_breaks_above() {
    let mut bandit = Entity::new(EntityKind::Npc, "Bandit");
    bandit.components.npc = Some(NpcComponent::new(AttributeSet::default(), 7));

    let held = resolve_morale_check(&bandit, &mut ScriptedRoller::new([3, 4])).unwrap();
    assert_eq!(held.succeeded(), Some(true));

    let broke = resolve_morale_check(&bandit, &mut ScriptedRoller::new([4, 4])).unwrap();
    assert_eq!(broke.succeeded(), Some(false));
    assert_eq!(broke.outcome, CheckOutcome::Failure { target: 7 });
}

#[test]
fn save_and_skill_misses_become_warnings() {
    let (kael, _) = kael(knife());
    let config = RuleConfig::default();
    let mut roller = ScriptedRoller::new([12]);
    let mut sink = MemorySink::new();

    let evasion = report(
        resolve_save_check(&kael, "evasion", &config, &mut roller),
        &mut sink,
    )
    .unwrap()
    .unwrap();
    assert_eq!(evasion.outcome, CheckOutcome::Success { target: 12 });

    report(
        resolve_save_check(&kael, "courage", &config, &mut roller),
        &mut sink,
    )
    .unwrap();
    report(
        resolve_skill_check(&kael, "Pilot", &CheckRequest::default(), &config, &mut roller),
        &mut sink,
    )
    .unwrap();

    assert_eq!(sink.results.len(), 1);
    assert_eq!(
        sink.warning_messages(),
        vec!["Kael has no courage save", "Kael has no skill named Pilot"]
    );
}

#[test]
fn contract_violations_are_not_warnings() {
    let hollow = Entity::new(EntityKind::Character, "Hollow");
    let mut sink = MemorySink::new();
    let err = report(
        resolve_save_check(
            &hollow,
            "evasion",
            &RuleConfig::default(),
            &mut ScriptedRoller::new([10]),
        ),
        &mut sink,
    )
    .unwrap_err();
    assert!(matches!(err, MechError::ContractViolation { .. }));
    assert!(sink.warnings.is_empty());
}
