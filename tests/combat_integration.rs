//! Combat rules integration tests
//!
//! End-to-end checks of the rule scenarios: validation messages, condition
//! lifetimes across rounds, forced movement against a real map and the
//! dispatcher's collect-errors handling of modifiers.

use hexhaven_combat::battle::{BattleMap, HexCoord, HexFeature, OpenBoard, TerrainType};
use hexhaven_combat::combat::{
    apply_condition, apply_pull, apply_push, apply_to_destination, expire_round_based_conditions,
    get_all_valid_forced_movement_destinations, is_incapacitated, validate_attack,
    validate_movement, Action, ActionDispatcher, BaseStats, CardAction, CardModifier, Character,
    CharacterClass, Condition, ConditionDuration, EffectStore, ForcedMovementKind, Modifier,
    ResolutionContext, SummonRequest,
};
use hexhaven_combat::core::PlayerId;

fn scout_at(q: i32, r: i32, movement: u32, range: u32) -> Character {
    Character::with_stats("Scout", BaseStats::new(10, movement, 2, range), HexCoord::new(q, r))
}

fn dispatch(
    action: Action,
    source: &mut Character,
    target: Option<&mut Character>,
    effects: &mut EffectStore,
) -> hexhaven_combat::combat::EffectApplicationResult {
    let mut summons: Vec<SummonRequest> = Vec::new();
    let mut ctx = ResolutionContext {
        effects,
        board: &OpenBoard,
        round: 1,
        summons: &mut summons,
    };
    ActionDispatcher::default().apply_action(&mut ctx, &CardAction::Known(action), source, target)
}

#[test]
fn test_move_three_hexes_with_movement_two() {
    let c = scout_at(0, 0, 2, 1);
    let result = validate_movement(&c, HexCoord::new(3, 0), &[], &[]);

    assert!(!result.valid);
    let error = result.error.expect("error text");
    assert!(error.contains('3'), "missing distance: {}", error);
    assert!(error.contains('2'), "missing movement: {}", error);
}

#[test]
fn test_stun_lifecycle_across_rounds() {
    let mut c = scout_at(0, 0, 2, 2);
    let target = HexCoord::new(1, 0);

    apply_condition(&mut c, Condition::Stun, ConditionDuration::Round, 3, None);
    assert!(!validate_attack(&c, target, true).valid);
    assert!(!validate_movement(&c, target, &[], &[]).valid);
    assert!(is_incapacitated(&c));

    // Nothing expires within the round it was applied
    assert!(expire_round_based_conditions(&mut c, 3).is_empty());

    let expired = expire_round_based_conditions(&mut c, 4);
    assert_eq!(expired, vec![Condition::Stun]);
    assert!(validate_attack(&c, target, true).valid);
    assert!(validate_movement(&c, target, &[], &[]).valid);
}

#[test]
fn test_expiry_leaves_other_durations() {
    let mut c = scout_at(0, 0, 2, 1);
    apply_condition(&mut c, Condition::Muddle, ConditionDuration::Round, 1, None);
    apply_condition(&mut c, Condition::Regenerate, ConditionDuration::Persistent, 1, None);
    apply_condition(&mut c, Condition::Poison, ConditionDuration::UntilConsumed, 1, None);

    let expired = expire_round_based_conditions(&mut c, 2);

    assert_eq!(expired, vec![Condition::Muddle]);
    assert!(c.has_condition(Condition::Regenerate));
    assert!(c.has_condition(Condition::Poison));
}

#[test]
fn test_attack_range_boundary_messages() {
    let c = scout_at(0, 0, 2, 2);
    assert!(validate_attack(&c, HexCoord::new(2, 0), true).valid);

    let result = validate_attack(&c, HexCoord::new(3, 0), true);
    assert!(!result.valid);
    assert_eq!(
        result.error.as_deref(),
        Some("Target is 3 hexes away but range is only 2")
    );
}

#[test]
fn test_heal_self_scenario() {
    let mut effects = EffectStore::new();
    let mut source = scout_at(0, 0, 2, 1);
    source.take_damage(5).expect("valid amount");

    let result = dispatch(
        Action::Heal {
            value: 3,
            modifiers: vec![],
        },
        &mut source,
        None,
        &mut effects,
    );

    assert!(result.success);
    assert_eq!(source.current_health, 8);
    assert_eq!(result.affected_entities, vec![source.id]);
}

#[test]
fn test_bad_modifier_does_not_void_poison() {
    let mut effects = EffectStore::new();
    let mut source = scout_at(0, 0, 2, 1);
    let mut target = scout_at(1, 0, 2, 1);

    let modifiers: Vec<CardModifier> = serde_json::from_value(serde_json::json!([
        { "type": "unknown_x" },
        { "type": "condition", "kind": "poison", "duration": "round" }
    ]))
    .expect("modifier list parses");

    let result = dispatch(
        Action::Attack {
            value: 1,
            modifiers,
        },
        &mut source,
        Some(&mut target),
        &mut effects,
    );

    assert!(result.success);
    assert!(target.has_condition(Condition::Poison));
    assert_eq!(result.failed_modifiers.len(), 1);
    assert_eq!(result.failed_modifiers[0].modifier.type_name(), "unknown_x");
    assert!(result.failed_modifiers[0].reason.contains("unknown_x"));
}

#[test]
fn test_precondition_matrix() {
    let mut effects = EffectStore::new();
    let mut source = Character::new(
        "Cragheart",
        CharacterClass::Cragheart,
        PlayerId::new(),
        HexCoord::new(0, 0),
    );
    let mut target = scout_at(1, 0, 2, 1);

    let attack = || Action::Attack {
        value: 1,
        modifiers: vec![],
    };
    let movement = || Action::Move {
        value: 2,
        modifiers: vec![],
    };
    let heal = || Action::Heal {
        value: 1,
        modifiers: vec![],
    };
    let loot = || Action::Loot {
        value: None,
        modifiers: vec![],
    };

    source.add_condition(Condition::Immobilize);
    assert!(dispatch(attack(), &mut source, Some(&mut target), &mut effects).success);
    assert!(!dispatch(movement(), &mut source, None, &mut effects).success);
    assert!(dispatch(heal(), &mut source, None, &mut effects).success);
    assert!(dispatch(loot(), &mut source, None, &mut effects).success);
    source.remove_condition(Condition::Immobilize);

    source.add_condition(Condition::Disarm);
    assert!(!dispatch(attack(), &mut source, Some(&mut target), &mut effects).success);
    assert!(dispatch(movement(), &mut source, None, &mut effects).success);
    assert!(dispatch(heal(), &mut source, None, &mut effects).success);
    assert!(dispatch(loot(), &mut source, None, &mut effects).success);
    source.remove_condition(Condition::Disarm);

    source.add_condition(Condition::Stun);
    assert!(!dispatch(attack(), &mut source, Some(&mut target), &mut effects).success);
    assert!(!dispatch(movement(), &mut source, None, &mut effects).success);
    assert!(dispatch(heal(), &mut source, None, &mut effects).success);
    assert!(!dispatch(loot(), &mut source, None, &mut effects).success);
}

#[test]
fn test_push_and_pull_on_open_board() {
    let source = HexCoord::new(0, 0);
    let mut target = scout_at(1, -1, 2, 1);

    let pushed = apply_push(&mut target, source, 2, &OpenBoard);
    assert!(pushed.success);
    assert_eq!(pushed.steps_taken, 2);
    assert_eq!(source.distance(&target.position), 3);

    let pulled = apply_pull(&mut target, source, 2, &OpenBoard);
    assert!(pulled.success);
    assert_eq!(source.distance(&target.position), 1);
}

#[test]
fn test_destinations_on_walled_map() {
    let mut map = BattleMap::with_radius(HexCoord::new(0, 0), 4);
    map.add_feature(HexCoord::new(2, 0), HexFeature::Wall);
    map.set_terrain(HexCoord::new(2, -1), TerrainType::Obstacle);
    let source = HexCoord::new(0, 0);
    let target = scout_at(1, 0, 2, 1);

    let found = get_all_valid_forced_movement_destinations(
        &target,
        source,
        1,
        ForcedMovementKind::Push,
        &map,
    );

    assert!(!found.contains(&HexCoord::new(2, 0)));
    assert!(!found.contains(&HexCoord::new(2, -1)));
    assert_eq!(found, vec![HexCoord::new(1, 1)]);
}

#[test]
fn test_boxed_in_target_has_no_destinations() {
    let mut map = BattleMap::with_radius(HexCoord::new(0, 0), 5);
    let target_pos = HexCoord::new(2, 0);
    for hex in target_pos.neighbors() {
        map.set_terrain(hex, TerrainType::Obstacle);
    }
    let target = scout_at(2, 0, 2, 1);

    for kind in [ForcedMovementKind::Push, ForcedMovementKind::Pull] {
        for distance in 1..=3 {
            let found = get_all_valid_forced_movement_destinations(
                &target,
                HexCoord::new(0, 0),
                distance,
                kind,
                &map,
            );
            assert!(found.is_empty(), "{:?} {} found {:?}", kind, distance, found);
        }
    }
}

#[test]
fn test_apply_chosen_destination() {
    let mut target = scout_at(1, 0, 2, 1);
    let result = apply_to_destination(&mut target, HexCoord::new(2, 1));
    assert!(result.success);
    assert_eq!(result.final_position, HexCoord::new(2, 1));
    assert_eq!(target.position, HexCoord::new(2, 1));
}

#[test]
fn test_shield_modifier_lifetime() {
    let mut effects = EffectStore::new();
    let mut source = scout_at(0, 0, 2, 1);

    let modifiers: Vec<CardModifier> = vec![
        Modifier::Shield {
            value: 1,
            duration: hexhaven_combat::combat::EffectDuration::Persistent,
        }
        .into(),
        Modifier::Retaliate {
            value: 2,
            range: Some(2),
            duration: hexhaven_combat::combat::EffectDuration::Round,
        }
        .into(),
    ];
    let result = dispatch(Action::Special { modifiers }, &mut source, None, &mut effects);
    assert!(result.success);
    assert_eq!(result.applied_modifiers.len(), 2);

    effects.clear_round_effects(source.id);
    assert_eq!(effects.shield_value(source.id), 1);
    assert!(effects.retaliate(source.id).is_none());
}
