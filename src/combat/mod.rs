//! Combat rules: character state, conditions, validation, forced movement
//! and action dispatch
//!
//! Everything here is synchronous and owns no board or turn state; the
//! encounter in `battle` supplies both.

pub mod actions;
pub mod character;
pub mod conditions;
pub mod dispatcher;
pub mod forced_movement;
pub mod validation;

pub use actions::{
    Action, CardAction, CardModifier, Element, Modifier, SummonDefinition, UnknownAction,
    UnknownModifier,
};
pub use character::{ActiveCardStats, BaseStats, Character, CharacterClass};
pub use conditions::{
    apply_condition, consume_condition, control_conditions, damage_conditions,
    expire_round_based_conditions, is_incapacitated, negative_conditions, positive_conditions,
    remove_condition, Condition, ConditionDuration, ConditionSet, ConditionState, EffectDuration,
    EffectStore, RetaliateEffect, ShieldEffect,
};
pub use dispatcher::{
    ActionDispatcher, EffectApplicationResult, FailedModifier, HealIntent, ResolutionContext,
    SummonRequest, SummonSink,
};
pub use forced_movement::{
    apply_forced_movement, apply_pull, apply_push, apply_terrain_effects, apply_to_destination,
    forced_direction, get_all_valid_forced_movement_destinations, is_walkable_hex,
    ForcedMovementKind, ForcedMovementResult, TerrainEffectOutcome,
};
pub use validation::{
    validate_attack, validate_card_selection, validate_movement, ValidationResult,
};
