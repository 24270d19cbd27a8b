//! Conditions and keyed round effects
//!
//! A character's conditions live in one ordered map from condition kind to
//! its duration record, so membership and duration can never disagree.
//! Shield and retaliate are not conditions; they live in an `EffectStore`
//! keyed by character id.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::combat::character::Character;
use crate::core::types::{CharacterId, Round};

/// Named status effects
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Poison,
    Wound,
    Muddle,
    Immobilize,
    Disarm,
    Stun,
    Curse,
    Brittle,
    Bane,
    Strengthen,
    Bless,
    Invisible,
    Regenerate,
    Ward,
}

pub const NEGATIVE_CONDITIONS: [Condition; 9] = [
    Condition::Poison,
    Condition::Wound,
    Condition::Muddle,
    Condition::Immobilize,
    Condition::Disarm,
    Condition::Stun,
    Condition::Curse,
    Condition::Brittle,
    Condition::Bane,
];

pub const POSITIVE_CONDITIONS: [Condition; 5] = [
    Condition::Strengthen,
    Condition::Bless,
    Condition::Invisible,
    Condition::Regenerate,
    Condition::Ward,
];

/// Conditions that change how much damage a character takes
pub const DAMAGE_CONDITIONS: [Condition; 4] = [
    Condition::Poison,
    Condition::Wound,
    Condition::Brittle,
    Condition::Bane,
];

/// Conditions that restrict what a character may do on its turn
pub const CONTROL_CONDITIONS: [Condition; 4] = [
    Condition::Immobilize,
    Condition::Disarm,
    Condition::Stun,
    Condition::Muddle,
];

impl Condition {
    pub fn is_negative(self) -> bool {
        NEGATIVE_CONDITIONS.contains(&self)
    }

    pub fn is_positive(self) -> bool {
        POSITIVE_CONDITIONS.contains(&self)
    }

    pub fn is_damage(self) -> bool {
        DAMAGE_CONDITIONS.contains(&self)
    }

    pub fn is_control(self) -> bool {
        CONTROL_CONDITIONS.contains(&self)
    }

    /// Duration used when a card does not print one
    pub fn default_duration(self) -> ConditionDuration {
        match self {
            Condition::Muddle
            | Condition::Immobilize
            | Condition::Disarm
            | Condition::Stun
            | Condition::Strengthen
            | Condition::Invisible => ConditionDuration::Round,
            Condition::Poison
            | Condition::Wound
            | Condition::Curse
            | Condition::Bless
            | Condition::Brittle
            | Condition::Ward => ConditionDuration::UntilConsumed,
            Condition::Regenerate | Condition::Bane => ConditionDuration::Persistent,
        }
    }
}

/// How a condition leaves a character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionDuration {
    /// Expires at the next round boundary
    Round,
    /// Stays until explicitly removed
    Persistent,
    /// Removed by a triggering event such as a heal
    #[serde(alias = "until-consumed")]
    UntilConsumed,
}

/// Duration record for one condition on one character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionState {
    pub duration: ConditionDuration,
    pub applied_round: Round,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl ConditionState {
    pub fn new(duration: ConditionDuration, applied_round: Round) -> Self {
        Self {
            duration,
            applied_round,
            metadata: None,
        }
    }
}

/// Ordered map from condition kind to its duration record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionSet {
    entries: BTreeMap<Condition, ConditionState>,
}

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, kind: Condition) -> bool {
        self.entries.contains_key(&kind)
    }

    pub fn get(&self, kind: Condition) -> Option<&ConditionState> {
        self.entries.get(&kind)
    }

    /// Insert only if the kind is not already present. Returns true if inserted.
    pub fn insert_if_absent(&mut self, kind: Condition, state: ConditionState) -> bool {
        if self.entries.contains_key(&kind) {
            return false;
        }
        self.entries.insert(kind, state);
        true
    }

    /// Insert or overwrite the record for a kind, returning the old record
    pub fn replace(&mut self, kind: Condition, state: ConditionState) -> Option<ConditionState> {
        self.entries.insert(kind, state)
    }

    pub fn remove(&mut self, kind: Condition) -> Option<ConditionState> {
        self.entries.remove(&kind)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Active kinds in a stable order
    pub fn kinds(&self) -> impl Iterator<Item = Condition> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Condition, &ConditionState)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    fn drain_matching(&mut self, mut pred: impl FnMut(&ConditionState) -> bool) -> Vec<Condition> {
        let expired: Vec<Condition> = self
            .entries
            .iter()
            .filter(|(_, state)| pred(*state))
            .map(|(kind, _)| *kind)
            .collect();
        for kind in &expired {
            self.entries.remove(kind);
        }
        expired
    }
}

// ============================================================================
// Condition operations
// ============================================================================

/// Apply a condition. Reapplying a kind replaces its duration record.
pub fn apply_condition(
    character: &mut Character,
    kind: Condition,
    duration: ConditionDuration,
    applied_round: Round,
    metadata: Option<serde_json::Value>,
) {
    let state = ConditionState {
        duration,
        applied_round,
        metadata,
    };
    let previous = character.conditions.replace(kind, state);
    debug!(
        character = %character.id,
        ?kind,
        ?duration,
        round = applied_round,
        replaced = previous.is_some(),
        "condition applied"
    );
}

/// Remove a condition and its duration record. No-op if absent.
pub fn remove_condition(character: &mut Character, kind: Condition) {
    if character.conditions.remove(kind).is_some() {
        debug!(character = %character.id, ?kind, "condition removed");
    }
}

/// Remove every round-duration condition applied before `current_round`
pub fn expire_round_based_conditions(
    character: &mut Character,
    current_round: Round,
) -> Vec<Condition> {
    let expired = character.conditions.drain_matching(|state| {
        state.duration == ConditionDuration::Round && state.applied_round < current_round
    });
    if !expired.is_empty() {
        debug!(character = %character.id, ?expired, round = current_round, "conditions expired");
    }
    expired
}

/// Remove a condition only if it is held until consumed
pub fn consume_condition(character: &mut Character, kind: Condition) -> bool {
    let consumable = character
        .conditions
        .get(kind)
        .is_some_and(|state| state.duration == ConditionDuration::UntilConsumed);
    if consumable {
        character.conditions.remove(kind);
        debug!(character = %character.id, ?kind, "condition consumed");
    }
    consumable
}

pub fn negative_conditions(character: &Character) -> Vec<Condition> {
    character.conditions.kinds().filter(|c| c.is_negative()).collect()
}

pub fn positive_conditions(character: &Character) -> Vec<Condition> {
    character.conditions.kinds().filter(|c| c.is_positive()).collect()
}

pub fn damage_conditions(character: &Character) -> Vec<Condition> {
    character.conditions.kinds().filter(|c| c.is_damage()).collect()
}

pub fn control_conditions(character: &Character) -> Vec<Condition> {
    character.conditions.kinds().filter(|c| c.is_control()).collect()
}

pub fn is_incapacitated(character: &Character) -> bool {
    character.is_stunned() || character.is_immobilized() || character.is_disarmed()
}

// ============================================================================
// Shield / retaliate store
// ============================================================================

/// Lifetime of a shield or retaliate bonus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EffectDuration {
    /// Cleared at the end of the round
    #[default]
    Round,
    /// Stays until removed
    Persistent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldEffect {
    pub value: u32,
    pub duration: EffectDuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetaliateEffect {
    pub value: u32,
    pub range: u32,
    pub duration: EffectDuration,
}

/// Shield and retaliate effects keyed by character
#[derive(Debug, Clone, Default)]
pub struct EffectStore {
    shields: AHashMap<CharacterId, ShieldEffect>,
    retaliates: AHashMap<CharacterId, RetaliateEffect>,
}

impl EffectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any shield held by `id`
    pub fn apply_shield(&mut self, id: CharacterId, value: u32, duration: EffectDuration) {
        self.shields.insert(id, ShieldEffect { value, duration });
        debug!(character = %id, value, ?duration, "shield applied");
    }

    /// Replace any retaliate held by `id`
    pub fn apply_retaliate(
        &mut self,
        id: CharacterId,
        value: u32,
        range: u32,
        duration: EffectDuration,
    ) {
        self.retaliates.insert(
            id,
            RetaliateEffect {
                value,
                range,
                duration,
            },
        );
        debug!(character = %id, value, range, ?duration, "retaliate applied");
    }

    pub fn shield(&self, id: CharacterId) -> Option<&ShieldEffect> {
        self.shields.get(&id)
    }

    pub fn retaliate(&self, id: CharacterId) -> Option<&RetaliateEffect> {
        self.retaliates.get(&id)
    }

    /// Current shield value, 0 when none
    pub fn shield_value(&self, id: CharacterId) -> u32 {
        self.shields.get(&id).map(|s| s.value).unwrap_or(0)
    }

    /// Drop round-duration entries for `id`, leaving persistent ones
    pub fn clear_round_effects(&mut self, id: CharacterId) {
        if self
            .shields
            .get(&id)
            .is_some_and(|s| s.duration == EffectDuration::Round)
        {
            self.shields.remove(&id);
        }
        if self
            .retaliates
            .get(&id)
            .is_some_and(|r| r.duration == EffectDuration::Round)
        {
            self.retaliates.remove(&id);
        }
    }

    /// Drop everything held by `id`
    pub fn remove_all(&mut self, id: CharacterId) {
        self.shields.remove(&id);
        self.retaliates.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::hex::HexCoord;
    use crate::combat::character::{BaseStats, Character};

    fn dummy() -> Character {
        Character::with_stats("Dummy", BaseStats::new(10, 2, 2, 1), HexCoord::new(0, 0))
    }

    #[test]
    fn test_reapply_replaces_record() {
        let mut c = dummy();
        apply_condition(&mut c, Condition::Poison, ConditionDuration::Round, 1, None);
        apply_condition(&mut c, Condition::Poison, ConditionDuration::Persistent, 2, None);

        assert_eq!(c.conditions.len(), 1);
        let state = c.conditions.get(Condition::Poison).expect("poisoned");
        assert_eq!(state.duration, ConditionDuration::Persistent);
        assert_eq!(state.applied_round, 2);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut c = dummy();
        remove_condition(&mut c, Condition::Stun);
        assert!(c.conditions.is_empty());
    }

    #[test]
    fn test_expire_only_round_conditions() {
        let mut c = dummy();
        apply_condition(&mut c, Condition::Stun, ConditionDuration::Round, 3, None);
        apply_condition(&mut c, Condition::Regenerate, ConditionDuration::Persistent, 3, None);
        apply_condition(&mut c, Condition::Poison, ConditionDuration::UntilConsumed, 3, None);

        assert!(expire_round_based_conditions(&mut c, 3).is_empty());
        assert!(c.is_stunned());

        let expired = expire_round_based_conditions(&mut c, 4);
        assert_eq!(expired, vec![Condition::Stun]);
        assert!(!c.is_stunned());
        assert!(c.has_condition(Condition::Regenerate));
        assert!(c.has_condition(Condition::Poison));
    }

    #[test]
    fn test_consume_only_until_consumed() {
        let mut c = dummy();
        apply_condition(&mut c, Condition::Bless, ConditionDuration::UntilConsumed, 1, None);
        apply_condition(&mut c, Condition::Strengthen, ConditionDuration::Round, 1, None);

        assert!(!consume_condition(&mut c, Condition::Strengthen));
        assert!(c.has_condition(Condition::Strengthen));
        assert!(consume_condition(&mut c, Condition::Bless));
        assert!(!c.has_condition(Condition::Bless));
        assert!(!consume_condition(&mut c, Condition::Bless));
    }

    #[test]
    fn test_category_tables() {
        assert!(Condition::Stun.is_negative() && Condition::Stun.is_control());
        assert!(Condition::Bless.is_positive() && !Condition::Bless.is_negative());
        assert!(Condition::Wound.is_damage());
        assert!(!Condition::Muddle.is_damage());
    }

    #[test]
    fn test_category_queries() {
        let mut c = dummy();
        apply_condition(&mut c, Condition::Poison, ConditionDuration::UntilConsumed, 1, None);
        apply_condition(&mut c, Condition::Disarm, ConditionDuration::Round, 1, None);
        apply_condition(&mut c, Condition::Bless, ConditionDuration::UntilConsumed, 1, None);

        assert_eq!(negative_conditions(&c), vec![Condition::Poison, Condition::Disarm]);
        assert_eq!(positive_conditions(&c), vec![Condition::Bless]);
        assert_eq!(damage_conditions(&c), vec![Condition::Poison]);
        assert_eq!(control_conditions(&c), vec![Condition::Disarm]);
        assert!(is_incapacitated(&c));
    }

    #[test]
    fn test_metadata_kept() {
        let mut c = dummy();
        let meta = serde_json::json!({ "source": "Spike Trap" });
        apply_condition(
            &mut c,
            Condition::Wound,
            ConditionDuration::UntilConsumed,
            1,
            Some(meta.clone()),
        );
        assert_eq!(
            c.conditions.get(Condition::Wound).and_then(|s| s.metadata.clone()),
            Some(meta)
        );
    }

    #[test]
    fn test_shield_replaces() {
        let mut store = EffectStore::new();
        let id = CharacterId::new();
        store.apply_shield(id, 1, EffectDuration::Round);
        store.apply_shield(id, 3, EffectDuration::Round);
        assert_eq!(store.shield_value(id), 3);
    }

    #[test]
    fn test_clear_round_effects_keeps_persistent() {
        let mut store = EffectStore::new();
        let id = CharacterId::new();
        store.apply_shield(id, 1, EffectDuration::Persistent);
        store.apply_retaliate(id, 2, 1, EffectDuration::Round);

        store.clear_round_effects(id);

        assert_eq!(store.shield_value(id), 1);
        assert!(store.retaliate(id).is_none());
    }

    #[test]
    fn test_duration_wire_alias() {
        let d: ConditionDuration = serde_json::from_str("\"until-consumed\"").expect("alias");
        assert_eq!(d, ConditionDuration::UntilConsumed);
    }
}
