//! Per-character combat record
//!
//! Base stats come from the character class (or a monster stat line). The
//! card played this turn may override movement, attack and range; those
//! overrides are explicit `Option`s so a card printing 0 is not confused
//! with "no card played".

use serde::{Deserialize, Serialize};

use crate::battle::hex::HexCoord;
use crate::combat::conditions::{Condition, ConditionSet, ConditionState};
use crate::core::error::{HexhavenError, Result};
use crate::core::types::{CharacterId, PlayerId};

/// Playable classes and their starting stat lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterClass {
    Brute,
    Tinkerer,
    Spellweaver,
    Scoundrel,
    Cragheart,
    Mindthief,
}

impl CharacterClass {
    /// Level 1 stats: (health, movement, attack, range)
    pub fn base_stats(self) -> BaseStats {
        match self {
            CharacterClass::Brute => BaseStats::new(10, 2, 3, 1),
            CharacterClass::Tinkerer => BaseStats::new(8, 2, 2, 3),
            CharacterClass::Spellweaver => BaseStats::new(6, 2, 2, 3),
            CharacterClass::Scoundrel => BaseStats::new(8, 3, 3, 1),
            CharacterClass::Cragheart => BaseStats::new(10, 2, 2, 2),
            CharacterClass::Mindthief => BaseStats::new(6, 3, 2, 1),
        }
    }
}

/// Stats a character falls back to when no card value is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    pub max_health: u32,
    pub movement: u32,
    pub attack: u32,
    pub range: u32,
}

impl BaseStats {
    pub fn new(max_health: u32, movement: u32, attack: u32, range: u32) -> Self {
        Self {
            max_health,
            movement,
            attack,
            range,
        }
    }
}

/// Values set by the card played this turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActiveCardStats {
    pub movement: Option<u32>,
    pub attack: Option<u32>,
    pub range: Option<u32>,
}

/// Combat record for one character, monster or summon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub owner: Option<PlayerId>,
    pub class: Option<CharacterClass>,
    pub base: BaseStats,
    pub current_health: u32,
    pub position: HexCoord,
    pub conditions: ConditionSet,
    pub exhausted: bool,
    pub active: ActiveCardStats,
    /// Hexes moved so far this turn
    pub movement_used: u32,
    pub has_moved: bool,
    pub has_attacked: bool,
}

fn non_negative(field: &'static str, amount: i32) -> Result<u32> {
    u32::try_from(amount).map_err(|_| HexhavenError::InvalidAmount { field, amount })
}

impl Character {
    /// Create a player character with its class stat line
    pub fn new(
        name: impl Into<String>,
        class: CharacterClass,
        owner: PlayerId,
        position: HexCoord,
    ) -> Self {
        let mut character = Self::with_stats(name, class.base_stats(), position);
        character.class = Some(class);
        character.owner = Some(owner);
        character
    }

    /// Create a character from an explicit stat line (monsters, summons)
    pub fn with_stats(name: impl Into<String>, base: BaseStats, position: HexCoord) -> Self {
        Self {
            id: CharacterId::new(),
            name: name.into(),
            owner: None,
            class: None,
            base,
            current_health: base.max_health,
            position,
            conditions: ConditionSet::new(),
            exhausted: false,
            active: ActiveCardStats::default(),
            movement_used: 0,
            has_moved: false,
            has_attacked: false,
        }
    }

    pub fn max_health(&self) -> u32 {
        self.base.max_health
    }

    // ========================================================================
    // Position
    // ========================================================================

    /// Voluntary move. Distance is not checked here; that is validation's job.
    pub fn move_to(&mut self, position: HexCoord) -> Result<()> {
        if self.is_immobilized() {
            return Err(HexhavenError::Immobilized { character: self.id });
        }
        self.position = position;
        self.has_moved = true;
        Ok(())
    }

    /// Involuntary relocation (push, pull, placement). Ignores immobilize.
    pub(crate) fn relocate(&mut self, position: HexCoord) {
        self.position = position;
    }

    // ========================================================================
    // Health
    // ========================================================================

    /// Returns the damage actually taken
    pub fn take_damage(&mut self, amount: i32) -> Result<u32> {
        Ok(self.suffer(non_negative("damage", amount)?))
    }

    /// Returns the health actually restored
    pub fn heal(&mut self, amount: i32) -> Result<u32> {
        Ok(self.restore(non_negative("heal", amount)?))
    }

    /// Damage computed by the engine itself, already known to be non-negative
    pub(crate) fn suffer(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current_health);
        self.current_health -= actual;
        actual
    }

    pub(crate) fn restore(&mut self, amount: u32) -> u32 {
        let missing = self.base.max_health.saturating_sub(self.current_health);
        let actual = amount.min(missing);
        self.current_health += actual;
        actual
    }

    pub fn is_dead(&self) -> bool {
        self.current_health == 0
    }

    /// Neither dead nor exhausted
    pub fn is_active(&self) -> bool {
        !self.exhausted && !self.is_dead()
    }

    // ========================================================================
    // Conditions
    // ========================================================================

    /// Add a condition with its natural duration. No-op if already present.
    pub fn add_condition(&mut self, kind: Condition) {
        self.conditions
            .insert_if_absent(kind, ConditionState::new(kind.default_duration(), 0));
    }

    pub fn remove_condition(&mut self, kind: Condition) {
        self.conditions.remove(kind);
    }

    pub fn clear_conditions(&mut self) {
        self.conditions.clear();
    }

    pub fn has_condition(&self, kind: Condition) -> bool {
        self.conditions.contains(kind)
    }

    pub fn is_immobilized(&self) -> bool {
        self.has_condition(Condition::Immobilize)
    }

    pub fn is_stunned(&self) -> bool {
        self.has_condition(Condition::Stun)
    }

    pub fn is_disarmed(&self) -> bool {
        self.has_condition(Condition::Disarm)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    pub fn exhaust(&mut self) {
        self.exhausted = true;
    }

    /// Bring an exhausted character back at 1 health with no conditions
    pub fn revive(&mut self) -> Result<()> {
        if !self.exhausted {
            return Err(HexhavenError::NotExhausted { character: self.id });
        }
        self.exhausted = false;
        self.current_health = 1;
        self.conditions.clear();
        Ok(())
    }

    // ========================================================================
    // Per-turn card stats
    // ========================================================================

    pub fn set_effective_movement(&mut self, movement: i32) -> Result<()> {
        self.active.movement = Some(non_negative("movement", movement)?);
        Ok(())
    }

    pub fn set_effective_attack(&mut self, attack: i32, range: i32) -> Result<()> {
        let attack = non_negative("attack", attack)?;
        let range = non_negative("range", range)?;
        self.active.attack = Some(attack);
        self.active.range = Some(range);
        Ok(())
    }

    pub fn effective_movement(&self) -> u32 {
        self.active.movement.unwrap_or(self.base.movement)
    }

    pub fn effective_attack(&self) -> u32 {
        self.active.attack.unwrap_or(self.base.attack)
    }

    pub fn effective_range(&self) -> u32 {
        self.active.range.unwrap_or(self.base.range)
    }

    pub fn add_movement_used(&mut self, distance: i32) -> Result<()> {
        self.record_movement(non_negative("movement distance", distance)?);
        Ok(())
    }

    pub(crate) fn record_movement(&mut self, distance: u32) {
        self.movement_used = self.movement_used.saturating_add(distance);
    }

    /// Movement left this turn
    pub fn movement_remaining(&self) -> u32 {
        self.effective_movement().saturating_sub(self.movement_used)
    }

    /// Clear card stats and usage counters. Called once per character at turn end.
    pub fn reset_action_flags(&mut self) {
        self.active = ActiveCardStats::default();
        self.movement_used = 0;
        self.has_moved = false;
        self.has_attacked = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute() -> Character {
        Character::new("Brute", CharacterClass::Brute, PlayerId::new(), HexCoord::new(0, 0))
    }

    #[test]
    fn test_new_character_full_health() {
        let c = brute();
        assert_eq!(c.current_health, 10);
        assert_eq!(c.max_health(), 10);
        assert!(c.is_active());
    }

    #[test]
    fn test_take_damage_clamped() {
        let mut c = brute();
        assert_eq!(c.take_damage(4).expect("valid"), 4);
        assert_eq!(c.current_health, 6);
        assert_eq!(c.take_damage(20).expect("valid"), 6);
        assert_eq!(c.current_health, 0);
        assert!(c.is_dead());
    }

    #[test]
    fn test_negative_amounts_rejected() {
        let mut c = brute();
        assert!(matches!(c.take_damage(-1), Err(HexhavenError::InvalidAmount { .. })));
        assert!(matches!(c.heal(-1), Err(HexhavenError::InvalidAmount { .. })));
        assert!(c.set_effective_movement(-2).is_err());
        assert!(c.set_effective_attack(2, -1).is_err());
        assert!(c.add_movement_used(-1).is_err());
        assert_eq!(c.current_health, 10);
        assert_eq!(c.active, ActiveCardStats::default());
    }

    #[test]
    fn test_heal_clamped_to_max() {
        let mut c = brute();
        c.take_damage(3).expect("valid");
        assert_eq!(c.heal(5).expect("valid"), 3);
        assert_eq!(c.current_health, 10);
    }

    #[test]
    fn test_immobilized_cannot_move() {
        let mut c = brute();
        c.add_condition(Condition::Immobilize);
        let result = c.move_to(HexCoord::new(1, 0));
        assert!(matches!(result, Err(HexhavenError::Immobilized { .. })));
        assert_eq!(c.position, HexCoord::new(0, 0));
    }

    #[test]
    fn test_move_to_ignores_distance() {
        let mut c = brute();
        c.move_to(HexCoord::new(7, -3)).expect("not immobilized");
        assert_eq!(c.position, HexCoord::new(7, -3));
        assert!(c.has_moved);
    }

    #[test]
    fn test_add_condition_idempotent() {
        let mut c = brute();
        c.add_condition(Condition::Poison);
        c.add_condition(Condition::Poison);
        assert_eq!(c.conditions.kinds().filter(|k| *k == Condition::Poison).count(), 1);
        c.remove_condition(Condition::Poison);
        c.remove_condition(Condition::Poison);
        assert!(!c.has_condition(Condition::Poison));
    }

    #[test]
    fn test_revive_requires_exhaustion() {
        let mut c = brute();
        assert!(matches!(c.revive(), Err(HexhavenError::NotExhausted { .. })));

        c.add_condition(Condition::Wound);
        c.take_damage(10).expect("valid");
        c.exhaust();
        c.revive().expect("exhausted");

        assert!(!c.exhausted);
        assert_eq!(c.current_health, 1);
        assert!(c.conditions.is_empty());
    }

    #[test]
    fn test_zero_card_value_is_not_unset() {
        let mut c = brute();
        assert_eq!(c.effective_movement(), 2);
        c.set_effective_movement(0).expect("valid");
        assert_eq!(c.effective_movement(), 0);
    }

    #[test]
    fn test_movement_used_saturates() {
        let mut c = brute();
        for _ in 0..3 {
            c.add_movement_used(i32::MAX).expect("valid");
        }
        assert_eq!(c.movement_used, u32::MAX);
        assert_eq!(c.movement_remaining(), 0);
    }

    #[test]
    fn test_reset_action_flags() {
        let mut c = brute();
        c.set_effective_movement(4).expect("valid");
        c.set_effective_attack(5, 3).expect("valid");
        c.add_movement_used(3).expect("valid");
        assert_eq!(c.movement_remaining(), 1);

        c.reset_action_flags();

        assert_eq!(c.effective_movement(), 2);
        assert_eq!(c.effective_attack(), 3);
        assert_eq!(c.effective_range(), 1);
        assert_eq!(c.movement_used, 0);
    }
}
