//! Encounter turn loop
//!
//! Owns the map, every character on it, the shield/retaliate store and the
//! round counter. Card selection, movement and actions go through here; the
//! encounter looks up targets, applies heals aimed at other characters,
//! resolves attack damage, places summons and applies terrain after
//! anything moves.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::battle::battle_map::{BattleMap, BoardQuery};
use crate::battle::hex::HexCoord;
use crate::battle::terrain::HexFeature;
use crate::combat::actions::{Action, CardAction};
use crate::combat::character::{BaseStats, Character};
use crate::combat::conditions::{expire_round_based_conditions, Condition, EffectStore};
use crate::combat::dispatcher::{
    ActionDispatcher, EffectApplicationResult, ResolutionContext, SummonRequest,
};
use crate::combat::forced_movement::apply_terrain_effects;
use crate::combat::validation::{
    validate_attack, validate_card_selection, validate_movement, ValidationResult,
};
use crate::core::config::RulesConfig;
use crate::core::error::{HexhavenError, Result};
use crate::core::types::{CardId, CharacterId, PlayerId, Round};

/// Values printed on the two cards chosen for a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CardStats {
    #[serde(default)]
    pub movement: Option<i32>,
    #[serde(default)]
    pub attack: Option<i32>,
    #[serde(default)]
    pub range: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EncounterEventKind {
    CardsSelected { character: CharacterId },
    Moved { character: CharacterId, to: HexCoord },
    ActionResolved { character: CharacterId, action: String },
    ActionRejected { character: CharacterId },
    Damaged { character: CharacterId, amount: u32 },
    Healed { character: CharacterId, amount: u32 },
    Retaliated { character: CharacterId, amount: u32 },
    TrapSprung { character: CharacterId, hex: HexCoord },
    TreasureLooted { character: CharacterId, hex: HexCoord },
    Summoned { summoner: CharacterId, summon: CharacterId },
    Exhausted { character: CharacterId },
    RoundEnded { round: Round },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterEvent {
    pub round: Round,
    pub kind: EncounterEventKind,
    pub description: String,
}

/// Conditions that fell off at a round boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round: Round,
    pub expired: Vec<(CharacterId, Vec<Condition>)>,
}

/// Map plus the hexes standing characters take up
struct OccupancyBoard<'a> {
    map: &'a BattleMap,
    occupied: AHashSet<HexCoord>,
}

impl BoardQuery for OccupancyBoard<'_> {
    fn is_walkable(&self, hex: HexCoord) -> bool {
        self.map.is_walkable(hex)
    }

    fn is_occupied(&self, hex: HexCoord) -> bool {
        self.occupied.contains(&hex)
    }
}

/// Complete encounter state
pub struct Encounter {
    pub map: BattleMap,
    dispatcher: ActionDispatcher,
    characters: BTreeMap<CharacterId, Character>,
    effects: EffectStore,
    round: Round,
    loot: BTreeMap<CharacterId, u32>,
    log: Vec<EncounterEvent>,
}

impl Encounter {
    /// Start an encounter at round 1
    pub fn new(map: BattleMap, config: RulesConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            map,
            dispatcher: ActionDispatcher::new(config),
            characters: BTreeMap::new(),
            effects: EffectStore::new(),
            round: 1,
            loot: BTreeMap::new(),
            log: Vec::new(),
        })
    }

    pub fn config(&self) -> &RulesConfig {
        self.dispatcher.config()
    }

    pub fn current_round(&self) -> Round {
        self.round
    }

    pub fn effects(&self) -> &EffectStore {
        &self.effects
    }

    pub fn log(&self) -> &[EncounterEvent] {
        &self.log
    }

    /// Treasure collected by a character so far
    pub fn loot_collected(&self, id: CharacterId) -> u32 {
        self.loot.get(&id).copied().unwrap_or(0)
    }

    fn log_event(&mut self, kind: EncounterEventKind, description: String) {
        self.log.push(EncounterEvent {
            round: self.round,
            kind,
            description,
        });
    }

    // ========================================================================
    // Characters
    // ========================================================================

    /// Place a character on a walkable, unoccupied hex
    pub fn add_character(&mut self, character: Character) -> Result<CharacterId> {
        let hex = character.position;
        let reason = if !self.map.is_walkable(hex) {
            Some("hex is not walkable")
        } else if self.occupant(hex).is_some() {
            Some("hex is occupied")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(HexhavenError::InvalidPlacement {
                q: hex.q,
                r: hex.r,
                reason: reason.into(),
            });
        }

        let id = character.id;
        debug!(character = %id, name = %character.name, hex = ?hex, "character placed");
        self.characters.insert(id, character);
        Ok(id)
    }

    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.characters.get(&id)
    }

    pub fn character_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.characters.get_mut(&id)
    }

    /// All characters in id order
    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    /// Active character standing on `hex`
    pub fn occupant(&self, hex: HexCoord) -> Option<CharacterId> {
        self.characters
            .values()
            .find(|c| c.is_active() && c.position == hex)
            .map(|c| c.id)
    }

    fn occupied_hexes(&self, except: Option<CharacterId>) -> Vec<HexCoord> {
        self.characters
            .values()
            .filter(|c| c.is_active() && Some(c.id) != except)
            .map(|c| c.position)
            .collect()
    }

    fn get(&self, id: CharacterId) -> Result<&Character> {
        self.characters
            .get(&id)
            .ok_or(HexhavenError::CharacterNotFound(id))
    }

    // ========================================================================
    // Turn steps
    // ========================================================================

    /// Validate the two cards for a turn and make their values active
    pub fn select_cards(
        &mut self,
        id: CharacterId,
        top: CardId,
        bottom: CardId,
        hand: &[CardId],
        stats: CardStats,
    ) -> Result<ValidationResult> {
        let validation = validate_card_selection(top, bottom, hand);
        if !validation.valid {
            return Ok(validation);
        }

        // Applied to a copy so a bad value leaves the character untouched
        let mut updated = self.get(id)?.clone();
        if let Some(movement) = stats.movement {
            updated.set_effective_movement(movement)?;
        }
        if stats.attack.is_some() || stats.range.is_some() {
            let attack = stats.attack.unwrap_or(saturating_i32(updated.base.attack));
            let range = stats.range.unwrap_or(saturating_i32(updated.base.range));
            updated.set_effective_attack(attack, range)?;
        }
        let name = updated.name.clone();
        self.characters.insert(id, updated);

        self.log_event(
            EncounterEventKind::CardsSelected { character: id },
            format!("{} plays cards {} and {}", name, top.0, bottom.0),
        );
        Ok(validation)
    }

    /// Voluntary move. Terrain at the destination applies afterwards.
    pub fn move_character(
        &mut self,
        id: CharacterId,
        destination: HexCoord,
    ) -> Result<ValidationResult> {
        let character = self.get(id)?;
        let occupied = self.occupied_hexes(Some(id));
        // Only the destination matters; off-map hexes are not walkable
        let obstacles: Vec<HexCoord> = if self.map.is_walkable(destination) {
            Vec::new()
        } else {
            vec![destination]
        };

        let validation = validate_movement(character, destination, &occupied, &obstacles);
        if !validation.valid {
            return Ok(validation);
        }
        let distance = character.position.distance(&destination);
        let remaining = character.movement_remaining();
        if distance > remaining {
            return Ok(ValidationResult::invalid(format!(
                "Target is {} hexes away but only {} movement remains",
                distance, remaining
            )));
        }

        let name = character.name.clone();
        if let Some(character) = self.characters.get_mut(&id) {
            character.move_to(destination)?;
            character.record_movement(distance);
        }
        self.log_event(
            EncounterEventKind::Moved {
                character: id,
                to: destination,
            },
            format!("{} moves to ({}, {})", name, destination.q, destination.r),
        );
        self.resolve_terrain(id);
        Ok(validation)
    }

    /// Resolve one card action for `actor`, optionally against `target`
    pub fn perform_action(
        &mut self,
        actor: CharacterId,
        action: &CardAction,
        target: Option<CharacterId>,
    ) -> Result<EffectApplicationResult> {
        let source_ref = self.get(actor)?;
        // Targeting yourself is the same as naming no target
        let target = target.filter(|t| *t != actor);
        let target_ref = match target {
            Some(t) => Some(self.get(t)?),
            None => None,
        };

        if source_ref.exhausted {
            return Ok(EffectApplicationResult::failed(format!(
                "{} is exhausted",
                source_ref.name
            )));
        }
        if let (CardAction::Known(Action::Attack { .. }), Some(defender)) = (action, target_ref) {
            let validation = validate_attack(source_ref, defender.position, defender.is_active());
            if !validation.valid {
                let reason = validation.error.unwrap_or_default();
                self.log_event(
                    EncounterEventKind::ActionRejected { character: actor },
                    reason.clone(),
                );
                return Ok(EffectApplicationResult::failed(reason));
            }
        }
        if let (CardAction::Known(Action::Heal { .. }), Some(patient)) = (action, target_ref) {
            if !patient.is_active() {
                let reason = format!("{} is exhausted and cannot be healed", patient.name);
                self.log_event(
                    EncounterEventKind::ActionRejected { character: actor },
                    reason.clone(),
                );
                return Ok(EffectApplicationResult::failed(reason));
            }
        }

        let occupied: AHashSet<HexCoord> = self.occupied_hexes(None).into_iter().collect();

        // Taken out of the map for the duration of the action, always put back
        let Some(mut source) = self.characters.remove(&actor) else {
            return Err(HexhavenError::CharacterNotFound(actor));
        };
        let mut defender = target.and_then(|t| self.characters.remove(&t));
        let defender_start = defender.as_ref().map(|d| d.position);

        let mut summons: Vec<SummonRequest> = Vec::new();
        let mut result = {
            let board = OccupancyBoard {
                map: &self.map,
                occupied,
            };
            let mut ctx = ResolutionContext {
                effects: &mut self.effects,
                board: &board,
                round: self.round,
                summons: &mut summons,
            };
            self.dispatcher
                .apply_action(&mut ctx, action, &mut source, defender.as_mut())
        };

        if result.success {
            if let CardAction::Known(known) = action {
                self.settle(known, &mut result, &mut source, defender.as_mut());
            }
        } else {
            self.log_event(
                EncounterEventKind::ActionRejected { character: actor },
                result.error.clone().unwrap_or_default(),
            );
        }

        let action_name = match action {
            CardAction::Known(known) => known.type_name().to_string(),
            CardAction::Unknown(unknown) => unknown.type_name.clone(),
        };
        let moved_defender = defender
            .as_ref()
            .filter(|d| Some(d.position) != defender_start)
            .map(|d| d.id);

        let source_name = source.name.clone();
        self.characters.insert(actor, source);
        if let Some(defender) = defender {
            self.characters.insert(defender.id, defender);
        }

        if let Some(moved) = moved_defender {
            self.resolve_terrain(moved);
        }
        for request in summons {
            if let Some(summon) = self.place_summon(request) {
                result.affected_entities.push(summon);
            }
        }
        self.check_exhaustion(actor);
        if let Some(t) = target {
            self.check_exhaustion(t);
        }

        if result.success {
            self.log_event(
                EncounterEventKind::ActionResolved {
                    character: actor,
                    action: action_name.clone(),
                },
                format!("{} resolves {}", source_name, action_name),
            );
        }
        Ok(result)
    }

    /// Effects of a successful action that need more than the two characters
    /// the dispatcher saw
    fn settle(
        &mut self,
        action: &Action,
        result: &mut EffectApplicationResult,
        source: &mut Character,
        defender: Option<&mut Character>,
    ) {
        match action {
            Action::Attack { value, .. } => {
                let Some(defender) = defender else {
                    return;
                };
                source.has_attacked = true;
                let shield = self
                    .effects
                    .shield_value(defender.id)
                    .saturating_sub(result.pierce());
                let dealt = defender.suffer(value.saturating_sub(shield));
                info!(
                    attacker = %source.id,
                    defender = %defender.id,
                    dealt,
                    shield,
                    "attack damage"
                );
                self.log_event(
                    EncounterEventKind::Damaged {
                        character: defender.id,
                        amount: dealt,
                    },
                    format!("{} deals {} damage to {}", source.name, dealt, defender.name),
                );

                if defender.is_dead() {
                    return;
                }
                let retaliate = self.effects.retaliate(defender.id).copied();
                if let Some(retaliate) = retaliate {
                    if source.position.distance(&defender.position) <= retaliate.range {
                        let returned = source.suffer(retaliate.value);
                        self.log_event(
                            EncounterEventKind::Retaliated {
                                character: source.id,
                                amount: returned,
                            },
                            format!("{} retaliates for {}", defender.name, returned),
                        );
                    }
                }
            }

            Action::Heal { .. } => {
                let (Some(intent), Some(defender)) = (result.pending_heal, defender) else {
                    return;
                };
                let healed = self.dispatcher.resolve_heal(defender, intent.amount);
                self.log_event(
                    EncounterEventKind::Healed {
                        character: defender.id,
                        amount: healed,
                    },
                    format!("{} heals {} for {}", source.name, defender.name, healed),
                );
            }

            Action::Loot { .. } => {
                let range = result.loot_range.unwrap_or(self.config().default_loot_range);
                let found = self
                    .map
                    .features_in_range(source.position, range, HexFeature::Treasure);
                for hex in found {
                    self.map.remove_feature(hex, HexFeature::Treasure);
                    *self.loot.entry(source.id).or_insert(0) += 1;
                    self.log_event(
                        EncounterEventKind::TreasureLooted {
                            character: source.id,
                            hex,
                        },
                        format!("{} loots treasure at ({}, {})", source.name, hex.q, hex.r),
                    );
                }
            }

            Action::Move { .. }
            | Action::Special { .. }
            | Action::Summon { .. }
            | Action::Text { .. } => {}
        }
    }

    /// Put a summon on the first free hex next to its summoner
    fn place_summon(&mut self, request: SummonRequest) -> Option<CharacterId> {
        let summoner = self.characters.get(&request.summoner)?;
        let owner = summoner.owner;
        let origin = summoner.position;
        let Some(hex) = origin
            .neighbors()
            .into_iter()
            .find(|h| self.map.is_walkable(*h) && self.occupant(*h).is_none())
        else {
            debug!(summoner = %request.summoner, "no free hex for summon");
            return None;
        };

        let def = &request.definition;
        let mut summon = Character::with_stats(
            def.name.clone(),
            BaseStats::new(def.health, def.movement, def.attack, def.range),
            hex,
        );
        summon.owner = owner;
        let id = summon.id;
        let description = format!("{} appears at ({}, {})", summon.name, hex.q, hex.r);
        self.characters.insert(id, summon);
        self.log_event(
            EncounterEventKind::Summoned {
                summoner: request.summoner,
                summon: id,
            },
            description,
        );
        Some(id)
    }

    /// Hazards and traps on the hex a character now stands on
    fn resolve_terrain(&mut self, id: CharacterId) {
        let Some(character) = self.characters.get_mut(&id) else {
            return;
        };
        let Some(hex) = self.map.get_hex(character.position) else {
            return;
        };
        let outcome = apply_terrain_effects(character, hex, self.dispatcher.config());
        let position = character.position;
        let name = character.name.clone();

        if outcome.damage > 0 {
            self.log_event(
                EncounterEventKind::Damaged {
                    character: id,
                    amount: outcome.damage,
                },
                format!("{} takes {} terrain damage", name, outcome.damage),
            );
        }
        if outcome.trap_sprung {
            if self.config().remove_sprung_traps {
                self.map.remove_feature(position, HexFeature::Trap);
            }
            self.log_event(
                EncounterEventKind::TrapSprung {
                    character: id,
                    hex: position,
                },
                format!("{} springs a trap", name),
            );
        }
        self.check_exhaustion(id);
    }

    /// A character at 0 health is exhausted and loses its effects
    fn check_exhaustion(&mut self, id: CharacterId) {
        let Some(character) = self.characters.get_mut(&id) else {
            return;
        };
        if !character.is_dead() || character.exhausted {
            return;
        }
        character.exhaust();
        let name = character.name.clone();
        self.effects.remove_all(id);
        info!(character = %id, "character exhausted");
        self.log_event(
            EncounterEventKind::Exhausted { character: id },
            format!("{} is exhausted", name),
        );
    }

    /// Clear card values and per-turn counters
    pub fn end_turn(&mut self, id: CharacterId) -> Result<()> {
        self.characters
            .get_mut(&id)
            .ok_or(HexhavenError::CharacterNotFound(id))?
            .reset_action_flags();
        Ok(())
    }

    /// Advance the round. Round conditions applied earlier expire and round
    /// shields and retaliates are cleared.
    pub fn end_round(&mut self) -> RoundSummary {
        let finished = self.round;
        self.round += 1;

        let mut expired = Vec::new();
        for character in self.characters.values_mut() {
            let gone = expire_round_based_conditions(character, self.round);
            self.effects.clear_round_effects(character.id);
            if !gone.is_empty() {
                expired.push((character.id, gone));
            }
        }

        info!(round = self.round, expired = expired.len(), "round advanced");
        self.log_event(
            EncounterEventKind::RoundEnded { round: finished },
            format!("Round {} ends", finished),
        );
        RoundSummary {
            round: self.round,
            expired,
        }
    }

    /// Is every character on one side exhausted? Sides are owners; monsters
    /// (no owner) form one side.
    pub fn is_decided(&self) -> bool {
        let mut sides: AHashMap<Option<PlayerId>, bool> = AHashMap::new();
        for character in self.characters.values() {
            let alive = sides.entry(character.owner).or_insert(false);
            *alive |= character.is_active();
        }
        sides.values().filter(|alive| **alive).count() <= 1
    }
}

fn saturating_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
