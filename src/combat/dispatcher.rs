//! Action dispatch
//!
//! Resolves one card action for a source character, and optionally a target
//! the caller has already looked up. Each action variant has its own
//! precondition; once it passes, the action's modifiers are applied one by
//! one. A modifier that cannot be applied is recorded in `failed_modifiers`
//! and the rest still resolve.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::battle::battle_map::BoardQuery;
use crate::combat::actions::{Action, CardAction, CardModifier, Modifier, SummonDefinition};
use crate::combat::character::Character;
use crate::combat::conditions::{apply_condition, consume_condition, Condition, EffectStore};
use crate::combat::forced_movement::{apply_forced_movement, ForcedMovementKind};
use crate::core::config::RulesConfig;
use crate::core::types::{CharacterId, Round};

/// A summon waiting to be placed on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummonRequest {
    pub summoner: CharacterId,
    pub definition: SummonDefinition,
}

/// Receives summons the dispatcher has validated
pub trait SummonSink {
    fn request_summon(&mut self, request: SummonRequest);
}

impl SummonSink for Vec<SummonRequest> {
    fn request_summon(&mut self, request: SummonRequest) {
        self.push(request);
    }
}

/// Healing aimed at a character other than the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealIntent {
    pub target: CharacterId,
    pub amount: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedModifier {
    pub modifier: CardModifier,
    pub reason: String,
}

/// Outcome of resolving an action or a modifier list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectApplicationResult {
    pub success: bool,
    pub applied_modifiers: Vec<CardModifier>,
    pub failed_modifiers: Vec<FailedModifier>,
    pub affected_entities: Vec<CharacterId>,
    /// Set when a heal targets someone else; the caller applies it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_heal: Option<HealIntent>,
    /// Collection range of a resolved loot action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loot_range: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EffectApplicationResult {
    fn succeeded() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    fn affect(&mut self, id: CharacterId) {
        if !self.affected_entities.contains(&id) {
            self.affected_entities.push(id);
        }
    }

    /// Fold a modifier pass into this result
    fn absorb(&mut self, other: EffectApplicationResult) {
        self.applied_modifiers.extend(other.applied_modifiers);
        self.failed_modifiers.extend(other.failed_modifiers);
        for id in other.affected_entities {
            self.affect(id);
        }
    }

    /// Sum of pierce modifiers that resolved
    pub fn pierce(&self) -> u32 {
        self.applied_modifiers
            .iter()
            .map(|m| match m {
                CardModifier::Known(Modifier::Pierce { value }) => *value,
                _ => 0,
            })
            .fold(0, u32::saturating_add)
    }
}

/// Board, effect store and summon sink for one resolution
pub struct ResolutionContext<'a> {
    pub effects: &'a mut EffectStore,
    pub board: &'a dyn BoardQuery,
    pub round: Round,
    pub summons: &'a mut dyn SummonSink,
}

/// Applies card actions according to the rules config
#[derive(Debug, Clone, Default)]
pub struct ActionDispatcher {
    config: RulesConfig,
}

type ModifierOutcome = std::result::Result<Option<CharacterId>, String>;

impl ActionDispatcher {
    pub fn new(config: RulesConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    /// Resolve `action` for `source` against an optional, already resolved target
    pub fn apply_action(
        &self,
        ctx: &mut ResolutionContext<'_>,
        action: &CardAction,
        source: &mut Character,
        mut target: Option<&mut Character>,
    ) -> EffectApplicationResult {
        let action = match action {
            CardAction::Known(action) => action,
            CardAction::Unknown(unknown) => {
                warn!(character = %source.id, action = %unknown.type_name, "unknown action type");
                return EffectApplicationResult::failed(format!(
                    "Unknown action type '{}'",
                    unknown.type_name
                ));
            }
        };

        let result = match action {
            Action::Attack { modifiers, .. } => {
                let Some(target) = target.as_deref_mut() else {
                    return self.reject(source, action, "Attack requires a target");
                };
                if source.is_disarmed() {
                    return self.reject(source, action, format!("{} is disarmed", source.name));
                }
                if source.is_stunned() {
                    return self.reject(source, action, format!("{} is stunned", source.name));
                }
                let target_id = target.id;
                let mut result = EffectApplicationResult::succeeded();
                result.affect(target_id);
                result.absorb(self.apply_modifiers(ctx, modifiers, source, Some(target)));
                result
            }

            Action::Move { modifiers, .. } => {
                if source.is_immobilized() {
                    return self.reject(source, action, format!("{} is immobilized", source.name));
                }
                if source.is_stunned() {
                    return self.reject(source, action, format!("{} is stunned", source.name));
                }
                let mut result = EffectApplicationResult::succeeded();
                result.affect(source.id);
                result.absorb(self.apply_modifiers(ctx, modifiers, source, target));
                result
            }

            Action::Heal { value, modifiers } => {
                let mut result = EffectApplicationResult::succeeded();
                match target.as_deref_mut() {
                    Some(other) => {
                        result.affect(other.id);
                        result.pending_heal = Some(HealIntent {
                            target: other.id,
                            amount: *value,
                        });
                    }
                    None => {
                        self.resolve_heal(source, *value);
                        result.affect(source.id);
                    }
                }
                result.absorb(self.apply_modifiers(ctx, modifiers, source, target));
                result
            }

            Action::Loot { value, modifiers } => {
                if source.is_stunned() {
                    return self.reject(source, action, format!("{} is stunned", source.name));
                }
                let mut result = EffectApplicationResult::succeeded();
                result.loot_range = Some(value.unwrap_or(self.config.default_loot_range));
                result.affect(source.id);
                result.absorb(self.apply_modifiers(ctx, modifiers, source, target));
                result
            }

            Action::Special { modifiers } => self.apply_modifiers(ctx, modifiers, source, target),

            Action::Summon { summon, modifiers } => {
                if let Err(reason) = summon.validate() {
                    return self.reject(source, action, reason);
                }
                ctx.summons.request_summon(SummonRequest {
                    summoner: source.id,
                    definition: summon.clone(),
                });
                let mut result = EffectApplicationResult::succeeded();
                result.affect(source.id);
                result.absorb(self.apply_modifiers(ctx, modifiers, source, target));
                result
            }

            Action::Text { .. } => EffectApplicationResult::succeeded(),
        };

        info!(
            character = %source.id,
            action = action.type_name(),
            applied = result.applied_modifiers.len(),
            failed = result.failed_modifiers.len(),
            "action resolved"
        );
        result
    }

    fn reject(
        &self,
        source: &Character,
        action: &Action,
        reason: impl Into<String>,
    ) -> EffectApplicationResult {
        let reason = reason.into();
        info!(character = %source.id, action = action.type_name(), %reason, "action rejected");
        EffectApplicationResult::failed(reason)
    }

    /// Apply every modifier in order. Failures are collected, never fatal.
    pub fn apply_modifiers(
        &self,
        ctx: &mut ResolutionContext<'_>,
        modifiers: &[CardModifier],
        source: &mut Character,
        mut target: Option<&mut Character>,
    ) -> EffectApplicationResult {
        let mut result = EffectApplicationResult::succeeded();

        for modifier in modifiers {
            let outcome = match modifier {
                CardModifier::Known(known) => {
                    self.apply_modifier(ctx, known, source, target.as_deref_mut())
                }
                CardModifier::Unknown(unknown) => {
                    warn!(
                        character = %source.id,
                        modifier = %unknown.type_name,
                        "unknown modifier type"
                    );
                    Err(format!("Unknown modifier type '{}'", unknown.type_name))
                }
            };

            match outcome {
                Ok(affected) => {
                    debug!(
                        character = %source.id,
                        modifier = modifier.type_name(),
                        "modifier applied"
                    );
                    if let Some(id) = affected {
                        result.affect(id);
                    }
                    result.applied_modifiers.push(modifier.clone());
                }
                Err(reason) => {
                    debug!(
                        character = %source.id,
                        modifier = modifier.type_name(),
                        %reason,
                        "modifier failed"
                    );
                    result.failed_modifiers.push(FailedModifier {
                        modifier: modifier.clone(),
                        reason,
                    });
                }
            }
        }

        result
    }

    fn apply_modifier(
        &self,
        ctx: &mut ResolutionContext<'_>,
        modifier: &Modifier,
        source: &mut Character,
        target: Option<&mut Character>,
    ) -> ModifierOutcome {
        match modifier {
            Modifier::Condition {
                condition,
                duration,
                metadata,
            } => {
                // No target: the card applies the condition to its user
                let recipient = match target {
                    Some(target) => target,
                    None => source,
                };
                apply_condition(
                    recipient,
                    *condition,
                    duration.unwrap_or_else(|| condition.default_duration()),
                    ctx.round,
                    metadata.clone(),
                );
                Ok(Some(recipient.id))
            }

            Modifier::Push { distance } => {
                self.force(ctx, source, target, *distance, ForcedMovementKind::Push)
            }
            Modifier::Pull { distance } => {
                self.force(ctx, source, target, *distance, ForcedMovementKind::Pull)
            }

            Modifier::Shield { value, duration } => {
                ctx.effects.apply_shield(source.id, *value, *duration);
                Ok(Some(source.id))
            }

            Modifier::Retaliate {
                value,
                range,
                duration,
            } => {
                let range = range.unwrap_or(self.config.default_retaliate_range);
                ctx.effects.apply_retaliate(source.id, *value, range, *duration);
                Ok(Some(source.id))
            }

            // Realized by the caller from `applied_modifiers`
            Modifier::Infuse { .. }
            | Modifier::Consume { .. }
            | Modifier::Range { .. }
            | Modifier::Pierce { .. }
            | Modifier::Aoe { .. }
            | Modifier::Jump
            | Modifier::Teleport
            | Modifier::Lost
            | Modifier::Recover { .. }
            | Modifier::Discard { .. }
            | Modifier::Round
            | Modifier::Persistent
            | Modifier::Xp { .. }
            | Modifier::Heal { .. }
            | Modifier::Target { .. } => Ok(None),
        }
    }

    fn force(
        &self,
        ctx: &ResolutionContext<'_>,
        source: &Character,
        target: Option<&mut Character>,
        distance: u32,
        kind: ForcedMovementKind,
    ) -> ModifierOutcome {
        let Some(target) = target else {
            return Err(format!("{:?} requires a target", kind));
        };
        let outcome = apply_forced_movement(target, source.position, distance, kind, ctx.board);
        if !outcome.success {
            return Err(format!(
                "{:?} has no direction: target shares the source hex",
                kind
            ));
        }
        Ok(Some(target.id))
    }

    /// Heal `character` and, when configured, consume its Poison and Wound.
    /// Returns the health restored.
    pub fn resolve_heal(&self, character: &mut Character, amount: u32) -> u32 {
        let healed = character.restore(amount);
        if self.config.heal_consumes_conditions {
            consume_condition(character, Condition::Poison);
            consume_condition(character, Condition::Wound);
        }
        debug!(character = %character.id, amount, healed, "heal resolved");
        healed
    }
}
