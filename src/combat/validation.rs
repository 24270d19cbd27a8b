//! Stateless rule checks for movement, attacks and card selection
//!
//! Rule violations are normal play, so these return a `ValidationResult`
//! instead of an error. Messages carry the numbers involved.

use serde::{Deserialize, Serialize};

use crate::battle::hex::HexCoord;
use crate::combat::character::Character;
use crate::core::types::CardId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
        }
    }
}

/// Check a voluntary move of `character` to `target`
pub fn validate_movement(
    character: &Character,
    target: HexCoord,
    occupied: &[HexCoord],
    obstacles: &[HexCoord],
) -> ValidationResult {
    if character.is_immobilized() {
        return ValidationResult::invalid(format!("{} is immobilized", character.name));
    }
    if character.is_stunned() {
        return ValidationResult::invalid(format!("{} is stunned", character.name));
    }
    if character.exhausted {
        return ValidationResult::invalid(format!("{} is exhausted", character.name));
    }

    let distance = character.position.distance(&target);
    let movement = character.effective_movement();
    if distance > movement {
        return ValidationResult::invalid(format!(
            "Target is {} hexes away but movement is only {}",
            distance, movement
        ));
    }

    if occupied.contains(&target) {
        return ValidationResult::invalid(format!(
            "Hex ({}, {}) is occupied",
            target.q, target.r
        ));
    }
    if obstacles.contains(&target) {
        return ValidationResult::invalid(format!(
            "Hex ({}, {}) is an obstacle",
            target.q, target.r
        ));
    }

    ValidationResult::ok()
}

/// Check an attack from `attacker` against whatever stands on `target_pos`
pub fn validate_attack(
    attacker: &Character,
    target_pos: HexCoord,
    target_alive: bool,
) -> ValidationResult {
    if attacker.is_disarmed() {
        return ValidationResult::invalid(format!("{} is disarmed", attacker.name));
    }
    if attacker.is_stunned() {
        return ValidationResult::invalid(format!("{} is stunned", attacker.name));
    }
    if attacker.exhausted {
        return ValidationResult::invalid(format!("{} is exhausted", attacker.name));
    }
    if !target_alive {
        return ValidationResult::invalid("Target is already dead");
    }

    let distance = attacker.position.distance(&target_pos);
    let range = attacker.effective_range();
    if distance > range {
        return ValidationResult::invalid(format!(
            "Target is {} hexes away but range is only {}",
            distance, range
        ));
    }

    ValidationResult::ok()
}

/// Check the two cards chosen for a turn against the hand
pub fn validate_card_selection(top: CardId, bottom: CardId, hand: &[CardId]) -> ValidationResult {
    if top == bottom {
        return ValidationResult::invalid(format!(
            "Top and bottom actions must come from different cards (both are card {})",
            top.0
        ));
    }
    for card in [top, bottom] {
        if !hand.contains(&card) {
            return ValidationResult::invalid(format!("Card {} is not in hand", card.0));
        }
    }
    ValidationResult::ok()
}
