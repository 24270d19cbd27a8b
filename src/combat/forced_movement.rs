//! Push and pull
//!
//! Forced movement runs in a straight line: a push moves the target away
//! from the source, a pull moves it toward the source. Each step must
//! change the distance to the source in the right direction and land on a
//! walkable, unoccupied hex; movement stops at the first step that fails.

use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use tracing::debug;

use crate::battle::battle_map::{BoardQuery, MapHex};
use crate::battle::hex::HexCoord;
use crate::battle::terrain::HexFeature;
use crate::combat::character::Character;
use crate::core::config::RulesConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForcedMovementKind {
    Push,
    Pull,
}

/// Outcome of moving a character by force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForcedMovementResult {
    pub success: bool,
    pub final_position: HexCoord,
    pub steps_taken: u32,
    /// Movement ended early on a wall, obstacle, occupant or the source
    pub blocked: bool,
}

/// Reduce an axial delta to a single step.
///
/// The axis with the larger magnitude wins. On a tie with opposite signs the
/// delta already lies on a hex direction and both components step. On a tie
/// with equal signs no hex direction fits exactly and the q axis is used, so
/// every step stays a single hex.
pub fn normalize_direction(delta: HexCoord) -> Option<HexCoord> {
    let (dq, dr) = (delta.q, delta.r);
    if dq == 0 && dr == 0 {
        return None;
    }

    let step = if dq.abs() > dr.abs() {
        HexCoord::new(dq.signum(), 0)
    } else if dr.abs() > dq.abs() {
        HexCoord::new(0, dr.signum())
    } else if dq.signum() != dr.signum() {
        HexCoord::new(dq.signum(), dr.signum())
    } else {
        HexCoord::new(dq.signum(), 0)
    };
    Some(step)
}

/// Unit step a push or pull moves the target along
pub fn forced_direction(
    source: HexCoord,
    target: HexCoord,
    kind: ForcedMovementKind,
) -> Option<HexCoord> {
    match kind {
        ForcedMovementKind::Push => normalize_direction(target - source),
        ForcedMovementKind::Pull => normalize_direction(source - target),
    }
}

/// Does moving from `from` to `to` go the right way relative to `source`?
fn is_directional(
    source: HexCoord,
    from: HexCoord,
    to: HexCoord,
    kind: ForcedMovementKind,
) -> bool {
    let before = source.distance(&from);
    let after = source.distance(&to);
    match kind {
        ForcedMovementKind::Push => after > before,
        ForcedMovementKind::Pull => after < before && to != source,
    }
}

fn is_open(board: &dyn BoardQuery, hex: HexCoord) -> bool {
    board.is_walkable(hex) && !board.is_occupied(hex)
}

/// Walk `target` up to `distance` hexes along the forced direction
pub fn apply_forced_movement(
    target: &mut Character,
    source: HexCoord,
    distance: u32,
    kind: ForcedMovementKind,
    board: &dyn BoardQuery,
) -> ForcedMovementResult {
    let start = target.position;
    let Some(step) = forced_direction(source, start, kind) else {
        debug!(character = %target.id, ?kind, "no forced direction: target shares the source hex");
        return ForcedMovementResult {
            success: false,
            final_position: start,
            steps_taken: 0,
            blocked: true,
        };
    };

    let mut position = start;
    let mut steps_taken = 0;
    let mut blocked = false;
    for _ in 0..distance {
        let next = position + step;
        if !is_directional(source, position, next, kind) || !is_open(board, next) {
            blocked = true;
            break;
        }
        position = next;
        steps_taken += 1;
    }

    target.relocate(position);
    debug!(
        character = %target.id,
        ?kind,
        from = ?start,
        to = ?position,
        steps_taken,
        blocked,
        "forced movement resolved"
    );

    ForcedMovementResult {
        success: true,
        final_position: position,
        steps_taken,
        blocked,
    }
}

pub fn apply_push(
    target: &mut Character,
    source: HexCoord,
    distance: u32,
    board: &dyn BoardQuery,
) -> ForcedMovementResult {
    apply_forced_movement(target, source, distance, ForcedMovementKind::Push, board)
}

pub fn apply_pull(
    target: &mut Character,
    source: HexCoord,
    distance: u32,
    board: &dyn BoardQuery,
) -> ForcedMovementResult {
    apply_forced_movement(target, source, distance, ForcedMovementKind::Pull, board)
}

/// Every hex a push or pull of up to `distance` could leave `target` on.
///
/// A candidate must be farther from (push) or closer to (pull) the source
/// than the target is now, walkable, and unoccupied. It must also be
/// reachable through hexes meeting the same tests, each step moving the
/// right way, so a boxed-in target has no destinations. Sorted.
pub fn get_all_valid_forced_movement_destinations(
    target: &Character,
    source: HexCoord,
    distance: u32,
    kind: ForcedMovementKind,
    board: &dyn BoardQuery,
) -> Vec<HexCoord> {
    let origin = target.position;
    let mut seen: HashSet<HexCoord> = HashSet::new();
    let mut queue: VecDeque<(HexCoord, u32)> = VecDeque::new();
    seen.insert(origin);
    queue.push_back((origin, 0));

    let mut destinations = Vec::new();
    while let Some((hex, depth)) = queue.pop_front() {
        if depth == distance {
            continue;
        }
        for next in hex.neighbors() {
            if seen.contains(&next) {
                continue;
            }
            if !is_directional(source, hex, next, kind) || !is_open(board, next) {
                continue;
            }
            seen.insert(next);
            destinations.push(next);
            queue.push_back((next, depth + 1));
        }
    }

    // Candidates are judged against the starting hex
    destinations.retain(|c| is_directional(source, origin, *c, kind) && is_open(board, *c));
    destinations.sort();
    destinations
}

/// Put `target` on a destination chosen from the enumerated set
pub fn apply_to_destination(target: &mut Character, destination: HexCoord) -> ForcedMovementResult {
    let steps_taken = target.position.distance(&destination);
    target.relocate(destination);
    ForcedMovementResult {
        success: true,
        final_position: destination,
        steps_taken,
        blocked: false,
    }
}

// ============================================================================
// Terrain
// ============================================================================

/// Obstacle terrain or a wall makes a hex non-walkable
pub fn is_walkable_hex(hex: &MapHex) -> bool {
    hex.terrain.is_passable() && !hex.features.iter().any(|f| f.blocks_movement())
}

/// What ending movement on a hex did to a character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TerrainEffectOutcome {
    pub damage: u32,
    pub trap_sprung: bool,
}

/// Resolve hazardous terrain and traps for a character ending movement on `hex`
pub fn apply_terrain_effects(
    character: &mut Character,
    hex: &MapHex,
    config: &RulesConfig,
) -> TerrainEffectOutcome {
    let mut damage = 0;
    if hex.terrain.is_hazardous() {
        damage += config.hazardous_terrain_damage;
    }
    let trap_sprung = hex.has_feature(HexFeature::Trap);
    if trap_sprung {
        damage += config.trap_damage;
    }

    let dealt = character.suffer(damage);
    if damage > 0 {
        debug!(character = %character.id, hex = ?hex.coord, dealt, trap_sprung, "terrain damage");
    }
    TerrainEffectOutcome {
        damage: dealt,
        trap_sprung,
    }
}
