//! Scenario map: hex tiles, terrain and features
//!
//! The rules engine never looks at the map directly. It asks a `BoardQuery`
//! whether a hex can be stood on and whether somebody already stands there.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::battle::hex::HexCoord;
use crate::battle::terrain::{HexFeature, TerrainType};
use crate::combat::forced_movement::is_walkable_hex;

/// Board predicates consumed by validation and forced movement
pub trait BoardQuery {
    /// Can a character end a step on this hex?
    fn is_walkable(&self, hex: HexCoord) -> bool;

    /// Is this hex already taken by a character, monster or summon?
    fn is_occupied(&self, hex: HexCoord) -> bool;
}

/// A board with no terrain and nobody on it. Every hex is walkable.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenBoard;

impl BoardQuery for OpenBoard {
    fn is_walkable(&self, _hex: HexCoord) -> bool {
        true
    }

    fn is_occupied(&self, _hex: HexCoord) -> bool {
        false
    }
}

/// A single hex on the scenario map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapHex {
    pub coord: HexCoord,
    #[serde(default)]
    pub terrain: TerrainType,
    #[serde(default)]
    pub features: Vec<HexFeature>,
}

impl MapHex {
    pub fn new(coord: HexCoord, terrain: TerrainType) -> Self {
        Self {
            coord,
            terrain,
            features: Vec::new(),
        }
    }

    pub fn has_feature(&self, feature: HexFeature) -> bool {
        self.features.contains(&feature)
    }
}

/// The full scenario map
#[derive(Debug, Clone, Default)]
pub struct BattleMap {
    hexes: AHashMap<HexCoord, MapHex>,
}

impl BattleMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hexagonal map of normal terrain
    pub fn with_radius(center: HexCoord, radius: u32) -> Self {
        Self::from_tiles(
            center
                .hexes_in_range(radius)
                .into_iter()
                .map(|coord| MapHex::new(coord, TerrainType::Normal)),
        )
    }

    /// Build a map from a list of tiles (later tiles replace earlier ones)
    pub fn from_tiles(tiles: impl IntoIterator<Item = MapHex>) -> Self {
        let mut map = Self::new();
        for tile in tiles {
            map.insert(tile);
        }
        map
    }

    pub fn insert(&mut self, hex: MapHex) {
        self.hexes.insert(hex.coord, hex);
    }

    /// Get a hex at the given coordinate
    pub fn get_hex(&self, coord: HexCoord) -> Option<&MapHex> {
        self.hexes.get(&coord)
    }

    /// Get a mutable hex at the given coordinate
    pub fn get_hex_mut(&mut self, coord: HexCoord) -> Option<&mut MapHex> {
        self.hexes.get_mut(&coord)
    }

    /// Check if coordinate is part of the map
    pub fn in_bounds(&self, coord: HexCoord) -> bool {
        self.hexes.contains_key(&coord)
    }

    pub fn len(&self) -> usize {
        self.hexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hexes.is_empty()
    }

    /// Set terrain at a coordinate
    pub fn set_terrain(&mut self, coord: HexCoord, terrain: TerrainType) {
        if let Some(hex) = self.get_hex_mut(coord) {
            hex.terrain = terrain;
        }
    }

    /// Add a feature at a coordinate
    pub fn add_feature(&mut self, coord: HexCoord, feature: HexFeature) {
        if let Some(hex) = self.get_hex_mut(coord) {
            if !hex.features.contains(&feature) {
                hex.features.push(feature);
            }
        }
    }

    /// Remove a feature, returns true if it was present
    pub fn remove_feature(&mut self, coord: HexCoord, feature: HexFeature) -> bool {
        match self.get_hex_mut(coord) {
            Some(hex) => {
                let before = hex.features.len();
                hex.features.retain(|f| *f != feature);
                hex.features.len() != before
            }
            None => false,
        }
    }

    /// Coordinates holding a feature within `range` of `center`
    pub fn features_in_range(
        &self,
        center: HexCoord,
        range: u32,
        feature: HexFeature,
    ) -> Vec<HexCoord> {
        let mut found: Vec<HexCoord> = center
            .hexes_in_range(range)
            .into_iter()
            .filter(|c| self.get_hex(*c).is_some_and(|h| h.has_feature(feature)))
            .collect();
        found.sort();
        found
    }
}

impl BoardQuery for BattleMap {
    /// Hexes off the map are never walkable
    fn is_walkable(&self, hex: HexCoord) -> bool {
        self.get_hex(hex).is_some_and(is_walkable_hex)
    }

    /// The map alone knows nothing about occupants
    fn is_occupied(&self, _hex: HexCoord) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_with_radius() {
        let map = BattleMap::with_radius(HexCoord::new(0, 0), 2);
        assert_eq!(map.len(), 19);
        assert!(map.in_bounds(HexCoord::new(2, -2)));
        assert!(!map.in_bounds(HexCoord::new(3, 0)));
    }

    #[test]
    fn test_from_tiles_later_tile_wins() {
        let map = BattleMap::from_tiles([
            MapHex::new(HexCoord::new(0, 0), TerrainType::Normal),
            MapHex::new(HexCoord::new(1, 0), TerrainType::Normal),
            MapHex::new(HexCoord::new(0, 0), TerrainType::Obstacle),
        ]);
        assert_eq!(map.len(), 2);
        assert!(!map.is_walkable(HexCoord::new(0, 0)));
        assert!(map.is_walkable(HexCoord::new(1, 0)));
    }

    #[test]
    fn test_out_of_bounds_not_walkable() {
        let map = BattleMap::with_radius(HexCoord::new(0, 0), 1);
        assert!(map.is_walkable(HexCoord::new(1, 0)));
        assert!(!map.is_walkable(HexCoord::new(5, 5)));
    }

    #[test]
    fn test_obstacle_not_walkable() {
        let mut map = BattleMap::with_radius(HexCoord::new(0, 0), 2);
        map.set_terrain(HexCoord::new(1, 0), TerrainType::Obstacle);
        assert!(!map.is_walkable(HexCoord::new(1, 0)));
    }

    #[test]
    fn test_wall_not_walkable() {
        let mut map = BattleMap::with_radius(HexCoord::new(0, 0), 2);
        map.add_feature(HexCoord::new(0, 1), HexFeature::Wall);
        assert!(!map.is_walkable(HexCoord::new(0, 1)));
    }

    #[test]
    fn test_add_feature_no_duplicates() {
        let mut map = BattleMap::with_radius(HexCoord::new(0, 0), 1);
        map.add_feature(HexCoord::new(0, 0), HexFeature::Trap);
        map.add_feature(HexCoord::new(0, 0), HexFeature::Trap);
        let hex = map.get_hex(HexCoord::new(0, 0)).expect("in bounds");
        assert_eq!(hex.features.len(), 1);
    }

    #[test]
    fn test_remove_feature() {
        let mut map = BattleMap::with_radius(HexCoord::new(0, 0), 1);
        map.add_feature(HexCoord::new(1, 0), HexFeature::Trap);
        assert!(map.remove_feature(HexCoord::new(1, 0), HexFeature::Trap));
        assert!(!map.remove_feature(HexCoord::new(1, 0), HexFeature::Trap));
    }

    #[test]
    fn test_features_in_range() {
        let mut map = BattleMap::with_radius(HexCoord::new(0, 0), 3);
        map.add_feature(HexCoord::new(1, 0), HexFeature::Treasure);
        map.add_feature(HexCoord::new(3, 0), HexFeature::Treasure);
        let found = map.features_in_range(HexCoord::new(0, 0), 1, HexFeature::Treasure);
        assert_eq!(found, vec![HexCoord::new(1, 0)]);
    }

    #[test]
    fn test_open_board() {
        assert!(OpenBoard.is_walkable(HexCoord::new(99, -99)));
        assert!(!OpenBoard.is_occupied(HexCoord::new(0, 0)));
    }
}
