//! Scenario terrain types and hex features

use serde::{Deserialize, Serialize};

/// Primary terrain type of a map hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TerrainType {
    #[default]
    Normal,    // No effect
    Difficult, // Slows voluntary movement; no effect on forced movement
    Obstacle,  // Cannot be entered
    Hazardous, // Damages anything that ends movement on it
}

impl TerrainType {
    /// Can a character stand on this terrain?
    pub fn is_passable(&self) -> bool {
        !matches!(self, TerrainType::Obstacle)
    }

    pub fn is_hazardous(&self) -> bool {
        matches!(self, TerrainType::Hazardous)
    }
}

/// Features placed on a hex in addition to its terrain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HexFeature {
    Wall,     // Blocks movement
    Trap,     // Sprung by the first character to end movement on it
    Door,     // Open doors are walkable
    Treasure, // Collected by a loot action
}

impl HexFeature {
    pub fn blocks_movement(&self) -> bool {
        matches!(self, HexFeature::Wall)
    }
}
