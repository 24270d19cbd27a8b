//! Rules configuration with documented constants
//!
//! Every tunable number the rules engine reads lives here. A `RulesConfig`
//! is handed to the dispatcher and the encounter when they are built; there
//! is no process-wide instance.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::{HexhavenError, Result};

/// Configuration for the combat rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    // === ACTIONS ===
    /// Collection range of a loot action whose card prints no value
    pub default_loot_range: u32,

    /// Range of a retaliate modifier that does not print one
    ///
    /// Retaliate without a range only answers adjacent attackers.
    pub default_retaliate_range: u32,

    // === TERRAIN ===
    /// Damage dealt when a character ends forced or voluntary movement
    /// on hazardous terrain
    pub hazardous_terrain_damage: u32,

    /// Damage dealt by springing a trap
    pub trap_damage: u32,

    /// Remove a trap from the map once it has been sprung
    pub remove_sprung_traps: bool,

    // === CONDITIONS ===
    /// Healing removes until-consumed Poison and Wound from the healed
    /// character
    pub heal_consumes_conditions: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            default_loot_range: 1,
            default_retaliate_range: 1,
            hazardous_terrain_damage: 1,
            trap_damage: 1,
            remove_sprung_traps: true,
            heal_consumes_conditions: true,
        }
    }
}

impl RulesConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RulesConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.default_loot_range == 0 {
            return Err(HexhavenError::InvalidConfig(format!(
                "default_loot_range ({}) must be at least 1",
                self.default_loot_range
            )));
        }

        Ok(())
    }
}
