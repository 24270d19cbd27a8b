//! Board and turn loop: hex geometry, terrain, the scenario map and the
//! encounter that drives the combat rules against them

pub mod battle_map;
pub mod encounter;
pub mod hex;
pub mod scenario;
pub mod terrain;

pub use battle_map::{BattleMap, BoardQuery, MapHex, OpenBoard};
pub use encounter::{
    CardStats, Encounter, EncounterEvent, EncounterEventKind, RoundSummary,
};
pub use hex::{CubeCoord, HexCoord, HexDirection};
pub use scenario::{Scenario, ScenarioReport, ScenarioStep};
pub use terrain::{HexFeature, TerrainType};
