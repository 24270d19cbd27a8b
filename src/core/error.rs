use thiserror::Error;

use crate::core::types::CharacterId;

#[derive(Error, Debug)]
pub enum HexhavenError {
    #[error("Character {character} is immobilized and cannot move")]
    Immobilized { character: CharacterId },

    #[error("Invalid {field}: {amount} (must be >= 0)")]
    InvalidAmount { field: &'static str, amount: i32 },

    #[error("Character {character} is not exhausted and cannot be revived")]
    NotExhausted { character: CharacterId },

    #[error("Character not found: {0}")]
    CharacterNotFound(CharacterId),

    #[error("Cannot place a character on ({q}, {r}): {reason}")]
    InvalidPlacement { q: i32, r: i32, reason: String },

    #[error("Invalid cube coordinate ({q}, {r}, {s}): q + r + s must be 0")]
    InvalidCube { q: i32, r: i32, s: i32 },

    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, HexhavenError>;
