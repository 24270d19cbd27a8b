//! Hexhaven Combat - hex-grid tactical combat rules engine
//!
//! `combat` holds the rules (character state, conditions, validation,
//! forced movement, action dispatch), `battle` holds the board and the
//! encounter turn loop, `core` holds ids, errors and the rules config.

pub mod battle;
pub mod combat;
pub mod core;
