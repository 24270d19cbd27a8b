pub mod config;
pub mod error;
pub mod types;

pub use config::RulesConfig;
pub use error::{HexhavenError, Result};
pub use types::{CardId, CharacterId, PlayerId, Round};
