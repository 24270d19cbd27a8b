//! Scripted scenarios
//!
//! A scenario is a JSON document: a map, the characters on it keyed by a
//! short name, and a list of steps to play. Running it builds a fresh
//! `Encounter`, plays every step in order and reports what happened. Rule
//! violations in a step are reported, not fatal; unknown character keys
//! and bad placements are errors.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::battle::battle_map::{BattleMap, MapHex};
use crate::battle::encounter::{CardStats, Encounter, EncounterEvent};
use crate::battle::hex::HexCoord;
use crate::battle::terrain::TerrainType;
use crate::combat::actions::CardAction;
use crate::combat::character::{BaseStats, Character, CharacterClass};
use crate::combat::conditions::{Condition, ConditionDuration};
use crate::core::config::RulesConfig;
use crate::core::error::{HexhavenError, Result};
use crate::core::types::{CardId, CharacterId, PlayerId};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapSpec {
    /// Hexagonal area of normal terrain around the origin
    #[serde(default)]
    pub radius: Option<u32>,
    /// Tiles laid over (or beyond) the radius area
    #[serde(default)]
    pub tiles: Vec<MapHex>,
}

impl MapSpec {
    pub fn build(&self) -> Result<BattleMap> {
        let area = self
            .radius
            .map(|radius| HexCoord::new(0, 0).hexes_in_range(radius))
            .unwrap_or_default()
            .into_iter()
            .map(|coord| MapHex::new(coord, TerrainType::Normal));
        let map = BattleMap::from_tiles(area.chain(self.tiles.iter().cloned()));
        if map.is_empty() {
            return Err(HexhavenError::InvalidScenario("map has no hexes".into()));
        }
        Ok(map)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterSpec {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub class: Option<CharacterClass>,
    /// Stat line for monsters; overrides the class stats when both are given
    #[serde(default)]
    pub stats: Option<BaseStats>,
    /// Characters sharing a side share an owner. No side means monster.
    #[serde(default)]
    pub side: Option<String>,
    pub position: HexCoord,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScenarioStep {
    SelectCards {
        actor: String,
        top: u32,
        bottom: u32,
        hand: Vec<u32>,
        #[serde(default)]
        stats: CardStats,
    },
    Move {
        actor: String,
        to: HexCoord,
    },
    Action {
        actor: String,
        #[serde(default)]
        target: Option<String>,
        action: CardAction,
    },
    EndTurn {
        actor: String,
    },
    EndRound,
}

impl ScenarioStep {
    fn kind(&self) -> &'static str {
        match self {
            ScenarioStep::SelectCards { .. } => "select_cards",
            ScenarioStep::Move { .. } => "move",
            ScenarioStep::Action { .. } => "action",
            ScenarioStep::EndTurn { .. } => "end_turn",
            ScenarioStep::EndRound => "end_round",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub map: MapSpec,
    pub characters: Vec<CharacterSpec>,
    #[serde(default)]
    pub steps: Vec<ScenarioStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub index: usize,
    pub step: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSummary {
    pub key: String,
    pub name: String,
    pub health: u32,
    pub max_health: u32,
    pub position: HexCoord,
    pub exhausted: bool,
    pub loot: u32,
    pub conditions: Vec<(Condition, ConditionDuration)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub name: String,
    pub final_round: u32,
    pub decided: bool,
    pub steps: Vec<StepReport>,
    pub characters: Vec<CharacterSummary>,
    pub events: Vec<EncounterEvent>,
}

impl Scenario {
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Play every step against a fresh encounter
    pub fn run(&self, config: &RulesConfig) -> Result<ScenarioReport> {
        let mut encounter = Encounter::new(self.map.build()?, config.clone())?;
        let mut keys: AHashMap<String, CharacterId> = AHashMap::new();
        let mut sides: AHashMap<String, PlayerId> = AHashMap::new();

        for spec in &self.characters {
            let character = build_character(spec, &mut sides)?;
            let id = encounter.add_character(character)?;
            if keys.insert(spec.key.clone(), id).is_some() {
                return Err(HexhavenError::InvalidScenario(format!(
                    "duplicate character key '{}'",
                    spec.key
                )));
            }
        }

        let mut steps = Vec::with_capacity(self.steps.len());
        for (index, step) in self.steps.iter().enumerate() {
            let (success, error) = match step {
                ScenarioStep::SelectCards {
                    actor,
                    top,
                    bottom,
                    hand,
                    stats,
                } => {
                    let hand: Vec<CardId> = hand.iter().copied().map(CardId).collect();
                    let v = encounter.select_cards(
                        lookup(&keys, actor)?,
                        CardId(*top),
                        CardId(*bottom),
                        &hand,
                        *stats,
                    )?;
                    (v.valid, v.error)
                }
                ScenarioStep::Move { actor, to } => {
                    let v = encounter.move_character(lookup(&keys, actor)?, *to)?;
                    (v.valid, v.error)
                }
                ScenarioStep::Action {
                    actor,
                    target,
                    action,
                } => {
                    let target = target.as_deref().map(|k| lookup(&keys, k)).transpose()?;
                    let r = encounter.perform_action(lookup(&keys, actor)?, action, target)?;
                    let error = r.error.or_else(|| {
                        (!r.failed_modifiers.is_empty()).then(|| {
                            r.failed_modifiers
                                .iter()
                                .map(|f| f.reason.as_str())
                                .collect::<Vec<_>>()
                                .join("; ")
                        })
                    });
                    (r.success, error)
                }
                ScenarioStep::EndTurn { actor } => {
                    encounter.end_turn(lookup(&keys, actor)?)?;
                    (true, None)
                }
                ScenarioStep::EndRound => {
                    encounter.end_round();
                    (true, None)
                }
            };

            if let Some(error) = &error {
                warn!(
                    scenario = %self.name,
                    index,
                    step = step.kind(),
                    %error,
                    "step reported a problem"
                );
            }
            steps.push(StepReport {
                index,
                step: step.kind().to_string(),
                success,
                error,
            });
        }

        let characters = self
            .characters
            .iter()
            .filter_map(|spec| {
                let id = keys.get(&spec.key)?;
                let c = encounter.character(*id)?;
                Some(CharacterSummary {
                    key: spec.key.clone(),
                    name: c.name.clone(),
                    health: c.current_health,
                    max_health: c.max_health(),
                    position: c.position,
                    exhausted: c.exhausted,
                    loot: encounter.loot_collected(*id),
                    conditions: c.conditions.iter().map(|(k, s)| (k, s.duration)).collect(),
                })
            })
            .collect();

        info!(
            scenario = %self.name,
            steps = steps.len(),
            round = encounter.current_round(),
            "scenario finished"
        );
        Ok(ScenarioReport {
            name: self.name.clone(),
            final_round: encounter.current_round(),
            decided: encounter.is_decided(),
            steps,
            characters,
            events: encounter.log().to_vec(),
        })
    }
}

fn lookup(keys: &AHashMap<String, CharacterId>, key: &str) -> Result<CharacterId> {
    keys.get(key)
        .copied()
        .ok_or_else(|| HexhavenError::InvalidScenario(format!("unknown character key '{}'", key)))
}

fn build_character(
    spec: &CharacterSpec,
    sides: &mut AHashMap<String, PlayerId>,
) -> Result<Character> {
    let name = spec.name.clone().unwrap_or_else(|| spec.key.clone());
    let stats = match (spec.stats, spec.class) {
        (Some(stats), _) => stats,
        (None, Some(class)) => class.base_stats(),
        (None, None) => {
            return Err(HexhavenError::InvalidScenario(format!(
                "character '{}' needs a class or a stat line",
                spec.key
            )))
        }
    };
    let mut character = Character::with_stats(name, stats, spec.position);
    character.class = spec.class;
    character.owner = spec
        .side
        .as_ref()
        .map(|side| *sides.entry(side.clone()).or_insert_with(PlayerId::new));
    for condition in &spec.conditions {
        character.add_condition(*condition);
    }
    Ok(character)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUEL: &str = r#"{
        "name": "duel",
        "map": { "radius": 3 },
        "characters": [
            { "key": "brute", "class": "brute", "side": "party", "position": { "q": 0, "r": 0 } },
            { "key": "guard", "name": "Bandit Guard",
              "stats": { "max_health": 5, "movement": 2, "attack": 2, "range": 1 },
              "position": { "q": 1, "r": 0 } }
        ],
        "steps": [
            { "step": "select_cards", "actor": "brute", "top": 1, "bottom": 2, "hand": [1, 2, 3],
              "stats": { "attack": 3 } },
            { "step": "action", "actor": "brute", "target": "guard",
              "action": { "type": "attack", "value": 3,
                          "modifiers": [ { "type": "push", "distance": 1 },
                                         { "type": "unknown_x" } ] } },
            { "step": "end_turn", "actor": "brute" },
            { "step": "end_round" }
        ]
    }"#;

    #[test]
    fn test_run_duel() {
        let scenario = Scenario::from_json_str(DUEL).expect("valid scenario");
        let report = scenario.run(&RulesConfig::default()).expect("runs");

        assert_eq!(report.final_round, 2);
        assert_eq!(report.steps.len(), 4);
        assert!(report.steps[1].success);
        assert!(report.steps[1]
            .error
            .as_deref()
            .is_some_and(|e| e.contains("unknown_x")));

        let guard = report
            .characters
            .iter()
            .find(|c| c.key == "guard")
            .expect("guard summary");
        assert_eq!(guard.health, 2);
        assert_eq!(guard.position, HexCoord::new(2, 0));
        assert_eq!(guard.name, "Bandit Guard");
    }

    #[test]
    fn test_unknown_key_is_error() {
        let mut scenario = Scenario::from_json_str(DUEL).expect("valid scenario");
        scenario.steps.push(ScenarioStep::EndTurn {
            actor: "nobody".into(),
        });
        assert!(matches!(
            scenario.run(&RulesConfig::default()),
            Err(HexhavenError::InvalidScenario(_))
        ));
    }

    #[test]
    fn test_character_needs_class_or_stats() {
        let mut scenario = Scenario::from_json_str(DUEL).expect("valid scenario");
        scenario.characters[0].class = None;
        assert!(scenario.run(&RulesConfig::default()).is_err());
    }

    #[test]
    fn test_empty_map_rejected() {
        let mut scenario = Scenario::from_json_str(DUEL).expect("valid scenario");
        scenario.map = MapSpec::default();
        assert!(matches!(
            scenario.run(&RulesConfig::default()),
            Err(HexhavenError::InvalidScenario(_))
        ));
    }
}
