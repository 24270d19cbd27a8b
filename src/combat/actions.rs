//! Card actions and their modifiers
//!
//! Both are closed enums tagged by `"type"` on the wire. Payloads written by
//! a newer client may carry variants this engine does not know; those land in
//! the `Unknown` wrappers with their type name kept, so the dispatcher can
//! report them by name.

use serde::{Deserialize, Serialize};

use crate::battle::hex::HexCoord;
use crate::combat::conditions::{Condition, ConditionDuration, EffectDuration};

/// Elemental infusions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Fire,
    Ice,
    Air,
    Earth,
    Light,
    Dark,
}

/// Sub-effect attached to a card action. Data only; the dispatcher
/// interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Modifier {
    Condition {
        #[serde(alias = "kind")]
        condition: Condition,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<ConditionDuration>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<serde_json::Value>,
    },
    Push {
        distance: u32,
    },
    Pull {
        distance: u32,
    },
    Shield {
        value: u32,
        #[serde(default)]
        duration: EffectDuration,
    },
    Retaliate {
        value: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range: Option<u32>,
        #[serde(default)]
        duration: EffectDuration,
    },
    Infuse {
        element: Element,
    },
    Consume {
        element: Element,
    },
    Range {
        value: u32,
    },
    Pierce {
        value: u32,
    },
    Aoe {
        pattern: Vec<HexCoord>,
    },
    Jump,
    Teleport,
    Lost,
    Recover {
        #[serde(default)]
        count: u32,
    },
    Discard {
        #[serde(default)]
        count: u32,
    },
    Round,
    Persistent,
    Xp {
        value: u32,
    },
    Heal {
        value: u32,
    },
    Target {
        count: u32,
    },
}

impl Modifier {
    /// Wire name of the variant
    pub fn type_name(&self) -> &'static str {
        match self {
            Modifier::Condition { .. } => "condition",
            Modifier::Push { .. } => "push",
            Modifier::Pull { .. } => "pull",
            Modifier::Shield { .. } => "shield",
            Modifier::Retaliate { .. } => "retaliate",
            Modifier::Infuse { .. } => "infuse",
            Modifier::Consume { .. } => "consume",
            Modifier::Range { .. } => "range",
            Modifier::Pierce { .. } => "pierce",
            Modifier::Aoe { .. } => "aoe",
            Modifier::Jump => "jump",
            Modifier::Teleport => "teleport",
            Modifier::Lost => "lost",
            Modifier::Recover { .. } => "recover",
            Modifier::Discard { .. } => "discard",
            Modifier::Round => "round",
            Modifier::Persistent => "persistent",
            Modifier::Xp { .. } => "xp",
            Modifier::Heal { .. } => "heal",
            Modifier::Target { .. } => "target",
        }
    }
}

/// A modifier this engine cannot interpret: an unknown type, or a known type
/// with a malformed payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnknownModifier {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl UnknownModifier {
    pub fn named(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: serde_json::Map::new(),
        }
    }
}

/// A modifier as printed on a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CardModifier {
    Known(Modifier),
    Unknown(UnknownModifier),
}

impl CardModifier {
    pub fn type_name(&self) -> &str {
        match self {
            CardModifier::Known(m) => m.type_name(),
            CardModifier::Unknown(u) => &u.type_name,
        }
    }
}

impl From<Modifier> for CardModifier {
    fn from(modifier: Modifier) -> Self {
        CardModifier::Known(modifier)
    }
}

/// Stat line for a summoned ally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummonDefinition {
    pub name: String,
    pub health: u32,
    #[serde(default)]
    pub movement: u32,
    #[serde(default)]
    pub attack: u32,
    #[serde(default = "default_summon_range")]
    pub range: u32,
}

fn default_summon_range() -> u32 {
    1
}

impl SummonDefinition {
    /// A summon needs a name and at least one health
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("summon has no name".into());
        }
        if self.health == 0 {
            return Err(format!("summon '{}' has 0 health", self.name));
        }
        Ok(())
    }
}

/// One half of a played card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Attack {
        value: u32,
        #[serde(default)]
        modifiers: Vec<CardModifier>,
    },
    Move {
        value: u32,
        #[serde(default)]
        modifiers: Vec<CardModifier>,
    },
    Heal {
        value: u32,
        #[serde(default)]
        modifiers: Vec<CardModifier>,
    },
    Loot {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<u32>,
        #[serde(default)]
        modifiers: Vec<CardModifier>,
    },
    Special {
        #[serde(default)]
        modifiers: Vec<CardModifier>,
    },
    Summon {
        summon: SummonDefinition,
        #[serde(default)]
        modifiers: Vec<CardModifier>,
    },
    Text {
        text: String,
    },
}

impl Action {
    pub fn modifiers(&self) -> &[CardModifier] {
        match self {
            Action::Attack { modifiers, .. }
            | Action::Move { modifiers, .. }
            | Action::Heal { modifiers, .. }
            | Action::Loot { modifiers, .. }
            | Action::Special { modifiers }
            | Action::Summon { modifiers, .. } => modifiers,
            Action::Text { .. } => &[],
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Action::Attack { .. } => "attack",
            Action::Move { .. } => "move",
            Action::Heal { .. } => "heal",
            Action::Loot { .. } => "loot",
            Action::Special { .. } => "special",
            Action::Summon { .. } => "summon",
            Action::Text { .. } => "text",
        }
    }
}

/// An action variant this engine does not know
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnknownAction {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// An action as read from a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CardAction {
    Known(Action),
    Unknown(UnknownAction),
}

impl From<Action> for CardAction {
    fn from(action: Action) -> Self {
        CardAction::Known(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_condition_modifier_accepts_kind_alias() {
        let m: CardModifier = serde_json::from_value(json!({
            "type": "condition",
            "kind": "poison",
            "duration": "round"
        }))
        .expect("parse");
        assert_eq!(
            m,
            CardModifier::Known(Modifier::Condition {
                condition: Condition::Poison,
                duration: Some(ConditionDuration::Round),
                metadata: None,
            })
        );
    }

    #[test]
    fn test_unknown_modifier_keeps_name() {
        let m: CardModifier =
            serde_json::from_value(json!({ "type": "unknown_x", "power": 3 })).expect("parse");
        match m {
            CardModifier::Unknown(u) => {
                assert_eq!(u.type_name, "unknown_x");
                assert_eq!(u.fields.get("power"), Some(&json!(3)));
            }
            other => panic!("expected unknown, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_known_modifier_is_unknown() {
        let m: CardModifier =
            serde_json::from_value(json!({ "type": "push" })).expect("parse");
        assert_eq!(m.type_name(), "push");
        assert!(matches!(m, CardModifier::Unknown(_)));
    }

    #[test]
    fn test_action_with_modifiers() {
        let a: CardAction = serde_json::from_value(json!({
            "type": "attack",
            "value": 3,
            "modifiers": [
                { "type": "push", "distance": 2 },
                { "type": "jump" }
            ]
        }))
        .expect("parse");
        let CardAction::Known(action) = a else {
            panic!("expected known action");
        };
        assert_eq!(action.type_name(), "attack");
        assert_eq!(action.modifiers().len(), 2);
        assert_eq!(action.modifiers()[1], CardModifier::Known(Modifier::Jump));
    }

    #[test]
    fn test_unknown_action() {
        let a: CardAction =
            serde_json::from_value(json!({ "type": "dance", "value": 1 })).expect("parse");
        assert!(matches!(a, CardAction::Unknown(ref u) if u.type_name == "dance"));
    }

    #[test]
    fn test_summon_validation() {
        let good = SummonDefinition {
            name: "Rat Swarm".into(),
            health: 3,
            movement: 2,
            attack: 1,
            range: 1,
        };
        assert!(good.validate().is_ok());
        let bad = SummonDefinition { health: 0, ..good };
        assert!(bad.validate().is_err());
    }
}
