use serde::{Deserialize, Serialize};

/// Token identifier used across `WorldDef` references.
pub type DefId = String;

/// Serialized description of a world the quest engine can populate.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorldDef {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub zones: Vec<ZoneDef>,
    #[serde(default)]
    pub levels: Vec<LevelDef>,
    #[serde(default)]
    pub actors: Vec<ActorDef>,
    #[serde(default)]
    pub items: Vec<ItemDef>,
}

/// A named group of levels; the unit of travel for goto steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneDef {
    pub id: DefId,
    pub name: String,
}

/// A level inside a zone, with exits to other levels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelDef {
    pub id: DefId,
    pub name: String,
    pub zone: DefId,
    #[serde(default)]
    pub exits: Vec<ExitDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitDef {
    pub direction: String,
    pub to: DefId,
    #[serde(default)]
    pub locked: bool,
}

/// Where an actor or item starts out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LocationDef {
    Level(DefId),
    Actor(DefId),
    #[default]
    Nowhere,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorDef {
    pub id: DefId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub location: LocationDef,
    #[serde(default = "alive_by_default")]
    pub alive: bool,
    /// Things this actor can tell a listener.
    #[serde(default)]
    pub lore: Vec<String>,
}

fn alive_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: DefId,
    pub name: String,
    pub location: LocationDef,
    /// Readable content, if any.
    #[serde(default)]
    pub text: Option<String>,
}
