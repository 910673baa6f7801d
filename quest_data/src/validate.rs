use std::collections::HashSet;
use std::fmt;

use crate::defs::*;

/// The kind of definition an id belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DefKind {
    Zone,
    Level,
    Actor,
    Item,
}

impl fmt::Display for DefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DefKind::Zone => "zone",
            DefKind::Level => "level",
            DefKind::Actor => "actor",
            DefKind::Item => "item",
        })
    }
}

/// A problem that keeps a `WorldDef` from being built into a world.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{kind} id '{id}' is defined more than once")]
    DuplicateId { kind: DefKind, id: String },
    #[error("level '{level}' belongs to unknown zone '{zone}'")]
    UnknownZone { level: String, zone: String },
    #[error("exit '{direction}' of level '{level}' leads to unknown level '{to}'")]
    DeadEndExit { level: String, direction: String, to: String },
    #[error("{kind} '{id}' is placed in unknown level '{level}'")]
    PlacedNowhere { kind: DefKind, id: String, level: String },
    #[error("item '{item}' is held by unknown actor '{holder}'")]
    UnknownHolder { item: String, holder: String },
    #[error("actor '{actor}' cannot be carried by '{holder}'")]
    CarriedActor { actor: String, holder: String },
}

/// Validate cross-references and basic invariants in a `WorldDef`.
///
/// ```
/// use quest_data::{LevelDef, WorldDef, ZoneDef, validate_world};
///
/// let world = WorldDef {
///     zones: vec![ZoneDef { id: "vale".into(), name: "The Vale".into() }],
///     levels: vec![LevelDef {
///         id: "vale-1".into(),
///         name: "Vale Road".into(),
///         zone: "vale".into(),
///         exits: Vec::new(),
///     }],
///     ..WorldDef::default()
/// };
/// assert!(validate_world(&world).is_empty());
/// ```
pub fn validate_world(world: &WorldDef) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut zones = HashSet::new();
    let mut levels = HashSet::new();
    let mut actors = HashSet::new();
    let mut items = HashSet::new();

    track_ids(DefKind::Zone, world.zones.iter().map(|z| z.id.as_str()), &mut zones, &mut errors);
    track_ids(DefKind::Level, world.levels.iter().map(|l| l.id.as_str()), &mut levels, &mut errors);
    track_ids(DefKind::Actor, world.actors.iter().map(|a| a.id.as_str()), &mut actors, &mut errors);
    track_ids(DefKind::Item, world.items.iter().map(|i| i.id.as_str()), &mut items, &mut errors);

    for level in &world.levels {
        if !zones.contains(level.zone.as_str()) {
            errors.push(ValidationError::UnknownZone {
                level: level.id.clone(),
                zone: level.zone.clone(),
            });
        }
        for exit in &level.exits {
            if !levels.contains(exit.to.as_str()) {
                errors.push(ValidationError::DeadEndExit {
                    level: level.id.clone(),
                    direction: exit.direction.clone(),
                    to: exit.to.clone(),
                });
            }
        }
    }

    for actor in &world.actors {
        match &actor.location {
            LocationDef::Level(id) if !levels.contains(id.as_str()) => {
                errors.push(ValidationError::PlacedNowhere {
                    kind: DefKind::Actor,
                    id: actor.id.clone(),
                    level: id.clone(),
                });
            },
            LocationDef::Actor(holder) => errors.push(ValidationError::CarriedActor {
                actor: actor.id.clone(),
                holder: holder.clone(),
            }),
            _ => {},
        }
    }

    for item in &world.items {
        match &item.location {
            LocationDef::Level(id) if !levels.contains(id.as_str()) => {
                errors.push(ValidationError::PlacedNowhere {
                    kind: DefKind::Item,
                    id: item.id.clone(),
                    level: id.clone(),
                });
            },
            LocationDef::Actor(id) if !actors.contains(id.as_str()) => {
                errors.push(ValidationError::UnknownHolder {
                    item: item.id.clone(),
                    holder: id.clone(),
                });
            },
            _ => {},
        }
    }

    errors
}

fn track_ids<'a>(
    kind: DefKind,
    ids: impl Iterator<Item = &'a str>,
    seen: &mut HashSet<&'a str>,
    errors: &mut Vec<ValidationError>,
) {
    for id in ids {
        if !seen.insert(id) {
            errors.push(ValidationError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
}
