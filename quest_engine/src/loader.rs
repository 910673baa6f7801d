//! Loader for building a [`World`] from a serialized `WorldDef`.
//!
//! Definition tokens are turned into stable v5 ids, so the same file always yields the
//! same entity ids. That is what lets saved quest bindings resolve against a freshly
//! loaded world.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use log::info;
use quest_data::{ActorDef, ExitDef, ItemDef, LevelDef, LocationDef, WorldDef, validate_world};

use crate::Id;
use crate::idgen::{NAMESPACE_ACTOR, NAMESPACE_ITEM, NAMESPACE_LEVEL, NAMESPACE_ZONE, uuid_from_token};
use crate::world::{Actor, Exit, Item, Level, Location, World, Zone};

/// Load a `WorldDef` from a RON file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn load_worlddef(path: &Path) -> Result<WorldDef> {
    let text = fs::read_to_string(path).with_context(|| format!("reading worlddef from '{}'", path.display()))?;
    ron::from_str(&text).with_context(|| format!("parsing worlddef RON from '{}'", path.display()))
}

/// Read, validate and build a world from a RON file.
///
/// # Errors
/// Errors bubble up from file IO, deserialization, or validation.
pub fn load_world(path: &Path) -> Result<World> {
    let def = load_worlddef(path).context("while loading worlddef from file")?;
    build_world(&def).context("while building world from worlddef")
}

/// Convert a `WorldDef` into a populated `World`.
///
/// # Errors
/// Returns a single aggregated error if the definition fails validation.
pub fn build_world(def: &WorldDef) -> Result<World> {
    validate_worlddef(def)?;
    let mut world = World::new_empty();
    world.title.clone_from(&def.title);

    for zone in &def.zones {
        world.add_zone(Zone {
            id: uuid_from_token(&NAMESPACE_ZONE, &zone.id),
            name: zone.name.clone(),
        });
    }
    for level in &def.levels {
        world.add_level(level_from_def(level));
    }
    for actor in &def.actors {
        world.add_actor(actor_from_def(actor));
    }
    // actors first, so carried items land in inventories
    for item in &def.items {
        world.add_item(item_from_def(item));
    }

    info!("{} zones added to World", world.zones.len());
    info!("{} levels added to World", world.levels.len());
    info!("{} actors added to World", world.actors.len());
    info!("{} items added to World", world.items.len());
    Ok(world)
}

/// Id a definition token of the given kind maps to.
pub fn zone_id(token: &str) -> Id {
    uuid_from_token(&NAMESPACE_ZONE, token)
}

pub fn level_id(token: &str) -> Id {
    uuid_from_token(&NAMESPACE_LEVEL, token)
}

pub fn actor_id(token: &str) -> Id {
    uuid_from_token(&NAMESPACE_ACTOR, token)
}

pub fn item_id(token: &str) -> Id {
    uuid_from_token(&NAMESPACE_ITEM, token)
}

fn validate_worlddef(def: &WorldDef) -> Result<()> {
    let errors = validate_world(def);
    if errors.is_empty() {
        return Ok(());
    }
    let details = errors
        .into_iter()
        .map(|err| format!("- {err}"))
        .collect::<Vec<_>>()
        .join("\n");
    bail!("worlddef validation failed:\n{details}");
}

fn level_from_def(def: &LevelDef) -> Level {
    let exits: HashMap<String, Exit> = def
        .exits
        .iter()
        .map(|exit: &ExitDef| {
            (
                exit.direction.clone(),
                Exit {
                    to: level_id(&exit.to),
                    locked: exit.locked,
                },
            )
        })
        .collect();
    Level {
        id: level_id(&def.id),
        name: def.name.clone(),
        zone: zone_id(&def.zone),
        exits,
    }
}

fn location_from_def(def: &LocationDef) -> Location {
    match def {
        LocationDef::Level(level) => Location::Level(level_id(level)),
        LocationDef::Actor(actor) => Location::Actor(actor_id(actor)),
        LocationDef::Nowhere => Location::Nowhere,
    }
}

fn actor_from_def(def: &ActorDef) -> Actor {
    let mut actor = Actor::new(actor_id(&def.id), def.name.clone(), location_from_def(&def.location));
    actor.description.clone_from(&def.description);
    actor.alive = def.alive;
    actor.lore.clone_from(&def.lore);
    actor
}

fn item_from_def(def: &ItemDef) -> Item {
    let mut item = Item::new(item_id(&def.id), def.name.clone(), location_from_def(&def.location));
    item.text.clone_from(&def.text);
    item
}
