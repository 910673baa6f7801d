//! Data structures representing the game world the quest system runs against.
//!
//! This module defines [`World`] and the entities it owns. It is deliberately small:
//! zones made of levels linked by exits, actors and items placed on levels or carried
//! by actors, and the per-entity quest component tables.

use crate::components::Components;
use crate::{Id, QUEST_ENGINE_VERSION};

use log::info;
use serde::{Deserialize, Serialize};

use std::collections::{HashMap, HashSet, VecDeque};
use variantly::Variantly;

/// Places where an actor or item may be located.
/// Levels and zones *are* the locations, so they carry no `Location` themselves.
#[derive(Copy, Debug, Default, Clone, Serialize, Deserialize, Variantly, PartialEq, Eq, Hash)]
pub enum Location {
    Level(Id),
    Actor(Id),
    #[default]
    Nowhere,
}

/// Methods common to any placeable object in the world.
pub trait WorldObject {
    fn id(&self) -> Id;
    fn name(&self) -> &str;
    fn location(&self) -> &Location;
}

/// A named group of levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exit {
    pub to: Id,
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub id: Id,
    pub name: String,
    pub zone: Id,
    pub exits: HashMap<String, Exit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Id,
    pub name: String,
    pub description: String,
    pub location: Location,
    pub alive: bool,
    pub inventory: HashSet<Id>,
    /// Things this actor can tell a listener.
    pub lore: Vec<String>,
    pub experience: u32,
    pub spells: Vec<String>,
}
impl Actor {
    pub fn new(id: Id, name: impl Into<String>, location: Location) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            location,
            alive: true,
            inventory: HashSet::new(),
            lore: Vec::new(),
            experience: 0,
            spells: Vec::new(),
        }
    }
}
impl WorldObject for Actor {
    fn id(&self) -> Id {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn location(&self) -> &Location {
        &self.location
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: Id,
    pub name: String,
    pub location: Location,
    /// Readable content, if any.
    pub text: Option<String>,
}
impl Item {
    pub fn new(id: Id, name: impl Into<String>, location: Location) -> Self {
        Self {
            id,
            name: name.into(),
            location,
            text: None,
        }
    }
}
impl WorldObject for Item {
    fn id(&self) -> Id {
        self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn location(&self) -> &Location {
        &self.location
    }
}

/// The set of zones a quest may be mapped into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub zones: Vec<Id>,
}
impl Area {
    pub fn new(zones: impl IntoIterator<Item = Id>) -> Self {
        Self {
            zones: zones.into_iter().collect(),
        }
    }

    pub fn contains(&self, zone: Id) -> bool {
        self.zones.contains(&zone)
    }
}

/// Complete state of the world.
///
/// `World` owns every zone, level, actor and item, plus the quest components attached
/// to them. It is created by the loader (or built by hand) and mutated by gameplay and
/// by the quest system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    pub title: String,
    pub zones: HashMap<Id, Zone>,
    pub levels: HashMap<Id, Level>,
    pub actors: HashMap<Id, Actor>,
    pub items: HashMap<Id, Item>,
    pub components: Components,
    pub version: String,
}

impl World {
    /// Create a new empty world.
    pub fn new_empty() -> World {
        let world = Self {
            version: QUEST_ENGINE_VERSION.to_string(),
            ..Self::default()
        };
        info!("new, empty 'World' created");
        world
    }

    /// Every zone, as an area.
    pub fn whole_area(&self) -> Area {
        let mut zones: Vec<Id> = self.zones.keys().copied().collect();
        zones.sort();
        Area { zones }
    }

    pub fn contains(&self, id: Id) -> bool {
        self.zones.contains_key(&id)
            || self.levels.contains_key(&id)
            || self.actors.contains_key(&id)
            || self.items.contains_key(&id)
    }

    /// Name of any entity, whatever its kind.
    pub fn entity_name(&self, id: Id) -> Option<&str> {
        if let Some(zone) = self.zones.get(&id) {
            return Some(&zone.name);
        }
        if let Some(level) = self.levels.get(&id) {
            return Some(&level.name);
        }
        if let Some(actor) = self.actors.get(&id) {
            return Some(&actor.name);
        }
        self.items.get(&id).map(|item| item.name.as_str())
    }

    /// Zone a location lies in. Items carried by an actor are in that actor's zone.
    pub fn zone_of(&self, location: &Location) -> Option<Id> {
        match location {
            Location::Level(level) => self.levels.get(level).map(|l| l.zone),
            Location::Actor(actor) => match self.actors.get(actor)?.location {
                Location::Level(level) => self.levels.get(&level).map(|l| l.zone),
                _ => None,
            },
            Location::Nowhere => None,
        }
    }

    pub fn actor_zone(&self, actor: Id) -> Option<Id> {
        self.actors.get(&actor).and_then(|a| self.zone_of(&a.location))
    }

    pub fn item_zone(&self, item: Id) -> Option<Id> {
        self.items.get(&item).and_then(|i| self.zone_of(&i.location))
    }

    /// Actors standing in a zone, sorted by id.
    pub fn actors_in_zone(&self, zone: Id) -> Vec<Id> {
        let mut found: Vec<Id> = self
            .actors
            .values()
            .filter(|a| self.zone_of(&a.location) == Some(zone))
            .map(|a| a.id)
            .collect();
        found.sort();
        found
    }

    /// Items lying on the zone's levels or carried by actors there, sorted by id.
    pub fn items_in_zone(&self, zone: Id) -> Vec<Id> {
        let mut found: Vec<Id> = self
            .items
            .values()
            .filter(|i| self.zone_of(&i.location) == Some(zone))
            .map(|i| i.id)
            .collect();
        found.sort();
        found
    }

    /// Zones directly reachable through level exits, sorted by id.
    pub fn zone_neighbors(&self, zone: Id) -> Vec<Id> {
        let mut found: Vec<Id> = self
            .levels
            .values()
            .filter(|l| l.zone == zone)
            .flat_map(|l| l.exits.values())
            .filter_map(|exit| self.levels.get(&exit.to).map(|l| l.zone))
            .filter(|z| *z != zone)
            .collect();
        found.sort();
        found.dedup();
        found
    }

    /// Zones reachable from `from` without leaving `area`, nearest first. `from` is excluded.
    pub fn reachable_zones(&self, from: Id, area: &Area) -> Vec<Id> {
        let mut seen = HashSet::from([from]);
        let mut queue = VecDeque::from([from]);
        let mut found = Vec::new();
        while let Some(zone) = queue.pop_front() {
            for next in self.zone_neighbors(zone) {
                if area.contains(next) && seen.insert(next) {
                    found.push(next);
                    queue.push_back(next);
                }
            }
        }
        found
    }

    /// Any level of a zone, for placing things "in" that zone.
    pub fn first_level_in(&self, zone: Id) -> Option<Id> {
        self.levels.values().filter(|l| l.zone == zone).map(|l| l.id).min()
    }

    pub fn add_zone(&mut self, zone: Zone) -> Id {
        let id = zone.id;
        self.zones.insert(id, zone);
        id
    }

    pub fn add_level(&mut self, level: Level) -> Id {
        let id = level.id;
        self.levels.insert(id, level);
        id
    }

    /// Link two levels with a pair of unlocked exits.
    pub fn connect(&mut self, a: Id, b: Id) {
        let names = (self.entity_name(a).map(str::to_string), self.entity_name(b).map(str::to_string));
        if let (Some(a_name), Some(b_name)) = names {
            if let Some(level) = self.levels.get_mut(&a) {
                level.exits.insert(b_name, Exit { to: b, locked: false });
            }
            if let Some(level) = self.levels.get_mut(&b) {
                level.exits.insert(a_name, Exit { to: a, locked: false });
            }
        }
    }

    pub fn add_actor(&mut self, actor: Actor) -> Id {
        let id = actor.id;
        self.actors.insert(id, actor);
        id
    }

    /// Insert an item, registering it in its carrier's inventory.
    pub fn add_item(&mut self, item: Item) -> Id {
        let id = item.id;
        if let Location::Actor(holder) = item.location
            && let Some(actor) = self.actors.get_mut(&holder)
        {
            actor.inventory.insert(id);
        }
        self.items.insert(id, item);
        id
    }

    /// Move an actor. Returns false if the actor does not exist.
    pub fn move_actor(&mut self, actor: Id, to: Location) -> bool {
        match self.actors.get_mut(&actor) {
            Some(a) => {
                a.location = to;
                true
            },
            None => false,
        }
    }

    /// Hand an item to an actor, taking it from any previous carrier.
    pub fn give_item(&mut self, item: Id, to: Id) -> bool {
        if !self.actors.contains_key(&to) {
            return false;
        }
        let Some(it) = self.items.get_mut(&item) else {
            return false;
        };
        if let Location::Actor(holder) = it.location
            && let Some(prev) = self.actors.get_mut(&holder)
        {
            prev.inventory.remove(&item);
        }
        it.location = Location::Actor(to);
        if let Some(actor) = self.actors.get_mut(&to) {
            actor.inventory.insert(item);
        }
        true
    }

    pub fn kill_actor(&mut self, actor: Id) -> bool {
        match self.actors.get_mut(&actor) {
            Some(a) => {
                a.alive = false;
                true
            },
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idgen::new_id;

    fn zone_with_level(world: &mut World, name: &str) -> (Id, Id) {
        let zone = world.add_zone(Zone {
            id: new_id(),
            name: name.to_string(),
        });
        let level = world.add_level(Level {
            id: new_id(),
            name: format!("{name} level"),
            zone,
            exits: HashMap::new(),
        });
        (zone, level)
    }

    /// Three zones in a line plus one island zone.
    fn line_world() -> (World, [Id; 4], [Id; 4]) {
        let mut world = World::new_empty();
        let (z0, l0) = zone_with_level(&mut world, "Meadow");
        let (z1, l1) = zone_with_level(&mut world, "Forest");
        let (z2, l2) = zone_with_level(&mut world, "Cave");
        let (z3, l3) = zone_with_level(&mut world, "Island");
        world.connect(l0, l1);
        world.connect(l1, l2);
        (world, [z0, z1, z2, z3], [l0, l1, l2, l3])
    }

    #[test]
    fn location_default_is_nowhere() {
        assert_eq!(Location::default(), Location::Nowhere);
        assert!(Location::Nowhere.is_nowhere());
        let id = new_id();
        assert_eq!(Location::Level(id).level_ref(), Some(&id));
    }

    #[test]
    fn new_empty_world_carries_version() {
        let world = World::new_empty();
        assert!(world.actors.is_empty());
        assert_eq!(world.version, crate::QUEST_ENGINE_VERSION);
    }

    #[test]
    fn neighbors_follow_exits_between_zones() {
        let (world, z, _) = line_world();
        assert_eq!(world.zone_neighbors(z[1]).len(), 2);
        assert_eq!(world.zone_neighbors(z[0]), vec![z[1]]);
        assert!(world.zone_neighbors(z[3]).is_empty());
    }

    #[test]
    fn reachable_zones_stay_inside_the_area() {
        let (world, z, _) = line_world();
        assert_eq!(world.reachable_zones(z[0], &world.whole_area()), vec![z[1], z[2]]);
        let small = Area::new([z[0], z[1]]);
        assert_eq!(world.reachable_zones(z[0], &small), vec![z[1]]);
    }

    #[test]
    fn carried_items_are_in_the_carriers_zone() {
        let (mut world, z, l) = line_world();
        let smith = world.add_actor(Actor::new(new_id(), "Smith", Location::Level(l[1])));
        let hammer = world.add_item(Item::new(new_id(), "hammer", Location::Actor(smith)));
        assert!(world.actors[&smith].inventory.contains(&hammer));
        assert_eq!(world.item_zone(hammer), Some(z[1]));
        assert_eq!(world.items_in_zone(z[1]), vec![hammer]);
        assert_eq!(world.actors_in_zone(z[1]), vec![smith]);
    }

    #[test]
    fn give_item_moves_between_inventories() {
        let (mut world, _, l) = line_world();
        let a = world.add_actor(Actor::new(new_id(), "A", Location::Level(l[0])));
        let b = world.add_actor(Actor::new(new_id(), "B", Location::Level(l[0])));
        let coin = world.add_item(Item::new(new_id(), "coin", Location::Actor(a)));
        assert!(world.give_item(coin, b));
        assert!(!world.actors[&a].inventory.contains(&coin));
        assert!(world.actors[&b].inventory.contains(&coin));
        assert_eq!(world.items[&coin].location, Location::Actor(b));
        assert!(!world.give_item(coin, new_id()));
    }

    #[test]
    fn entity_names_cover_every_kind() {
        let (mut world, z, l) = line_world();
        let wolf = world.add_actor(Actor::new(new_id(), "Wolf", Location::Level(l[2])));
        assert_eq!(world.entity_name(z[0]), Some("Meadow"));
        assert_eq!(world.entity_name(l[0]), Some("Meadow level"));
        assert_eq!(world.entity_name(wolf), Some("Wolf"));
        assert!(world.kill_actor(wolf));
        assert!(!world.actors[&wolf].alive);
        assert_eq!(world.entity_name(new_id()), None);
    }
}
