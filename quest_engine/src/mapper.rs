//! Resource mapper: binds an abstract quest to concrete world entities.
//!
//! [`QuestPopulate`] walks the flattened steps of a [`quest_grammar::Quest`] in order,
//! keeping a cursor on the zone the quester would be standing in and a set of entities
//! already claimed by earlier steps. Mapping either binds every step or binds nothing;
//! the world is only touched later by [`QuestPopulate::add_quest_components`].

use std::collections::HashSet;

use log::{debug, info};
use quest_data::{EntityRef, QuestData, QuestId, TargetBinding, TargetType};
use quest_grammar::{Quest, QuestNode, TaskKind, TaskToken};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::Id;
use crate::components::{
    QuestEscortTarget, QuestGiveTarget, QuestGiver, QuestInfo, QuestReadTarget, QuestReport, Reward,
};
use crate::config::MapperConfig;
use crate::quest::StepRef;
use crate::world::{Area, World};

/// Why a quest could not be mapped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapFailure {
    #[error("start zone {0} is not part of the area")]
    OutsideArea(Id),
    #[error("no one in zone {0} can give the quest")]
    NoGiver(Id),
    #[error("no zone reachable from {0} inside the area")]
    NoRoute(Id),
    #[error("no free actor for a {kind} step in zone {zone}")]
    NoActor { kind: TaskKind, zone: Id },
    #[error("no free item for a {kind} step in zone {zone}")]
    NoItem { kind: TaskKind, zone: Id },
    #[error("quest ids are used up")]
    QuestIdsExhausted,
}

/// A role marker to attach once the mapping is materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Role {
    Info(String),
    Report(Option<String>),
    Escort(Id),
    /// `text` is only set when the item does not already name `reveals`.
    Read { reveals: Id, text: Option<String> },
    Give(Option<Id>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PlannedRole {
    entity: Id,
    at: StepRef,
    role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Mapped {
    data: QuestData,
    roles: Vec<PlannedRole>,
    next_quest_id: u32,
}

/// Binds abstract quests to world resources.
pub struct QuestPopulate<R: Rng = StdRng> {
    rng: R,
    lore: Vec<String>,
    giver: Option<Id>,
    reward: Option<Reward>,
    experience_per_step: u32,
    mapped: Option<Mapped>,
    last_failure: Option<MapFailure>,
}

impl QuestPopulate<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Mapper set up from configuration, seeded from the generator seed if one is set.
    pub fn from_config(config: &MapperConfig, seed: Option<u64>) -> Self {
        let mut mapper = match seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::new(),
        };
        mapper.set_lore(&config.lore);
        mapper.experience_per_step = config.experience_per_step;
        mapper
    }
}

impl Default for QuestPopulate<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> QuestPopulate<R> {
    pub fn with_rng(rng: R) -> QuestPopulate<R> {
        let defaults = MapperConfig::default();
        QuestPopulate {
            rng,
            lore: defaults.lore,
            giver: None,
            reward: None,
            experience_per_step: defaults.experience_per_step,
            mapped: None,
            last_failure: None,
        }
    }

    /// Lines used for listen steps when the speaker knows nothing of their own.
    pub fn set_lore(&mut self, lines: &[String]) {
        self.lore = lines.to_vec();
    }

    /// Use this actor as the quest giver instead of picking one in the start zone.
    pub fn set_giver(&mut self, giver: Option<Id>) {
        self.giver = giver;
    }

    /// Reward placed on the giver; without one, experience per step is granted.
    pub fn set_reward(&mut self, reward: Option<Reward>) {
        self.reward = reward;
    }

    /// Result of the last successful mapping.
    pub fn quest_data(&self) -> Option<&QuestData> {
        self.mapped.as_ref().map(|m| &m.data)
    }

    /// Why the last mapping failed, if it did.
    pub fn last_failure(&self) -> Option<&MapFailure> {
        self.last_failure.as_ref()
    }

    /// Bind every step of `quest`, starting in `zone` and staying inside `area`.
    ///
    /// Returns false on the first step that cannot be satisfied. A failed mapping keeps
    /// nothing; neither the mapper nor the world is left with partial bindings.
    pub fn map_quest_to_resources(&mut self, world: &World, quest: &Quest, zone: Id, area: &Area) -> bool {
        self.mapped = None;
        self.last_failure = None;
        let giver = self.giver;
        let result = Walk::new(world, area, &mut self.rng, &self.lore, zone).run(quest, giver);
        match result {
            Ok(mapped) => {
                info!(
                    "mapped {} with {} steps in {} quest levels",
                    mapped.data.id,
                    mapped.data.num_steps(),
                    mapped.data.quest_ids().len()
                );
                self.mapped = Some(mapped);
                true
            },
            Err(failure) => {
                info!("quest mapping failed: {failure}");
                self.last_failure = Some(failure);
                false
            },
        }
    }

    /// Attach the giver, target and role components of the last mapping to the world.
    ///
    /// Returns the root quest id, or `None` if nothing has been mapped.
    pub fn add_quest_components(&self, world: &mut World) -> Option<QuestId> {
        let mapped = self.mapped.as_ref()?;
        let data = &mapped.data;
        let reward = self.reward.clone().or_else(|| {
            let steps = u32::try_from(data.num_steps()).unwrap_or(u32::MAX);
            Some(Reward::Experience(steps.saturating_mul(self.experience_per_step)))
        });
        let description = format!("{} has a task in {} steps.", data.giver.name, data.num_steps());
        world
            .components
            .givers
            .insert(data.giver.id, QuestGiver::new(data.clone(), reward, description));

        add_targets(world, data);

        for planned in &mapped.roles {
            let components = &mut world.components;
            let (entity, at) = (planned.entity, planned.at);
            match &planned.role {
                Role::Info(info) => components.infos.entry(entity).or_default().push(QuestInfo {
                    at,
                    info: info.clone(),
                }),
                Role::Report(expect) => components.reports.entry(entity).or_default().push(QuestReport {
                    at,
                    expect: expect.clone(),
                }),
                Role::Escort(escort_to) => components
                    .escorts
                    .entry(entity)
                    .or_default()
                    .push(QuestEscortTarget { at, escort_to: *escort_to }),
                Role::Read { reveals, text } => {
                    components
                        .reads
                        .entry(entity)
                        .or_default()
                        .push(QuestReadTarget { at, reveals: *reveals });
                    if let Some(text) = text
                        && let Some(item) = world.items.get_mut(&entity)
                    {
                        item.text = Some(text.clone());
                    }
                },
                Role::Give(item) => components
                    .gives
                    .entry(entity)
                    .or_default()
                    .push(QuestGiveTarget { at, item: *item }),
            }
        }

        let next = &mut world.components.next_quest_id;
        *next = (*next).max(mapped.next_quest_id);
        debug!("quest components for {} added to world", data.id);
        Some(data.id)
    }
}

fn add_targets(world: &mut World, data: &QuestData) {
    for binding in &data.path {
        world
            .components
            .targets
            .entry(binding.id)
            .or_default()
            .add(data.id, binding.target_type);
    }
    for nested in &data.nested {
        add_targets(world, nested);
    }
}

/// State of one mapping attempt.
struct Walk<'a, R: Rng> {
    world: &'a World,
    area: &'a Area,
    rng: &'a mut R,
    lore: &'a [String],
    next_quest_id: u32,
    bound: HashSet<Id>,
    cursor: Id,
    latest_info: Option<String>,
    latest_item: Option<Id>,
    destination: Option<Id>,
    roles: Vec<PlannedRole>,
}

impl<'a, R: Rng> Walk<'a, R> {
    fn new(world: &'a World, area: &'a Area, rng: &'a mut R, lore: &'a [String], zone: Id) -> Self {
        Self {
            world,
            area,
            rng,
            lore,
            next_quest_id: world.components.next_quest_id,
            bound: HashSet::new(),
            cursor: zone,
            latest_info: None,
            latest_item: None,
            destination: None,
            roles: Vec::new(),
        }
    }

    fn run(mut self, quest: &Quest, giver: Option<Id>) -> Result<Mapped, MapFailure> {
        if !self.area.contains(self.cursor) {
            return Err(MapFailure::OutsideArea(self.cursor));
        }
        let giver = match giver.filter(|g| self.world.actors.contains_key(g)) {
            Some(giver) => giver,
            None => self
                .pick(self.free_actors(self.cursor))
                .ok_or(MapFailure::NoGiver(self.cursor))?,
        };
        self.bound.insert(giver);
        let data = self.map_level(quest, self.entity_ref(giver))?;
        Ok(Mapped {
            data,
            roles: self.roles,
            next_quest_id: self.next_quest_id,
        })
    }

    fn map_level(&mut self, quest: &Quest, giver: EntityRef) -> Result<QuestData, MapFailure> {
        let id = QuestId(self.next_quest_id);
        self.next_quest_id = self
            .next_quest_id
            .checked_add(1)
            .ok_or(MapFailure::QuestIdsExhausted)?;
        let mut data = QuestData::new(id, giver);
        for node in quest.nodes() {
            let at = StepRef::new(id, data.path.len());
            match node {
                QuestNode::Task(task) => {
                    if let Some(binding) = self.bind_task(task, at, &data.giver)? {
                        debug!("{id} step {}: {task} -> {}", at.step, binding.name);
                        data.add(binding);
                    }
                },
                QuestNode::Quest(sub) => {
                    let sub_giver = self
                        .pick(self.free_actors(self.cursor))
                        .ok_or(MapFailure::NoActor {
                            kind: TaskKind::Generic,
                            zone: self.cursor,
                        })?;
                    self.bound.insert(sub_giver);
                    let nested = self.map_level(sub, self.entity_ref(sub_giver))?;
                    data.add(TargetBinding::sub_quest(sub_giver, nested.giver.name.clone(), nested.id));
                    data.nested.push(nested);
                },
            }
        }
        Ok(data)
    }

    fn bind_task(&mut self, task: &TaskToken, at: StepRef, giver: &EntityRef) -> Result<Option<TargetBinding>, MapFailure> {
        let kind = task.kind();
        let zone = self.cursor;
        let binding = match kind {
            TaskKind::Goto if task.is_trivial() => {
                let mut here = self.leaf(zone, TargetType::Location);
                here.is_completed = true;
                here
            },
            _ if task.is_trivial() => return Ok(None),
            TaskKind::Goto => {
                let next = match self.destination.take() {
                    Some(dest) => dest,
                    None => {
                        let neighbors: Vec<Id> = self
                            .world
                            .zone_neighbors(zone)
                            .into_iter()
                            .filter(|z| self.area.contains(*z))
                            .collect();
                        self.pick(neighbors).ok_or(MapFailure::NoRoute(zone))?
                    },
                };
                self.cursor = next;
                self.leaf(next, TargetType::Location)
            },
            TaskKind::Kill | TaskKind::Damage | TaskKind::Escort => {
                let actor = self.claim_actor(kind)?;
                let ty = match kind {
                    TaskKind::Kill => TargetType::Kill,
                    TaskKind::Damage => TargetType::Damage,
                    _ => {
                        self.plan(actor, at, Role::Escort(zone));
                        TargetType::Escort
                    },
                };
                self.leaf(actor, ty)
            },
            TaskKind::Listen => {
                let actor = self.claim_actor(kind)?;
                let info = self.lore_of(actor);
                self.latest_info = Some(info.clone());
                self.plan(actor, at, Role::Info(info));
                self.leaf(actor, TargetType::Listen)
            },
            TaskKind::Report | TaskKind::Give => {
                let recipient = self.recipient(giver, kind)?;
                if kind == TaskKind::Report {
                    self.plan(recipient, at, Role::Report(self.latest_info.clone()));
                    self.leaf(recipient, TargetType::Report)
                } else {
                    self.plan(recipient, at, Role::Give(self.latest_item));
                    self.leaf(recipient, TargetType::Give)
                }
            },
            TaskKind::Get | TaskKind::Steal => {
                let mut items = self.free_items(zone);
                if kind == TaskKind::Steal {
                    let carried: Vec<Id> = items
                        .iter()
                        .copied()
                        .filter(|i| self.world.items[i].location.is_actor())
                        .collect();
                    if !carried.is_empty() {
                        items = carried;
                    }
                }
                let item = self.pick(items).ok_or(MapFailure::NoItem { kind, zone })?;
                self.bound.insert(item);
                self.latest_item = Some(item);
                let ty = if kind == TaskKind::Steal {
                    TargetType::Steal
                } else {
                    TargetType::Get
                };
                self.leaf(item, ty)
            },
            TaskKind::Read => {
                let reachable = self.world.reachable_zones(zone, self.area);
                let items = self.free_items(zone);
                if reachable.is_empty() {
                    return Err(MapFailure::NoRoute(zone));
                }
                // an item that already names a reachable zone is the natural pick
                let named = items.iter().find_map(|i| {
                    let text = self.world.items[i].text.as_deref()?;
                    reachable
                        .iter()
                        .find(|z| self.world.entity_name(**z).is_some_and(|n| text.contains(n)))
                        .map(|z| (*i, *z))
                });
                let (item, reveals, text) = match named {
                    Some((item, reveals)) => (item, reveals, None),
                    None => {
                        let item = self.pick(items).ok_or(MapFailure::NoItem { kind, zone })?;
                        let reveals = self.pick(reachable).ok_or(MapFailure::NoRoute(zone))?;
                        let text = format!(
                            "Scrawled on the {}: the way to {}.",
                            self.name_of(item),
                            self.name_of(reveals)
                        );
                        (item, reveals, Some(text))
                    },
                };
                self.bound.insert(item);
                self.destination = Some(reveals);
                self.plan(item, at, Role::Read { reveals, text });
                self.leaf(item, TargetType::Read)
            },
            TaskKind::Generic => self.leaf(zone, TargetType::Task),
        };
        Ok(Some(binding))
    }

    fn claim_actor(&mut self, kind: TaskKind) -> Result<Id, MapFailure> {
        let zone = self.cursor;
        let actor = self
            .pick(self.free_actors(zone))
            .ok_or(MapFailure::NoActor { kind, zone })?;
        self.bound.insert(actor);
        Ok(actor)
    }

    /// Who receives a report or an item: the level's giver while alive, else someone nearby.
    fn recipient(&mut self, giver: &EntityRef, kind: TaskKind) -> Result<Id, MapFailure> {
        if self.world.actors.get(&giver.id).is_some_and(|a| a.alive) {
            return Ok(giver.id);
        }
        self.claim_actor(kind)
    }

    fn free_actors(&self, zone: Id) -> Vec<Id> {
        self.world
            .actors_in_zone(zone)
            .into_iter()
            .filter(|a| !self.bound.contains(a) && self.world.actors[a].alive)
            .collect()
    }

    fn free_items(&self, zone: Id) -> Vec<Id> {
        self.world
            .items_in_zone(zone)
            .into_iter()
            .filter(|i| !self.bound.contains(i))
            .collect()
    }

    fn pick(&mut self, candidates: Vec<Id>) -> Option<Id> {
        candidates.choose(&mut *self.rng).copied()
    }

    fn lore_of(&mut self, actor: Id) -> String {
        let own = self.world.actors.get(&actor).map(|a| a.lore.as_slice()).unwrap_or_default();
        own.choose(&mut *self.rng)
            .or_else(|| self.lore.choose(&mut *self.rng))
            .cloned()
            .unwrap_or_else(|| format!("{} has nothing new to say.", self.name_of(actor)))
    }

    fn plan(&mut self, entity: Id, at: StepRef, role: Role) {
        self.roles.push(PlannedRole { entity, at, role });
    }

    fn name_of(&self, id: Id) -> String {
        self.world.entity_name(id).unwrap_or_default().to_string()
    }

    fn entity_ref(&self, id: Id) -> EntityRef {
        EntityRef::new(id, self.name_of(id))
    }

    fn leaf(&self, id: Id, target_type: TargetType) -> TargetBinding {
        TargetBinding::leaf(id, self.name_of(id), target_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idgen::new_id;
    use crate::world::{Actor, Item, Level, Location, Zone};
    use std::collections::HashMap;

    /// Two connected zones; the first holds an elder, a wolf and a note.
    fn small_world() -> (World, Id, Id, Id) {
        let mut world = World::new_empty();
        let mut levels = Vec::new();
        let mut zones = Vec::new();
        for name in ["Village", "Woods"] {
            let zone = world.add_zone(Zone {
                id: new_id(),
                name: name.into(),
            });
            levels.push(world.add_level(Level {
                id: new_id(),
                name: format!("{name} square"),
                zone,
                exits: HashMap::new(),
            }));
            zones.push(zone);
        }
        world.connect(levels[0], levels[1]);
        let elder = world.add_actor(Actor::new(new_id(), "Elder", Location::Level(levels[0])));
        world.add_actor(Actor::new(new_id(), "Wolf", Location::Level(levels[0])));
        world.add_item(Item::new(new_id(), "note", Location::Level(levels[0])));
        (world, zones[0], zones[1], elder)
    }

    #[test]
    fn trivial_goto_binds_the_current_zone_completed() {
        let (world, village, _, elder) = small_world();
        let quest = Quest::from_tokens(&["already_there", "already_know_it", "kill"]).unwrap();
        let mut mapper = QuestPopulate::with_seed(1);
        mapper.set_giver(Some(elder));
        assert!(mapper.map_quest_to_resources(&world, &quest, village, &world.whole_area()));
        let data = mapper.quest_data().unwrap();
        assert_eq!(data.path.len(), 2);
        assert_eq!(data.path[0].id, village);
        assert!(data.path[0].is_completed);
        assert_eq!(data.path[1].name, "Wolf");
    }

    #[test]
    fn failure_leaves_nothing_behind() {
        let (world, village, _, elder) = small_world();
        let mut mapper = QuestPopulate::with_seed(2);
        mapper.set_giver(Some(elder));
        let ok = Quest::from_tokens(&["kill"]).unwrap();
        assert!(mapper.map_quest_to_resources(&world, &ok, village, &world.whole_area()));
        // only one actor besides the giver, so a second kill cannot be bound
        let too_many = Quest::from_tokens(&["kill", "kill"]).unwrap();
        assert!(!mapper.map_quest_to_resources(&world, &too_many, village, &world.whole_area()));
        assert!(mapper.quest_data().is_none());
        assert!(matches!(mapper.last_failure(), Some(MapFailure::NoActor { .. })));
    }

    #[test]
    fn goto_needs_a_neighbor_inside_the_area() {
        let (world, village, _, elder) = small_world();
        let mut mapper = QuestPopulate::with_seed(3);
        mapper.set_giver(Some(elder));
        let quest = Quest::from_tokens(&["<goto>goto"]).unwrap();
        let island = Area::new([village]);
        assert!(!mapper.map_quest_to_resources(&world, &quest, village, &island));
        assert_eq!(mapper.last_failure(), Some(&MapFailure::NoRoute(village)));
        assert!(mapper.map_quest_to_resources(&world, &quest, village, &world.whole_area()));
    }

    #[test]
    fn read_points_the_next_goto_at_the_revealed_zone() {
        let (world, village, woods, elder) = small_world();
        let mut mapper = QuestPopulate::with_seed(4);
        mapper.set_giver(Some(elder));
        let quest = Quest::from_tokens(&["<learn>read", "<goto>goto"]).unwrap();
        assert!(mapper.map_quest_to_resources(&world, &quest, village, &world.whole_area()));
        let data = mapper.quest_data().unwrap();
        assert_eq!(data.path[0].name, "note");
        assert_eq!(data.path[1].id, woods);
    }

    #[test]
    fn components_are_attached_to_bound_entities() {
        let (mut world, village, _, elder) = small_world();
        let mut mapper = QuestPopulate::with_seed(5);
        mapper.set_giver(Some(elder));
        let quest = Quest::from_tokens(&["listen", "report"]).unwrap();
        assert!(mapper.map_quest_to_resources(&world, &quest, village, &world.whole_area()));
        let id = mapper.add_quest_components(&mut world).unwrap();

        let giver = &world.components.givers[&elder];
        assert!(!giver.has_given_quest);
        assert_eq!(giver.reward, Some(Reward::Experience(20)));
        let wolf = mapper.quest_data().unwrap().path[0].id;
        let info = &world.components.infos[&wolf][0];
        let report = &world.components.reports[&elder][0];
        assert_eq!(report.expect.as_deref(), Some(info.info.as_str()));
        assert!(world.components.targets[&wolf].names(id));
        assert_eq!(world.components.next_quest_id, id.0 + 1);
    }

    #[test]
    fn same_seed_gives_the_same_fallback_lore() {
        let (world, village, _, elder) = small_world();
        let quest = Quest::from_tokens(&["listen", "report"]).unwrap();
        let heard: Vec<String> = (0..5)
            .map(|_| {
                let mut mapper = QuestPopulate::with_seed(1);
                mapper.set_giver(Some(elder));
                assert!(mapper.map_quest_to_resources(&world, &quest, village, &world.whole_area()));
                let mut copy = world.clone();
                mapper.add_quest_components(&mut copy).unwrap();
                let wolf = mapper.quest_data().unwrap().path[0].id;
                copy.components.infos[&wolf][0].info.clone()
            })
            .collect();
        assert!(MapperConfig::default().lore.contains(&heard[0]));
        assert!(heard.iter().all(|line| *line == heard[0]));
    }

    #[test]
    fn used_up_quest_ids_fail_the_mapping() {
        let (mut world, village, _, elder) = small_world();
        world.components.next_quest_id = u32::MAX;
        let mut mapper = QuestPopulate::with_seed(6);
        mapper.set_giver(Some(elder));
        let quest = Quest::from_tokens(&["kill"]).unwrap();
        assert!(!mapper.map_quest_to_resources(&world, &quest, village, &world.whole_area()));
        assert_eq!(mapper.last_failure(), Some(&MapFailure::QuestIdsExhausted));
    }

    #[test]
    fn authored_text_naming_the_destination_is_kept() {
        let (mut world, village, woods, elder) = small_world();
        let note = world.items.values().find(|i| i.name == "note").unwrap().id;
        let authored = "Someone has marked a trail into the Woods.".to_string();
        world.items.get_mut(&note).unwrap().text = Some(authored.clone());

        let mut mapper = QuestPopulate::with_seed(7);
        mapper.set_giver(Some(elder));
        let quest = Quest::from_tokens(&["<learn>read"]).unwrap();
        assert!(mapper.map_quest_to_resources(&world, &quest, village, &world.whole_area()));
        mapper.add_quest_components(&mut world).unwrap();
        assert_eq!(world.items[&note].text, Some(authored));
        assert_eq!(world.components.reads[&note][0].reveals, woods);
    }

    #[test]
    fn blank_items_get_directions_written_on_them() {
        let (mut world, village, _, elder) = small_world();
        let mut mapper = QuestPopulate::with_seed(8);
        mapper.set_giver(Some(elder));
        let quest = Quest::from_tokens(&["<learn>read"]).unwrap();
        assert!(mapper.map_quest_to_resources(&world, &quest, village, &world.whole_area()));
        mapper.add_quest_components(&mut world).unwrap();
        let note = mapper.quest_data().unwrap().path[0].id;
        assert_eq!(
            world.items[&note].text.as_deref(),
            Some("Scrawled on the note: the way to Woods.")
        );
    }
}
