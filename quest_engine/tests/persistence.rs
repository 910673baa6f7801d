mod common;

use common::{elder, line_world, zone};
use quest_data::{TargetBinding, TargetType};
use quest_engine::idgen::new_id;
use quest_engine::loader::level_id;
use quest_engine::{
    Actor, Id, Location, QuestEvent, QuestPopulate, QuestStatus, QuestSystem, QuestTargetEvent, World,
    load_quest_book, save_quest_book,
};
use quest_grammar::Quest;
use serde_json::json;

/// A world where the hero has taken a goto-then-kill quest and reached the goto.
fn world_in_progress() -> (World, Id, TargetBinding) {
    let mut world = line_world();
    let quest = Quest::from_tokens(&["<goto>goto", "kill"]).unwrap();
    let mut mapper = QuestPopulate::with_seed(21);
    mapper.set_giver(Some(elder()));
    assert!(mapper.map_quest_to_resources(&world, &quest, zone(0), &world.whole_area()));
    mapper.add_quest_components(&mut world).unwrap();
    let kill = mapper.quest_data().unwrap().first(TargetType::Kill).unwrap().clone();

    let hero = world.add_actor(Actor::new(new_id(), "Hero", Location::Level(level_id("vale-lower"))));
    let mut system = QuestSystem::new();
    system.give_quest(elder(), hero);
    system.post(QuestEvent::Target(QuestTargetEvent::new(hero, TargetType::Location, zone(1))));
    assert_eq!(system.update(&mut world).len(), 2);
    (world, hero, kill)
}

/// The same line world rebuilt from its definition, with the hero added back.
fn fresh_world(hero: Id) -> World {
    let mut world = line_world();
    world.add_actor(Actor::new(hero, "Hero", Location::Level(level_id("fen-lower"))));
    world
}

#[test]
fn saved_quests_resolve_in_a_rebuilt_world() {
    let (world, hero, kill) = world_in_progress();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quests.ron");
    save_quest_book(&world, &path).unwrap();

    let mut restored = fresh_world(hero);
    let book = load_quest_book(&path).unwrap();
    assert_eq!(book.restore(&mut restored), 0);
    assert!(restored.components.givers[&elder()].has_given_quest);

    let quest = &restored.components.quests_of(hero)[0];
    assert!(quest.is_resolved());
    assert!(quest.frames()[0].steps[0].is_completed);
    let value = serde_json::to_value(quest.first(TargetType::Kill).unwrap()).unwrap();
    assert_eq!(
        value,
        json!({
            "id": kill.id.to_string(),
            "name": kill.name,
            "targetType": "kill",
            "subQuestID": -1,
            "isCompleted": false,
        })
    );

    let mut system = QuestSystem::new();
    system.post(QuestEvent::Target(QuestTargetEvent::new(hero, TargetType::Kill, kill.id)));
    assert_eq!(system.update(&mut restored).len(), 2);
    assert_eq!(restored.components.quests_of(hero)[0].status, QuestStatus::Completed);
}

#[test]
fn quests_with_missing_targets_stay_inert() {
    let (world, hero, kill) = world_in_progress();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quests.ron");
    save_quest_book(&world, &path).unwrap();

    let mut restored = fresh_world(hero);
    restored.actors.remove(&kill.id);
    assert_eq!(load_quest_book(&path).unwrap().restore(&mut restored), 1);
    assert!(!restored.components.quests_of(hero)[0].is_resolved());

    let mut system = QuestSystem::new();
    system.post(QuestEvent::Target(QuestTargetEvent::new(hero, TargetType::Kill, kill.id)));
    assert!(system.update(&mut restored).is_empty());
}
