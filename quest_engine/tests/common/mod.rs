#![allow(dead_code)]

use quest_data::{ActorDef, ExitDef, ItemDef, LevelDef, LocationDef, WorldDef, ZoneDef};
use quest_engine::loader::{actor_id, zone_id};
use quest_engine::{Id, World, build_world};

pub const ZONES: [&str; 3] = ["vale", "fen", "crag"];

/// Three zones in a line (vale - fen - crag), each with two linked levels,
/// three actors and three items, one of them carried. The elder in the vale is
/// the quest giver.
pub fn line_def() -> WorldDef {
    let mut def = WorldDef {
        title: "Line".into(),
        ..WorldDef::default()
    };
    for (z, zone) in ZONES.iter().enumerate() {
        def.zones.push(ZoneDef {
            id: (*zone).into(),
            name: capitalize(zone),
        });
        let lower = format!("{zone}-lower");
        let upper = format!("{zone}-upper");
        let mut lower_exits = vec![ExitDef {
            direction: "up".into(),
            to: upper.clone(),
            locked: false,
        }];
        if let Some(prev) = z.checked_sub(1).map(|p| ZONES[p]) {
            lower_exits.push(ExitDef {
                direction: "back".into(),
                to: format!("{prev}-upper"),
                locked: false,
            });
        }
        let mut upper_exits = vec![ExitDef {
            direction: "down".into(),
            to: lower.clone(),
            locked: false,
        }];
        if let Some(next) = ZONES.get(z + 1) {
            upper_exits.push(ExitDef {
                direction: "on".into(),
                to: format!("{next}-lower"),
                locked: false,
            });
        }
        def.levels.push(LevelDef {
            id: lower.clone(),
            name: format!("{} Lower", capitalize(zone)),
            zone: (*zone).into(),
            exits: lower_exits,
        });
        def.levels.push(LevelDef {
            id: upper.clone(),
            name: format!("{} Upper", capitalize(zone)),
            zone: (*zone).into(),
            exits: upper_exits,
        });

        for n in 0..3 {
            def.actors.push(ActorDef {
                id: format!("{zone}-actor-{n}"),
                name: format!("{} Dweller {n}", capitalize(zone)),
                description: String::new(),
                location: LocationDef::Level(if n % 2 == 0 { lower.clone() } else { upper.clone() }),
                alive: true,
                lore: vec![format!("Rumor {n} from {zone}")],
            });
        }
        for n in 0..3 {
            let location = if n == 0 {
                LocationDef::Actor(format!("{zone}-actor-1"))
            } else {
                LocationDef::Level(lower.clone())
            };
            def.items.push(ItemDef {
                id: format!("{zone}-item-{n}"),
                name: format!("{zone} trinket {n}"),
                location,
                text: None,
            });
        }
    }
    def.actors.push(ActorDef {
        id: "elder".into(),
        name: "Elder".into(),
        description: "Gives out quests.".into(),
        location: LocationDef::Level("vale-lower".into()),
        alive: true,
        lore: Vec::new(),
    });
    def
}

pub fn line_world() -> World {
    build_world(&line_def()).expect("line world builds")
}

pub fn elder() -> Id {
    actor_id("elder")
}

pub fn zone(index: usize) -> Id {
    zone_id(ZONES[index])
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
