#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! ** questgen **
//! Generate a quest, bind it to a world, and optionally play it through.

use quest_data::{QuestData, TargetType};
use quest_engine::components::marker_at;
use quest_engine::idgen::new_id;
use quest_engine::loader::zone_id;
use quest_engine::style::QuestStyle;
use quest_engine::{
    Actor, EventPayload, Location, QuestEvent, QuestOutcome, QuestPopulate, QuestSystem, QuestTargetEvent, World,
    build_world, load_config, load_world,
};
use quest_grammar::{Motive, QuestGen, default_grammar, parse_grammar};

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use log::{info, warn};

use std::fs;
use std::path::PathBuf;

const DEMO_WORLD: &str = include_str!("../data/demo_world.ron");

#[derive(Parser)]
#[command(author, version, about = "Generate a quest and bind it to a world.")]
struct Cli {
    /// Quest configuration (TOML).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Grammar file; the bundled grammar is used if omitted.
    #[arg(long)]
    grammar: Option<PathBuf>,
    /// World definition (RON); the bundled demo world is used if omitted.
    #[arg(long)]
    world: Option<PathBuf>,
    /// Zone token to start in; defaults to the first zone.
    #[arg(long)]
    zone: Option<String>,
    /// Rule to start generation from.
    #[arg(long, conflicts_with = "motive")]
    rule: Option<String>,
    /// Motive whose rule generation starts from.
    #[arg(long)]
    motive: Option<Motive>,
    #[arg(long)]
    seed: Option<u64>,
    /// Quests to generate before giving up on mapping one.
    #[arg(long, default_value_t = 20)]
    attempts: usize,
    /// Play the mapped quest through with a stand-in hero.
    #[arg(long)]
    play: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = cli.config.as_deref().map(load_config).unwrap_or_default();
    if cli.seed.is_some() {
        config.generator.seed = cli.seed;
    }
    if let Some(rule) = &cli.rule {
        config.generator.start_rule.clone_from(rule);
    }

    let grammar = match &cli.grammar {
        Some(path) => {
            let text =
                fs::read_to_string(path).with_context(|| format!("reading grammar from '{}'", path.display()))?;
            parse_grammar(&text).with_context(|| format!("parsing grammar '{}'", path.display()))?
        },
        None => default_grammar().context("parsing bundled grammar")?,
    };

    let mut world = match &cli.world {
        Some(path) => load_world(path)?,
        None => build_world(&ron::from_str(DEMO_WORLD).context("parsing bundled demo world")?)?,
    };
    let zone = match &cli.zone {
        Some(token) => zone_id(token),
        None => *world
            .whole_area()
            .zones
            .first()
            .context("world has no zones")?,
    };
    if !world.zones.contains_key(&zone) {
        bail!("no zone '{}' in world '{}'", cli.zone.unwrap_or_default(), world.title);
    }
    let area = world.whole_area();

    let mut generator = QuestGen::new(grammar, config.generator.clone());
    let mut mapper = QuestPopulate::from_config(&config.mapper, config.generator.seed);
    for attempt in 1..=cli.attempts {
        let quest = match cli.motive {
            Some(motive) => generator.gen_quest_with_motive(motive)?,
            None => generator.gen_quest()?,
        };
        if !mapper.map_quest_to_resources(&world, &quest, zone, &area) {
            warn!(
                "attempt {attempt}: {}",
                mapper
                    .last_failure()
                    .map_or_else(|| "mapping failed".to_string(), ToString::to_string)
            );
            continue;
        }
        info!("quest mapped on attempt {attempt}");

        println!("{}", "abstract quest".section_style());
        print!("{quest}");
        let Some(data) = mapper.quest_data() else {
            bail!("mapper reported success without quest data");
        };
        println!("\n{}", "bound path".section_style());
        print_path(data, 0);
        println!("\n{}", "quest data".section_style());
        println!("{}", serde_json::to_string_pretty(data)?);

        mapper.add_quest_components(&mut world);
        if cli.play {
            play(&mut world, data.giver.id, zone);
        }
        return Ok(());
    }
    bail!(
        "no quest could be mapped into '{}' after {} attempts",
        world.entity_name(zone).unwrap_or_default(),
        cli.attempts
    )
}

fn print_path(data: &QuestData, indent: usize) {
    let pad = "  ".repeat(indent);
    println!("{pad}{} from {}", data.id.to_string().quest_style(), data.giver.name);
    for binding in &data.path {
        let label = format!("{:<8} {}", binding.target_type.as_str(), binding.name);
        let line = if binding.is_completed {
            label.done_style()
        } else if binding.target_type == TargetType::Location {
            label.zone_style()
        } else {
            label.step_style()
        };
        println!("{pad}  {line}");
        if let Some(nested) = binding.sub_quest_id.and_then(|id| data.nested.iter().find(|n| n.id == id)) {
            print_path(nested, indent + 2);
        }
    }
}

/// Walk a stand-in hero through every step in order, then collect the reward.
fn play(world: &mut World, giver: quest_engine::Id, zone: quest_engine::Id) {
    let Some(level) = world.first_level_in(zone) else {
        return;
    };
    let hero = world.add_actor(Actor::new(new_id(), "Wanderer", Location::Level(level)));
    let mut system = QuestSystem::new();
    system.give_quest(giver, hero);
    report(&system.update(world), world);

    loop {
        let Some(quest) = world.components.quests_of(hero).first() else {
            break;
        };
        let Some((at, binding)) = quest.current_step().map(|(at, b)| (at, b.clone())) else {
            break;
        };
        let mut event = QuestTargetEvent::new(hero, binding.target_type, binding.id);
        match binding.target_type {
            TargetType::Escort => {
                let to = marker_at(&world.components.escorts, binding.id, at)
                    .and_then(|m| world.first_level_in(m.escort_to));
                if let Some(to) = to {
                    world.move_actor(binding.id, Location::Level(to));
                }
            },
            TargetType::Give => {
                if let Some(item) = marker_at(&world.components.gives, binding.id, at).and_then(|m| m.item) {
                    world.give_item(item, hero);
                    event = event.with_payload(EventPayload::Item(item));
                }
            },
            TargetType::Kill => {
                world.kill_actor(binding.id);
            },
            _ => {},
        }
        system.post(QuestEvent::Target(event));
        let outcomes = system.update(world);
        if outcomes.is_empty() {
            println!("{}", format!("stuck at {} {}", binding.target_type, binding.name).error_style());
            return;
        }
        report(&outcomes, world);
    }

    system.post(QuestEvent::Completed { giver, quester: hero });
    report(&system.update(world), world);
}

fn report(outcomes: &[QuestOutcome], world: &World) {
    let name = |id| world.entity_name(id).unwrap_or("someone").to_string();
    for outcome in outcomes {
        let line = match outcome {
            QuestOutcome::QuestGiven { giver, quest_id, .. } => format!("{} hands over {quest_id}", name(*giver)),
            QuestOutcome::StepCompleted { step, .. } => format!("done: {} {}", step.target_type, step.name),
            QuestOutcome::QuestFinished { quest_id, .. } => format!("{quest_id} finished"),
            QuestOutcome::Rewarded { giver, reward, .. } => format!("{} pays out {reward:?}", name(*giver)),
            QuestOutcome::Abandoned { quest_id, .. } => format!("{quest_id} abandoned"),
        };
        println!("{} {}", "*".bright_yellow(), line);
    }
}
