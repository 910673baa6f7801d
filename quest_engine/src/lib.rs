#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! Quest engine.
//!
//! Binds abstract quests from `quest_grammar` to the entities of a [`World`], attaches
//! quest components to them, and advances runtime quests from gameplay events.

pub const QUEST_ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Identifier of every world entity.
pub type Id = uuid::Uuid;

pub mod components;
pub mod config;
pub mod engine;
pub mod idgen;
pub mod loader;
pub mod mapper;
pub mod persist;
pub mod quest;
pub mod style;
pub mod world;

pub use components::{Components, QuestGiver, QuestTarget, Reward};
pub use config::{MapperConfig, QuestConfig, load_config, try_load_config};
pub use engine::{EventPayload, QuestEvent, QuestOutcome, QuestSystem, QuestTargetEvent};
pub use loader::{build_world, load_world};
pub use mapper::{MapFailure, QuestPopulate};
pub use persist::{QuestBook, load_quest_book, save_quest_book};
pub use quest::{Quest, QuestStatus, StepRef};
pub use world::{Actor, Area, Item, Level, Location, World, WorldObject, Zone};
