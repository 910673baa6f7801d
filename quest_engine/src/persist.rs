//! Saving and restoring quest state.
//!
//! A [`QuestBook`] is a RON snapshot of every quest component and runtime quest in a
//! world. Bindings are stored by id and name only; after a restore, each runtime quest
//! is re-resolved against the world it was loaded into and stays inert until every id
//! it refers to exists.

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::QUEST_ENGINE_VERSION;
use crate::components::Components;
use crate::world::World;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestBook {
    pub version: String,
    pub components: Components,
}

impl QuestBook {
    /// Copy the quest state out of a world.
    pub fn snapshot(world: &World) -> QuestBook {
        QuestBook {
            version: QUEST_ENGINE_VERSION.to_string(),
            components: world.components.clone(),
        }
    }

    /// Install this quest state into `world`, replacing what was there.
    ///
    /// Returns the number of runtime quests that could not be resolved.
    pub fn restore(self, world: &mut World) -> usize {
        if self.version != QUEST_ENGINE_VERSION {
            warn!(
                "quest book written by version {} restored into {}",
                self.version, QUEST_ENGINE_VERSION
            );
        }
        let mut components = self.components;
        let mut unresolved = 0;
        for quest in components.quests.values_mut().flatten() {
            if !quest.resolve(world).is_empty() {
                unresolved += 1;
            }
        }
        world.components = components;
        info!("quest book restored ({unresolved} unresolved quests)");
        unresolved
    }
}

/// Write a world's quest state to a RON file.
///
/// # Errors
/// Returns an error if serialization fails or the file cannot be written.
pub fn save_quest_book(world: &World, path: &Path) -> Result<()> {
    let book = QuestBook::snapshot(world);
    let text = ron::ser::to_string_pretty(&book, ron::ser::PrettyConfig::default())
        .context("error converting quest book to 'ron' format")?;
    fs::write(path, text).with_context(|| format!("writing quest book to '{}'", path.display()))?;
    info!("quest book saved to '{}'", path.display());
    Ok(())
}

/// Read a quest book from a RON file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn load_quest_book(path: &Path) -> Result<QuestBook> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading quest book from '{}'", path.display()))?;
    ron::from_str::<QuestBook>(&raw).with_context(|| format!("parsing quest book '{}'", path.display()))
}
