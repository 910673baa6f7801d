//! Quest system configuration and loader.
//!
//! Settings live in a TOML file with a `[generator]` and a `[mapper]` table. Every field
//! has a default, so a partial file (or none at all) still yields a usable config.

use anyhow::{Context, Result};
use log::{info, warn};
use quest_grammar::GenConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings for binding quests to world resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Lines handed out by listen steps when the speaker has no lore of their own.
    pub lore: Vec<String>,
    /// Experience granted per quest step when a giver has no explicit reward.
    pub experience_per_step: u32,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            lore: default_lore(),
            experience_per_step: 10,
        }
    }
}

/// Complete quest system configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestConfig {
    pub generator: GenConfig,
    pub mapper: MapperConfig,
}

fn default_lore() -> Vec<String> {
    [
        "The old road floods every spring.",
        "Something has been taking sheep from the high pasture.",
        "The ferryman owes money to half the town.",
        "There is a door under the chapel nobody admits to opening.",
        "The miners stopped digging when the singing started.",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Loads the quest configuration from a TOML file, falling back to defaults on error.
///
/// This function never fails: a missing or malformed file is logged with `warn!`
/// and the defaults are returned instead.
pub fn load_config(toml_path: &Path) -> QuestConfig {
    match try_load_config(toml_path) {
        Ok(config) => {
            info!("quest configuration loaded from '{}'", toml_path.display());
            config
        },
        Err(e) => {
            warn!(
                "Could not load quest configuration from '{}': {:#}. Using defaults.",
                toml_path.display(),
                e
            );
            QuestConfig::default()
        },
    }
}

/// Attempts to load the quest configuration from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn try_load_config(toml_path: &Path) -> Result<QuestConfig> {
    let text = fs::read_to_string(toml_path)
        .with_context(|| format!("reading quest configuration from '{}'", toml_path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing quest configuration from '{}'", toml_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quest_grammar::ChoicePolicy;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[generator]
max_quests = 5
policy = "prefer_shorter"

[mapper]
experience_per_step = 3
"#
        )
        .unwrap();
        let config = try_load_config(file.path()).unwrap();
        assert_eq!(config.generator.max_quests, 5);
        assert_eq!(config.generator.policy, ChoicePolicy::PreferShorter);
        assert_eq!(config.generator.start_rule, "QUEST");
        assert_eq!(config.mapper.experience_per_step, 3);
        assert_eq!(config.mapper.lore, default_lore());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(try_load_config(&path).is_err());
        assert_eq!(load_config(&path), QuestConfig::default());
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[generator\nmax_quests = ").unwrap();
        assert!(try_load_config(file.path()).is_err());
        assert_eq!(load_config(file.path()), QuestConfig::default());
    }
}
