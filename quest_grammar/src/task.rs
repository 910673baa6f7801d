//! Task tokens -- the leaves of an abstract quest.
//!
//! A token is written `"name"` or `"<tag>name"` in grammar text. The tag, when present,
//! decides the token's [`TaskKind`]; otherwise the name does.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use crate::GrammarError;

/// Step category that the resource mapper and quest engine dispatch on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    Goto,
    Kill,
    Listen,
    Report,
    Get,
    Give,
    Escort,
    Read,
    Steal,
    Damage,
    Generic,
}

impl TaskKind {
    fn from_word(word: &str) -> Option<TaskKind> {
        let kind = match word {
            "goto" | "explore" | "already_there" => TaskKind::Goto,
            "kill" => TaskKind::Kill,
            "listen" => TaskKind::Listen,
            "report" => TaskKind::Report,
            "get" | "gather" => TaskKind::Get,
            "give" => TaskKind::Give,
            "escort" => TaskKind::Escort,
            "read" | "learn" => TaskKind::Read,
            "steal" | "take" => TaskKind::Steal,
            "damage" => TaskKind::Damage,
            _ => return None,
        };
        Some(kind)
    }
}

impl Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskKind::Goto => "goto",
            TaskKind::Kill => "kill",
            TaskKind::Listen => "listen",
            TaskKind::Report => "report",
            TaskKind::Get => "get",
            TaskKind::Give => "give",
            TaskKind::Escort => "escort",
            TaskKind::Read => "read",
            TaskKind::Steal => "steal",
            TaskKind::Damage => "damage",
            TaskKind::Generic => "generic",
        };
        write!(f, "{s}")
    }
}

/// A terminal of the quest grammar, with its optional category tag preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskToken {
    pub tag: Option<String>,
    pub name: String,
}

impl TaskToken {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            tag: None,
            name: name.into(),
        }
    }

    pub fn tagged(tag: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            name: name.into(),
        }
    }

    /// Parse the body of a terminal (`goto`, `<kill>kill`, ...).
    ///
    /// # Errors
    /// Returns [`GrammarError::BadToken`] for an empty name, an empty tag, or an unclosed tag.
    pub fn parse(raw: &str) -> Result<TaskToken, GrammarError> {
        let raw = raw.trim();
        let bad = |reason: &'static str| GrammarError::BadToken {
            token: raw.to_string(),
            reason,
        };
        let (tag, name) = if let Some(rest) = raw.strip_prefix('<') {
            let (tag, name) = rest.split_once('>').ok_or_else(|| bad("unclosed tag"))?;
            if tag.trim().is_empty() {
                return Err(bad("empty tag"));
            }
            (Some(tag.trim().to_string()), name.trim())
        } else {
            (None, raw)
        };
        if name.is_empty() {
            return Err(bad("empty task name"));
        }
        if name.contains(['<', '>']) {
            return Err(bad("stray angle bracket"));
        }
        Ok(TaskToken {
            tag,
            name: name.to_string(),
        })
    }

    /// Category of this task. The tag wins over the name.
    pub fn kind(&self) -> TaskKind {
        self.tag
            .as_deref()
            .and_then(TaskKind::from_word)
            .or_else(|| TaskKind::from_word(&self.name))
            .unwrap_or(TaskKind::Generic)
    }

    /// The `already_*` placeholders need no travel or resource.
    pub fn is_trivial(&self) -> bool {
        self.name.starts_with("already_")
    }
}

impl Display for TaskToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "<{tag}>{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl FromStr for TaskToken {
    type Err = GrammarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskToken::parse(s)
    }
}
