//! Abstract quests: trees of task tokens and nested sub-quests, before any world binding.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::{GrammarError, Motive, TaskToken};

/// One element of a quest: either a task or a nested sub-quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestNode {
    Task(TaskToken),
    Quest(Quest),
}

/// An abstract quest produced by the generator or built by hand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    nodes: Vec<QuestNode>,
    motive: Option<Motive>,
}

impl Quest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a flat quest from token strings such as `"<goto>goto"` or `"kill"`.
    ///
    /// # Errors
    /// Returns an error if any token is malformed.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Quest, GrammarError> {
        let mut quest = Quest::new();
        for raw in tokens {
            quest.add_task(TaskToken::parse(raw.as_ref())?);
        }
        Ok(quest)
    }

    pub fn add_task(&mut self, task: TaskToken) {
        self.nodes.push(QuestNode::Task(task));
    }

    pub fn add_quest(&mut self, quest: Quest) {
        self.nodes.push(QuestNode::Quest(quest));
    }

    pub fn nodes(&self) -> &[QuestNode] {
        &self.nodes
    }

    pub fn motive(&self) -> Option<Motive> {
        self.motive
    }

    pub fn set_motive(&mut self, motive: Option<Motive>) {
        self.motive = motive;
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Tasks directly under this quest (nested quests' tasks excluded).
    pub fn tasks(&self) -> impl Iterator<Item = &TaskToken> {
        self.nodes.iter().filter_map(|node| match node {
            QuestNode::Task(task) => Some(task),
            QuestNode::Quest(_) => None,
        })
    }

    /// Sub-quests directly under this quest.
    pub fn sub_quests(&self) -> impl Iterator<Item = &Quest> {
        self.nodes.iter().filter_map(|node| match node {
            QuestNode::Quest(quest) => Some(quest),
            QuestNode::Task(_) => None,
        })
    }

    /// Number of leaf tasks owned by this quest node.
    pub fn num_tasks(&self) -> usize {
        self.tasks().count()
    }

    /// This quest plus every quest nested below it.
    pub fn num_quests(&self) -> usize {
        1 + self.sub_quests().map(Quest::num_quests).sum::<usize>()
    }

    /// Number of leaves across all nesting levels.
    pub fn num_steps(&self) -> usize {
        self.steps().len()
    }

    /// Leaves of the whole tree in order.
    pub fn steps(&self) -> Vec<&TaskToken> {
        let mut out = Vec::new();
        self.collect_steps(&mut out);
        out
    }

    fn collect_steps<'a>(&'a self, out: &mut Vec<&'a TaskToken>) {
        for node in &self.nodes {
            match node {
                QuestNode::Task(task) => out.push(task),
                QuestNode::Quest(quest) => quest.collect_steps(out),
            }
        }
    }

    /// Nesting depth: 1 for a quest without sub-quests.
    pub fn depth(&self) -> usize {
        1 + self.sub_quests().map(Quest::depth).max().unwrap_or(0)
    }

    fn fmt_indented(&self, f: &mut std::fmt::Formatter<'_>, indent: usize) -> std::fmt::Result {
        for node in &self.nodes {
            match node {
                QuestNode::Task(task) => writeln!(f, "{:indent$}- {task}", "")?,
                QuestNode::Quest(quest) => {
                    writeln!(f, "{:indent$}+ subquest", "")?;
                    quest.fmt_indented(f, indent + 2)?;
                },
            }
        }
        Ok(())
    }
}

impl Display for Quest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(motive) = self.motive {
            writeln!(f, "quest ({motive})")?;
        } else {
            writeln!(f, "quest")?;
        }
        self.fmt_indented(f, 2)
    }
}
