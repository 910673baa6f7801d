//! Quest components attached to world entities.
//!
//! Every component is owned by the entity it is stored under. Role markers name the
//! exact quest step they belong to, so one actor can play several roles in the same
//! quest (a giver who also receives two reports, say) without ambiguity.

use std::collections::HashMap;

use quest_data::{QuestData, QuestId, TargetType};
use serde::{Deserialize, Serialize};

use crate::Id;
use crate::quest::{Quest, StepRef};

/// What a giver hands over once its quest is completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reward {
    Item(Id),
    Spell(String),
    Experience(u32),
}

/// Attached to the actor who hands out a quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestGiver {
    pub quest: QuestData,
    pub reward: Option<Reward>,
    pub description: String,
    pub has_given_quest: bool,
    pub has_given_reward: bool,
}
impl QuestGiver {
    pub fn new(quest: QuestData, reward: Option<Reward>, description: impl Into<String>) -> Self {
        Self {
            quest,
            reward,
            description: description.into(),
            has_given_quest: false,
            has_given_reward: false,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetRole {
    pub quest_id: QuestId,
    pub target_type: TargetType,
}

/// Marks an entity as bound to one or more quest steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestTarget {
    pub roles: Vec<TargetRole>,
}
impl QuestTarget {
    pub fn add(&mut self, quest_id: QuestId, target_type: TargetType) {
        let role = TargetRole { quest_id, target_type };
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
    }

    pub fn names(&self, quest_id: QuestId) -> bool {
        self.roles.iter().any(|r| r.quest_id == quest_id)
    }
}

/// Lore an actor tells during a listen step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestInfo {
    pub at: StepRef,
    pub info: String,
}

/// An actor waiting to be told something learned earlier in the quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestReport {
    pub at: StepRef,
    pub expect: Option<String>,
}

/// An actor who must be brought to `escort_to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestEscortTarget {
    pub at: StepRef,
    pub escort_to: Id,
}

/// A readable item that points the way to another zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestReadTarget {
    pub at: StepRef,
    pub reveals: Id,
}

/// An actor expecting to be handed an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestGiveTarget {
    pub at: StepRef,
    pub item: Option<Id>,
}

/// Role markers that belong to a single quest step.
pub trait StepMarker {
    fn step_ref(&self) -> StepRef;
}

macro_rules! step_marker {
    ($($ty:ty),*) => {
        $(impl StepMarker for $ty {
            fn step_ref(&self) -> StepRef {
                self.at
            }
        })*
    };
}
step_marker!(QuestInfo, QuestReport, QuestEscortTarget, QuestReadTarget, QuestGiveTarget);

/// The marker an entity carries for a given step, if any.
pub fn marker_at<T: StepMarker>(table: &HashMap<Id, Vec<T>>, entity: Id, at: StepRef) -> Option<&T> {
    table.get(&entity)?.iter().find(|m| m.step_ref() == at)
}

/// Quest component tables, keyed by the owning entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    pub givers: HashMap<Id, QuestGiver>,
    pub targets: HashMap<Id, QuestTarget>,
    pub infos: HashMap<Id, Vec<QuestInfo>>,
    pub reports: HashMap<Id, Vec<QuestReport>>,
    pub escorts: HashMap<Id, Vec<QuestEscortTarget>>,
    pub reads: HashMap<Id, Vec<QuestReadTarget>>,
    pub gives: HashMap<Id, Vec<QuestGiveTarget>>,
    /// Runtime quests, keyed by the questing actor.
    pub quests: HashMap<Id, Vec<Quest>>,
    /// Next unused quest id; quest ids are unique across the world.
    pub next_quest_id: u32,
}

impl Components {
    /// Drop every component an entity owns (runtime quests excepted).
    pub fn remove_entity(&mut self, entity: Id) {
        self.givers.remove(&entity);
        self.targets.remove(&entity);
        self.infos.remove(&entity);
        self.reports.remove(&entity);
        self.escorts.remove(&entity);
        self.reads.remove(&entity);
        self.gives.remove(&entity);
    }

    /// Runtime quests an actor is carrying.
    pub fn quests_of(&self, actor: Id) -> &[Quest] {
        self.quests.get(&actor).map_or(&[], Vec::as_slice)
    }
}
