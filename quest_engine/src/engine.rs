//! Quest system: drains quest events once per tick and advances runtime quests.
//!
//! Gameplay code posts [`QuestEvent`]s as things happen; [`QuestSystem::update`] handles
//! them in arrival order, including events posted while draining. Events that do not
//! match the current state are dropped with a debug log and never fault an update.

use std::collections::VecDeque;

use log::{debug, info};
use quest_data::{QuestId, TargetBinding, TargetType};
use serde::{Deserialize, Serialize};

use crate::Id;
use crate::components::{Components, Reward, marker_at};
use crate::quest::{Quest, QuestStatus, StepRef};
use crate::world::World;

/// Extra data a target event may carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPayload {
    Info(String),
    Item(Id),
}

/// Something the quester did to (or with) a world entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestTargetEvent {
    pub quester: Id,
    pub event_type: TargetType,
    pub target: Id,
    pub payload: Option<EventPayload>,
}
impl QuestTargetEvent {
    pub fn new(quester: Id, event_type: TargetType, target: Id) -> Self {
        Self {
            quester,
            event_type,
            target,
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: EventPayload) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Events that can move a quest forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestEvent {
    /// The quester agreed to take the giver's quest in dialogue.
    AcceptQuest { giver: Id, quester: Id },
    /// Hand the giver's quest to the quester.
    GiveQuest { giver: Id, quester: Id },
    Target(QuestTargetEvent),
    /// The quester returns to the giver of a finished quest.
    Completed { giver: Id, quester: Id },
    Abandon { quester: Id, quest_id: QuestId },
}

impl QuestEvent {
    pub fn quester(&self) -> Id {
        match self {
            QuestEvent::AcceptQuest { quester, .. }
            | QuestEvent::GiveQuest { quester, .. }
            | QuestEvent::Completed { quester, .. }
            | QuestEvent::Abandon { quester, .. } => *quester,
            QuestEvent::Target(ev) => ev.quester,
        }
    }

    /// Event name, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            QuestEvent::AcceptQuest { .. } => "accept",
            QuestEvent::GiveQuest { .. } => "give",
            QuestEvent::Target(_) => "target",
            QuestEvent::Completed { .. } => "completed",
            QuestEvent::Abandon { .. } => "abandon",
        }
    }
}

/// What an update changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestOutcome {
    QuestGiven { giver: Id, quester: Id, quest_id: QuestId },
    StepCompleted { quester: Id, at: StepRef, step: TargetBinding },
    QuestFinished { quester: Id, quest_id: QuestId },
    Rewarded { giver: Id, quester: Id, reward: Option<Reward> },
    Abandoned { quester: Id, quest_id: QuestId },
}

/// Owns the quest event queue.
#[derive(Debug, Clone, Default)]
pub struct QuestSystem {
    queue: VecDeque<QuestEvent>,
}

impl QuestSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&mut self, event: QuestEvent) {
        self.queue.push_back(event);
    }

    /// Queue a quest hand-off from `giver` to `quester`.
    pub fn give_quest(&mut self, giver: Id, quester: Id) {
        self.post(QuestEvent::GiveQuest { giver, quester });
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Drain the queue, returning everything that changed in order.
    pub fn update(&mut self, world: &mut World) -> Vec<QuestOutcome> {
        let mut outcomes = Vec::new();
        while let Some(event) = self.queue.pop_front() {
            let before = outcomes.len();
            match &event {
                QuestEvent::AcceptQuest { giver, quester } => accept(world, *giver, *quester, &mut outcomes),
                QuestEvent::GiveQuest { giver, quester } => give(world, *giver, *quester, &mut outcomes),
                QuestEvent::Target(target) => on_target(world, target, &mut outcomes),
                QuestEvent::Completed { giver, quester } => reward(world, *giver, *quester, &mut outcomes),
                QuestEvent::Abandon { quester, quest_id } => abandon(world, *quester, *quest_id, &mut outcomes),
            }
            if outcomes.len() == before {
                debug!("{} event for {} changed nothing", event.kind(), event.quester());
            }
        }
        outcomes
    }
}

/// Hand the quest over on the spot if the giver still has one and the quester can take it.
fn accept(world: &mut World, giver: Id, quester: Id, outcomes: &mut Vec<QuestOutcome>) {
    if world.actors.get(&quester).is_some_and(|a| a.alive) {
        give(world, giver, quester, outcomes);
    }
}

fn give(world: &mut World, giver: Id, quester: Id, outcomes: &mut Vec<QuestOutcome>) {
    if !world.actors.contains_key(&quester) {
        return;
    }
    let Components { givers, quests, .. } = &mut world.components;
    let Some(component) = givers.get_mut(&giver) else {
        return;
    };
    if component.has_given_quest {
        return;
    }
    let quest = Quest::from_data(&component.quest);
    component.has_given_quest = true;
    let quest_id = quest.quest_id;
    let finished = quest.is_completed();
    quests.entry(quester).or_default().push(quest);
    info!("{quest_id} given by {giver} to {quester}");
    outcomes.push(QuestOutcome::QuestGiven {
        giver,
        quester,
        quest_id,
    });
    if finished {
        outcomes.push(QuestOutcome::QuestFinished { quester, quest_id });
    }
}

fn on_target(world: &mut World, event: &QuestTargetEvent, outcomes: &mut Vec<QuestOutcome>) {
    let target_zone = world.actor_zone(event.target);
    let mut handed_over = None;
    let Components {
        targets,
        infos,
        reports,
        escorts,
        gives,
        quests,
        ..
    } = &mut world.components;
    let Some(active) = quests.get_mut(&event.quester) else {
        return;
    };

    for quest in active
        .iter_mut()
        .filter(|q| q.status == QuestStatus::InProgress && q.is_resolved())
    {
        let Some((at, binding)) = quest.current_step().map(|(at, b)| (at, b.clone())) else {
            continue;
        };
        if binding.id != event.target || binding.target_type != event.event_type {
            continue;
        }
        if !targets.get(&event.target).is_some_and(|t| t.names(at.quest_id)) {
            continue;
        }
        let role_ok = match binding.target_type {
            TargetType::Escort => marker_at(escorts, event.target, at)
                .is_none_or(|m| target_zone == Some(m.escort_to)),
            TargetType::Report => marker_at(reports, event.target, at)
                .and_then(|m| m.expect.as_deref())
                .is_none_or(|expect| quest.has_learned(expect)),
            TargetType::Give => match marker_at(gives, event.target, at).and_then(|m| m.item) {
                Some(item) => event.payload == Some(EventPayload::Item(item)),
                None => true,
            },
            _ => true,
        };
        if !role_ok {
            continue;
        }

        if binding.target_type == TargetType::Listen
            && let Some(info) = marker_at(infos, event.target, at)
        {
            quest.learn(info.info.clone());
        }
        if let Some(EventPayload::Item(item)) = event.payload
            && binding.target_type == TargetType::Give
        {
            handed_over = Some(item);
        }
        let finished = quest.complete_step(at);
        info!("{} step {} ({}) done by {}", at.quest_id, at.step, binding.name, event.quester);
        outcomes.push(QuestOutcome::StepCompleted {
            quester: event.quester,
            at,
            step: binding,
        });
        if finished {
            outcomes.push(QuestOutcome::QuestFinished {
                quester: event.quester,
                quest_id: quest.quest_id,
            });
        }
    }

    if let Some(item) = handed_over {
        world.give_item(item, event.target);
    }
}

fn reward(world: &mut World, giver: Id, quester: Id, outcomes: &mut Vec<QuestOutcome>) {
    let Components { givers, quests, .. } = &mut world.components;
    let Some(component) = givers.get_mut(&giver) else {
        return;
    };
    if component.has_given_reward {
        return;
    }
    let Some(quest) = quests
        .get_mut(&quester)
        .and_then(|qs| qs.iter_mut().find(|q| q.giver.id == giver && q.status == QuestStatus::Completed))
    else {
        return;
    };
    quest.status = QuestStatus::Rewarded;
    component.has_given_reward = true;
    let prize = component.reward.clone();

    match &prize {
        Some(Reward::Item(item)) => {
            world.give_item(*item, quester);
        },
        Some(Reward::Spell(spell)) => {
            if let Some(actor) = world.actors.get_mut(&quester) {
                actor.spells.push(spell.clone());
            }
        },
        Some(Reward::Experience(points)) => {
            if let Some(actor) = world.actors.get_mut(&quester) {
                actor.experience = actor.experience.saturating_add(*points);
            }
        },
        None => {},
    }
    info!("{quester} rewarded by {giver}: {prize:?}");
    outcomes.push(QuestOutcome::Rewarded {
        giver,
        quester,
        reward: prize,
    });
}

fn abandon(world: &mut World, quester: Id, quest_id: QuestId, outcomes: &mut Vec<QuestOutcome>) {
    let Some(active) = world.components.quests.get_mut(&quester) else {
        return;
    };
    let before = active.len();
    active.retain(|q| q.quest_id != quest_id);
    if active.len() == before {
        return;
    }
    if active.is_empty() {
        world.components.quests.remove(&quester);
    }
    info!("{quester} abandoned {quest_id}");
    outcomes.push(QuestOutcome::Abandoned { quester, quest_id });
}
