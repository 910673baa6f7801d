//! Runtime quests carried by questing actors.
//!
//! A runtime quest is an arena of frames, one per quest level. Each nested frame holds
//! an explicit back-reference to the parent step it stands for, so completing the last
//! step of a frame completes that parent step and the cascade continues upward by id
//! lookup, with no shared ownership between levels.

use log::{debug, info, warn};
use quest_data::{EntityRef, QuestData, QuestId, TargetBinding, TargetType};
use serde::{Deserialize, Serialize};

use crate::Id;
use crate::world::World;

/// Lifecycle of a runtime quest. Only ever moves forward.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QuestStatus {
    #[default]
    NotGiven,
    InProgress,
    Completed,
    Rewarded,
}

/// Position of one step: the quest level it belongs to and its index in that level's path.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepRef {
    pub quest_id: QuestId,
    pub step: usize,
}
impl StepRef {
    pub fn new(quest_id: QuestId, step: usize) -> Self {
        Self { quest_id, step }
    }
}

/// One quest level inside a runtime quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestFrame {
    #[serde(rename = "questID")]
    pub quest_id: QuestId,
    pub parent: Option<StepRef>,
    pub steps: Vec<TargetBinding>,
}
impl QuestFrame {
    pub fn is_done(&self) -> bool {
        self.steps.iter().all(|s| s.is_completed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    #[serde(rename = "questID")]
    pub quest_id: QuestId,
    pub giver: EntityRef,
    frames: Vec<QuestFrame>,
    pub status: QuestStatus,
    learned: Vec<String>,
    /// Set once every bound id is known to exist in the current world.
    #[serde(skip)]
    resolved: bool,
}

impl Quest {
    /// Build a runtime quest from mapped quest data. The first frame is the root.
    pub fn from_data(data: &QuestData) -> Quest {
        let mut frames = Vec::new();
        push_frames(data, None, &mut frames);
        let mut quest = Quest {
            quest_id: data.id,
            giver: data.giver.clone(),
            frames,
            status: QuestStatus::InProgress,
            learned: Vec::new(),
            resolved: true,
        };
        quest.settle();
        quest
    }

    pub fn frames(&self) -> &[QuestFrame] {
        &self.frames
    }

    pub fn frame(&self, id: QuestId) -> Option<&QuestFrame> {
        self.frames.iter().find(|f| f.quest_id == id)
    }

    fn frame_mut(&mut self, id: QuestId) -> Option<&mut QuestFrame> {
        self.frames.iter_mut().find(|f| f.quest_id == id)
    }

    pub fn binding(&self, at: StepRef) -> Option<&TargetBinding> {
        self.frame(at.quest_id)?.steps.get(at.step)
    }

    /// The earliest pending leaf step, descending into nested frames.
    pub fn current_step(&self) -> Option<(StepRef, &TargetBinding)> {
        let mut frame = self.frames.first()?;
        // every descent moves to a different frame, so the arena length bounds the walk
        for _ in 0..self.frames.len() {
            let (index, binding) = frame.steps.iter().enumerate().find(|(_, s)| !s.is_completed)?;
            match binding.sub_quest_id {
                Some(sub) => frame = self.frame(sub)?,
                None => return Some((StepRef::new(frame.quest_id, index), binding)),
            }
        }
        None
    }

    /// Mark one step complete and cascade through finished frames.
    ///
    /// Returns true if this completed the whole quest.
    pub fn complete_step(&mut self, at: StepRef) -> bool {
        let Some(binding) = self.frame_mut(at.quest_id).and_then(|f| f.steps.get_mut(at.step)) else {
            return false;
        };
        if binding.is_completed {
            return false;
        }
        binding.is_completed = true;
        debug!("{} step {} ({}) completed", at.quest_id, at.step, binding.name);
        let was_complete = self.is_completed();
        self.settle();
        !was_complete && self.is_completed()
    }

    /// Propagate finished frames to their parent steps until nothing changes.
    fn settle(&mut self) {
        loop {
            let finished = self
                .frames
                .iter()
                .filter(|f| f.is_done())
                .filter_map(|f| f.parent)
                .find(|parent| self.binding(*parent).is_some_and(|b| !b.is_completed));
            let Some(parent) = finished else {
                break;
            };
            if let Some(step) = self.frame_mut(parent.quest_id).and_then(|f| f.steps.get_mut(parent.step)) {
                step.is_completed = true;
                info!("sub-quest of {} finished; step {} complete", parent.quest_id, parent.step);
            }
        }
        let root_done = self.frames.first().is_none_or(QuestFrame::is_done);
        if root_done && self.status < QuestStatus::Completed {
            self.status = QuestStatus::Completed;
            info!("{} completed", self.quest_id);
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status >= QuestStatus::Completed
    }

    /// All bindings in step order, a sub-quest step just before its nested steps.
    pub fn bindings(&self) -> Vec<&TargetBinding> {
        let mut out = Vec::new();
        if let Some(root) = self.frames.first() {
            self.collect(root, &mut out);
        }
        out
    }

    fn collect<'a>(&'a self, frame: &'a QuestFrame, out: &mut Vec<&'a TargetBinding>) {
        for binding in &frame.steps {
            out.push(binding);
            if let Some(nested) = binding.sub_quest_id.and_then(|id| self.frame(id)) {
                self.collect(nested, out);
            }
        }
    }

    pub fn first(&self, target_type: TargetType) -> Option<&TargetBinding> {
        self.bindings().into_iter().find(|b| b.target_type == target_type)
    }

    pub fn all(&self, target_type: TargetType) -> Vec<&TargetBinding> {
        self.bindings()
            .into_iter()
            .filter(|b| b.target_type == target_type)
            .collect()
    }

    pub fn learn(&mut self, info: impl Into<String>) {
        let info = info.into();
        if !self.learned.contains(&info) {
            self.learned.push(info);
        }
    }

    pub fn has_learned(&self, info: &str) -> bool {
        self.learned.iter().any(|l| l == info)
    }

    pub fn learned(&self) -> &[String] {
        &self.learned
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Check every bound id against `world`, returning the ones that are missing.
    ///
    /// The quest only matches events again once nothing is missing. A name that differs
    /// from the one recorded at binding time is logged but not treated as missing.
    pub fn resolve(&mut self, world: &World) -> Vec<Id> {
        let mut missing = Vec::new();
        let refs = std::iter::once((self.giver.id, self.giver.name.as_str()))
            .chain(self.frames.iter().flat_map(|f| f.steps.iter().map(|s| (s.id, s.name.as_str()))));
        for (id, name) in refs {
            match world.entity_name(id) {
                None => {
                    if !missing.contains(&id) {
                        missing.push(id);
                    }
                },
                Some(current) if current != name => {
                    warn!("{}: '{name}' ({id}) is now called '{current}'", self.quest_id);
                },
                Some(_) => {},
            }
        }
        self.resolved = missing.is_empty();
        if !self.resolved {
            warn!("{} left unresolved: {} missing entities", self.quest_id, missing.len());
        }
        missing
    }
}

fn push_frames(data: &QuestData, parent: Option<StepRef>, frames: &mut Vec<QuestFrame>) {
    frames.push(QuestFrame {
        quest_id: data.id,
        parent,
        steps: data.path.clone(),
    });
    for (index, binding) in data.path.iter().enumerate() {
        if let Some(sub) = binding.sub_quest_id {
            match data.nested.iter().find(|n| n.id == sub) {
                Some(nested) => push_frames(nested, Some(StepRef::new(data.id, index)), frames),
                None => warn!("{} step {index} refers to missing {sub}", data.id),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idgen::new_id;

    fn leaf(name: &str, ty: TargetType) -> TargetBinding {
        TargetBinding::leaf(new_id(), name, ty)
    }

    /// root: goto, [sub: listen, kill], report
    fn nested_data() -> QuestData {
        let mut sub = QuestData::new(QuestId(1), EntityRef::new(new_id(), "Hermit"));
        sub.add(leaf("Hermit", TargetType::Listen));
        sub.add(leaf("Bat", TargetType::Kill));
        let mut root = QuestData::new(QuestId(0), EntityRef::new(new_id(), "Elder"));
        root.add(leaf("Forest", TargetType::Location));
        root.add(TargetBinding::sub_quest(sub.giver.id, "Hermit", QuestId(1)));
        root.add(leaf("Elder", TargetType::Report));
        root.nested.push(sub);
        root
    }

    #[test]
    fn frames_point_back_at_their_parent_step() {
        let quest = Quest::from_data(&nested_data());
        assert_eq!(quest.frames().len(), 2);
        assert_eq!(quest.frame(QuestId(1)).and_then(|f| f.parent), Some(StepRef::new(QuestId(0), 1)));
        assert_eq!(quest.status, QuestStatus::InProgress);
    }

    #[test]
    fn current_step_descends_into_nested_frames() {
        let mut quest = Quest::from_data(&nested_data());
        assert_eq!(quest.current_step().map(|(at, _)| at), Some(StepRef::new(QuestId(0), 0)));
        quest.complete_step(StepRef::new(QuestId(0), 0));
        let (at, binding) = quest.current_step().unwrap();
        assert_eq!(at, StepRef::new(QuestId(1), 0));
        assert_eq!(binding.name, "Hermit");
    }

    #[test]
    fn finishing_a_frame_cascades_to_the_root() {
        let mut quest = Quest::from_data(&nested_data());
        assert!(!quest.complete_step(StepRef::new(QuestId(0), 0)));
        assert!(!quest.complete_step(StepRef::new(QuestId(1), 0)));
        assert!(!quest.complete_step(StepRef::new(QuestId(1), 1)));
        assert!(quest.binding(StepRef::new(QuestId(0), 1)).unwrap().is_completed);
        assert!(!quest.is_completed());
        assert!(quest.complete_step(StepRef::new(QuestId(0), 2)));
        assert_eq!(quest.status, QuestStatus::Completed);
        assert!(quest.current_step().is_none());
        // completed steps stay completed
        assert!(!quest.complete_step(StepRef::new(QuestId(0), 2)));
    }

    #[test]
    fn innermost_leaf_completes_every_ancestor() {
        let mut inner = QuestData::new(QuestId(2), EntityRef::new(new_id(), "Miner"));
        inner.add(leaf("Troll", TargetType::Kill));
        let mut middle = QuestData::new(QuestId(1), EntityRef::new(new_id(), "Hermit"));
        middle.add(TargetBinding::sub_quest(inner.giver.id, "Miner", QuestId(2)));
        middle.nested.push(inner);
        let mut root = QuestData::new(QuestId(0), EntityRef::new(new_id(), "Elder"));
        root.add(TargetBinding::sub_quest(middle.giver.id, "Hermit", QuestId(1)));
        root.nested.push(middle);

        let mut quest = Quest::from_data(&root);
        assert_eq!(quest.frames().len(), 3);
        assert_eq!(quest.current_step().map(|(at, _)| at), Some(StepRef::new(QuestId(2), 0)));
        assert!(quest.complete_step(StepRef::new(QuestId(2), 0)));
        assert!(quest.all(TargetType::Subquest).iter().all(|b| b.is_completed));
        assert_eq!(quest.status, QuestStatus::Completed);
    }

    #[test]
    fn precompleted_steps_are_skipped() {
        let mut data = QuestData::new(QuestId(4), EntityRef::new(new_id(), "Elder"));
        let mut here = leaf("Meadow", TargetType::Location);
        here.is_completed = true;
        data.add(here);
        data.add(leaf("Wolf", TargetType::Kill));
        let quest = Quest::from_data(&data);
        assert_eq!(quest.current_step().map(|(at, _)| at.step), Some(1));

        let mut trivial = QuestData::new(QuestId(5), EntityRef::new(new_id(), "Elder"));
        let mut done = leaf("Meadow", TargetType::Location);
        done.is_completed = true;
        trivial.add(done);
        assert!(Quest::from_data(&trivial).is_completed());
    }

    #[test]
    fn queries_flatten_in_step_order() {
        let quest = Quest::from_data(&nested_data());
        let names: Vec<&str> = quest.bindings().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Forest", "Hermit", "Hermit", "Bat", "Elder"]);
        assert_eq!(quest.first(TargetType::Kill).map(|b| b.name.as_str()), Some("Bat"));
        assert_eq!(quest.all(TargetType::Subquest).len(), 1);
    }

    #[test]
    fn learned_lore_is_kept_once() {
        let mut quest = Quest::from_data(&nested_data());
        quest.learn("the bridge is out");
        quest.learn("the bridge is out");
        assert!(quest.has_learned("the bridge is out"));
        assert_eq!(quest.learned().len(), 1);
    }

    #[test]
    fn deserialized_quests_start_unresolved() {
        let quest = Quest::from_data(&nested_data());
        let text = ron::ser::to_string(&quest).unwrap();
        let mut back: Quest = ron::from_str(&text).unwrap();
        assert!(!back.is_resolved());
        let missing = back.resolve(&World::new_empty());
        assert!(!missing.is_empty());
        assert!(!back.is_resolved());
    }
}
