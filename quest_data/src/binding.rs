//! Target bindings and quest paths.
//!
//! A [`TargetBinding`] links one quest step to one concrete world entity. Bindings are
//! stored by entity id and name only, never by live reference, so that quest state
//! survives a save/load cycle unchanged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier of any world entity (zone, level, actor, item).
pub type EntityId = Uuid;

/// Identity of one quest level (a root quest or one of its nested sub-quests).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestId(pub u32);

impl Display for QuestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "quest#{}", self.0)
    }
}

/// The role a bound entity plays in a quest step.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Location,
    Kill,
    Damage,
    Listen,
    Report,
    Get,
    Give,
    Escort,
    Read,
    Steal,
    Subquest,
    Task,
}

impl TargetType {
    pub const ALL: [TargetType; 12] = [
        TargetType::Location,
        TargetType::Kill,
        TargetType::Damage,
        TargetType::Listen,
        TargetType::Report,
        TargetType::Get,
        TargetType::Give,
        TargetType::Escort,
        TargetType::Read,
        TargetType::Steal,
        TargetType::Subquest,
        TargetType::Task,
    ];

    /// Lower-case name, identical to the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            TargetType::Location => "location",
            TargetType::Kill => "kill",
            TargetType::Damage => "damage",
            TargetType::Listen => "listen",
            TargetType::Report => "report",
            TargetType::Get => "get",
            TargetType::Give => "give",
            TargetType::Escort => "escort",
            TargetType::Read => "read",
            TargetType::Steal => "steal",
            TargetType::Subquest => "subquest",
            TargetType::Task => "task",
        }
    }
}

impl Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetType::ALL
            .into_iter()
            .find(|tt| tt.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown target type '{s}'"))
    }
}

/// Serde adapter that stores a missing sub-quest reference as `-1`.
pub mod sub_quest_id {
    use super::QuestId;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<QuestId>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(id) => serializer.serialize_i64(i64::from(id.0)),
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<QuestId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match i64::deserialize(deserializer)? {
            -1 => Ok(None),
            raw => u32::try_from(raw)
                .map(|id| Some(QuestId(id)))
                .map_err(|_| D::Error::custom(format!("invalid subQuestID {raw}"))),
        }
    }
}

/// A (persistable) reference to an entity: its id plus the name it had when bound.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: EntityId,
    pub name: String,
}
impl EntityRef {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

/// One concrete step of a quest path.
///
/// Serialized shape is exactly `{id, name, targetType, subQuestID, isCompleted}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetBinding {
    pub id: EntityId,
    pub name: String,
    pub target_type: TargetType,
    #[serde(rename = "subQuestID", with = "sub_quest_id")]
    pub sub_quest_id: Option<QuestId>,
    pub is_completed: bool,
}

impl TargetBinding {
    /// A plain step bound to a single entity.
    pub fn leaf(id: EntityId, name: impl Into<String>, target_type: TargetType) -> Self {
        Self {
            id,
            name: name.into(),
            target_type,
            sub_quest_id: None,
            is_completed: false,
        }
    }

    /// A step that completes only when the nested quest `sub` completes.
    pub fn sub_quest(id: EntityId, name: impl Into<String>, sub: QuestId) -> Self {
        Self {
            id,
            name: name.into(),
            target_type: TargetType::Subquest,
            sub_quest_id: Some(sub),
            is_completed: false,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.sub_quest_id.is_none()
    }
}

/// The concrete path of a mapped quest, including the data of its nested quests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestData {
    pub id: QuestId,
    pub giver: EntityRef,
    pub path: Vec<TargetBinding>,
    #[serde(default)]
    pub nested: Vec<QuestData>,
}

impl QuestData {
    pub fn new(id: QuestId, giver: EntityRef) -> Self {
        Self {
            id,
            giver,
            path: Vec::new(),
            nested: Vec::new(),
        }
    }

    /// Append a binding to this level's path.
    pub fn add(&mut self, binding: TargetBinding) {
        self.path.push(binding);
    }

    /// Bindings of every level in flattened, in-order sequence.
    ///
    /// A sub-quest step is yielded just before the steps of the quest it refers to.
    pub fn bindings(&self) -> Vec<&TargetBinding> {
        let mut out = Vec::new();
        self.collect_bindings(&mut out);
        out
    }

    fn collect_bindings<'a>(&'a self, out: &mut Vec<&'a TargetBinding>) {
        for binding in &self.path {
            out.push(binding);
            if let Some(sub) = binding.sub_quest_id
                && let Some(nested) = self.nested.iter().find(|n| n.id == sub)
            {
                nested.collect_bindings(out);
            }
        }
    }

    /// First binding of the given type, searching nested quests in step order.
    pub fn first(&self, target_type: TargetType) -> Option<&TargetBinding> {
        self.bindings().into_iter().find(|b| b.target_type == target_type)
    }

    /// All bindings of the given type, in step order.
    pub fn all(&self, target_type: TargetType) -> Vec<&TargetBinding> {
        self.bindings()
            .into_iter()
            .filter(|b| b.target_type == target_type)
            .collect()
    }

    /// Bindings grouped by target type.
    pub fn by_type(&self) -> BTreeMap<TargetType, Vec<&TargetBinding>> {
        let mut groups: BTreeMap<TargetType, Vec<&TargetBinding>> = BTreeMap::new();
        for binding in self.bindings() {
            groups.entry(binding.target_type).or_default().push(binding);
        }
        groups
    }

    /// Number of leaf steps across all nesting levels.
    pub fn num_steps(&self) -> usize {
        self.bindings().iter().filter(|b| b.is_leaf()).count()
    }

    /// Look up this quest or any quest nested below it.
    pub fn find(&self, id: QuestId) -> Option<&QuestData> {
        if self.id == id {
            return Some(self);
        }
        self.nested.iter().find_map(|n| n.find(id))
    }

    /// Ids of this quest and every nested quest, depth-first.
    pub fn quest_ids(&self) -> Vec<QuestId> {
        let mut ids = vec![self.id];
        for nested in &self.nested {
            ids.extend(nested.quest_ids());
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> QuestData {
        let giver = EntityRef::new(Uuid::new_v4(), "Elder");
        let mut nested = QuestData::new(QuestId(2), EntityRef::new(Uuid::new_v4(), "Hermit"));
        nested.add(TargetBinding::leaf(Uuid::new_v4(), "Cave", TargetType::Location));
        nested.add(TargetBinding::leaf(Uuid::new_v4(), "Bat", TargetType::Kill));

        let mut root = QuestData::new(QuestId(1), giver.clone());
        root.add(TargetBinding::leaf(Uuid::new_v4(), "Forest", TargetType::Location));
        root.add(TargetBinding::sub_quest(nested.giver.id, "Hermit", QuestId(2)));
        root.add(TargetBinding::leaf(Uuid::new_v4(), "Wolf", TargetType::Kill));
        root.add(TargetBinding::leaf(giver.id, "Elder", TargetType::Report));
        root.nested.push(nested);
        root
    }

    #[test]
    fn leaf_binding_serializes_with_exact_shape() {
        let id = Uuid::new_v4();
        let binding = TargetBinding::leaf(id, "Goblin", TargetType::Kill);
        let value = serde_json::to_value(&binding).unwrap();
        let expected = serde_json::json!({
            "id": id.to_string(),
            "name": "Goblin",
            "targetType": "kill",
            "subQuestID": -1,
            "isCompleted": false,
        });
        assert_eq!(value, expected);
    }

    #[test]
    fn sub_quest_binding_stores_nested_id() {
        let binding = TargetBinding::sub_quest(Uuid::new_v4(), "Hermit", QuestId(7));
        let value = serde_json::to_value(&binding).unwrap();
        assert_eq!(value["subQuestID"], 7);
        assert_eq!(value["targetType"], "subquest");
        let back: TargetBinding = serde_json::from_value(value).unwrap();
        assert_eq!(back, binding);
    }

    #[test]
    fn negative_sub_quest_ids_other_than_minus_one_are_rejected() {
        let raw = format!(
            r#"{{"id":"{}","name":"x","targetType":"get","subQuestID":-5,"isCompleted":false}}"#,
            Uuid::new_v4()
        );
        assert!(serde_json::from_str::<TargetBinding>(&raw).is_err());
    }

    #[test]
    fn bindings_are_flattened_in_step_order() {
        let data = sample();
        let names: Vec<_> = data.bindings().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Forest", "Hermit", "Cave", "Bat", "Wolf", "Elder"]);
        assert_eq!(data.num_steps(), 5);
    }

    #[test]
    fn first_and_all_search_nested_levels() {
        let data = sample();
        assert_eq!(data.first(TargetType::Kill).unwrap().name, "Bat");
        assert_eq!(data.all(TargetType::Kill).len(), 2);
        assert_eq!(data.all(TargetType::Location).len(), 2);
        assert!(data.first(TargetType::Escort).is_none());
        assert_eq!(data.by_type()[&TargetType::Report].len(), 1);
    }

    #[test]
    fn find_and_quest_ids_cover_nested_quests() {
        let data = sample();
        assert_eq!(data.quest_ids(), vec![QuestId(1), QuestId(2)]);
        assert_eq!(data.find(QuestId(2)).unwrap().giver.name, "Hermit");
        assert!(data.find(QuestId(3)).is_none());
    }

    #[test]
    fn target_type_parses_case_insensitively() {
        assert_eq!("Escort".parse::<TargetType>(), Ok(TargetType::Escort));
        assert!("teleport".parse::<TargetType>().is_err());
    }

    #[test]
    fn quest_data_survives_ron() {
        let data = sample();
        let text = ron::ser::to_string(&data).unwrap();
        let back: QuestData = ron::from_str(&text).unwrap();
        assert_eq!(back, data);
    }
}
