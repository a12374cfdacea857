use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::template::ChecklistTemplate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Ok,
    Issue,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Issue => "issue",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ok" => Some(Self::Ok),
            "issue" => Some(Self::Issue),
            _ => None,
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of one piece of equipment. An `Ok` item never carries an observation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemState {
    pub status: ItemStatus,
    #[serde(default)]
    pub observation: String,
}

impl ItemState {
    pub fn new(status: ItemStatus, observation: &str) -> Self {
        let observation = match status {
            ItemStatus::Ok => String::new(),
            ItemStatus::Issue => observation.to_string(),
        };
        Self {
            status,
            observation,
        }
    }

    pub fn ok() -> Self {
        Self::default()
    }

    pub fn issue(observation: &str) -> Self {
        Self::new(ItemStatus::Issue, observation)
    }

    pub fn is_issue(&self) -> bool {
        self.status == ItemStatus::Issue
    }

    pub fn has_observation(&self) -> bool {
        !self.observation.trim().is_empty()
    }

    /// An issue with a written observation, the only state that feeds the fault log.
    pub fn is_reported_fault(&self) -> bool {
        self.is_issue() && self.has_observation()
    }
}

pub type SectionState = BTreeMap<String, ItemState>;

/// Full checklist state for one day: section -> item -> state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChecklistData {
    sections: BTreeMap<String, SectionState>,
}

impl ChecklistData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every template item present and `Ok`.
    pub fn default_for(template: &ChecklistTemplate) -> Self {
        let mut data = Self::new();
        for section in template.sections() {
            let state = data.sections.entry(section.name.clone()).or_default();
            for item in &section.items {
                state.insert(item.clone(), ItemState::ok());
            }
        }
        data
    }

    /// Reads an item, falling back to the `Ok` default for missing entries.
    pub fn item(&self, section: &str, item: &str) -> ItemState {
        self.sections
            .get(section)
            .and_then(|s| s.get(item))
            .cloned()
            .unwrap_or_default()
    }

    pub fn get(&self, section: &str, item: &str) -> Option<&ItemState> {
        self.sections.get(section).and_then(|s| s.get(item))
    }

    /// Writes an item, creating the section on first use.
    pub fn set_item(&mut self, section: &str, item: &str, state: ItemState) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(item.to_string(), state);
    }

    pub fn sections(&self) -> &BTreeMap<String, SectionState> {
        &self.sections
    }

    /// Template items currently flagged as an issue, in template order.
    pub fn issues<'a>(
        &'a self,
        template: &'a ChecklistTemplate,
    ) -> impl Iterator<Item = (&'a str, &'a str, ItemState)> + 'a {
        template
            .items()
            .map(move |(s, i)| (s, i, self.item(s, i)))
            .filter(|(_, _, state)| state.is_issue())
    }

    pub fn to_msgpack(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        rmp_serde::to_vec_named(self)
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, rmp_serde::decode::Error> {
        rmp_serde::from_slice(bytes)
    }
}
