use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::SpecError;
use crate::spec::screen::{AnswerOption, Item, Screen};

/// Named option lists shared between items, keyed by set name.
pub type OptionSets = BTreeMap<String, Vec<AnswerOption>>;

/// Identity and lifecycle metadata of a survey definition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct SurveyMeta {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
}

/// Top-level survey definition as shipped to every client.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct SurveySchema {
    #[serde(default)]
    pub survey: SurveyMeta,
    #[serde(default)]
    pub option_sets: OptionSets,
    #[serde(default)]
    pub screens: Vec<Screen>,
}

impl SurveySchema {
    pub fn from_json_str(raw: &str) -> Result<Self, SpecError> {
        serde_json::from_str(raw).map_err(SpecError::Parse)
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self, SpecError> {
        serde_json::from_value(value).map_err(SpecError::Parse)
    }

    /// Every item in declared order, paired with the index of its screen.
    pub fn items(&self) -> impl Iterator<Item = (usize, &Item)> {
        self.screens
            .iter()
            .enumerate()
            .flat_map(|(index, screen)| screen.items.iter().map(move |item| (index, item)))
    }

    pub fn find_item(&self, code: &str) -> Option<(usize, &Item)> {
        self.items().find(|(_, item)| item.question.code == code)
    }

    /// A copy with screens stably sorted by `ordinal`. The engine itself
    /// always follows declared order.
    pub fn sorted_by_ordinal(&self) -> Self {
        let mut sorted = self.clone();
        sorted.screens.sort_by_key(|screen| screen.ordinal);
        sorted
    }
}
