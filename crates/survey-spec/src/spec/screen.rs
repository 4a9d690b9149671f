use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::rules::Rule;
use crate::spec::question::Question;
use crate::value::Primitive;

/// A selectable choice: the stored `value` and the text shown for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnswerOption {
    pub value: Primitive,
    #[serde(default)]
    pub label: String,
}

impl AnswerOption {
    pub fn new(value: impl Into<Primitive>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Where an item's options come from: a key into the schema's
/// `option_sets`, or a list declared on the item itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum OptionSource {
    Named(String),
    Inline(Vec<AnswerOption>),
}

/// A question placed on a screen, with its option source and show-if rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Item {
    pub question: Question,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionSource>,
    /// Conjunctive visibility rules; empty means always visible.
    #[serde(
        default,
        alias = "show_if",
        deserialize_with = "crate::rules::deserialize_rules"
    )]
    #[schemars(with = "Vec<Rule>")]
    pub rules: Vec<Rule>,
}

impl Item {
    pub fn new(question: Question) -> Self {
        Self {
            question,
            options: None,
            rules: Vec::new(),
        }
    }

    pub fn with_option_set(mut self, key: impl Into<String>) -> Self {
        self.options = Some(OptionSource::Named(key.into()));
        self
    }

    pub fn with_options(mut self, options: Vec<AnswerOption>) -> Self {
        self.options = Some(OptionSource::Inline(options));
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn code(&self) -> &str {
        &self.question.code
    }
}

/// One page of the survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Screen {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub ordinal: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Screen {
    pub fn new(key: impl Into<String>, ordinal: i64, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ordinal,
            title: title.into(),
            subtitle: None,
            items: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }
}
