use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Answer widget family. Unrecognized strings load as `Unknown` so newer
/// schemas still parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    #[serde(rename = "likert_1_5")]
    Likert1To5,
    SingleSelect,
    ForcedChoicePair,
    #[serde(other)]
    Unknown,
}

/// Region a question is shown in.
///
/// Tags are matched case-insensitively after trimming, and a blank tag is
/// `GLOBAL`. Anything else loads as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegionTag {
    Global,
    CbsNyc,
    SchoolSpecific,
    Unknown,
}

impl RegionTag {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "" | "GLOBAL" => RegionTag::Global,
            "CBS_NYC" => RegionTag::CbsNyc,
            "SCHOOL_SPECIFIC" => RegionTag::SchoolSpecific,
            _ => RegionTag::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for RegionTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(raw) => RegionTag::parse(&raw),
            _ => RegionTag::Unknown,
        })
    }
}

/// Whether an answer feeds scoring or only display copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Usage {
    Scoring,
    CopyOnly,
    #[serde(other)]
    Unknown,
}

/// One question of the survey. `ui_hint`, `reverse_coded`, `region_tag`,
/// `usage` and any unrecognized fields are carried through untouched; the
/// engine never reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Question {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_type: Option<ResponseType>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub allow_skip: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_hint: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse_coded: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_tag: Option<RegionTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tenant_tags: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Question {
    pub fn new(code: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            text: text.into(),
            response_type: None,
            is_required: false,
            allow_skip: false,
            ui_hint: None,
            reverse_coded: None,
            region_tag: None,
            usage: None,
            tenant_tags: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    pub fn skippable(mut self) -> Self {
        self.allow_skip = true;
        self
    }

    pub fn with_response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    /// Required and not skippable: an unanswered question of this kind keeps
    /// its screen incomplete.
    pub fn blocks_completion(&self) -> bool {
        self.is_required && !self.allow_skip
    }
}
