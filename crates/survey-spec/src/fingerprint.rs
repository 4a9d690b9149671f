use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::SpecError;
use crate::rules::Rule;
use crate::spec::question::{RegionTag, ResponseType, Usage};
use crate::spec::screen::{AnswerOption, Item, OptionSource};
use crate::spec::survey::{OptionSets, SurveySchema};

/// Identity of a survey revision: its slug, version, and content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyFingerprint {
    pub slug: String,
    pub version: u32,
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionIndexEntry {
    pub screen_key: String,
    pub screen_ordinal: i64,
    pub effective_required: bool,
    pub question_hash: String,
}

pub type QuestionIndex = BTreeMap<String, QuestionIndexEntry>;

/// Serializes `value` with sorted keys and compact separators.
///
/// Arrays made only of `{value, label}` objects are option lists; they are
/// sorted so that reordering options does not change the hash.
pub fn canonical_json(value: &Value) -> String {
    normalize(value).to_string()
}

pub fn sha256_hex(value: &Value) -> String {
    hex::encode(Sha256::digest(canonical_json(value).as_bytes()))
}

/// Fingerprint of a survey definition exactly as authored. Only the fields
/// present in `definition` are hashed, so two stores that hash the same
/// document agree.
pub fn definition_fingerprint(definition: &Value) -> SurveyFingerprint {
    let meta = definition.get("survey");
    let slug = match meta.and_then(|meta| meta.get("slug")) {
        Some(Value::String(slug)) => slug.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    let version = match meta.and_then(|meta| meta.get("version")) {
        Some(Value::Number(number)) => number.as_u64(),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    }
    .and_then(|version| u32::try_from(version).ok())
    .unwrap_or(0);

    let hash = if definition.is_object() {
        sha256_hex(definition)
    } else {
        sha256_hex(&Value::Object(Map::new()))
    };
    SurveyFingerprint {
        slug,
        version,
        hash,
    }
}

/// Fingerprint of the loaded model. Defaults filled in while loading are
/// part of the hash, so this differs from [`definition_fingerprint`] for a
/// document that omits them.
pub fn survey_fingerprint(schema: &SurveySchema) -> Result<SurveyFingerprint, SpecError> {
    let value = serde_json::to_value(schema).map_err(SpecError::Encode)?;
    Ok(SurveyFingerprint {
        slug: schema.survey.slug.clone(),
        version: schema.survey.version,
        hash: sha256_hex(&value),
    })
}

/// Per-question metadata keyed by code, including a hash of everything that
/// changes the question's meaning.
pub fn question_index(schema: &SurveySchema) -> Result<QuestionIndex, SpecError> {
    let mut index = QuestionIndex::new();
    for screen in &schema.screens {
        for item in &screen.items {
            let code = item.question.code.trim();
            if code.is_empty() {
                continue;
            }
            index.insert(
                code.to_string(),
                QuestionIndexEntry {
                    screen_key: screen.key.clone(),
                    screen_ordinal: screen.ordinal,
                    effective_required: item.question.blocks_completion(),
                    question_hash: question_semantics_hash(item, &schema.option_sets)?,
                },
            );
        }
    }
    Ok(index)
}

/// Sorted codes of questions that must be answered for completion.
pub fn required_question_codes(schema: &SurveySchema) -> Vec<String> {
    schema
        .items()
        .filter(|(_, item)| item.question.blocks_completion())
        .map(|(_, item)| item.question.code.trim().to_string())
        .filter(|code| !code.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn question_codes(schema: &SurveySchema) -> BTreeSet<String> {
    schema
        .items()
        .map(|(_, item)| item.question.code.trim().to_string())
        .filter(|code| !code.is_empty())
        .collect()
}

#[derive(Serialize)]
struct QuestionSemantics<'a> {
    prompt: &'a str,
    #[serde(rename = "type")]
    kind: Option<ResponseType>,
    options: Option<&'a Vec<AnswerOption>>,
    validation: SemanticsValidation<'a>,
    scoring: SemanticsScoring,
}

#[derive(Serialize)]
struct SemanticsValidation<'a> {
    is_required: bool,
    allow_skip: bool,
    rules: &'a [Rule],
}

#[derive(Serialize)]
struct SemanticsScoring {
    usage: Option<Usage>,
    reverse_coded: bool,
    region_tag: Option<RegionTag>,
}

fn question_semantics_hash(item: &Item, option_sets: &OptionSets) -> Result<String, SpecError> {
    let question = &item.question;
    // Unlike resolve_options, an unknown set hashes as null rather than [].
    let options = match &item.options {
        Some(OptionSource::Named(key)) => option_sets.get(key),
        Some(OptionSource::Inline(options)) => Some(options),
        None => None,
    };
    let semantics = QuestionSemantics {
        prompt: &question.text,
        kind: question.response_type,
        options,
        validation: SemanticsValidation {
            is_required: question.is_required,
            allow_skip: question.allow_skip,
            rules: &item.rules,
        },
        scoring: SemanticsScoring {
            usage: question.usage,
            reverse_coded: question.reverse_coded.unwrap_or(false),
            region_tag: question.region_tag,
        },
    };
    let value = serde_json::to_value(semantics).map_err(SpecError::Encode)?;
    Ok(sha256_hex(&value))
}

fn normalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys = map.keys().collect::<Vec<_>>();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), normalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(entries) if !entries.is_empty() && entries.iter().all(is_option) => {
            let mut normalized = entries.iter().map(normalize).collect::<Vec<_>>();
            normalized.sort_by_key(|entry| (sort_text(&entry["value"]), sort_text(&entry["label"])));
            Value::Array(normalized)
        }
        Value::Array(entries) => Value::Array(entries.iter().map(normalize).collect()),
        other => other.clone(),
    }
}

fn is_option(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.contains_key("value") && map.contains_key("label"))
}

fn sort_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
