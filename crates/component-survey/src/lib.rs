use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::warn;

use survey_spec::{
    AnswerValue, Answers, SpecError, SurveySchema, definition_fingerprint, filter_for_tenant,
    question_index, required_question_codes, resolve_options, summarize,
    validate_schema as spec_validate_schema, visible_screens as spec_visible_screens,
};

const DEFAULT_SCHEMA: &str = include_str!("../../survey-spec/tests/fixtures/onboarding.json");

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse config: {0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error(transparent)]
    Schema(#[from] SpecError),
    #[error("failed to parse answer value: {0}")]
    ValueParse(#[source] serde_json::Error),
    #[error("answer for '{0}' must be a primitive or a list of primitives")]
    InvalidAnswer(String),
    #[error("question '{0}' is not part of the survey")]
    UnknownQuestion(String),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct ComponentConfig {
    #[serde(default)]
    schema_json: Option<String>,
    #[serde(default)]
    tenant_slug: Option<String>,
    #[serde(default)]
    resume_fallback: usize,
}

struct Loaded {
    /// Schema document as received, used for hashing.
    definition: Value,
    /// Full schema, used for authoring checks.
    source: SurveySchema,
    /// The view served to respondents: `source` filtered for the tenant.
    schema: SurveySchema,
    resume_fallback: usize,
}

fn load(config_json: &str) -> Result<Loaded, ComponentError> {
    let config = if config_json.trim().is_empty() {
        ComponentConfig::default()
    } else {
        serde_json::from_str(config_json).map_err(ComponentError::ConfigParse)?
    };

    let schema_json = config.schema_json.as_deref().unwrap_or(DEFAULT_SCHEMA);
    let definition: Value = serde_json::from_str(schema_json).map_err(SpecError::Parse)?;
    let source = SurveySchema::from_json(definition.clone())?;
    let schema = filter_for_tenant(&source, config.tenant_slug.as_deref());

    Ok(Loaded {
        definition,
        source,
        schema,
        resume_fallback: config.resume_fallback,
    })
}

/// Unreadable answers degrade to an empty answer set rather than an error.
fn parse_answers(answers_json: &str) -> Answers {
    if answers_json.trim().is_empty() {
        return Answers::new();
    }
    serde_json::from_str(answers_json).unwrap_or_else(|error| {
        warn!(%error, "ignoring unreadable answers payload");
        Answers::new()
    })
}

fn encode<T: Serialize>(value: &T) -> Result<Value, ComponentError> {
    serde_json::to_value(value).map_err(ComponentError::JsonEncode)
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

pub fn describe(config_json: &str) -> String {
    respond(load(config_json).and_then(|loaded| encode(&loaded.schema)))
}

pub fn visible_screens(config_json: &str, answers_json: &str) -> String {
    respond(load(config_json).and_then(|loaded| {
        let answers = parse_answers(answers_json);
        let screens = spec_visible_screens(&loaded.schema, &answers);
        Ok(json!({ "screens": encode(&screens)? }))
    }))
}

pub fn progress(config_json: &str, answers_json: &str) -> String {
    respond(load(config_json).and_then(|loaded| {
        let answers = parse_answers(answers_json);
        encode(&summarize(&loaded.schema, &answers, loaded.resume_fallback))
    }))
}

pub fn resolve_item_options(config_json: &str, question_code: &str) -> String {
    respond(load(config_json).and_then(|loaded| {
        let (_, item) = loaded
            .schema
            .find_item(question_code)
            .ok_or_else(|| ComponentError::UnknownQuestion(question_code.to_string()))?;
        encode(&resolve_options(item, &loaded.schema.option_sets))
    }))
}

pub fn validate_schema(config_json: &str) -> String {
    respond(load(config_json).and_then(|loaded| encode(&spec_validate_schema(&loaded.source))))
}

pub fn fingerprint(config_json: &str) -> String {
    respond(load(config_json).and_then(|loaded| {
        let fingerprint = definition_fingerprint(&loaded.definition);
        let index = question_index(&loaded.source)?;
        Ok(json!({
            "slug": fingerprint.slug,
            "version": fingerprint.version,
            "hash": fingerprint.hash,
            "required_question_codes": required_question_codes(&loaded.source),
            "question_index": encode(&index)?,
        }))
    }))
}

/// Applies one answer and returns the new answer set with its progress.
/// A `null` value clears the question.
pub fn submit_patch(
    config_json: &str,
    answers_json: &str,
    question_code: &str,
    value_json: &str,
) -> String {
    respond(load(config_json).and_then(|loaded| {
        if loaded.schema.find_item(question_code).is_none() {
            return Err(ComponentError::UnknownQuestion(question_code.to_string()));
        }
        let raw: Value = serde_json::from_str(value_json).map_err(ComponentError::ValueParse)?;
        let value = AnswerValue::from_json(&raw)
            .ok_or_else(|| ComponentError::InvalidAnswer(question_code.to_string()))?;

        let mut answers = parse_answers(answers_json);
        answers.insert(question_code, value);
        let summary = summarize(&loaded.schema, &answers, loaded.resume_fallback);

        Ok(json!({
            "status": summary.status.as_str(),
            "answers": encode(&answers)?,
            "progress": encode(&summary)?,
        }))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Value {
        serde_json::from_str(raw).expect("valid json")
    }

    fn two_screen_config() -> String {
        let schema = json!({
            "survey": { "slug": "two", "version": 1 },
            "screens": [
                {
                    "key": "A",
                    "items": [{ "question": { "code": "Q1", "is_required": true } }]
                },
                {
                    "key": "B",
                    "items": [{
                        "question": { "code": "Q2", "is_required": true },
                        "rules": [{ "trigger_question_code": "Q1", "operator": "eq", "trigger_value": "a" }]
                    }]
                }
            ]
        });
        json!({ "schema_json": schema.to_string() }).to_string()
    }

    #[test]
    fn describe_returns_default_schema() {
        let schema = parse(&describe(""));
        assert_eq!(schema["survey"]["slug"], "cbs-match-v1");
        assert_eq!(schema["screens"].as_array().map(Vec::len), Some(4));
    }

    #[test]
    fn bad_config_is_reported_as_error() {
        let response = parse(&describe("{not json"));
        assert!(
            response["error"]
                .as_str()
                .unwrap_or_default()
                .starts_with("failed to parse config")
        );
    }

    #[test]
    fn visible_screens_follow_answers() {
        let config = two_screen_config();
        let hidden = parse(&visible_screens(&config, "{}"));
        assert_eq!(hidden["screens"].as_array().map(Vec::len), Some(1));

        let shown = parse(&visible_screens(&config, r#"{"Q1":"a"}"#));
        let screens = shown["screens"].as_array().expect("screens");
        assert_eq!(screens.len(), 2);
        assert_eq!(screens[1]["index"], 1);
        assert_eq!(screens[1]["items"][0]["question"]["code"], "Q2");
    }

    #[test]
    fn progress_reports_completion_and_resume_index() {
        let config = two_screen_config();
        let progress = parse(&progress(&config, r#"{"Q1":"a"}"#));
        assert_eq!(progress["completion"], 50);
        assert_eq!(progress["resume_index"], 1);
        assert_eq!(progress["status"], "need_input");
    }

    #[test]
    fn unreadable_answers_fall_back_to_empty() {
        let config = two_screen_config();
        let progress = parse(&progress(&config, "not json"));
        assert_eq!(progress["completion"], 0);
        assert_eq!(progress["resume_index"], 0);
    }

    #[test]
    fn tenant_slug_filters_questions() {
        let config = json!({ "tenant_slug": "wharton" }).to_string();
        let schema = parse(&describe(&config));
        let codes = schema["screens"][1]["items"]
            .as_array()
            .expect("items")
            .iter()
            .map(|item| item["question"]["code"].clone())
            .collect::<Vec<_>>();
        assert_eq!(codes, vec![json!("VAL_AMBITION_01")]);
    }

    #[test]
    fn missing_tenant_serves_default_tenant_view() {
        let schema = json!({
            "screens": [{
                "key": "s",
                "items": [
                    { "question": { "code": "G1", "region_tag": "GLOBAL" } },
                    { "question": { "code": "N1", "region_tag": "CBS_NYC" } },
                    {
                        "question": {
                            "code": "W1",
                            "region_tag": "SCHOOL_SPECIFIC",
                            "tenant_tags": ["wharton"]
                        }
                    }
                ]
            }]
        });
        let config = json!({ "schema_json": schema.to_string() }).to_string();
        let described = parse(&describe(&config));
        let codes = described["screens"][0]["items"]
            .as_array()
            .expect("items")
            .iter()
            .map(|item| item["question"]["code"].clone())
            .collect::<Vec<_>>();
        assert_eq!(codes, vec![json!("G1"), json!("N1")]);

        let report = parse(&validate_schema(&config));
        assert_eq!(report["valid"], true);
    }

    #[test]
    fn fingerprint_hashes_schema_document_as_sent() {
        let schema = json!({ "survey": { "slug": "tiny", "version": 2 }, "screens": [] });
        let config = json!({ "schema_json": schema.to_string() }).to_string();
        let payload = parse(&fingerprint(&config));
        assert_eq!(payload["slug"], "tiny");
        assert_eq!(payload["hash"], definition_fingerprint(&schema).hash);
    }

    #[test]
    fn options_resolve_through_registry() {
        let options = parse(&resolve_item_options("", "LA_KIDS_01"));
        let values = options
            .as_array()
            .expect("options")
            .iter()
            .map(|option| option["value"].clone())
            .collect::<Vec<_>>();
        assert_eq!(
            values,
            vec![json!("yes"), json!("maybe"), json!("probably_not"), json!("no")]
        );

        let missing = parse(&resolve_item_options("", "NOPE"));
        assert_eq!(missing["error"], "question 'NOPE' is not part of the survey");
    }

    #[test]
    fn default_schema_validates() {
        let report = parse(&validate_schema(""));
        assert_eq!(report["valid"], true);
    }

    #[test]
    fn fingerprint_lists_required_codes() {
        let payload = parse(&fingerprint(""));
        assert_eq!(payload["version"], 3);
        assert_eq!(payload["hash"].as_str().map(str::len), Some(64));
        assert_eq!(payload["required_question_codes"][0], "CONSENT_FLIRTY_01");
        assert_eq!(payload["question_index"]["LA_KIDS_01"]["screen_key"], "basics");
    }

    #[test]
    fn submit_patch_advances_progress() {
        let config = two_screen_config();
        let response = parse(&submit_patch(&config, "{}", "Q1", r#""a""#));
        assert_eq!(response["status"], "need_input");
        assert_eq!(response["answers"]["Q1"], "a");
        assert_eq!(response["progress"]["resume_index"], 1);

        let done = parse(&submit_patch(&config, r#"{"Q1":"a"}"#, "Q2", r#""b""#));
        assert_eq!(done["status"], "complete");
        assert_eq!(done["progress"]["completion"], 100);
    }

    #[test]
    fn submit_patch_null_clears_answer() {
        let config = two_screen_config();
        let response = parse(&submit_patch(&config, r#"{"Q1":"a"}"#, "Q1", "null"));
        assert!(response["answers"].get("Q1").is_none());
        assert_eq!(response["progress"]["completion"], 0);
    }

    #[test]
    fn submit_patch_rejects_objects_and_unknown_codes() {
        let config = two_screen_config();
        let object = parse(&submit_patch(&config, "{}", "Q1", r#"{"a":1}"#));
        assert!(object["error"].as_str().is_some());

        let unknown = parse(&submit_patch(&config, "{}", "Q9", r#""a""#));
        assert_eq!(unknown["error"], "question 'Q9' is not part of the survey");
    }
}
