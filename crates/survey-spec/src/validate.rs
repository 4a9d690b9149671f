use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rules::{Operator, RuleKind};
use crate::spec::question::{RegionTag, ResponseType, Usage};
use crate::spec::screen::{AnswerOption, OptionSource};
use crate::spec::survey::SurveySchema;
use crate::value::{AnswerValue, Primitive};

/// A single authoring problem found in a survey definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaIssue {
    pub code: String,
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<SchemaIssue>,
}

impl ValidationReport {
    pub fn has(&self, code: &str) -> bool {
        self.issues.iter().any(|issue| issue.code == code)
    }
}

/// Checks a definition the way the authoring tools do before publishing.
///
/// This is separate from the engine, which accepts any schema; here every
/// structural mistake is reported so content authors can fix it.
pub fn validate_schema(schema: &SurveySchema) -> ValidationReport {
    let mut issues = Vec::new();
    let mut screen_keys = BTreeSet::new();
    let mut question_codes = BTreeSet::new();
    // None when the question has no resolvable option values to check against.
    let mut allowed_values: BTreeMap<&str, Option<Vec<&Primitive>>> = BTreeMap::new();

    for (s_idx, screen) in schema.screens.iter().enumerate() {
        let screen_path = format!("screens[{}]", s_idx);
        if screen.key.trim().is_empty() {
            issues.push(issue(
                "missing_screen_key",
                format!("{}.key", screen_path),
                "screen key is required".into(),
            ));
        } else if !screen_keys.insert(screen.key.as_str()) {
            issues.push(issue(
                "duplicate_screen_key",
                format!("{}.key", screen_path),
                format!("duplicate screen key '{}'", screen.key),
            ));
        }

        for (i_idx, item) in screen.items.iter().enumerate() {
            let item_path = format!("{}.items[{}]", screen_path, i_idx);
            let question = &item.question;
            let code = question.code.trim();
            if code.is_empty() {
                issues.push(issue(
                    "missing_question_code",
                    format!("{}.question.code", item_path),
                    "question code is required".into(),
                ));
                continue;
            }
            if !question_codes.insert(code) {
                issues.push(issue(
                    "duplicate_question_code",
                    format!("{}.question.code", item_path),
                    format!("duplicate question code '{}'", code),
                ));
            }

            if question.response_type == Some(ResponseType::Unknown) {
                issues.push(issue(
                    "invalid_response_type",
                    format!("{}.question.response_type", item_path),
                    "response_type must be one of [forced_choice_pair, likert_1_5, single_select]"
                        .into(),
                ));
            }
            if question.region_tag == Some(RegionTag::Unknown) {
                issues.push(issue(
                    "invalid_region_tag",
                    format!("{}.question.region_tag", item_path),
                    "region_tag must be one of [CBS_NYC, GLOBAL, SCHOOL_SPECIFIC]".into(),
                ));
            }
            if question.usage == Some(Usage::Unknown) {
                issues.push(issue(
                    "invalid_usage",
                    format!("{}.question.usage", item_path),
                    "usage must be one of [COPY_ONLY, SCORING]".into(),
                ));
            }

            let options: Option<&[AnswerOption]> = match &item.options {
                Some(OptionSource::Named(key)) => match schema.option_sets.get(key) {
                    Some(options) => Some(options.as_slice()),
                    None => {
                        issues.push(issue(
                            "missing_option_set",
                            format!("{}.options", item_path),
                            format!("option_set '{}' not found", key),
                        ));
                        None
                    }
                },
                Some(OptionSource::Inline(options)) => Some(options.as_slice()),
                None => None,
            };

            let values = options
                .map(|options| options.iter().map(|option| &option.value).collect::<Vec<_>>())
                .filter(|values| !values.is_empty());
            allowed_values.insert(code, values);

            if question.response_type == Some(ResponseType::ForcedChoicePair) {
                check_forced_choice(options, &item_path, &mut issues);
            }
        }
    }

    for (s_idx, screen) in schema.screens.iter().enumerate() {
        for (i_idx, item) in screen.items.iter().enumerate() {
            if item.question.code.trim().is_empty() {
                continue;
            }
            for (r_idx, rule) in item.rules.iter().enumerate() {
                if rule.kind != RuleKind::ShowIf {
                    continue;
                }
                let rule_path = format!("screens[{}].items[{}].rules[{}]", s_idx, i_idx, r_idx);
                let trigger = rule.trigger_question_code.as_str();

                if !question_codes.contains(trigger) {
                    issues.push(issue(
                        "unknown_trigger_question_code",
                        format!("{}.trigger_question_code", rule_path),
                        format!("trigger question code '{}' not found", trigger),
                    ));
                }

                let scalar_operator = match rule.operator {
                    Operator::Eq | Operator::Neq => true,
                    Operator::In | Operator::NotIn => false,
                    Operator::Unknown => {
                        issues.push(issue(
                            "invalid_operator",
                            format!("{}.operator", rule_path),
                            "operator must be one of [eq, in, neq, not_in]".into(),
                        ));
                        continue;
                    }
                };

                let shape_ok = match (&rule.trigger_value, scalar_operator) {
                    (None | Some(AnswerValue::Scalar(_)), true) => true,
                    (Some(AnswerValue::List(_)), false) => true,
                    _ => false,
                };
                if !shape_ok {
                    let expected = if scalar_operator {
                        "trigger_value must be a scalar for eq/neq"
                    } else {
                        "trigger_value must be an array for in/not_in"
                    };
                    issues.push(issue(
                        "invalid_trigger_value_shape",
                        format!("{}.trigger_value", rule_path),
                        expected.into(),
                    ));
                    continue;
                }

                let Some(Some(allowed)) = allowed_values.get(trigger) else {
                    continue;
                };
                let is_allowed = |value: &Primitive| allowed.iter().any(|option| *option == value);

                match &rule.trigger_value {
                    Some(AnswerValue::Scalar(value)) if !is_allowed(value) => {
                        issues.push(issue(
                            "invalid_trigger_value",
                            format!("{}.trigger_value", rule_path),
                            format!(
                                "trigger_value '{}' is not a valid option for '{}'",
                                value, trigger
                            ),
                        ));
                    }
                    Some(AnswerValue::List(values)) => {
                        let bad = values
                            .iter()
                            .filter(|value| !is_allowed(*value))
                            .map(ToString::to_string)
                            .collect::<Vec<_>>();
                        if !bad.is_empty() {
                            issues.push(issue(
                                "invalid_trigger_values",
                                format!("{}.trigger_value", rule_path),
                                format!(
                                    "trigger values [{}] are not valid options for '{}'",
                                    bad.join(", "),
                                    trigger
                                ),
                            ));
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    debug!(
        survey = %schema.survey.slug,
        issues = issues.len(),
        "validated survey definition"
    );

    ValidationReport {
        valid: issues.is_empty(),
        issues,
    }
}

fn check_forced_choice(
    options: Option<&[AnswerOption]>,
    item_path: &str,
    issues: &mut Vec<SchemaIssue>,
) {
    let Some(options) = options.filter(|options| options.len() == 2) else {
        issues.push(issue(
            "invalid_forced_choice_options",
            format!("{}.options", item_path),
            "forced_choice_pair must define exactly 2 options".into(),
        ));
        return;
    };

    let values = options
        .iter()
        .filter_map(|option| option.value.as_str())
        .collect::<BTreeSet<_>>();
    if values != BTreeSet::from(["A", "B"]) {
        issues.push(issue(
            "invalid_forced_choice_values",
            format!("{}.options", item_path),
            "forced_choice_pair option values must be exactly 'A' and 'B'".into(),
        ));
    }
    if options.iter().any(|option| option.label.trim().is_empty()) {
        issues.push(issue(
            "invalid_forced_choice_labels",
            format!("{}.options", item_path),
            "forced_choice_pair labels must be non-empty".into(),
        ));
    }
}

fn issue(code: &str, path: String, message: String) -> SchemaIssue {
    SchemaIssue {
        code: code.into(),
        path,
        message,
    }
}
