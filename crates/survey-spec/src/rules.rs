use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::spec::screen::Item;
use crate::value::{AnswerValue, Answers, Primitive};

/// Comparison applied between the trigger answer and `trigger_value`.
///
/// Anything outside the four known operators, including a missing operator,
/// loads as `Unknown` and never matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Neq,
    In,
    NotIn,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Rule family. Only `show_if` rules take part in visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    #[default]
    ShowIf,
    #[serde(other)]
    Other,
}

/// "Show this item only if the answer to `trigger_question_code` ...".
///
/// Deserialization never fails: a rule whose fields have the wrong JSON type
/// loads with `Operator::Unknown` so the item it guards stays hidden.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Rule {
    #[serde(rename = "type", default)]
    pub kind: RuleKind,
    #[serde(default)]
    pub trigger_question_code: String,
    #[serde(default)]
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_value: Option<AnswerValue>,
}

impl Rule {
    pub fn show_if(
        trigger_question_code: impl Into<String>,
        operator: Operator,
        trigger_value: impl Into<AnswerValue>,
    ) -> Self {
        Self {
            kind: RuleKind::ShowIf,
            trigger_question_code: trigger_question_code.into(),
            operator,
            trigger_value: Some(trigger_value.into()),
        }
    }

    /// Reads a rule out of arbitrary JSON. See the type docs for how
    /// malformed input is handled.
    pub fn from_json(raw: &Value) -> Self {
        let kind = read_field::<RuleKind>(raw, "type");
        let code = read_field::<String>(raw, "trigger_question_code");
        let operator = read_field::<Operator>(raw, "operator");
        let trigger_value = read_field::<AnswerValue>(raw, "trigger_value");

        let malformed = !raw.is_object()
            || kind.is_err()
            || code.is_err()
            || operator.is_err()
            || trigger_value.is_err();
        if malformed {
            debug!(rule = %raw, "malformed rule loaded as never matching");
        }

        Self {
            kind: kind.ok().flatten().unwrap_or_default(),
            trigger_question_code: code.ok().flatten().unwrap_or_default(),
            operator: if malformed {
                Operator::Unknown
            } else {
                operator.ok().flatten().unwrap_or_default()
            },
            trigger_value: trigger_value.ok().flatten(),
        }
    }

    pub fn eq(code: impl Into<String>, value: impl Into<AnswerValue>) -> Self {
        Self::show_if(code, Operator::Eq, value)
    }

    pub fn neq(code: impl Into<String>, value: impl Into<AnswerValue>) -> Self {
        Self::show_if(code, Operator::Neq, value)
    }

    pub fn one_of(code: impl Into<String>, values: Vec<Primitive>) -> Self {
        Self::show_if(code, Operator::In, values)
    }

    pub fn none_of(code: impl Into<String>, values: Vec<Primitive>) -> Self {
        Self::show_if(code, Operator::NotIn, values)
    }

    /// Candidate set for `in`/`not_in`; `None` when `trigger_value` is not a
    /// list.
    fn candidates(&self) -> Option<&[Primitive]> {
        self.trigger_value.as_ref().and_then(AnswerValue::as_list)
    }

    fn equals_trigger(&self, actual: &AnswerValue) -> bool {
        self.trigger_value.as_ref() == Some(actual)
    }
}

impl<'de> Deserialize<'de> for Rule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(Self::from_json(&raw))
    }
}

/// `Ok(None)` for a missing or `null` field, `Err` when it has the wrong shape.
fn read_field<T: DeserializeOwned>(
    raw: &Value,
    name: &str,
) -> Result<Option<T>, serde_json::Error> {
    match raw.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => T::deserialize(value).map(Some),
    }
}

/// Lenient reader for an item's rule list: `null` means no rules and a lone
/// rule object counts as a one-element list.
pub(crate) fn deserialize_rules<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<Rule>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(entries) => entries.iter().map(Rule::from_json).collect(),
        other => vec![Rule::from_json(&other)],
    })
}

/// Evaluates one rule against the answers. Total: an unanswered trigger
/// question or an unknown operator yields `false`.
pub fn is_rule_match(rule: &Rule, answers: &Answers) -> bool {
    let Some(actual) = answers.get(&rule.trigger_question_code) else {
        return false;
    };

    match rule.operator {
        Operator::Eq => rule.equals_trigger(actual),
        Operator::Neq => !rule.equals_trigger(actual),
        Operator::In => rule
            .candidates()
            .is_some_and(|candidates| contains(candidates, actual)),
        Operator::NotIn => rule
            .candidates()
            .is_some_and(|candidates| !contains(candidates, actual)),
        Operator::Unknown => false,
    }
}

fn contains(candidates: &[Primitive], actual: &AnswerValue) -> bool {
    candidates
        .iter()
        .any(|candidate| actual.matches_primitive(candidate))
}

/// True when every `show_if` rule of the item matches. Rules of other kinds
/// are not visibility conditions and are skipped.
pub fn is_item_visible(item: &Item, answers: &Answers) -> bool {
    item.rules
        .iter()
        .filter(|rule| rule.kind == RuleKind::ShowIf)
        .all(|rule| is_rule_match(rule, answers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule(value: serde_json::Value) -> Rule {
        serde_json::from_value(value).expect("rule")
    }

    #[test]
    fn unknown_operator_loads_and_fails_closed() {
        let rule = rule(json!({
            "type": "show_if",
            "trigger_question_code": "Q1",
            "operator": "contains",
            "trigger_value": "a"
        }));
        assert_eq!(rule.operator, Operator::Unknown);
        let answers = Answers::new().with("Q1", "a");
        assert!(!is_rule_match(&rule, &answers));
    }

    #[test]
    fn missing_operator_fails_closed() {
        let rule = rule(json!({ "trigger_question_code": "Q1", "trigger_value": "a" }));
        assert_eq!(rule.kind, RuleKind::ShowIf);
        assert!(!is_rule_match(&rule, &Answers::new().with("Q1", "a")));
    }

    #[test]
    fn wrongly_typed_fields_load_as_never_matching() {
        let answers = Answers::new().with("Q1", "a");
        for raw in [
            json!({ "trigger_question_code": "Q1", "operator": 5, "trigger_value": "a" }),
            json!({ "trigger_question_code": "Q1", "operator": "neq", "trigger_value": { "x": 1 } }),
            json!({ "type": 7, "trigger_question_code": "Q1", "operator": "eq", "trigger_value": "a" }),
            json!({ "trigger_question_code": ["Q1"], "operator": "neq", "trigger_value": "b" }),
            json!("show_if Q1"),
        ] {
            let rule = rule(raw);
            assert_eq!(rule.operator, Operator::Unknown);
            assert_eq!(rule.kind, RuleKind::ShowIf);
            assert!(!is_rule_match(&rule, &answers));
        }
    }

    #[test]
    fn null_fields_read_as_missing() {
        let rule = rule(json!({
            "type": null,
            "trigger_question_code": null,
            "operator": null,
            "trigger_value": null
        }));
        assert_eq!(rule.kind, RuleKind::ShowIf);
        assert_eq!(rule.operator, Operator::Unknown);
        assert!(rule.trigger_question_code.is_empty());
        assert!(rule.trigger_value.is_none());
    }

    #[test]
    fn neq_matches_when_trigger_value_missing() {
        let rule = rule(json!({ "trigger_question_code": "Q1", "operator": "neq" }));
        assert!(is_rule_match(&rule, &Answers::new().with("Q1", "a")));
    }

    #[test]
    fn set_operators_need_list_trigger() {
        let answers = Answers::new().with("Q1", "yes");
        let in_scalar = Rule::show_if("Q1", Operator::In, "yes");
        let not_in_scalar = Rule::show_if("Q1", Operator::NotIn, "no");
        assert!(!is_rule_match(&in_scalar, &answers));
        assert!(!is_rule_match(&not_in_scalar, &answers));
    }

    #[test]
    fn list_answers_compare_structurally() {
        let answers = Answers::new().with("Q1", vec![Primitive::from("a"), Primitive::from("b")]);
        let same = Rule::eq("Q1", vec![Primitive::from("a"), Primitive::from("b")]);
        let reordered = Rule::eq("Q1", vec![Primitive::from("b"), Primitive::from("a")]);
        assert!(is_rule_match(&same, &answers));
        assert!(!is_rule_match(&reordered, &answers));
        assert!(!is_rule_match(
            &Rule::one_of("Q1", vec!["a".into(), "b".into()]),
            &answers
        ));
    }

    #[test]
    fn non_show_if_rules_do_not_hide_items() {
        let item: Item = serde_json::from_value(json!({
            "question": { "code": "Q2" },
            "rules": [
                { "type": "score_weight", "trigger_question_code": "Q1", "operator": "eq", "trigger_value": "x" }
            ]
        }))
        .expect("item");
        assert_eq!(item.rules[0].kind, RuleKind::Other);
        assert!(is_item_visible(&item, &Answers::new()));
    }

    #[test]
    fn show_if_alias_is_accepted() {
        let item: Item = serde_json::from_value(json!({
            "question": { "code": "Q2" },
            "show_if": [
                { "trigger_question_code": "Q1", "operator": "eq", "trigger_value": "a" }
            ]
        }))
        .expect("item");
        assert!(!is_item_visible(&item, &Answers::new()));
        assert!(is_item_visible(&item, &Answers::new().with("Q1", "a")));
    }
}
