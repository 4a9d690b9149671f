use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Scalar carried by answers, trigger values, and option values.
///
/// Numbers compare by numeric value, so `1` and `1.0` are equal. Values of
/// different kinds are never equal (`true` is not `1`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Primitive {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl Primitive {
    /// Converts a JSON value, returning `None` for arrays and objects.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Primitive::Null),
            Value::Bool(flag) => Some(Primitive::Bool(*flag)),
            Value::Number(num) => Some(Primitive::Number(num.clone())),
            Value::String(text) => Some(Primitive::String(text.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Primitive::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Primitive::String(text) => Some(text),
            _ => None,
        }
    }
}

impl PartialEq for Primitive {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Primitive::Null, Primitive::Null) => true,
            (Primitive::Bool(left), Primitive::Bool(right)) => left == right,
            (Primitive::String(left), Primitive::String(right)) => left == right,
            (Primitive::Number(left), Primitive::Number(right)) => {
                if left == right {
                    return true;
                }
                match (left.as_f64(), right.as_f64()) {
                    (Some(left), Some(right)) => left == right,
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Null => f.write_str("null"),
            Primitive::Bool(flag) => write!(f, "{}", flag),
            Primitive::Number(num) => write!(f, "{}", num),
            Primitive::String(text) => f.write_str(text),
        }
    }
}

impl From<&str> for Primitive {
    fn from(value: &str) -> Self {
        Primitive::String(value.to_string())
    }
}

impl From<String> for Primitive {
    fn from(value: String) -> Self {
        Primitive::String(value)
    }
}

impl From<bool> for Primitive {
    fn from(value: bool) -> Self {
        Primitive::Bool(value)
    }
}

impl From<i64> for Primitive {
    fn from(value: i64) -> Self {
        Primitive::Number(Number::from(value))
    }
}

impl From<f64> for Primitive {
    /// Non-finite floats have no JSON form and become `Null`.
    fn from(value: f64) -> Self {
        Number::from_f64(value)
            .map(Primitive::Number)
            .unwrap_or(Primitive::Null)
    }
}

/// A stored answer or rule trigger: one primitive or an ordered list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum AnswerValue {
    Scalar(Primitive),
    List(Vec<Primitive>),
}

impl AnswerValue {
    /// Converts a JSON value. Objects, and arrays holding anything but
    /// primitives, have no answer form and yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Array(entries) => entries
                .iter()
                .map(Primitive::from_json)
                .collect::<Option<Vec<_>>>()
                .map(AnswerValue::List),
            other => Primitive::from_json(other).map(AnswerValue::Scalar),
        }
    }

    pub fn as_scalar(&self) -> Option<&Primitive> {
        match self {
            AnswerValue::Scalar(primitive) => Some(primitive),
            AnswerValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Primitive]> {
        match self {
            AnswerValue::List(entries) => Some(entries),
            AnswerValue::Scalar(_) => None,
        }
    }

    /// True when this value is exactly the given primitive. A list never
    /// equals a primitive.
    pub fn matches_primitive(&self, primitive: &Primitive) -> bool {
        self.as_scalar() == Some(primitive)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AnswerValue::Scalar(Primitive::Null))
    }
}

impl From<Primitive> for AnswerValue {
    fn from(value: Primitive) -> Self {
        AnswerValue::Scalar(value)
    }
}

impl From<Vec<Primitive>> for AnswerValue {
    fn from(value: Vec<Primitive>) -> Self {
        AnswerValue::List(value)
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Scalar(value.into())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        AnswerValue::Scalar(value.into())
    }
}

impl From<bool> for AnswerValue {
    fn from(value: bool) -> Self {
        AnswerValue::Scalar(value.into())
    }
}

impl From<i64> for AnswerValue {
    fn from(value: i64) -> Self {
        AnswerValue::Scalar(value.into())
    }
}

/// Snapshot of the user's answers keyed by question code.
///
/// A missing key and a key holding `null` both mean "unanswered": `null`
/// entries are never stored. Deserialization keeps every entry that has an
/// answer form and drops the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Value>")]
pub struct Answers(BTreeMap<String, AnswerValue>);

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(raw: &str) -> Result<Self, crate::SpecError> {
        serde_json::from_str(raw).map_err(crate::SpecError::ParseAnswers)
    }

    pub fn from_json(value: &Value) -> Self {
        value
            .as_object()
            .map(|map| {
                map.iter()
                    .filter_map(|(code, value)| {
                        AnswerValue::from_json(value).map(|answer| (code.clone(), answer))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get(&self, code: &str) -> Option<&AnswerValue> {
        self.0.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// Stores an answer. Storing `null` clears the question instead.
    pub fn insert(&mut self, code: impl Into<String>, value: impl Into<AnswerValue>) {
        let code = code.into();
        let value = value.into();
        if value.is_null() {
            self.0.remove(&code);
        } else {
            self.0.insert(code, value);
        }
    }

    pub fn remove(&mut self, code: &str) -> Option<AnswerValue> {
        self.0.remove(code)
    }

    pub fn with(mut self, code: impl Into<String>, value: impl Into<AnswerValue>) -> Self {
        self.insert(code, value);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnswerValue)> {
        self.0.iter().map(|(code, value)| (code.as_str(), value))
    }
}

impl From<BTreeMap<String, Value>> for Answers {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        raw.into_iter()
            .filter_map(|(code, value)| AnswerValue::from_json(&value).map(|answer| (code, answer)))
            .collect()
    }
}

impl<K: Into<String>, V: Into<AnswerValue>> FromIterator<(K, V)> for Answers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut answers = Answers::new();
        for (code, value) in iter {
            answers.insert(code, value);
        }
        answers
    }
}
