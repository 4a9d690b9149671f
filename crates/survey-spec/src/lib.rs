#![allow(missing_docs)]

pub mod error;
pub mod fingerprint;
pub mod json_schema;
pub mod options;
pub mod progress;
pub mod rules;
pub mod spec;
pub mod tenant;
pub mod validate;
pub mod value;
pub mod visibility;

pub use error::SpecError;
pub use fingerprint::{
    QuestionIndex, QuestionIndexEntry, SurveyFingerprint, canonical_json, definition_fingerprint,
    question_codes, question_index, required_question_codes, survey_fingerprint,
};
pub use json_schema::survey_json_schema;
pub use options::resolve_options;
pub use progress::{
    ProgressStatus, ProgressSummary, ScreenProgress, blocking_questions, compute_completion,
    is_answered, is_screen_complete, next_screen_index, summarize,
};
pub use rules::{Operator, Rule, RuleKind, is_item_visible, is_rule_match};
pub use spec::{
    AnswerOption, Item, OptionSets, OptionSource, Question, RegionTag, ResponseType, Screen,
    SurveyMeta, SurveySchema, Usage,
};
pub use tenant::{DEFAULT_TENANT, filter_for_tenant};
pub use validate::{SchemaIssue, ValidationReport, validate_schema};
pub use value::{AnswerValue, Answers, Primitive};
pub use visibility::{
    VisibilityMap, VisibleScreen, resolve_visibility, visible_items_for_screen, visible_screens,
};
