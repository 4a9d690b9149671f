use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::spec::screen::Screen;
use crate::spec::survey::SurveySchema;
use crate::value::{AnswerValue, Answers, Primitive};
use crate::visibility::{visible_items_for_screen, visible_screens};

/// Overall state of a survey for a given answer set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    /// At least one visible screen still has blocking questions.
    NeedInput,
    /// Every visible screen is complete.
    Complete,
    /// Nothing is visible, so completion is indeterminate.
    Empty,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::NeedInput => "need_input",
            ProgressStatus::Complete => "complete",
            ProgressStatus::Empty => "empty",
        }
    }
}

/// Per-screen counters, indexed by declared screen position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenProgress {
    pub index: usize,
    pub key: String,
    pub visible: bool,
    pub complete: bool,
    pub answered: usize,
    pub total: usize,
    pub blocking: Vec<String>,
}

/// Everything a client needs to draw a progress indicator and pick the
/// landing screen, computed in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub status: ProgressStatus,
    pub completion: u8,
    pub resume_index: usize,
    pub visible_screen_keys: Vec<String>,
    pub screens: Vec<ScreenProgress>,
}

/// Whether a stored value counts as an answer. `null`, blank strings, and
/// empty lists do not; `0` and `false` do.
pub fn is_answered(value: Option<&AnswerValue>) -> bool {
    match value {
        None => false,
        Some(AnswerValue::Scalar(Primitive::Null)) => false,
        Some(AnswerValue::Scalar(Primitive::String(text))) => !text.trim().is_empty(),
        Some(AnswerValue::List(entries)) => !entries.is_empty(),
        Some(AnswerValue::Scalar(_)) => true,
    }
}

/// Codes of visible questions that keep the screen incomplete.
pub fn blocking_questions<'a>(screen: &'a Screen, answers: &Answers) -> Vec<&'a str> {
    visible_items_for_screen(screen, answers)
        .into_iter()
        .filter(|item| item.question.blocks_completion())
        .filter(|item| !is_answered(answers.get(&item.question.code)))
        .map(|item| item.question.code.as_str())
        .collect()
}

/// A screen is complete when none of its visible questions block. A screen
/// with nothing visible is vacuously complete.
pub fn is_screen_complete(screen: &Screen, answers: &Answers) -> bool {
    blocking_questions(screen, answers).is_empty()
}

/// Percentage of visible screens that are complete, rounded half up.
/// Returns `0` when no screen is visible.
pub fn compute_completion(schema: &SurveySchema, answers: &Answers) -> u8 {
    let screens = visible_screens(schema, answers);
    let complete = screens
        .iter()
        .filter(|visible| is_screen_complete(visible.screen, answers))
        .count();
    rounded_percent(complete, screens.len())
}

/// Declared-order index of the first incomplete screen. When every screen is
/// complete this is the last screen; `fallback` is only used for a schema
/// without screens.
pub fn next_screen_index(schema: &SurveySchema, answers: &Answers, fallback: usize) -> usize {
    if let Some(index) = schema
        .screens
        .iter()
        .position(|screen| !is_screen_complete(screen, answers))
    {
        return index;
    }
    schema.screens.len().checked_sub(1).unwrap_or(fallback)
}

pub fn summarize(schema: &SurveySchema, answers: &Answers, fallback: usize) -> ProgressSummary {
    let screens = schema
        .screens
        .iter()
        .enumerate()
        .map(|(index, screen)| screen_progress(index, screen, answers))
        .collect::<Vec<_>>();

    let visible = screens
        .iter()
        .filter(|screen| screen.visible)
        .collect::<Vec<_>>();
    let complete = visible.iter().filter(|screen| screen.complete).count();
    let completion = rounded_percent(complete, visible.len());

    let status = if visible.is_empty() {
        ProgressStatus::Empty
    } else if complete == visible.len() {
        ProgressStatus::Complete
    } else {
        ProgressStatus::NeedInput
    };

    let resume_index = screens
        .iter()
        .find(|screen| !screen.complete)
        .map(|screen| screen.index)
        .or_else(|| screens.len().checked_sub(1))
        .unwrap_or(fallback);

    debug!(
        survey = %schema.survey.slug,
        completion,
        resume_index,
        status = status.as_str(),
        "computed survey progress"
    );

    ProgressSummary {
        status,
        completion,
        resume_index,
        visible_screen_keys: visible.iter().map(|screen| screen.key.clone()).collect(),
        screens,
    }
}

fn screen_progress(index: usize, screen: &Screen, answers: &Answers) -> ScreenProgress {
    let items = visible_items_for_screen(screen, answers);
    let answered = items
        .iter()
        .filter(|item| is_answered(answers.get(&item.question.code)))
        .count();
    let blocking = blocking_questions(screen, answers)
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    ScreenProgress {
        index,
        key: screen.key.clone(),
        visible: !items.is_empty(),
        complete: blocking.is_empty(),
        answered,
        total: items.len(),
        blocking,
    }
}

fn rounded_percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let percent = (200 * part + whole) / (2 * whole);
    u8::try_from(percent).unwrap_or(100)
}
