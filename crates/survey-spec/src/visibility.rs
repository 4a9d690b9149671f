use std::collections::BTreeMap;

use serde::Serialize;

use crate::rules::is_item_visible;
use crate::spec::screen::{Item, Screen};
use crate::spec::survey::SurveySchema;
use crate::value::Answers;

/// Visibility of every question in a schema, keyed by question code.
pub type VisibilityMap = BTreeMap<String, bool>;

/// A screen projected to its currently visible items.
///
/// `index` points into the schema's declared `screens` list so callers can
/// map back from the filtered list.
#[derive(Debug, Clone, Serialize)]
pub struct VisibleScreen<'a> {
    pub index: usize,
    pub key: &'a str,
    pub ordinal: i64,
    pub title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<&'a str>,
    pub items: Vec<&'a Item>,
    #[serde(skip)]
    pub screen: &'a Screen,
}

impl VisibleScreen<'_> {
    /// Owned copy of the screen holding only the visible items.
    pub fn to_screen(&self) -> Screen {
        Screen {
            items: self.items.iter().map(|item| (*item).clone()).collect(),
            ..self.screen.clone()
        }
    }
}

pub fn visible_items_for_screen<'a>(screen: &'a Screen, answers: &Answers) -> Vec<&'a Item> {
    screen
        .items
        .iter()
        .filter(|item| is_item_visible(item, answers))
        .collect()
}

/// Screens in declared order, each reduced to its visible items. Screens
/// with nothing visible are left out entirely.
pub fn visible_screens<'a>(schema: &'a SurveySchema, answers: &Answers) -> Vec<VisibleScreen<'a>> {
    schema
        .screens
        .iter()
        .enumerate()
        .filter_map(|(index, screen)| {
            let items = visible_items_for_screen(screen, answers);
            if items.is_empty() {
                return None;
            }
            Some(VisibleScreen {
                index,
                key: &screen.key,
                ordinal: screen.ordinal,
                title: &screen.title,
                subtitle: screen.subtitle.as_deref(),
                items,
                screen,
            })
        })
        .collect()
}

pub fn resolve_visibility(schema: &SurveySchema, answers: &Answers) -> VisibilityMap {
    schema
        .items()
        .map(|(_, item)| (item.question.code.clone(), is_item_visible(item, answers)))
        .collect()
}
