use crate::spec::screen::{AnswerOption, Item, OptionSource};
use crate::spec::survey::OptionSets;

/// Concrete options for an item, in the order they were authored.
///
/// A set name missing from `option_sets`, or an item without options,
/// resolves to an empty slice.
pub fn resolve_options<'a>(item: &'a Item, option_sets: &'a OptionSets) -> &'a [AnswerOption] {
    match &item.options {
        Some(OptionSource::Inline(options)) => options,
        Some(OptionSource::Named(key)) => option_sets.get(key).map(Vec::as_slice).unwrap_or(&[]),
        None => &[],
    }
}
