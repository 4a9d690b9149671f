pub mod question;
pub mod screen;
pub mod survey;

pub use question::{Question, RegionTag, ResponseType, Usage};
pub use screen::{AnswerOption, Item, OptionSource, Screen};
pub use survey::{OptionSets, SurveyMeta, SurveySchema};
