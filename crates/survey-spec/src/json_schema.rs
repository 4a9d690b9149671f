use serde_json::Value;

use crate::spec::survey::SurveySchema;

/// JSON Schema describing the `SurveySchema` wire format.
pub fn survey_json_schema() -> Value {
    schemars::schema_for!(SurveySchema).to_value()
}
