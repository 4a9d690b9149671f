use crate::spec::question::{Question, RegionTag};
use crate::spec::screen::Screen;
use crate::spec::survey::SurveySchema;

/// Tenant assumed when the caller does not name one.
pub const DEFAULT_TENANT: &str = "cbs";

/// Copy of the schema holding only the questions the tenant may see.
///
/// Screens left without any item are dropped. Questions without a region tag
/// count as `GLOBAL`.
pub fn filter_for_tenant(schema: &SurveySchema, tenant_slug: Option<&str>) -> SurveySchema {
    let slug = tenant_slug
        .map(str::trim)
        .filter(|slug| !slug.is_empty())
        .unwrap_or(DEFAULT_TENANT)
        .to_lowercase();

    let screens = schema
        .screens
        .iter()
        .filter_map(|screen| {
            let items = screen
                .items
                .iter()
                .filter(|item| serves_tenant(&item.question, &slug))
                .cloned()
                .collect::<Vec<_>>();
            if items.is_empty() {
                None
            } else {
                Some(Screen {
                    items,
                    ..screen.clone()
                })
            }
        })
        .collect();

    SurveySchema {
        survey: schema.survey.clone(),
        option_sets: schema.option_sets.clone(),
        screens,
    }
}

fn serves_tenant(question: &Question, slug: &str) -> bool {
    match question.region_tag.unwrap_or(RegionTag::Global) {
        RegionTag::Global => true,
        RegionTag::SchoolSpecific => question
            .tenant_tags
            .iter()
            .any(|tag| tag.trim().eq_ignore_ascii_case(slug)),
        // Legacy tag from before per-school tagging existed.
        RegionTag::CbsNyc => slug == DEFAULT_TENANT,
        RegionTag::Unknown => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::screen::Item;

    fn tagged(code: &str, tag: Option<RegionTag>, tenants: &[&str]) -> Item {
        let mut question = Question::new(code, code);
        question.region_tag = tag;
        question.tenant_tags = tenants.iter().map(|tenant| tenant.to_string()).collect();
        Item::new(question)
    }

    fn schema() -> SurveySchema {
        SurveySchema {
            screens: vec![
                Screen::new("shared", 1, "Shared")
                    .with_item(tagged("G1", None, &[]))
                    .with_item(tagged("NYC1", Some(RegionTag::CbsNyc), &[])),
                Screen::new("school", 2, "School")
                    .with_item(tagged("S1", Some(RegionTag::SchoolSpecific), &["Wharton"])),
            ],
            ..SurveySchema::default()
        }
    }

    fn codes(schema: &SurveySchema) -> Vec<&str> {
        schema.items().map(|(_, item)| item.code()).collect()
    }

    #[test]
    fn default_tenant_keeps_legacy_nyc_questions() {
        let filtered = filter_for_tenant(&schema(), None);
        assert_eq!(codes(&filtered), vec!["G1", "NYC1"]);
        assert_eq!(filtered.screens.len(), 1);
    }

    #[test]
    fn school_tags_match_case_insensitively() {
        let filtered = filter_for_tenant(&schema(), Some(" wharton "));
        assert_eq!(codes(&filtered), vec!["G1", "S1"]);
    }

    #[test]
    fn region_tags_are_normalized_on_load() {
        let schema = SurveySchema::from_json(serde_json::json!({
            "screens": [{
                "key": "s",
                "items": [
                    { "question": { "code": "LOWER", "region_tag": "global" } },
                    { "question": { "code": "BLANK", "region_tag": "" } },
                    { "question": { "code": "PADDED", "region_tag": " GLOBAL " } },
                    { "question": { "code": "NYC", "region_tag": "cbs_nyc" } },
                    { "question": { "code": "ODD", "region_tag": 3 } }
                ]
            }]
        }))
        .expect("schema");

        assert_eq!(
            codes(&filter_for_tenant(&schema, Some("cbs"))),
            vec!["LOWER", "BLANK", "PADDED", "NYC"]
        );
        assert_eq!(
            codes(&filter_for_tenant(&schema, Some("wharton"))),
            vec!["LOWER", "BLANK", "PADDED"]
        );
    }

    #[test]
    fn input_schema_is_untouched() {
        let original = schema();
        let _ = filter_for_tenant(&original, Some("wharton"));
        assert_eq!(codes(&original).len(), 3);
    }
}
