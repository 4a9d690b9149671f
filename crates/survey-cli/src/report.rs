use survey_spec::{
    ProgressStatus, ProgressSummary, SurveySchema, ValidationReport, VisibleScreen,
};

/// Controls how much detail the text reports include.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Verbosity {
    /// Headline numbers only.
    Clean,
    /// Per-screen counters and the questions still blocking each screen.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

pub fn progress_text(
    schema: &SurveySchema,
    summary: &ProgressSummary,
    verbosity: Verbosity,
) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Survey: {} ({} v{})",
        display_name(schema),
        schema.survey.slug,
        schema.survey.version
    ));
    lines.push(format!(
        "Status: {} ({}% complete)",
        summary.status.as_str(),
        summary.completion
    ));

    match summary.status {
        ProgressStatus::Empty => lines.push("No screen is currently visible.".to_string()),
        _ => {
            if let Some(screen) = schema.screens.get(summary.resume_index) {
                lines.push(format!(
                    "Resume at: #{} {} ({})",
                    summary.resume_index, screen.key, screen.title
                ));
            }
        }
    }

    if verbosity.is_verbose() {
        lines.push("Screens:".to_string());
        for screen in &summary.screens {
            let state = if !screen.visible {
                "hidden"
            } else if screen.complete {
                "complete"
            } else {
                "incomplete"
            };
            let mut entry = format!(
                " - #{} {} [{}] {}/{}",
                screen.index, screen.key, state, screen.answered, screen.total
            );
            if !screen.blocking.is_empty() {
                entry.push_str(&format!(" blocking: {}", screen.blocking.join(", ")));
            }
            lines.push(entry);
        }
    }

    lines.join("\n")
}

pub fn visible_text(screens: &[VisibleScreen<'_>]) -> String {
    if screens.is_empty() {
        return "No visible screens.".to_string();
    }
    let mut lines = Vec::new();
    for screen in screens {
        lines.push(format!("#{} {} - {}", screen.index, screen.key, screen.title));
        for item in &screen.items {
            let mut entry = format!("   {}: {}", item.question.code, item.question.text);
            if item.question.blocks_completion() {
                entry.push_str(" [required]");
            }
            lines.push(entry);
        }
    }
    lines.join("\n")
}

pub fn validation_text(report: &ValidationReport) -> String {
    if report.valid {
        return "Schema is valid.".to_string();
    }
    let mut lines = vec![format!("Schema has {} issue(s):", report.issues.len())];
    for issue in &report.issues {
        lines.push(format!(" - [{}] {}: {}", issue.code, issue.path, issue.message));
    }
    lines.join("\n")
}

fn display_name(schema: &SurveySchema) -> &str {
    if schema.survey.name.is_empty() {
        "untitled survey"
    } else {
        &schema.survey.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_spec::{Answers, Item, Question, Rule, Screen, summarize, visible_screens};

    fn schema() -> SurveySchema {
        SurveySchema {
            screens: vec![
                Screen::new("A", 1, "First").with_item(Item::new(Question::new("Q1", "One").required())),
                Screen::new("B", 2, "Second").with_item(
                    Item::new(Question::new("Q2", "Two").required()).with_rule(Rule::eq("Q1", "a")),
                ),
            ],
            ..SurveySchema::default()
        }
    }

    #[test]
    fn clean_progress_shows_resume_point() {
        let schema = schema();
        let summary = summarize(&schema, &Answers::new(), 0);
        let text = progress_text(&schema, &summary, Verbosity::Clean);
        assert!(text.contains("Status: need_input (0% complete)"));
        assert!(text.contains("Resume at: #0 A (First)"));
        assert!(!text.contains("Screens:"));
    }

    #[test]
    fn verbose_progress_lists_blocking_questions() {
        let schema = schema();
        let answers = Answers::new().with("Q1", "a");
        let summary = summarize(&schema, &answers, 0);
        let text = progress_text(&schema, &summary, Verbosity::from_verbose(true));
        assert!(text.contains(" - #0 A [complete] 1/1"));
        assert!(text.contains(" - #1 B [incomplete] 0/1 blocking: Q2"));
    }

    #[test]
    fn hidden_screens_are_marked() {
        let schema = schema();
        let summary = summarize(&schema, &Answers::new(), 0);
        let text = progress_text(&schema, &summary, Verbosity::Verbose);
        assert!(text.contains(" - #1 B [hidden] 0/0"));
    }

    #[test]
    fn visible_text_lists_required_questions() {
        let schema = schema();
        let answers = Answers::new();
        let text = visible_text(&visible_screens(&schema, &answers));
        assert!(text.contains("#0 A - First"));
        assert!(text.contains("Q1: One [required]"));
        assert!(!text.contains("Q2"));
    }
}
