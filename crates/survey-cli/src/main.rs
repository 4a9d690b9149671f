mod report;

use clap::{Parser, Subcommand, ValueEnum};
use report::{Verbosity, progress_text, validation_text, visible_text};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use survey_spec::{
    Answers, QuestionIndex, SurveySchema, definition_fingerprint, filter_for_tenant,
    question_index, required_question_codes, summarize, survey_json_schema, validate_schema,
    visible_screens,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Survey engine inspection CLI",
    long_about = "Evaluates visibility, completion and resume position for a survey schema and an answer file, and checks schemas before publishing"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Print completion percentage and the screen to resume on.
    Progress {
        /// Path to the survey schema JSON.
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        /// Optional JSON file containing the current answers.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        /// Tenant whose questions should be kept.
        #[arg(long, env = "SURVEY_TENANT")]
        tenant: Option<String>,
        /// Resume index reported for a schema without screens.
        #[arg(long, default_value_t = 0)]
        fallback: usize,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Show per-screen counters and blocking questions.
        #[arg(long, alias = "debug")]
        verbose: bool,
    },
    /// List the screens and questions currently visible.
    Visible {
        /// Path to the survey schema JSON.
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        /// Optional JSON file containing the current answers.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        /// Tenant whose questions should be kept.
        #[arg(long, env = "SURVEY_TENANT")]
        tenant: Option<String>,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Check a schema for authoring mistakes.
    Validate {
        /// Path to the survey schema JSON.
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the content hash and question index of a schema.
    Fingerprint {
        /// Path to the survey schema JSON.
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
    },
    /// Print the JSON Schema of the survey wire format.
    Schema,
}

#[derive(Serialize)]
struct FingerprintOutput {
    slug: String,
    version: u32,
    hash: String,
    required_question_codes: Vec<String>,
    question_index: QuestionIndex,
}

fn main() -> CliResult<()> {
    // RUST_LOG=debug for engine diagnostics; output goes to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Progress {
            schema,
            answers,
            tenant,
            fallback,
            format,
            verbose,
        } => run_progress(
            &schema,
            answers.as_deref(),
            tenant.as_deref(),
            fallback,
            format,
            verbose,
        ),
        Command::Visible {
            schema,
            answers,
            tenant,
            format,
        } => run_visible(&schema, answers.as_deref(), tenant.as_deref(), format),
        Command::Validate { schema, format } => run_validate(&schema, format),
        Command::Fingerprint { schema } => run_fingerprint(&schema),
        Command::Schema => print_json(&survey_json_schema()),
    }
}

/// Schema file as parsed JSON plus the model loaded from it.
fn read_schema(path: &Path) -> CliResult<(Value, SurveySchema)> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("failed to read schema {}: {}", path.display(), err))?;
    let definition: Value = serde_json::from_str(&raw)
        .map_err(|err| format!("failed to parse schema {}: {}", path.display(), err))?;
    let schema = SurveySchema::from_json(definition.clone())?;
    debug!(
        slug = %schema.survey.slug,
        screens = schema.screens.len(),
        "loaded survey schema"
    );
    Ok((definition, schema))
}

/// Respondent view of the schema. Without a tenant the default tenant's view
/// is served.
fn load_schema(path: &Path, tenant: Option<&str>) -> CliResult<SurveySchema> {
    let (_, schema) = read_schema(path)?;
    Ok(filter_for_tenant(&schema, tenant))
}

fn load_answers(path: Option<&Path>) -> CliResult<Answers> {
    let Some(path) = path else {
        return Ok(Answers::new());
    };
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("failed to read answers {}: {}", path.display(), err))?;
    Ok(Answers::from_json_str(&raw)?)
}

fn run_progress(
    schema_path: &Path,
    answers_path: Option<&Path>,
    tenant: Option<&str>,
    fallback: usize,
    format: OutputFormat,
    verbose: bool,
) -> CliResult<()> {
    let schema = load_schema(schema_path, tenant)?;
    let answers = load_answers(answers_path)?;
    let summary = summarize(&schema, &answers, fallback);

    match format {
        OutputFormat::Json => print_json(&summary),
        OutputFormat::Text => {
            println!(
                "{}",
                progress_text(&schema, &summary, Verbosity::from_verbose(verbose))
            );
            Ok(())
        }
    }
}

fn run_visible(
    schema_path: &Path,
    answers_path: Option<&Path>,
    tenant: Option<&str>,
    format: OutputFormat,
) -> CliResult<()> {
    let schema = load_schema(schema_path, tenant)?;
    let answers = load_answers(answers_path)?;
    let screens = visible_screens(&schema, &answers);

    match format {
        OutputFormat::Json => print_json(&screens),
        OutputFormat::Text => {
            println!("{}", visible_text(&screens));
            Ok(())
        }
    }
}

fn run_validate(schema_path: &Path, format: OutputFormat) -> CliResult<()> {
    let (_, schema) = read_schema(schema_path)?;
    let report = validate_schema(&schema);

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => println!("{}", validation_text(&report)),
    }

    if report.valid {
        Ok(())
    } else {
        Err("schema validation failed".into())
    }
}

fn run_fingerprint(schema_path: &Path) -> CliResult<()> {
    let (definition, schema) = read_schema(schema_path)?;
    let fingerprint = definition_fingerprint(&definition);
    print_json(&FingerprintOutput {
        slug: fingerprint.slug,
        version: fingerprint.version,
        hash: fingerprint.hash,
        required_question_codes: required_question_codes(&schema),
        question_index: question_index(&schema)?,
    })
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn missing_answers_path_means_no_answers() {
        let answers = load_answers(None).expect("answers");
        assert!(answers.is_empty());
    }

    #[test]
    fn answers_file_is_parsed() {
        let file = write_temp(r#"{"Q1": "a", "Q2": null}"#);
        let answers = load_answers(Some(file.path())).expect("answers");
        assert_eq!(answers.len(), 1);
        assert!(answers.contains("Q1"));
    }

    #[test]
    fn unreadable_schema_reports_path() {
        let err = load_schema(Path::new("/definitely/missing.json"), None)
            .expect_err("missing file");
        assert!(err.to_string().contains("/definitely/missing.json"));
    }

    #[test]
    fn missing_tenant_loads_default_tenant_view() {
        let file = write_temp(
            r#"{"screens":[{"key":"s","items":[
                {"question":{"code":"N1","region_tag":"CBS_NYC"}},
                {"question":{"code":"W1","region_tag":"SCHOOL_SPECIFIC","tenant_tags":["wharton"]}}
            ]}]}"#,
        );
        let schema = load_schema(file.path(), None).expect("schema");
        let codes = schema
            .items()
            .map(|(_, item)| item.code())
            .collect::<Vec<_>>();
        assert_eq!(codes, vec!["N1"]);

        let (_, full) = read_schema(file.path()).expect("schema");
        assert_eq!(full.screens[0].items.len(), 2);
    }

    #[test]
    fn tenant_filter_is_applied_on_load() {
        let file = write_temp(
            r#"{"screens":[{"key":"s","items":[
                {"question":{"code":"G1","region_tag":"GLOBAL"}},
                {"question":{"code":"N1","region_tag":"CBS_NYC"}}
            ]}]}"#,
        );
        let schema = load_schema(file.path(), Some("wharton")).expect("schema");
        assert_eq!(schema.screens[0].items.len(), 1);
    }
}
