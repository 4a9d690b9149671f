use thiserror::Error;

/// Failures at the edges of the engine: decoding input and encoding output.
/// The evaluation functions themselves never fail.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("failed to parse survey schema: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("failed to parse answers: {0}")]
    ParseAnswers(#[source] serde_json::Error),
    #[error("json encode error: {0}")]
    Encode(#[source] serde_json::Error),
}
