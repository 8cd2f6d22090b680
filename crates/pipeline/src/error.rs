use thiserror::Error;

/// Caller-facing error taxonomy. Only the fatal kinds abort a run;
/// recoverable external failures degrade features and are counted in the
/// run's diagnostics instead. An empty search result is not an error.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed annotator output. Fatal to the build.
    #[error("annotator input error: {0}")]
    AnnotatorInput(String),

    /// An external collaborator call failed past retries.
    #[error("external collaborator unavailable: {0}")]
    ExternalUnavailable(String),

    /// The embedding matrix would not fit the configured ceiling. Fatal.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// An export failed. The in-memory graph stays valid.
    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
