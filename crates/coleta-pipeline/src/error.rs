//! Error types for the selection pipeline.

use thiserror::Error;

/// Why a stage could not produce its options.
///
/// Resolvers build one of these around whatever failed underneath, the
/// pipeline stores its message on the stage so observers can show it.
#[derive(Debug, Error)]
#[error("failed to resolve options for stage `{stage}`: {detail}")]
pub struct ResolutionError {
    stage: String,
    detail: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ResolutionError {
    pub fn new(stage: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            detail: detail.into(),
            source: None,
        }
    }

    /// Attach the underlying error for `source()` chains.
    pub fn with_source(
        stage: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            stage: stage.into(),
            detail: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

/// Errors surfaced by [`DependentPipeline`](crate::DependentPipeline) operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("stage index {0} is out of range")]
    StageOutOfRange(usize),

    #[error("stage `{stage}` has no option with key `{key}`")]
    UnknownOption { stage: String, key: String },

    #[error("stage `{0}` has no options to select from yet")]
    StageNotReady(String),

    #[error("pipeline task has shut down")]
    Closed,
}
