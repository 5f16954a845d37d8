use crate::ingest::types::Dataset;
use thiserror::Error;

/// Failure classes of the screening and recommendation pipeline.
///
/// Only [`PipelineError::StructuralViolation`] is ever returned to callers of
/// `screen` or `generate`; the other variants are recovered where they occur and
/// exist so that the recovery sites can log a typed cause.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("dataset {dataset} unavailable: {reason}")]
    DataUnavailable { dataset: Dataset, reason: String },

    #[error("malformed row: field `{field}` {detail}")]
    RowMalformed { field: &'static str, detail: String },

    #[error("text generation failed: {0}")]
    GenerationFailure(String),

    #[error("screener contract violated: {0}")]
    StructuralViolation(String),
}

impl PipelineError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StructuralViolation(_))
    }
}
