use crate::llm::Provider;
use serde_json::Value;
use std::fmt;

/// Transport or protocol failure from a generation backend, with enough of the raw
/// exchange attached to diagnose it after the fact.
#[derive(Debug, Clone)]
pub struct LlmDiagnosticsError {
    pub provider: Provider,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
    pub raw_response_json: Option<Value>,
}

impl LlmDiagnosticsError {
    pub fn new(provider: Provider, stage: &'static str, detail: impl Into<String>) -> Self {
        Self {
            provider,
            stage,
            detail: detail.into(),
            raw_output: None,
            raw_response_json: None,
        }
    }

    pub fn with_raw_output(mut self, raw: impl Into<String>) -> Self {
        self.raw_output = Some(raw.into());
        self
    }

    pub fn with_raw_response_json(mut self, raw: Value) -> Self {
        self.raw_response_json = Some(raw);
        self
    }
}

impl fmt::Display for LlmDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "generation backend error (provider={:?}, stage={}): {}",
            self.provider, self.stage, self.detail
        )
    }
}

impl std::error::Error for LlmDiagnosticsError {}
