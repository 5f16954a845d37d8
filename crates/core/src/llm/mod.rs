pub mod anthropic;
pub mod error;
pub mod json;
pub mod prompts;

pub use anthropic::AnthropicClient;
pub use error::LlmDiagnosticsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
}

/// Free-form text generation: one prompt in, one completion out.
///
/// Implementations make a single logical attempt per call; the engine owns the
/// timeout and the fallback when a call fails.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    fn provider(&self) -> Provider;

    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}
