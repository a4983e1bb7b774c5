//! Echo language model for offline runs.

use async_trait::async_trait;
use stache_core::{CompletionOptions, LlmError, LlmProvider};

/// LLM provider that answers with the prompt's final non-empty line.
///
/// Stands in for a remote model so a retrieval pipeline can run end to end
/// without network access.
#[derive(Debug, Default)]
pub struct EchoLlm;

impl EchoLlm {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LlmProvider for EchoLlm {
    fn name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, prompt: &str, _options: &CompletionOptions) -> Result<String, LlmError> {
        prompt
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .map(str::to_string)
            .ok_or_else(|| LlmError::Request("prompt is empty".to_string()))
    }
}
