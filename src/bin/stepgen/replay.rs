//! Offline collaborator that answers every prompt with a saved reply.

use async_trait::async_trait;
use stepblocks::generation::Prompt;
use stepblocks::{ChatCompletion, GenerationClient, GenerationError};

/// Returns the same completion text for every request.
pub struct ReplayClient {
    text: String,
}

impl ReplayClient {
    pub fn new(text: String) -> Self {
        Self { text }
    }
}

#[async_trait]
impl GenerationClient for ReplayClient {
    async fn complete(&self, _prompt: &Prompt) -> Result<ChatCompletion, GenerationError> {
        Ok(ChatCompletion::from_text(self.text.clone()))
    }
}
