use std::pin::Pin;

use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;
use tokio_util::sync::CancellationToken;

use crate::types::Message;

/// Lazily produced reply text. Each item is one fragment.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub history: Vec<Message>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }
}

/// Produces the assistant reply as a stream of fragments.
///
/// Every call starts a fresh stream. Implementations stop producing once
/// `cancel` fires; callers also stop polling, so checking between fragments
/// is enough.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest, cancel: CancellationToken) -> Result<FragmentStream>;
}

/// Proposes a thread title from the first user message.
///
/// Infallible: implementations fall back to something usable on their own.
#[async_trait]
pub trait TitleSuggester: Send + Sync {
    async fn suggest_title(&self, first_message: &str) -> String;
}
