use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::traits::{GenerationRequest, ResponseGenerator, TitleSuggester};
use crate::types::Message;

pub const DEFAULT_TITLE_MAX_CHARS: usize = 30;
pub const UNTITLED: &str = "Untitled";

const GENERATED_TITLE_MAX_CHARS: usize = 100;
const TITLE_INSTRUCTION: &str = "Write a short title (at most six words) for a conversation that starts with the \
message below. Reply with the title only, without quotes or punctuation at the end.";

/// Title from the first non-empty line of the message.
#[derive(Debug, Clone)]
pub struct HeuristicTitleSuggester {
    max_chars: usize,
}

impl HeuristicTitleSuggester {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
        }
    }

    pub fn title_for(&self, first_message: &str) -> String {
        let line = first_message
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "));

        match line {
            Some(line) => truncate_chars(&line, self.max_chars, "…"),
            None => UNTITLED.to_string(),
        }
    }
}

impl Default for HeuristicTitleSuggester {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE_MAX_CHARS)
    }
}

#[async_trait]
impl TitleSuggester for HeuristicTitleSuggester {
    async fn suggest_title(&self, first_message: &str) -> String {
        self.title_for(first_message)
    }
}

/// Asks a [`ResponseGenerator`] for a title and falls back to the heuristic
/// on timeout, stream error or an empty answer.
pub struct GeneratedTitleSuggester {
    generator: Arc<dyn ResponseGenerator>,
    timeout: Duration,
    fallback: HeuristicTitleSuggester,
}

impl GeneratedTitleSuggester {
    pub fn new(generator: Arc<dyn ResponseGenerator>, timeout: Duration) -> Self {
        Self {
            generator,
            timeout,
            fallback: HeuristicTitleSuggester::default(),
        }
    }

    pub fn with_fallback(mut self, fallback: HeuristicTitleSuggester) -> Self {
        self.fallback = fallback;
        self
    }

    async fn generate(&self, first_message: &str, cancel: CancellationToken) -> anyhow::Result<String> {
        let request = GenerationRequest::new(first_message)
            .with_history(vec![Message::system(TITLE_INSTRUCTION)]);
        let mut stream = self.generator.generate(request, cancel).await?;

        let mut raw = String::new();
        while let Some(fragment) = stream.next().await {
            raw.push_str(&fragment?);
        }
        Ok(raw)
    }
}

#[async_trait]
impl TitleSuggester for GeneratedTitleSuggester {
    async fn suggest_title(&self, first_message: &str) -> String {
        let cancel = CancellationToken::new();
        let outcome = tokio::time::timeout(self.timeout, self.generate(first_message, cancel.clone())).await;
        cancel.cancel();

        match outcome {
            Ok(Ok(raw)) => match clean_title(&raw) {
                Some(title) => title,
                None => {
                    tracing::warn!("title generator returned an empty title, using fallback");
                    self.fallback.title_for(first_message)
                }
            },
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "title generation failed, using fallback");
                self.fallback.title_for(first_message)
            }
            Err(_) => {
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "title generation timed out, using fallback");
                self.fallback.title_for(first_message)
            }
        }
    }
}

/// Trim, strip wrapping quotes and keep the first line of a generated title.
fn clean_title(raw_title: &str) -> Option<String> {
    let cleaned = raw_title
        .trim()
        .lines()
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
        .trim();

    if cleaned.is_empty() {
        None
    } else {
        Some(truncate_chars(cleaned, GENERATED_TITLE_MAX_CHARS, "..."))
    }
}

fn truncate_chars(text: &str, max_chars: usize, ellipsis: &str) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(ellipsis.chars().count()).max(1);
    let mut cut: String = text.chars().take(keep).collect();
    cut.truncate(cut.trim_end().len());
    cut.push_str(ellipsis);
    cut
}
