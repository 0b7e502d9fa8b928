use std::time::Duration;

use anyhow::{anyhow, Result};
use async_stream::stream;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::traits::{FragmentStream, GenerationRequest, ResponseGenerator};

const DEMO_DELAY: Duration = Duration::from_millis(250);

/// Replays a fixed list of fragments with a delay before each one.
///
/// Stands in for a real model: the bundled demo script streams a short
/// acknowledgement, a markdown snippet, twenty progress dots and a closing
/// marker.
#[derive(Debug, Clone)]
pub struct ScriptedGenerator {
    fragments: Vec<String>,
    delay: Duration,
    fail_after: Option<(usize, String)>,
}

impl ScriptedGenerator {
    pub fn new(fragments: Vec<String>) -> Self {
        Self {
            fragments,
            delay: Duration::ZERO,
            fail_after: None,
        }
    }

    pub fn demo() -> Self {
        Self::new(demo_script()).with_delay(DEMO_DELAY)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Yield an error after `count` fragments instead of finishing.
    pub fn failing_after(mut self, count: usize, message: impl Into<String>) -> Self {
        self.fail_after = Some((count, message.into()));
        self
    }
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self::demo()
    }
}

pub fn demo_script() -> Vec<String> {
    let mut script = vec![
        "Got it. ".to_string(),
        "I'll stream the reply a little at a time.".to_string(),
        "\n\n- Bullet points\n- work too\n\n`code` is supported as well.".to_string(),
    ];
    script.extend(std::iter::repeat(".".to_string()).take(20));
    script.push("\n\n".to_string());
    script.push("(response complete)".to_string());
    script
}

#[async_trait]
impl ResponseGenerator for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest, cancel: CancellationToken) -> Result<FragmentStream> {
        tracing::debug!(
            prompt_len = request.prompt.len(),
            history = request.history.len(),
            fragments = self.fragments.len(),
            "starting scripted generation"
        );

        let fragments = self.fragments.clone();
        let delay = self.delay;
        let fail_after = self.fail_after.clone();

        let stream = stream! {
            let total = fragments.len();
            for (index, fragment) in fragments.into_iter().enumerate() {
                if let Some((count, message)) = &fail_after {
                    if index == *count {
                        yield Err(anyhow!(message.clone()));
                        return;
                    }
                }

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
                yield Ok(fragment);
            }

            // Failure point at or past the end of the script.
            if let Some((count, message)) = fail_after {
                if count >= total {
                    yield Err(anyhow!(message));
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_replays_fragments_in_order() {
        let generator = ScriptedGenerator::new(vec!["Hi".into(), " there".into(), "!".into()]);
        let stream = generator
            .generate(GenerationRequest::new("Hello"), CancellationToken::new())
            .await
            .unwrap();

        let fragments: Vec<String> = stream.map(|f| f.unwrap()).collect().await;
        assert_eq!(fragments.concat(), "Hi there!");
    }

    #[tokio::test]
    async fn test_stops_when_cancelled() {
        let generator = ScriptedGenerator::demo().with_delay(Duration::from_millis(20));
        let cancel = CancellationToken::new();
        let mut stream = generator
            .generate(GenerationRequest::new("Hello"), cancel.clone())
            .await
            .unwrap();

        assert!(stream.next().await.is_some());
        cancel.cancel();
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_failing_after_yields_error() {
        let generator = ScriptedGenerator::new(vec!["a".into(), "b".into()]).failing_after(1, "boom");
        let items: Vec<_> = generator
            .generate(GenerationRequest::new("x"), CancellationToken::new())
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "a");
        assert_eq!(items[1].as_ref().unwrap_err().to_string(), "boom");
    }

    #[test]
    fn test_demo_script_shape() {
        let script = demo_script();
        assert_eq!(script.iter().filter(|f| *f == ".").count(), 20);
        assert_eq!(script.last().map(String::as_str), Some("(response complete)"));
    }
}
