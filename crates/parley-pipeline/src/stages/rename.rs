use std::sync::Arc;

use async_trait::async_trait;
use parley_llm::TitleSuggester;
use parley_persist::ThreadDirectory;
use parley_types::{PipelineEvent, Stage};

use super::{EventSink, PipelineStage, RunState, StageFlow};
use crate::error::Result;

/// Auto-titles a fresh thread, then refreshes the thread listing.
///
/// Title trouble never fails the run; the listing is emitted whether or not
/// a rename happened.
pub struct RenameTitleStage {
    directory: ThreadDirectory,
    titles: Arc<dyn TitleSuggester>,
    listing_limit: usize,
}

impl RenameTitleStage {
    pub fn new(directory: ThreadDirectory, titles: Arc<dyn TitleSuggester>, listing_limit: usize) -> Self {
        Self {
            directory,
            titles,
            listing_limit,
        }
    }

    async fn maybe_rename(&self, thread_id: &str, prompt: &str) -> Option<String> {
        match self.directory.is_fresh(thread_id).await {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                tracing::warn!(thread_id, error = %e, "freshness check failed, keeping title");
                return None;
            }
        }

        let title = self.titles.suggest_title(prompt).await;
        match self.directory.rename_thread(thread_id, &title).await {
            Ok(thread) => {
                tracing::info!(thread_id, title = %thread.title, "thread auto-titled");
                Some(thread.title)
            }
            Err(e) => {
                tracing::warn!(thread_id, error = %e, "auto-title rename failed");
                None
            }
        }
    }
}

#[async_trait]
impl PipelineStage for RenameTitleStage {
    fn stage(&self) -> Stage {
        Stage::RenameTitle
    }

    async fn execute(&self, state: &mut RunState, sink: &EventSink) -> Result<StageFlow> {
        let Some(thread_id) = state.thread_id.clone() else {
            return Ok(StageFlow::Continue);
        };

        state.renamed = self.maybe_rename(&thread_id, &state.prompt).await;

        match self.directory.list_recent(self.listing_limit, false).await {
            Ok(threads) => {
                sink.emit(PipelineEvent::Listing {
                    threads,
                    renamed: state.renamed.clone(),
                })
                .await;
            }
            Err(e) => {
                tracing::error!(thread_id = %thread_id, error = %e, "listing refresh failed");
            }
        }
        Ok(StageFlow::Continue)
    }
}
