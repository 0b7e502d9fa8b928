use std::sync::Arc;

use anyhow::{anyhow, Result};
use parley_llm::{HeuristicTitleSuggester, ResponseGenerator, TitleSuggester};
use parley_persist::{PersistenceClient, ThreadDirectory};
use parley_types::PipelineConfig;

use crate::pipeline::{Pipeline, PipelineInner};
use crate::queue::RunQueue;
use crate::session::SessionRegistry;
use crate::stages::{EnsureThreadStage, GuardStage, RecordTurnStage, RenameTitleStage, SettleStage, StreamStage};

/// Builder for constructing a Pipeline with optional components
pub struct PipelineBuilder {
    store: Option<Arc<dyn PersistenceClient>>,
    generator: Option<Arc<dyn ResponseGenerator>>,
    titles: Option<Arc<dyn TitleSuggester>>,
    config: PipelineConfig,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            generator: None,
            titles: None,
            config: PipelineConfig::default(),
        }
    }

    /// Set the persistence store
    pub fn store(mut self, store: Arc<dyn PersistenceClient>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the reply generator
    pub fn generator(mut self, generator: Arc<dyn ResponseGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set the title suggester (defaults to the first-line heuristic)
    pub fn titles(mut self, titles: Arc<dyn TitleSuggester>) -> Self {
        self.titles = Some(titles);
        self
    }

    /// Set the pipeline configuration
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the Pipeline
    pub fn build(self) -> Result<Pipeline> {
        let store = self.store.ok_or_else(|| anyhow!("persistence store is required"))?;
        let generator = self.generator.ok_or_else(|| anyhow!("response generator is required"))?;
        let titles = self
            .titles
            .unwrap_or_else(|| Arc::new(HeuristicTitleSuggester::default()));

        let directory = ThreadDirectory::new(store);
        let sessions = SessionRegistry::new();
        let config = self.config;

        Ok(Pipeline::from_inner(PipelineInner {
            queue: RunQueue::new(config.max_concurrency, config.queue_depth),
            ensure: EnsureThreadStage::new(directory.clone()),
            guard: GuardStage,
            record: RecordTurnStage::new(directory.clone()),
            rename: RenameTitleStage::new(directory.clone(), titles, config.listing_limit),
            stream: StreamStage::new(directory.clone(), generator),
            settle: SettleStage::new(sessions.clone(), config.settle_delay),
            sessions,
            directory,
            config,
        }))
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
