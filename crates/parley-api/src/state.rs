use std::sync::Arc;
use std::time::Duration;

use parley_llm::{
    GeneratedTitleSuggester, HeuristicTitleSuggester, ResponseGenerator, ScriptedGenerator, TitleSuggester,
};
use parley_persist::{PersistClientBuilder, ThreadDirectory};
use parley_pipeline::Pipeline;

use crate::config::{Config, GeneratorConfig, TitleConfig, TitleStrategy};
use crate::settings::SettingsService;

/// Shared application state passed to all handlers
///
/// The pipeline owns the session registry and run queue, so one instance
/// is built at startup and shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub directory: ThreadDirectory,
    pub pipeline: Pipeline,
    pub settings: SettingsService,
}

impl AppState {
    pub fn new(config: Config, pipeline: Pipeline) -> Self {
        let settings = SettingsService::new(config.settings.clone().into());
        Self {
            directory: pipeline.directory().clone(),
            config: Arc::new(config),
            pipeline,
            settings,
        }
    }

    /// Build the store, collaborators and pipeline described by `config`.
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        tracing::info!(backend = ?config.storage.backend, "Initializing persistence store");
        let store = PersistClientBuilder::new()
            .backend(config.storage.backend)
            .mongodb_uri(config.mongodb_uri.clone())
            .database(config.storage.database.clone())
            .retry(config.storage.retry_policy())
            .build()
            .await?;

        let generator = build_generator(&config.generator);
        let titles = build_title_suggester(&config.title, generator.clone());

        tracing::info!("Initializing pipeline");
        let pipeline = Pipeline::builder()
            .store(store)
            .generator(generator)
            .titles(titles)
            .config(config.pipeline_config())
            .build()?;

        Ok(Self::new(config, pipeline))
    }
}

fn build_generator(config: &GeneratorConfig) -> Arc<dyn ResponseGenerator> {
    let generator = match &config.fragments {
        Some(fragments) => ScriptedGenerator::new(fragments.clone()),
        None => ScriptedGenerator::demo(),
    };
    Arc::new(generator.with_delay(Duration::from_millis(config.fragment_delay_ms)))
}

fn build_title_suggester(config: &TitleConfig, generator: Arc<dyn ResponseGenerator>) -> Arc<dyn TitleSuggester> {
    let heuristic = HeuristicTitleSuggester::new(config.max_chars);
    match config.strategy {
        TitleStrategy::Heuristic => Arc::new(heuristic),
        TitleStrategy::Generated => Arc::new(
            GeneratedTitleSuggester::new(generator, Duration::from_millis(config.timeout_ms))
                .with_fallback(heuristic),
        ),
    }
}
