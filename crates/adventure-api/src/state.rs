//! Shared application state.

use std::sync::Arc;

use adventure_core::determinism::{Clock, SystemClock};
use adventure_core::store::KeyValueStore;
use adventure_llm::AnthropicStoryModel;
use adventure_narrative::application::generator::ContentGenerator;
use adventure_narrative::domain::seed::SeedGraph;
use adventure_session::application::choice_processor::{ChoiceProcessor, ProcessorSettings};
use adventure_store::{MemoryStore, PgStore};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::AppConfig;
use crate::error::AppError;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub processor: ChoiceProcessor,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(processor: ChoiceProcessor) -> Self {
        Self { processor }
    }

    /// Connects the store, loads the seed graph and wires the generator as
    /// `config` describes.
    ///
    /// # Errors
    ///
    /// Returns `AppError` if the database is unreachable, the seed graph is
    /// unreadable or invalid, or the story model cannot be built.
    pub async fn bootstrap(config: &AppConfig) -> Result<Self, AppError> {
        let store: Arc<dyn KeyValueStore> = match &config.database_url {
            Some(url) => {
                let pool = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await?;
                let store = PgStore::new(pool);
                store.ensure_schema().await?;
                info!("using PostgreSQL store");
                Arc::new(store)
            }
            None => {
                info!("DATABASE_URL not set, using in-memory store");
                Arc::new(MemoryStore::new())
            }
        };

        let seed = match &config.seed_path {
            Some(path) => {
                let yaml = tokio::fs::read_to_string(path).await.map_err(|e| {
                    AppError::Config(format!("cannot read seed graph {}: {e}", path.display()))
                })?;
                SeedGraph::from_yaml(&yaml)?
            }
            None => SeedGraph::embedded()?,
        };

        let generator = match &config.anthropic_api_key {
            Some(key) => {
                let model = AnthropicStoryModel::new(key.clone(), config.model.clone())
                    .map_err(|e| AppError::Config(e.to_string()))?;
                info!(
                    model = %config.model,
                    timeout = ?config.generator_timeout,
                    "story model enabled"
                );
                ContentGenerator::with_model(Arc::new(model), config.generator_timeout)
            }
            None => {
                info!("ANTHROPIC_API_KEY not set, generating procedurally");
                ContentGenerator::procedural_only()
            }
        };

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let settings = ProcessorSettings {
            max_attempts: config.max_attempts,
            history_cap: config.history_cap,
            start: seed.start.clone(),
        };
        let processor = ChoiceProcessor::new(store, generator, clock, settings);
        processor.scenes().load_seed(&seed).await?;

        Ok(Self::new(processor))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use adventure_core::store::KeyValueStore;
    use adventure_narrative::application::generator::ContentGenerator;
    use adventure_narrative::domain::seed::SeedGraph;
    use adventure_session::application::choice_processor::{ChoiceProcessor, ProcessorSettings};
    use adventure_store::MemoryStore;
    use adventure_test_support::FixedClock;

    use super::AppState;

    /// State over `store` with the embedded seed graph loaded.
    pub(crate) async fn state_over(store: Arc<dyn KeyValueStore>) -> AppState {
        let processor = ChoiceProcessor::new(
            store,
            ContentGenerator::procedural_only(),
            Arc::new(FixedClock::epoch()),
            ProcessorSettings::default(),
        );
        processor
            .scenes()
            .load_seed(&SeedGraph::embedded().unwrap())
            .await
            .unwrap();
        AppState::new(processor)
    }

    pub(crate) async fn test_state() -> AppState {
        state_over(Arc::new(MemoryStore::new())).await
    }
}
