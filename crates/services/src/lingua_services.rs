use std::sync::Arc;

use lingua_core::model::GameSettings;
use lingua_core::topics::{ContentDocument, TopicRegistry, builtin};
use storage::repository::Storage;

use crate::Clock;
use crate::dictionary::WordLookup;
use crate::error::{LinguaServicesError, RunError};
use crate::high_score_service::HighScoreService;
use crate::progression::{ProgressionController, RunHandle};

/// Assembles the registry, storage and dictionary shared by every run.
#[derive(Clone)]
pub struct LinguaServices {
    clock: Clock,
    settings: GameSettings,
    registry: Arc<TopicRegistry>,
    storage: Storage,
    dictionary: Option<Arc<dyn WordLookup>>,
    high_scores: Arc<HighScoreService>,
}

impl LinguaServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// Questions come from `content` when given, otherwise from the
    /// built-in topics.
    ///
    /// # Errors
    ///
    /// Returns `LinguaServicesError` for invalid settings or content, or if
    /// storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: GameSettings,
        content: Option<ContentDocument>,
    ) -> Result<Self, LinguaServicesError> {
        let registry = build_registry(&settings, content)?;
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::assemble(clock, settings, registry, storage))
    }

    /// Build services that keep high scores in memory.
    ///
    /// # Errors
    ///
    /// Returns `LinguaServicesError` for invalid settings or content.
    pub fn in_memory(
        clock: Clock,
        settings: GameSettings,
        content: Option<ContentDocument>,
    ) -> Result<Self, LinguaServicesError> {
        let registry = build_registry(&settings, content)?;
        Ok(Self::assemble(clock, settings, registry, Storage::in_memory()))
    }

    fn assemble(
        clock: Clock,
        settings: GameSettings,
        registry: TopicRegistry,
        storage: Storage,
    ) -> Self {
        let high_scores = Arc::new(HighScoreService::new(Arc::clone(&storage.high_scores)));
        Self {
            clock,
            settings,
            registry: Arc::new(registry),
            storage,
            dictionary: None,
            high_scores,
        }
    }

    #[must_use]
    pub fn with_dictionary(mut self, dictionary: Arc<dyn WordLookup>) -> Self {
        self.dictionary = Some(dictionary);
        self
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    #[must_use]
    pub fn registry(&self) -> Arc<TopicRegistry> {
        Arc::clone(&self.registry)
    }

    #[must_use]
    pub fn high_scores(&self) -> Arc<HighScoreService> {
        Arc::clone(&self.high_scores)
    }

    #[must_use]
    pub fn has_dictionary(&self) -> bool {
        self.dictionary.is_some()
    }

    /// A controller for one new run, awaiting `start_run`.
    ///
    /// # Errors
    ///
    /// Returns `RunError` if the registry and settings disagree.
    pub fn new_run(&self) -> Result<ProgressionController, RunError> {
        let controller = ProgressionController::new(
            self.settings.clone(),
            Arc::clone(&self.registry),
            Arc::clone(&self.storage.high_scores),
            self.clock,
        )?;
        Ok(match &self.dictionary {
            Some(dictionary) => controller.with_dictionary(Arc::clone(dictionary)),
            None => controller,
        })
    }

    /// Like `new_run`, wrapped for sharing across tasks.
    ///
    /// # Errors
    ///
    /// Returns `RunError` if the registry and settings disagree.
    pub fn new_run_handle(&self) -> Result<RunHandle, RunError> {
        Ok(RunHandle::new(self.new_run()?))
    }
}

fn build_registry(
    settings: &GameSettings,
    content: Option<ContentDocument>,
) -> Result<TopicRegistry, LinguaServicesError> {
    settings.validate()?;
    let registry = match content {
        Some(doc) => doc.into_registry(settings.total_sublevels())?,
        None => builtin::default_registry(settings)?,
    };
    tracing::debug!(
        topics = registry.slots().len(),
        total = registry.total_sublevels(),
        "topic registry ready"
    );
    Ok(registry)
}
