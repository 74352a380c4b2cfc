//! Scene generation for unresolved edges.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use adventure_core::error::DomainError;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::domain::draft::{DraftRejection, SceneDraft};
use crate::domain::procedural;
use crate::domain::prompt::{PlayerContext, StoryPrompt};
use crate::domain::scene::{ChoiceKey, Scene};

/// Default hard limit on a single story-model call.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(8);

/// A text-generation service that continues the story.
#[async_trait]
pub trait StoryModel: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Sends `prompt` and returns the raw reply text.
    async fn complete(&self, prompt: &StoryPrompt) -> Result<String, DomainError>;
}

/// Everything the generator needs to resolve one edge.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    /// The scene the player is leaving.
    pub origin: &'a Scene,
    /// The branch taken.
    pub choice_key: ChoiceKey,
    /// The player's state before the branch's delta is applied.
    pub player: &'a PlayerContext,
    /// Generation sequence number for this attempt.
    pub sequence: u64,
}

/// Which path produced a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationSource {
    /// The story model's validated reply.
    Model,
    /// Deterministic synthesis from the theme tables.
    Procedural,
}

/// A fully formed generated scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub scene: Scene,
    pub source: GenerationSource,
}

#[derive(Debug, Error)]
enum Degraded {
    #[error("no reply within {0:?}")]
    Timeout(Duration),
    #[error("transport failure: {0}")]
    Transport(DomainError),
    #[error("reply rejected: {0}")]
    Rejected(DraftRejection),
}

/// Produces scenes for unresolved edges, falling back to procedural synthesis
/// whenever the story model is absent, slow, failing or off-schema.
#[derive(Clone)]
pub struct ContentGenerator {
    model: Option<Arc<dyn StoryModel>>,
    timeout: Duration,
}

impl fmt::Debug for ContentGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentGenerator")
            .field("model", &self.model.as_ref().map(|m| m.name().to_owned()))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ContentGenerator {
    /// A generator that only uses procedural synthesis.
    #[must_use]
    pub fn procedural_only() -> Self {
        Self {
            model: None,
            timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    /// A generator that asks `model` first, waiting at most `timeout`.
    #[must_use]
    pub fn with_model(model: Arc<dyn StoryModel>, timeout: Duration) -> Self {
        Self {
            model: Some(model),
            timeout,
        }
    }

    /// Resolves one edge into a complete scene.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::GenerationFailure` if the story model degraded
    /// and the procedural draft also failed validation. Nothing is written
    /// either way.
    #[instrument(
        skip(self, request),
        fields(
            origin = %request.origin.id,
            key = %request.choice_key,
            sequence = request.sequence
        )
    )]
    pub async fn resolve(&self, request: GenerationRequest<'_>) -> Result<Generation, DomainError> {
        if let Some(model) = &self.model {
            match self.ask(model.as_ref(), &request).await {
                Ok(draft) => {
                    debug!(model = model.name(), "story model reply accepted");
                    return Ok(finish(&request, draft, GenerationSource::Model));
                }
                Err(reason) => {
                    warn!(
                        model = model.name(),
                        %reason,
                        "story model degraded, using procedural fallback"
                    );
                }
            }
        }

        let draft = procedural::compose(request.origin, request.choice_key, request.sequence)
            .validate()
            .map_err(|e| {
                DomainError::GenerationFailure(format!(
                    "procedural fallback for {}:{} rejected: {e}",
                    request.origin.id, request.choice_key
                ))
            })?;
        Ok(finish(&request, draft, GenerationSource::Procedural))
    }

    async fn ask(
        &self,
        model: &dyn StoryModel,
        request: &GenerationRequest<'_>,
    ) -> Result<SceneDraft, Degraded> {
        let prompt = StoryPrompt::build(request.origin, request.choice_key, request.player);
        let reply = tokio::time::timeout(self.timeout, model.complete(&prompt))
            .await
            .map_err(|_| Degraded::Timeout(self.timeout))?
            .map_err(Degraded::Transport)?;
        SceneDraft::parse(&reply).map_err(Degraded::Rejected)
    }
}

fn finish(
    request: &GenerationRequest<'_>,
    draft: SceneDraft,
    source: GenerationSource,
) -> Generation {
    Generation {
        scene: Scene::from_draft(&request.origin.id, request.choice_key, request.sequence, draft),
        source,
    }
}
