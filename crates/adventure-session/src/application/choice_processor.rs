//! The resolve-and-apply transaction for one incoming choice.
//!
//! Every call is an independent unit of work. Coordination with concurrent
//! callers happens only through conditional store writes: the player record
//! is compare-and-swapped on its version, generated edges are bound
//! first-write-wins, and statistics use atomic counters.

use std::sync::Arc;

use adventure_core::command::Command;
use adventure_core::determinism::Clock;
use adventure_core::error::DomainError;
use adventure_core::store::KeyValueStore;
use adventure_narrative::application::generator::{ContentGenerator, GenerationRequest};
use adventure_narrative::application::scene_graph::{EdgeBinding, SceneGraphStore};
use adventure_narrative::domain::scene::{ChoiceKey, Scene, SceneId};
use adventure_player::application::repository::PlayerStateStore;
use adventure_player::domain::state::{GLOBAL_PLAYER_ID, PlayerState, Progression};
use adventure_stats::{ChoiceRecord, DEFAULT_HISTORY_CAP, StatsAggregator};
use tracing::{debug, info, instrument, warn};

use crate::domain::commands::{RegisterPlayer, ResolveChoice};

/// Default number of attempts before a contended choice is given up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Tunables for `ChoiceProcessor`.
#[derive(Debug, Clone)]
pub struct ProcessorSettings {
    /// Attempts per choice when the player write conflicts or the store fails.
    pub max_attempts: u32,
    /// Length of the recent-activity log.
    pub history_cap: usize,
    /// Scene new and reset players stand in.
    pub start: SceneId,
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            history_cap: DEFAULT_HISTORY_CAP,
            start: SceneId::start(),
        }
    }
}

/// Result of a successfully processed choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOutcome {
    /// The player after the choice was applied.
    pub player: PlayerState,
    /// The scene the chosen edge leads to.
    pub scene: Scene,
    /// The scene the player now stands in: `scene`, or the start scene after
    /// a death.
    pub current_scene: Scene,
    pub died: bool,
}

struct Applied {
    outcome: ChoiceOutcome,
    origin: Scene,
    created_player: bool,
}

/// Processes choices against the shared scene graph and player records.
#[derive(Clone)]
pub struct ChoiceProcessor {
    players: PlayerStateStore,
    scenes: SceneGraphStore,
    stats: StatsAggregator,
    generator: ContentGenerator,
    clock: Arc<dyn Clock>,
    settings: ProcessorSettings,
}

impl ChoiceProcessor {
    /// Builds a processor whose repositories all share `store`.
    #[must_use]
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        generator: ContentGenerator,
        clock: Arc<dyn Clock>,
        settings: ProcessorSettings,
    ) -> Self {
        Self {
            players: PlayerStateStore::new(Arc::clone(&store)),
            scenes: SceneGraphStore::new(Arc::clone(&store)),
            stats: StatsAggregator::new(store, settings.history_cap),
            generator,
            clock,
            settings,
        }
    }

    #[must_use]
    pub fn players(&self) -> &PlayerStateStore {
        &self.players
    }

    #[must_use]
    pub fn scenes(&self) -> &SceneGraphStore {
        &self.scenes
    }

    #[must_use]
    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }

    #[must_use]
    pub fn settings(&self) -> &ProcessorSettings {
        &self.settings
    }

    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Takes one branch out of the player's current scene.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidChoice` for a key other than `a`/`b`,
    /// `DomainError::PlayerNotFound` for an unregistered player,
    /// `DomainError::GenerationFailure` if no scene could be produced, and
    /// `DomainError::TransientFailure` once every attempt hit a conflict or
    /// store failure. No player change is visible after an error.
    #[instrument(
        skip_all,
        fields(
            correlation_id = %command.correlation_id,
            player_id = %command.player_id,
            choice = %command.choice
        )
    )]
    pub async fn process(&self, command: &ResolveChoice) -> Result<ChoiceOutcome, DomainError> {
        let key: ChoiceKey = command.choice.parse()?;
        let max_attempts = self.settings.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match self.attempt(command.player_id(), key).await {
                Ok(applied) => {
                    self.record_stats(command, key, &applied).await;
                    let outcome = applied.outcome;
                    info!(
                        command_type = command.command_type(),
                        attempt,
                        scene_id = %outcome.scene.id,
                        died = outcome.died,
                        health = outcome.player.health,
                        "choice processed"
                    );
                    return Ok(outcome);
                }
                Err(err) if err.is_transient() => {
                    warn!(attempt, max_attempts, error = %err, "choice attempt failed, retrying");
                }
                Err(err) => return Err(err),
            }
        }

        Err(DomainError::TransientFailure(format!(
            "choice {key} for player {} abandoned after {max_attempts} attempts",
            command.player_id
        )))
    }

    /// Creates a new player at the start scene.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` if the id is taken, or any
    /// store error.
    #[instrument(
        skip_all,
        fields(correlation_id = %command.correlation_id, player_id = %command.player_id)
    )]
    pub async fn register(&self, command: &RegisterPlayer) -> Result<PlayerState, DomainError> {
        let mut player = PlayerState::new(
            command.player_id.clone(),
            self.settings.start.clone(),
            self.clock.now(),
        );
        self.players.save(&mut player).await?;
        if let Err(err) = self.stats.record_new_player().await {
            warn!(error = %err, "failed to count new player");
        }
        info!(command_type = command.command_type(), "player registered");
        Ok(player)
    }

    async fn attempt(&self, player_id: &str, key: ChoiceKey) -> Result<Applied, DomainError> {
        let mut player = self.load_player(player_id).await?;
        let created_player = player.version.is_none();
        let origin = self.current_scene(&player).await?;
        let target = self.resolve_target(&origin, key, &player).await?;

        let delta = origin.choice(key).stat_delta.clone();
        let progression =
            player.apply_traversal(&delta, &target, &self.settings.start, self.clock.now());
        let died = progression == Progression::Died;
        let current_scene = if died {
            self.scenes.require_scene(&self.settings.start).await?
        } else {
            target.clone()
        };

        // Nothing fallible may follow this write: a retry would replay the
        // choice against the committed player.
        self.players.save(&mut player).await?;
        Ok(Applied {
            outcome: ChoiceOutcome {
                player,
                scene: target,
                current_scene,
                died,
            },
            origin,
            created_player,
        })
    }

    async fn load_player(&self, player_id: &str) -> Result<PlayerState, DomainError> {
        match self.players.load(player_id).await? {
            Some(player) => Ok(player),
            None if player_id == GLOBAL_PLAYER_ID => Ok(PlayerState::new(
                player_id,
                self.settings.start.clone(),
                self.clock.now(),
            )),
            None => Err(DomainError::PlayerNotFound(player_id.to_owned())),
        }
    }

    async fn current_scene(&self, player: &PlayerState) -> Result<Scene, DomainError> {
        if let Some(scene) = self.scenes.get_scene(&player.current_scene_id).await? {
            return Ok(scene);
        }
        warn!(
            scene_id = %player.current_scene_id,
            "player stands in an unknown scene, using start"
        );
        self.scenes.require_scene(&self.settings.start).await
    }

    async fn resolve_target(
        &self,
        origin: &Scene,
        key: ChoiceKey,
        player: &PlayerState,
    ) -> Result<Scene, DomainError> {
        if let Some(target) = self.scenes.target_of(origin, key).await? {
            return self.scenes.require_scene(&target).await;
        }

        let sequence = self.stats.next_generation_sequence().await?;
        let context = player.context();
        let generation = self
            .generator
            .resolve(GenerationRequest {
                origin,
                choice_key: key,
                player: &context,
                sequence,
            })
            .await?;

        self.scenes.insert_scene(&generation.scene).await?;
        match self
            .scenes
            .bind_edge(&origin.id, key, &generation.scene.id)
            .await?
        {
            EdgeBinding::Bound => {
                info!(
                    origin = %origin.id,
                    %key,
                    scene_id = %generation.scene.id,
                    source = ?generation.source,
                    "generated scene bound"
                );
                Ok(generation.scene)
            }
            EdgeBinding::AlreadyBound(winner) => {
                debug!(discarded = %generation.scene.id, %winner, "lost edge race, using winner");
                self.scenes.require_scene(&winner).await
            }
        }
    }

    async fn record_stats(&self, command: &ResolveChoice, key: ChoiceKey, applied: &Applied) {
        let outcome = &applied.outcome;
        if applied.created_player {
            if let Err(err) = self.stats.record_new_player().await {
                warn!(error = %err, "failed to count new player");
            }
        }
        if let Err(err) = self.stats.record_visit(&outcome.scene.id).await {
            warn!(error = %err, "failed to count scene visit");
        }
        let record = ChoiceRecord {
            player_id: command.player_id.clone(),
            from_scene_id: applied.origin.id.clone(),
            choice_key: key,
            choice_text: applied.origin.choice(key).text.clone(),
            scene_id: outcome.scene.id.clone(),
            scene_title: outcome.scene.title.clone(),
            died: outcome.died,
            recorded_at: self.clock.now(),
        };
        if let Err(err) = self.stats.record_choice(&record).await {
            warn!(error = %err, "failed to record choice");
        }
        if outcome.died {
            if let Err(err) = self.stats.record_death().await {
                warn!(error = %err, "failed to count death");
            }
        }
    }
}
