//! Query handlers for the Session context.
//!
//! Read-only views over the player records, scene graph and statistics.
//! None of these write, not even for the global player.

use adventure_core::determinism::Clock;
use adventure_core::error::DomainError;
use adventure_narrative::application::scene_graph::SceneGraphStore;
use adventure_narrative::domain::scene::{Scene, SceneId};
use adventure_player::application::repository::PlayerStateStore;
use adventure_player::domain::state::{GLOBAL_PLAYER_ID, PlayerState};
use adventure_stats::{AggregateStats, StatsAggregator};

/// A player together with the scene they stand in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerView {
    pub player: PlayerState,
    pub scene: Scene,
}

/// Retrieves a player and their current scene.
///
/// The global player is reported with default values until their first
/// choice creates the record.
///
/// # Errors
///
/// Returns `DomainError::PlayerNotFound` for an unregistered player, or any
/// store error.
pub async fn get_player_view(
    player_id: &str,
    players: &PlayerStateStore,
    scenes: &SceneGraphStore,
    start: &SceneId,
    clock: &dyn Clock,
) -> Result<PlayerView, DomainError> {
    let player = match players.load(player_id).await? {
        Some(player) => player,
        None if player_id == GLOBAL_PLAYER_ID => {
            PlayerState::new(player_id, start.clone(), clock.now())
        }
        None => return Err(DomainError::PlayerNotFound(player_id.to_owned())),
    };
    let scene = match scenes.get_scene(&player.current_scene_id).await? {
        Some(scene) => scene,
        None => scenes.require_scene(start).await?,
    };
    Ok(PlayerView { player, scene })
}

/// Retrieves the aggregate statistics.
///
/// # Errors
///
/// Returns any store or decoding error.
pub async fn get_stats(stats: &StatsAggregator) -> Result<AggregateStats, DomainError> {
    stats.snapshot().await
}
