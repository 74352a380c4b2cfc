//! Versioned persistence for player records.

use std::sync::Arc;

use adventure_core::error::DomainError;
use adventure_core::store::{KeyValueStore, decode, encode};
use tracing::debug;

use crate::domain::state::PlayerState;

fn player_key(id: &str) -> String {
    format!("player:{id}")
}

/// Loads and conditionally writes `PlayerState` records.
#[derive(Clone)]
pub struct PlayerStateStore {
    store: Arc<dyn KeyValueStore>,
}

impl PlayerStateStore {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Loads a player, stamped with the version it was read at.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if the store read or decoding fails.
    pub async fn load(&self, id: &str) -> Result<Option<PlayerState>, DomainError> {
        let key = player_key(id);
        let Some(record) = self.store.get(&key).await? else {
            return Ok(None);
        };
        let mut player: PlayerState = decode(&key, record.value)?;
        player.version = Some(record.version);
        Ok(Some(player))
    }

    /// Writes `player` if the stored version still equals `player.version`
    /// (or, for a never-saved player, if no record exists). On success the
    /// player carries the new version.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` if another writer got
    /// there first, or any store error.
    pub async fn save(&self, player: &mut PlayerState) -> Result<(), DomainError> {
        let key = player_key(&player.id);
        let value = encode(&key, &*player)?;
        let version = self
            .store
            .compare_and_swap(&key, player.version, value)
            .await?;
        debug!(player_id = %player.id, version, "saved player");
        player.version = Some(version);
        Ok(())
    }
}
