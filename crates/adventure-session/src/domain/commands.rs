//! Commands for the Session context.

use adventure_core::command::Command;
use adventure_player::domain::state::GLOBAL_PLAYER_ID;
use uuid::Uuid;

/// Command to take one branch out of the player's current scene.
#[derive(Debug, Clone)]
pub struct ResolveChoice {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The player making the choice.
    pub player_id: String,
    /// The branch key as received; only `a` and `b` are accepted.
    pub choice: String,
}

impl ResolveChoice {
    /// A choice made by the shared global player.
    #[must_use]
    pub fn global(correlation_id: Uuid, choice: impl Into<String>) -> Self {
        Self {
            correlation_id,
            player_id: GLOBAL_PLAYER_ID.to_owned(),
            choice: choice.into(),
        }
    }
}

impl Command for ResolveChoice {
    fn command_type(&self) -> &'static str {
        "session.resolve_choice"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn player_id(&self) -> &str {
        &self.player_id
    }
}

/// Command to create a new player at the start scene.
#[derive(Debug, Clone)]
pub struct RegisterPlayer {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Identifier for the new player.
    pub player_id: String,
}

impl RegisterPlayer {
    /// Registers a player under a freshly minted id.
    #[must_use]
    pub fn new(correlation_id: Uuid) -> Self {
        Self {
            correlation_id,
            player_id: Uuid::now_v7().to_string(),
        }
    }
}

impl Command for RegisterPlayer {
    fn command_type(&self) -> &'static str {
        "session.register_player"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn player_id(&self) -> &str {
        &self.player_id
    }
}
