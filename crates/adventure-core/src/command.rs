//! Command abstractions.

use uuid::Uuid;

/// A request to change state on behalf of one player.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Dotted name used in log fields, e.g. `session.resolve_choice`.
    fn command_type(&self) -> &'static str;

    /// Identifier carried through every log line the command produces.
    fn correlation_id(&self) -> Uuid;

    /// The player record this command reads or mutates.
    fn player_id(&self) -> &str;
}
