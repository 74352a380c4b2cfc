//! Adventure engine: Aggregate statistics bounded context.
//!
//! Global counters and a bounded recent-activity log shared by every
//! player. All mutation goes through the store's atomic increment and capped
//! append, so concurrent writers never lose updates.

mod aggregator;
mod model;

pub use aggregator::{DEFAULT_HISTORY_CAP, StatsAggregator};
pub use model::{AggregateStats, ChoiceRecord};
