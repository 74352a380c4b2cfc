//! Counter and activity-log writes.

use std::sync::Arc;

use adventure_core::error::DomainError;
use adventure_core::store::{KeyValueStore, decode, encode};
use adventure_narrative::domain::scene::SceneId;
use tracing::{debug, instrument};

use crate::model::{AggregateStats, ChoiceRecord};

/// Default length of the recent-activity log.
pub const DEFAULT_HISTORY_CAP: usize = 10;

/// Tries per counter or log write before the error is returned.
pub const STATS_WRITE_ATTEMPTS: u32 = 3;

const STATS_KEY: &str = "stats";
const VISITS_KEY: &str = "stats:visits";
const HISTORY_KEY: &str = "stats:history";
const SEQUENCE_KEY: &str = "narrative:sequence";

const TOTAL_CHOICES: &str = "total_choices";
const TOTAL_PLAYERS: &str = "total_players";
const DEATHS: &str = "deaths";
const GENERATIONS: &str = "generations";

/// Writes and reads the global statistics.
#[derive(Clone)]
pub struct StatsAggregator {
    store: Arc<dyn KeyValueStore>,
    history_cap: usize,
}

impl StatsAggregator {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, history_cap: usize) -> Self {
        Self {
            store,
            history_cap: history_cap.max(1),
        }
    }

    /// Counts one resolution of `scene`.
    ///
    /// # Errors
    ///
    /// Returns the store error once `STATS_WRITE_ATTEMPTS` tries failed.
    pub async fn record_visit(&self, scene: &SceneId) -> Result<(), DomainError> {
        let store = self.store.as_ref();
        let field = scene.as_str();
        retrying("record_visit", move || store.increment(VISITS_KEY, field, 1)).await?;
        Ok(())
    }

    /// Counts one processed choice and logs it. The counter and the log are
    /// retried separately, so a failed append never counts the choice twice.
    ///
    /// # Errors
    ///
    /// Returns the store error once `STATS_WRITE_ATTEMPTS` tries of either
    /// write failed. The counter may have been incremented even if the log
    /// append failed.
    #[instrument(skip_all, fields(player_id = %record.player_id, scene_id = %record.scene_id))]
    pub async fn record_choice(&self, record: &ChoiceRecord) -> Result<(), DomainError> {
        let store = self.store.as_ref();
        let cap = self.history_cap;
        retrying("record_choice", move || {
            store.increment(STATS_KEY, TOTAL_CHOICES, 1)
        })
        .await?;
        let entry = encode(HISTORY_KEY, record)?;
        retrying("record_choice", move || {
            store.push_capped(HISTORY_KEY, entry.clone(), cap)
        })
        .await
    }

    /// Counts one death.
    ///
    /// # Errors
    ///
    /// Returns the store error once `STATS_WRITE_ATTEMPTS` tries failed.
    pub async fn record_death(&self) -> Result<(), DomainError> {
        let store = self.store.as_ref();
        retrying("record_death", move || store.increment(STATS_KEY, DEATHS, 1)).await?;
        Ok(())
    }

    /// Counts one newly created player.
    ///
    /// # Errors
    ///
    /// Returns the store error once `STATS_WRITE_ATTEMPTS` tries failed.
    pub async fn record_new_player(&self) -> Result<(), DomainError> {
        let store = self.store.as_ref();
        retrying("record_new_player", move || {
            store.increment(STATS_KEY, TOTAL_PLAYERS, 1)
        })
        .await?;
        Ok(())
    }

    /// Takes the next value of the global generation sequence. Every call
    /// returns a distinct value.
    ///
    /// # Errors
    ///
    /// Returns any store error.
    pub async fn next_generation_sequence(&self) -> Result<u64, DomainError> {
        let value = self.store.increment(SEQUENCE_KEY, GENERATIONS, 1).await?;
        u64::try_from(value).map_err(|_| {
            DomainError::Infrastructure(format!("generation sequence went negative: {value}"))
        })
    }

    /// Reads every counter and the activity log.
    ///
    /// # Errors
    ///
    /// Returns any store or decoding error.
    pub async fn snapshot(&self) -> Result<AggregateStats, DomainError> {
        let totals = self.store.counters(STATS_KEY).await?;
        let visit_counts = self.store.counters(VISITS_KEY).await?;
        let recent_choice_history = self
            .store
            .list(HISTORY_KEY)
            .await?
            .into_iter()
            .map(|entry| decode(HISTORY_KEY, entry))
            .collect::<Result<Vec<ChoiceRecord>, _>>()?;
        let total = |field: &str| totals.get(field).copied().unwrap_or(0);
        Ok(AggregateStats {
            visit_counts,
            total_choices: total(TOTAL_CHOICES),
            total_players: total(TOTAL_PLAYERS),
            deaths: total(DEATHS),
            recent_choice_history,
        })
    }
}

async fn retrying<T, F, Fut>(operation: &str, mut write: F) -> Result<T, DomainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DomainError>>,
{
    let mut attempt = 1;
    loop {
        match write().await {
            Err(err) if err.is_transient() && attempt < STATS_WRITE_ATTEMPTS => {
                debug!(operation, attempt, error = %err, "stats write failed, retrying");
                attempt += 1;
            }
            result => return result,
        }
    }
}
