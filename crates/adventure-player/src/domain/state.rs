//! The player progression record and its rules.

use adventure_narrative::domain::prompt::{PlayerContext, SUMMARY_CHAIN_LEN};
use adventure_narrative::domain::scene::{Scene, SceneId, StatDelta};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Id of the shared player every anonymous caller plays.
pub const GLOBAL_PLAYER_ID: &str = "global";
/// Starting health and health ceiling.
pub const DEFAULT_MAX_HEALTH: i32 = 100;
/// Experience needed per level.
pub const XP_PER_LEVEL: i32 = 100;

/// Result of moving a player along an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progression {
    /// The player now stands in the target scene.
    Advanced,
    /// Health reached zero; the player was reset to the start scene.
    Died,
}

/// Progression state of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub id: String,
    pub health: i32,
    pub max_health: i32,
    pub gold: i32,
    pub xp: i32,
    /// Items carried, in the order they were found.
    pub items: Vec<String>,
    pub current_scene_id: SceneId,
    /// Lifetime death count. Survives resets.
    #[serde(default)]
    pub deaths: u32,
    /// Summaries of the most recent scenes entered, oldest first.
    #[serde(default)]
    pub recent_summaries: Vec<String>,
    pub updated_at: DateTime<Utc>,
    /// Store version this state was read at; `None` until first saved.
    #[serde(skip)]
    pub version: Option<i64>,
}

impl PlayerState {
    /// A fresh player standing in `start`.
    #[must_use]
    pub fn new(id: impl Into<String>, start: SceneId, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            health: DEFAULT_MAX_HEALTH,
            max_health: DEFAULT_MAX_HEALTH,
            gold: 0,
            xp: 0,
            items: Vec::new(),
            current_scene_id: start,
            deaths: 0,
            recent_summaries: Vec::new(),
            updated_at: now,
            version: None,
        }
    }

    /// Level derived from experience, starting at 1.
    #[must_use]
    pub fn level(&self) -> u32 {
        u32::try_from(self.xp.max(0) / XP_PER_LEVEL).unwrap_or(0) + 1
    }

    /// The facts about this player a scene generator may see.
    #[must_use]
    pub fn context(&self) -> PlayerContext {
        PlayerContext {
            health: self.health,
            max_health: self.max_health,
            gold: self.gold,
            xp: self.xp,
            level: self.level(),
            items: self.items.clone(),
            recent_summaries: self.recent_summaries.clone(),
        }
    }

    /// Applies `delta` for traversing into `target`.
    ///
    /// Health is clamped to `[0, max_health]`; gold and experience never go
    /// below zero. If health reaches zero the player is reset to `start`
    /// and its death count incremented.
    pub fn apply_traversal(
        &mut self,
        delta: &StatDelta,
        target: &Scene,
        start: &SceneId,
        now: DateTime<Utc>,
    ) -> Progression {
        self.health = self
            .health
            .saturating_add(delta.health)
            .clamp(0, self.max_health);
        self.gold = self.gold.saturating_add(delta.gold).max(0);
        self.xp = self.xp.saturating_add(delta.xp).max(0);
        if let Some(item) = &delta.item {
            self.items.push(item.clone());
        }
        self.updated_at = now;

        if self.health <= 0 {
            self.reset(start.clone());
            self.deaths += 1;
            return Progression::Died;
        }

        self.current_scene_id = target.id.clone();
        if !target.summary.is_empty() {
            self.recent_summaries.push(target.summary.clone());
            let excess = self.recent_summaries.len().saturating_sub(SUMMARY_CHAIN_LEN);
            self.recent_summaries.drain(..excess);
        }
        Progression::Advanced
    }

    fn reset(&mut self, start: SceneId) {
        self.health = DEFAULT_MAX_HEALTH;
        self.max_health = DEFAULT_MAX_HEALTH;
        self.gold = 0;
        self.xp = 0;
        self.items.clear();
        self.current_scene_id = start;
        self.recent_summaries.clear();
    }
}
