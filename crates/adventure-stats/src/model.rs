//! Read models for aggregate statistics.

use std::collections::BTreeMap;

use adventure_narrative::domain::scene::{ChoiceKey, SceneId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the recent-activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceRecord {
    pub player_id: String,
    pub from_scene_id: SceneId,
    pub choice_key: ChoiceKey,
    pub choice_text: String,
    /// The scene the choice resolved to.
    pub scene_id: SceneId,
    pub scene_title: String,
    pub died: bool,
    pub recorded_at: DateTime<Utc>,
}

/// Snapshot of the global counters and activity log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    /// Times each scene was resolved, by scene id.
    pub visit_counts: BTreeMap<String, i64>,
    pub total_choices: i64,
    pub total_players: i64,
    pub deaths: i64,
    /// Most recent first.
    pub recent_choice_history: Vec<ChoiceRecord>,
}
