//! Response bodies shared by the route modules.

use adventure_narrative::domain::scene::Scene;
use adventure_player::domain::state::PlayerState;
use adventure_session::application::choice_processor::ChoiceOutcome;
use serde::Serialize;

/// What a client renders for a scene.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub background_color: String,
    pub choice_a_text: String,
    pub choice_b_text: String,
}

impl From<&Scene> for SceneView {
    fn from(scene: &Scene) -> Self {
        Self {
            id: scene.id.to_string(),
            title: scene.title.clone(),
            description: scene.description.clone(),
            background_color: scene.background_color.clone(),
            choice_a_text: scene.choices.a.text.clone(),
            choice_b_text: scene.choices.b.text.clone(),
        }
    }
}

/// Public progression fields of a player.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatsView {
    pub id: String,
    pub health: i32,
    pub max_health: i32,
    pub gold: i32,
    pub xp: i32,
    pub level: u32,
    pub items: Vec<String>,
    pub deaths: u32,
}

impl From<&PlayerState> for PlayerStatsView {
    fn from(player: &PlayerState) -> Self {
        Self {
            id: player.id.clone(),
            health: player.health,
            max_health: player.max_health,
            gold: player.gold,
            xp: player.xp,
            level: player.level(),
            items: player.items.clone(),
            deaths: player.deaths,
        }
    }
}

/// A player and the scene they stand in.
#[derive(Debug, Serialize)]
pub struct PlayerSceneResponse {
    pub scene: SceneView,
    pub player: PlayerStatsView,
}

/// Result of resolving a choice. `scene` is where the player now stands;
/// after a death that is the start scene rather than `resolved_scene_id`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceResponse {
    pub scene: SceneView,
    pub player: PlayerStatsView,
    pub resolved_scene_id: String,
    pub died: bool,
}

impl From<&ChoiceOutcome> for ChoiceResponse {
    fn from(outcome: &ChoiceOutcome) -> Self {
        Self {
            scene: SceneView::from(&outcome.current_scene),
            player: PlayerStatsView::from(&outcome.player),
            resolved_scene_id: outcome.scene.id.to_string(),
            died: outcome.died,
        }
    }
}
