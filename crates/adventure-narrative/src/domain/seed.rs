//! Pre-authored seed graph.

use std::collections::HashSet;

use adventure_core::error::DomainError;
use serde::Deserialize;

use super::draft::is_hex_color;
use super::scene::{ChoiceKey, Scene, SceneId};

/// The seed graph shipped with the engine.
pub const DEFAULT_SEED_YAML: &str = include_str!("../../seed/scenes.yaml");

/// A validated set of authored scenes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedGraph {
    /// The scene new and reset players are placed in.
    pub start: SceneId,
    /// Every authored scene.
    pub scenes: Vec<Scene>,
}

impl SeedGraph {
    /// Parses and validates a YAML seed document.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the document does not parse, the
    /// start scene is missing, an id repeats, a colour is malformed, or an
    /// inline `leadsTo` names a scene outside the seed.
    pub fn from_yaml(yaml: &str) -> Result<Self, DomainError> {
        let graph: SeedGraph = serde_yaml::from_str(yaml)
            .map_err(|e| DomainError::Validation(format!("seed graph does not parse: {e}")))?;
        graph.validate()?;
        Ok(graph)
    }

    /// The embedded default seed graph.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the embedded document is invalid.
    pub fn embedded() -> Result<Self, DomainError> {
        Self::from_yaml(DEFAULT_SEED_YAML)
    }

    /// Looks up a seed scene by id.
    #[must_use]
    pub fn scene(&self, id: &SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|scene| &scene.id == id)
    }

    fn validate(&self) -> Result<(), DomainError> {
        let mut ids = HashSet::new();
        for scene in &self.scenes {
            if !ids.insert(&scene.id) {
                return Err(DomainError::Validation(format!(
                    "seed scene {} is defined twice",
                    scene.id
                )));
            }
            if scene.id.as_str().starts_with("gen-") {
                return Err(DomainError::Validation(format!(
                    "seed scene {} uses the reserved gen- prefix",
                    scene.id
                )));
            }
            if !is_hex_color(&scene.background_color) {
                return Err(DomainError::Validation(format!(
                    "seed scene {} has malformed colour {:?}",
                    scene.id, scene.background_color
                )));
            }
        }
        if !ids.contains(&self.start) {
            return Err(DomainError::Validation(format!(
                "start scene {} is not defined",
                self.start
            )));
        }
        for scene in &self.scenes {
            for key in ChoiceKey::ALL {
                if let Some(target) = &scene.choice(key).leads_to {
                    if !ids.contains(target) {
                        return Err(DomainError::Validation(format!(
                            "seed scene {} choice {key} leads to undefined scene {target}",
                            scene.id
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scene::START_SCENE_ID;

    #[test]
    fn test_embedded_seed_is_valid() {
        let graph = SeedGraph::embedded().unwrap();

        assert_eq!(graph.start.as_str(), START_SCENE_ID);
        assert!(graph.scenes.len() >= 7);
    }

    #[test]
    fn test_embedded_start_scene_leads_into_the_dark_path() {
        let graph = SeedGraph::embedded().unwrap();
        let start = graph.scene(&SceneId::start()).unwrap();

        let left = start.choice(ChoiceKey::A);
        assert_eq!(left.leads_to, Some(SceneId::new("dark_path")));
        assert_eq!(left.stat_delta.health, -10);
    }

    #[test]
    fn test_embedded_seed_leaves_leaf_edges_unresolved() {
        let graph = SeedGraph::embedded().unwrap();
        let cave = graph.scene(&SceneId::new("crystal_cave")).unwrap();

        assert!(cave.choice(ChoiceKey::A).leads_to.is_none());
        assert_eq!(
            cave.choice(ChoiceKey::A).stat_delta.item.as_deref(),
            Some("crystal shard")
        );
    }

    #[test]
    fn test_rejects_dangling_inline_edge() {
        let yaml = r##"
start: start
scenes:
  - id: start
    title: Start
    description: Begin.
    backgroundColor: "#000000"
    choices:
      a: { text: Go, leadsTo: nowhere }
      b: { text: Stay }
"##;

        match SeedGraph::from_yaml(yaml) {
            Err(DomainError::Validation(message)) => assert!(message.contains("nowhere")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_missing_start() {
        let yaml = r##"
start: somewhere
scenes:
  - id: start
    title: Start
    description: Begin.
    backgroundColor: "#000000"
    choices:
      a: { text: Go }
      b: { text: Stay }
"##;

        assert!(matches!(
            SeedGraph::from_yaml(yaml),
            Err(DomainError::Validation(_))
        ));
    }
}
