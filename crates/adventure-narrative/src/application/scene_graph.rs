//! Append-only, edge-addressed scene storage.
//!
//! Scenes are written once under `scene:{id}`. The target of a generated
//! edge is written once under `edge:{origin}:{key}`; the first successful
//! write wins and is never replaced. Nothing here updates a record in place.

use std::sync::Arc;

use adventure_core::error::DomainError;
use adventure_core::store::{KeyValueStore, decode, encode, put_if_absent};
use tracing::{debug, info};

use crate::domain::scene::{ChoiceKey, Scene, SceneId};
use crate::domain::seed::SeedGraph;

/// Outcome of an attempt to bind an edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeBinding {
    /// This caller's scene is now the permanent target.
    Bound,
    /// Another caller bound the edge first; this is its target.
    AlreadyBound(SceneId),
}

fn scene_key(id: &SceneId) -> String {
    format!("scene:{id}")
}

fn edge_key(origin: &SceneId, key: ChoiceKey) -> String {
    format!("edge:{origin}:{key}")
}

/// Scene graph repository over the shared key-value store.
#[derive(Clone)]
pub struct SceneGraphStore {
    store: Arc<dyn KeyValueStore>,
}

impl SceneGraphStore {
    /// Creates a scene graph over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Loads a scene.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if the store read or decoding fails.
    pub async fn get_scene(&self, id: &SceneId) -> Result<Option<Scene>, DomainError> {
        let key = scene_key(id);
        self.store
            .get(&key)
            .await?
            .map(|record| decode(&key, record.value))
            .transpose()
    }

    /// Loads a scene that an edge or player record refers to.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the scene is missing.
    pub async fn require_scene(&self, id: &SceneId) -> Result<Scene, DomainError> {
        self.get_scene(id)
            .await?
            .ok_or_else(|| {
                DomainError::Infrastructure(format!("scene {id} is referenced but not stored"))
            })
    }

    /// Stores a scene if no scene with its id exists. Returns whether this
    /// call wrote it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if the store write fails.
    pub async fn insert_scene(&self, scene: &Scene) -> Result<bool, DomainError> {
        let key = scene_key(&scene.id);
        put_if_absent(self.store.as_ref(), &key, encode(&key, scene)?).await
    }

    /// Returns the resolved target of the edge `(origin, key)`, if any.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if the store read or decoding fails.
    pub async fn target_of(
        &self,
        origin: &Scene,
        key: ChoiceKey,
    ) -> Result<Option<SceneId>, DomainError> {
        if let Some(target) = &origin.choice(key).leads_to {
            return Ok(Some(target.clone()));
        }
        let edge = edge_key(&origin.id, key);
        self.store
            .get(&edge)
            .await?
            .map(|record| decode(&edge, record.value))
            .transpose()
    }

    /// Binds the edge `(origin, key)` to `target` unless it is already bound.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if the store write or read fails.
    pub async fn bind_edge(
        &self,
        origin: &SceneId,
        key: ChoiceKey,
        target: &SceneId,
    ) -> Result<EdgeBinding, DomainError> {
        let edge = edge_key(origin, key);
        if put_if_absent(self.store.as_ref(), &edge, encode(&edge, target)?).await? {
            return Ok(EdgeBinding::Bound);
        }
        let winner: SceneId = match self.store.get(&edge).await? {
            Some(record) => decode(&edge, record.value)?,
            None => {
                return Err(DomainError::Infrastructure(format!(
                    "edge {edge} rejected a write but has no value"
                )));
            }
        };
        debug!(%origin, %key, %winner, candidate = %target, "edge already bound");
        Ok(EdgeBinding::AlreadyBound(winner))
    }

    /// Writes every seed scene that is not stored yet. Returns how many were
    /// written.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if a store write fails.
    pub async fn load_seed(&self, seed: &SeedGraph) -> Result<usize, DomainError> {
        let mut written = 0;
        for scene in &seed.scenes {
            if self.insert_scene(scene).await? {
                written += 1;
            }
        }
        info!(written, total = seed.scenes.len(), "seed graph loaded");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use adventure_store::MemoryStore;
    use adventure_test_support::FailingStore;

    use super::*;

    fn graph() -> SceneGraphStore {
        SceneGraphStore::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_load_seed_is_idempotent() {
        // Arrange
        let graph = graph();
        let seed = SeedGraph::embedded().unwrap();

        // Act
        let first = graph.load_seed(&seed).await.unwrap();
        let second = graph.load_seed(&seed).await.unwrap();

        // Assert
        assert_eq!(first, seed.scenes.len());
        assert_eq!(second, 0);
        let start = graph.require_scene(&SceneId::start()).await.unwrap();
        assert_eq!(start.title, "The Mysterious Forest");
    }

    #[tokio::test]
    async fn test_inline_edge_resolves_without_store_record() {
        let graph = graph();
        let seed = SeedGraph::embedded().unwrap();
        graph.load_seed(&seed).await.unwrap();
        let start = graph.require_scene(&SceneId::start()).await.unwrap();

        let target = graph.target_of(&start, ChoiceKey::A).await.unwrap();

        assert_eq!(target, Some(SceneId::new("dark_path")));
    }

    #[tokio::test]
    async fn test_first_binding_wins() {
        // Arrange
        let graph = graph();
        let seed = SeedGraph::embedded().unwrap();
        graph.load_seed(&seed).await.unwrap();
        let cave = graph.require_scene(&SceneId::new("crystal_cave")).await.unwrap();
        let first = SceneId::new("gen-first");
        let second = SceneId::new("gen-second");

        // Act
        let won = graph.bind_edge(&cave.id, ChoiceKey::A, &first).await.unwrap();
        let lost = graph.bind_edge(&cave.id, ChoiceKey::A, &second).await.unwrap();

        // Assert
        assert_eq!(won, EdgeBinding::Bound);
        assert_eq!(lost, EdgeBinding::AlreadyBound(first.clone()));
        assert_eq!(graph.target_of(&cave, ChoiceKey::A).await.unwrap(), Some(first));
        assert_eq!(graph.target_of(&cave, ChoiceKey::B).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_require_scene_reports_missing_scene() {
        let graph = graph();

        let result = graph.require_scene(&SceneId::new("gen-missing")).await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }

    #[tokio::test]
    async fn test_store_failures_propagate() {
        let graph = SceneGraphStore::new(Arc::new(FailingStore));

        let result = graph.get_scene(&SceneId::start()).await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
