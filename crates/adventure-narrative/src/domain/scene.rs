//! Scene model for the Narrative graph context.

use std::fmt;
use std::str::FromStr;

use adventure_core::error::DomainError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::draft::{ChoiceDraft, SceneDraft};

/// Identifier of the pre-authored scene every player starts in.
pub const START_SCENE_ID: &str = "start";

/// Identifier of a narrative node.
///
/// Seed scenes carry authored slugs; generated scenes carry a `gen-` prefixed
/// fingerprint of their originating edge and content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(String);

impl SceneId {
    /// Wraps an identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The start scene identifier.
    #[must_use]
    pub fn start() -> Self {
        Self::new(START_SCENE_ID)
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derives the identifier of a scene generated for the edge
    /// `(origin, key)` from the edge, the generation sequence, and the
    /// scene's content.
    #[must_use]
    pub fn derived(origin: &SceneId, key: ChoiceKey, sequence: u64, draft: &SceneDraft) -> Self {
        let mut hasher = Sha256::new();
        let mut field = |bytes: &[u8]| {
            hasher.update(bytes);
            hasher.update([0u8]);
        };
        field(origin.as_str().as_bytes());
        field(key.as_str().as_bytes());
        field(&sequence.to_be_bytes());
        field(draft.title.as_bytes());
        field(draft.description.as_bytes());
        field(draft.summary.as_bytes());
        field(draft.background_color.as_bytes());
        for choice in [&draft.choice_a, &draft.choice_b] {
            field(choice.text.as_bytes());
            field(&choice.stat_delta.health.to_be_bytes());
            field(&choice.stat_delta.gold.to_be_bytes());
            field(&choice.stat_delta.xp.to_be_bytes());
            field(choice.stat_delta.item.as_deref().unwrap_or("").as_bytes());
        }
        let digest = hasher.finalize();
        let hex = format!("{digest:x}");
        Self(format!("gen-{}", &hex[..16]))
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One of the two branches leaving a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChoiceKey {
    /// The first branch.
    A,
    /// The second branch.
    B,
}

impl ChoiceKey {
    /// Both keys, in display order.
    pub const ALL: [ChoiceKey; 2] = [ChoiceKey::A, ChoiceKey::B];

    /// Returns the wire form of the key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
        }
    }
}

impl fmt::Display for ChoiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChoiceKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "a" => Ok(Self::A),
            "b" => Ok(Self::B),
            other => Err(DomainError::InvalidChoice(format!(
                "choice must be \"a\" or \"b\", got {other:?}"
            ))),
        }
    }
}

/// Signed progression adjustment applied when an edge is traversed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatDelta {
    /// Health change.
    pub health: i32,
    /// Gold change.
    pub gold: i32,
    /// Experience change.
    pub xp: i32,
    /// Item granted on traversal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
}

impl StatDelta {
    /// A delta that only changes health.
    #[must_use]
    pub fn health(health: i32) -> Self {
        Self {
            health,
            ..Self::default()
        }
    }
}

/// An outgoing branch of a scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    /// Text shown to the player.
    pub text: String,
    /// Target authored inline (seed scenes only). Generated edges are bound
    /// through the scene graph store instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leads_to: Option<SceneId>,
    /// Adjustment applied when this branch is taken.
    #[serde(default)]
    pub stat_delta: StatDelta,
}

/// Exactly two choices, keyed `a` and `b`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choices {
    /// Branch `a`.
    pub a: Choice,
    /// Branch `b`.
    pub b: Choice,
}

/// An immutable narrative node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// Scene identifier.
    pub id: SceneId,
    /// Heading shown to the player.
    pub title: String,
    /// Body text; `\n` separates rendered lines.
    pub description: String,
    /// What happened on the way into this scene.
    #[serde(default)]
    pub summary: String,
    /// `#RRGGBB` background colour.
    pub background_color: String,
    /// Outgoing branches.
    pub choices: Choices,
}

impl Scene {
    /// Builds the scene for the edge `(origin, key)` from a validated draft.
    #[must_use]
    pub fn from_draft(origin: &SceneId, key: ChoiceKey, sequence: u64, draft: SceneDraft) -> Self {
        let id = SceneId::derived(origin, key, sequence, &draft);
        let into_choice = |choice: ChoiceDraft| Choice {
            text: choice.text,
            leads_to: None,
            stat_delta: choice.stat_delta,
        };
        Self {
            id,
            title: draft.title,
            description: draft.description,
            summary: draft.summary,
            background_color: draft.background_color,
            choices: Choices {
                a: into_choice(draft.choice_a),
                b: into_choice(draft.choice_b),
            },
        }
    }

    /// Returns the branch for `key`.
    #[must_use]
    pub fn choice(&self, key: ChoiceKey) -> &Choice {
        match key {
            ChoiceKey::A => &self.choices.a,
            ChoiceKey::B => &self.choices.b,
        }
    }
}
