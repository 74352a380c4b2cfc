//! Untrusted scene drafts and their validation.
//!
//! A draft is the shape requested from the story model. Nothing derived from
//! a draft may reach the scene graph until `SceneDraft::validate` accepts it.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::scene::StatDelta;

/// Accepted health delta per choice.
pub const HEALTH_DELTA_BOUNDS: RangeInclusive<i32> = -50..=50;
/// Accepted gold delta per choice.
pub const GOLD_DELTA_BOUNDS: RangeInclusive<i32> = -20..=50;
/// Accepted experience delta per choice.
pub const XP_DELTA_BOUNDS: RangeInclusive<i32> = 0..=50;

const MAX_TITLE_CHARS: usize = 80;
const MAX_DESCRIPTION_CHARS: usize = 600;
const MAX_SUMMARY_CHARS: usize = 400;
const MAX_CHOICE_CHARS: usize = 80;
const MAX_ITEM_CHARS: usize = 40;

/// Why a draft was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftRejection {
    /// The response was not the requested JSON object.
    #[error("malformed draft: {0}")]
    Malformed(String),

    /// A required text field was blank.
    #[error("field {0} is empty")]
    Empty(&'static str),

    /// A text field exceeded its length limit.
    #[error("field {field} exceeds {max} characters")]
    TooLong {
        /// Offending field.
        field: &'static str,
        /// Character limit.
        max: usize,
    },

    /// The background colour is not `#RRGGBB`.
    #[error("background colour {0:?} is not a #RRGGBB hex colour")]
    BadColor(String),

    /// A stat delta lies outside its accepted range.
    #[error("{field} delta {value} outside [{min}, {max}]")]
    OutOfBounds {
        /// Offending field.
        field: &'static str,
        /// Value supplied.
        value: i32,
        /// Lower bound.
        min: i32,
        /// Upper bound.
        max: i32,
    },
}

/// One branch of a drafted scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceDraft {
    /// Text shown to the player.
    pub text: String,
    /// Adjustment applied when this branch is taken.
    #[serde(default)]
    pub stat_delta: StatDelta,
}

/// Scene content produced by a generator, before it becomes a `Scene`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDraft {
    /// Heading.
    pub title: String,
    /// Body text.
    pub description: String,
    /// What happened on the way into the scene.
    pub summary: String,
    /// `#RRGGBB` background colour.
    pub background_color: String,
    /// Branch `a`.
    pub choice_a: ChoiceDraft,
    /// Branch `b`.
    pub choice_b: ChoiceDraft,
}

impl SceneDraft {
    /// Parses a story-model reply into a validated draft.
    ///
    /// Models sometimes wrap the object in prose or code fences; the outermost
    /// `{ ... }` span is taken as the payload.
    ///
    /// # Errors
    ///
    /// Returns `DraftRejection` if no JSON object is present, the object does
    /// not match the schema, or validation fails.
    pub fn parse(reply: &str) -> Result<Self, DraftRejection> {
        let start = reply
            .find('{')
            .ok_or_else(|| DraftRejection::Malformed("no JSON object in reply".to_owned()))?;
        let end = reply
            .rfind('}')
            .filter(|end| *end > start)
            .ok_or_else(|| DraftRejection::Malformed("unterminated JSON object".to_owned()))?;
        let draft: SceneDraft = serde_json::from_str(&reply[start..=end])
            .map_err(|e| DraftRejection::Malformed(e.to_string()))?;
        draft.validate()
    }

    /// Checks every field against the schema bounds, trimming surrounding
    /// whitespace from text fields.
    ///
    /// # Errors
    ///
    /// Returns the first `DraftRejection` found.
    pub fn validate(self) -> Result<Self, DraftRejection> {
        let title = text("title", self.title, MAX_TITLE_CHARS)?;
        let description = text("description", self.description, MAX_DESCRIPTION_CHARS)?;
        let summary = text("summary", self.summary, MAX_SUMMARY_CHARS)?;
        let background_color = self.background_color.trim().to_owned();
        if !is_hex_color(&background_color) {
            return Err(DraftRejection::BadColor(background_color));
        }
        Ok(Self {
            title,
            description,
            summary,
            background_color,
            choice_a: choice("choiceA.text", self.choice_a)?,
            choice_b: choice("choiceB.text", self.choice_b)?,
        })
    }
}

fn text(field: &'static str, value: String, max: usize) -> Result<String, DraftRejection> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DraftRejection::Empty(field));
    }
    if trimmed.chars().count() > max {
        return Err(DraftRejection::TooLong { field, max });
    }
    Ok(trimmed.to_owned())
}

fn choice(field: &'static str, draft: ChoiceDraft) -> Result<ChoiceDraft, DraftRejection> {
    let text = text(field, draft.text, MAX_CHOICE_CHARS)?;
    let delta = draft.stat_delta;
    bounded("health", delta.health, &HEALTH_DELTA_BOUNDS)?;
    bounded("gold", delta.gold, &GOLD_DELTA_BOUNDS)?;
    bounded("xp", delta.xp, &XP_DELTA_BOUNDS)?;
    let item = match delta.item {
        Some(item) if item.trim().is_empty() => None,
        Some(item) => Some(self::text("item", item, MAX_ITEM_CHARS)?),
        None => None,
    };
    Ok(ChoiceDraft {
        text,
        stat_delta: StatDelta { item, ..delta },
    })
}

fn bounded(
    field: &'static str,
    value: i32,
    bounds: &RangeInclusive<i32>,
) -> Result<(), DraftRejection> {
    if bounds.contains(&value) {
        Ok(())
    } else {
        Err(DraftRejection::OutOfBounds {
            field,
            value,
            min: *bounds.start(),
            max: *bounds.end(),
        })
    }
}

/// Whether `value` is a `#RRGGBB` colour.
#[must_use]
pub fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}
