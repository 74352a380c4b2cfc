//! Adventure engine: story model over the Anthropic Messages API.
//!
//! `AnthropicStoryModel` implements the narrative crate's `StoryModel` seam.
//! It only moves text: schema checks and fallback stay with the generator.

mod anthropic;

pub use anthropic::{AnthropicStoryModel, DEFAULT_MODEL, LlmError};
