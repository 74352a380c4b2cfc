//! Domain model for the Narrative graph context.

pub mod draft;
pub mod procedural;
pub mod prompt;
pub mod scene;
pub mod seed;
