//! Application services for the Narrative graph context.

pub mod generator;
pub mod scene_graph;
