//! Adventure engine: Player progression bounded context.
//!
//! Owns the progression record (health, gold, experience, items, position in
//! the scene graph) and the rules that move it along an edge, including
//! death and reset. Persistence is a single versioned record per player.

pub mod application;
pub mod domain;
