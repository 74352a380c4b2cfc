//! Adventure engine: Session bounded context.
//!
//! Orchestrates one choice end to end: resolve the chosen edge (from the
//! scene graph or by generating and binding a new scene), move the player
//! along it under optimistic concurrency, then update the global statistics.

pub mod application;
pub mod domain;
