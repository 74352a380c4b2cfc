//! Domain layer for the Player context.

pub mod state;
