//! Route modules organized by resource.

pub mod choices;
pub mod health;
pub mod players;
pub mod stats;
pub mod views;
