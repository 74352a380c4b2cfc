//! Adventure Core: shared domain abstractions.
//!
//! This crate defines the traits and types every bounded context of the
//! adventure engine depends on: the error taxonomy, the persistent store
//! contract, and the clock/RNG seams that keep scene synthesis replayable.
//! It contains no infrastructure code.

pub mod command;
pub mod determinism;
pub mod error;
pub mod store;
