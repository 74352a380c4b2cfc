//! Application layer for the Player context.

pub mod repository;
