//! Application layer for the Session context.

pub mod choice_processor;
pub mod query_handlers;
