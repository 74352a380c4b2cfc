//! Adventure engine: Narrative graph bounded context.
//!
//! Responsible for the scene model, the pre-authored seed graph, the
//! append-only edge-addressed scene store, and synthesis of new scenes for
//! unresolved edges (model-backed with a deterministic procedural fallback).

pub mod application;
pub mod domain;
