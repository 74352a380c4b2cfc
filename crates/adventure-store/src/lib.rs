//! Adventure Store: implementations of the `KeyValueStore` contract.
//!
//! `PgStore` is the durable backend; `MemoryStore` keeps everything in
//! process and is used for local play and tests.

pub mod memory_store;
pub mod pg_store;
pub mod schema;

pub use memory_store::MemoryStore;
pub use pg_store::PgStore;
