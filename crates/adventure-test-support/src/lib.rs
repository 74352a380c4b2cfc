//! Shared test doubles for the adventure engine.

mod clock;
mod rng;
mod store;

pub use clock::FixedClock;
pub use rng::{MockRng, SequenceRng};
pub use store::{ContendedStore, FailingStore, FlakyStore};
