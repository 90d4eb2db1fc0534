//! 영속 저장소.

pub mod snapshot;

pub use snapshot::{SnapshotStore, SpotObservation};
