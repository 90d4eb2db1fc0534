//! 인메모리 캐시.

pub mod snapshot;

pub use snapshot::SnapshotCache;
