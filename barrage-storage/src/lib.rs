//! Storage for barrage stress-test configs and runs
//!
//! [`StressTestStore`] is the interface the interactive client persists
//! through. Two implementations are provided: [`InMemoryStore`] for tests
//! and scratch sessions, and [`JsonFileStore`], which keeps everything in a
//! single JSON document rewritten atomically on every change.

pub mod catalog;
pub mod error;
pub mod file;
pub mod memory;
pub mod store;

#[cfg(feature = "testing")]
pub mod testing;

// Re-export main types
pub use catalog::{Catalog, DEFAULT_MAX_RUNS_PER_PROFILE};
pub use error::{StoreError, StoreResult};
pub use file::JsonFileStore;
pub use memory::InMemoryStore;
pub use store::StressTestStore;
