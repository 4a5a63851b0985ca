//! Duplicate detection and resolution for browser bookmark collections.
//!
//! The store owns the tree; the engine takes point-in-time snapshots of it
//! (flatten), partitions them into duplicate classes (classify), and applies
//! best-effort bulk mutations (group, delete) followed by a reload.

pub mod bookmarks;
pub mod chromium;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod progress;
pub mod report;
pub mod store;

pub use bookmarks::{flatten, BookmarkNode, FlatBookmark, NodeKind};
pub use chromium::ChromiumFileStore;
pub use config::Settings;
pub use dedup::{find_duplicates, DuplicateClass, DuplicateIndex, ScanMode};
pub use engine::{CleanerEngine, MutationSummary};
pub use store::{BookmarkStore, MemoryStore, StoreError};
