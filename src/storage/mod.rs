//! Local persistence for signed-out use.
//!
//! The planner state is one JSON document stored under a single key
//! (`operator_planner.json` in the data directory).
//!
//! # Submodules
//!
//! - [`file`] - Atomic document writes and tolerant loading
//! - [`debounce`] - Background writer that coalesces rapid snapshots

pub mod debounce;
pub mod file;

pub use debounce::{DebouncedWriter, DEFAULT_DEBOUNCE};
pub use file::{atomic_write, document_path, load_state, serialize_state, STORAGE_KEY};
