//! Persistent key-value backends.
//!
//! # Module Structure
//!
//! - `atomic_file`: tmp-file + rename writes
//! - `file_store`: [`FileStore`], one JSON file per key
//! - `debounced`: [`DebouncedStore`], coalesces writes per key

mod atomic_file;
mod debounced;
mod file_store;

pub use atomic_file::AtomicFile;
pub use debounced::DebouncedStore;
pub use file_store::FileStore;
