//! Infrastructure layer for Komorebi.
//!
//! File-backed persistence, configuration loading and versioned record
//! migration for the types defined in `komorebi-core`.

pub mod config_service;
pub mod dto;
pub mod limits_store;
pub mod paths;
pub mod storage;

pub use config_service::ConfigService;
pub use limits_store::VersionedLimitsStore;
pub use paths::KomorebiPaths;
pub use storage::{DebouncedStore, FileStore};
