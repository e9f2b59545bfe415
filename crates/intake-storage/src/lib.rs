//! Intake Storage Library
//!
//! This crate provides the filesystem seam used to persist uploads: the
//! `FileStore` trait and its local filesystem implementation.
//!
//! Persisted files are never world-writable. On unix they end up with mode
//! `0644`; directories are created recursively with `0777` minus the umask.

pub mod local;
pub mod traits;

// Re-export commonly used types
pub use intake_core::{FsOperation, UploadError, UploadResult};
pub use local::LocalFileStore;
pub use traits::FileStore;
