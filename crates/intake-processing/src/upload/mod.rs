//! Upload descriptors and the per-attempt state machine.

pub mod types;

pub use types::{ResolvedUpload, UploadDescriptor, UploadForm, UploadState};
