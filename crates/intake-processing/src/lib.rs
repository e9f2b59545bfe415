//! Intake Processing Library
//!
//! Upload validation and persistence (`UploadValidator`) and image uploads
//! with derived thumbnails (`ThumbnailUploader`).
//!
//! Each instance handles a single upload attempt at a time and is not meant
//! to be shared across threads while an upload is in flight.

#[cfg(feature = "image")]
pub mod image;
pub mod upload;
pub mod validator;

// Re-export commonly used types
#[cfg(feature = "image")]
pub use self::image::{ImageCodec, ImageCrateCodec, ThumbnailState, ThumbnailUploader};
pub use intake_core::{SizeUnit, UploadConfig, UploadError, UploadResult};
pub use upload::{ResolvedUpload, UploadDescriptor, UploadForm, UploadState};
pub use validator::UploadValidator;
