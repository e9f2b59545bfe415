//! Image uploads
//!
//! This module provides:
//! - The image collaborator seam (codec): decode, resize, encode
//! - `ThumbnailUploader`, which wraps an `UploadValidator` and persists a
//!   resized copy of the uploaded image

pub mod codec;
pub mod thumbnail;

pub use codec::{ImageCodec, ImageCrateCodec};
pub use thumbnail::{ThumbnailState, ThumbnailUploader};

/// Extensions accepted by a fresh `ThumbnailUploader`
pub const DEFAULT_IMAGE_EXTENSIONS: [&str; 4] = [".jpg", ".png", ".gif", ".bmp"];
/// Thumbnail bounding box used when none is set
pub const DEFAULT_THUMB_RESOLUTION: (u32, u32) = (800, 600);
pub const DEFAULT_THUMB_PREFIX: &str = "thumb_";
