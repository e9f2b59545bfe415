//! Thumbnail uploader
//!
//! Wraps an `UploadValidator` configured for image extensions and derives a
//! resized copy of the upload. The original is decoded at most once per
//! upload; the thumbnail is recomputed only when the resolution changes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, GenericImageView};
use intake_core::{UploadConfig, UploadError, UploadResult, DEFAULT_DIRECTORY};

use super::codec::{ImageCodec, ImageCrateCodec};
use super::{DEFAULT_IMAGE_EXTENSIONS, DEFAULT_THUMB_PREFIX, DEFAULT_THUMB_RESOLUTION};
use crate::upload::{ResolvedUpload, UploadDescriptor, UploadForm};
use crate::validator::UploadValidator;

/// Progress of the derived thumbnail for the current upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailState {
    Pending,
    Generated,
    Persisted(PathBuf),
}

pub struct ThumbnailUploader {
    validator: UploadValidator,
    codec: Arc<dyn ImageCodec>,
    thumb_directory: PathBuf,
    resolution: (u32, u32),
    thumb_prefix: String,
    thumb_name: Option<String>,
    /// Upload the caches below were derived from
    source_key: Option<ResolvedUpload>,
    original: Option<DynamicImage>,
    thumbnail: Option<((u32, u32), DynamicImage)>,
    state: ThumbnailState,
}

impl ThumbnailUploader {
    /// Wrap `validator`, replacing its allow-list with the image defaults
    pub fn new(mut validator: UploadValidator) -> Self {
        validator.clear_allowed_extensions();
        validator.add_allowed_extensions(DEFAULT_IMAGE_EXTENSIONS);

        Self {
            validator,
            codec: Arc::new(ImageCrateCodec::new()),
            thumb_directory: PathBuf::from(DEFAULT_DIRECTORY),
            resolution: DEFAULT_THUMB_RESOLUTION,
            thumb_prefix: DEFAULT_THUMB_PREFIX.to_string(),
            thumb_name: None,
            source_key: None,
            original: None,
            thumbnail: None,
            state: ThumbnailState::Pending,
        }
    }

    /// Build from configuration; configured extensions are added to the
    /// image defaults
    pub fn from_config(config: &UploadConfig) -> UploadResult<Self> {
        let mut uploader = Self::new(UploadValidator::from_config(config)?);
        if let Some(extra) = &config.allowed_extensions {
            uploader
                .validator
                .add_allowed_extensions(extra.iter().cloned());
        }
        uploader.thumb_directory = config.thumb_directory.clone();
        uploader.resolution = config.thumb_resolution();
        uploader.thumb_prefix = config.thumb_prefix.clone();
        Ok(uploader)
    }

    pub fn with_codec(mut self, codec: Arc<dyn ImageCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn validator(&self) -> &UploadValidator {
        &self.validator
    }

    pub fn validator_mut(&mut self) -> &mut UploadValidator {
        &mut self.validator
    }

    // Original image

    pub fn load_image(&mut self, descriptor: &UploadDescriptor) -> UploadResult<ResolvedUpload> {
        self.reset_derived();
        self.validator.load(descriptor)
    }

    pub fn load_form(
        &mut self,
        form: &UploadForm,
        field_name: Option<&str>,
    ) -> UploadResult<ResolvedUpload> {
        self.reset_derived();
        self.validator.load_form(form, field_name)
    }

    pub fn set_image_path(&mut self, destination: impl Into<PathBuf>) {
        self.validator.set_destination(destination);
    }

    /// Persist the original upload
    pub fn upload_original(&mut self) -> UploadResult<PathBuf> {
        self.validator.persist()
    }

    // Thumbnail settings

    pub fn thumb_directory(&self) -> &Path {
        &self.thumb_directory
    }

    pub fn set_thumb_directory(&mut self, directory: impl Into<PathBuf>) {
        self.thumb_directory = directory.into();
    }

    pub fn thumb_resolution(&self) -> (u32, u32) {
        self.resolution
    }

    pub fn set_thumb_resolution(&mut self, width: u32, height: u32) {
        self.resolution = (width, height);
    }

    pub fn reset_thumb_resolution(&mut self) {
        self.resolution = DEFAULT_THUMB_RESOLUTION;
    }

    /// Name the thumbnail `<prefix><generated name>`; `None` uses the
    /// configured prefix (`"thumb_"` by default)
    pub fn set_thumb_name(&mut self, prefix: Option<&str>) -> UploadResult<&str> {
        self.sync_with_upload();

        let generated = self.validator.generated_name().ok_or_else(|| {
            UploadError::PreconditionViolation {
                operation: "name thumbnail",
                state: self.validator.state().name(),
            }
        })?;
        let name = format!("{}{}", prefix.unwrap_or(self.thumb_prefix.as_str()), generated);

        Ok(self.thumb_name.insert(name).as_str())
    }

    pub fn thumb_name(&self) -> Option<&str> {
        self.thumb_name.as_deref()
    }

    pub fn thumb_full_path(&self) -> Option<PathBuf> {
        self.thumb_name
            .as_ref()
            .map(|name| self.thumb_directory.join(name))
    }

    pub fn state(&self) -> &ThumbnailState {
        &self.state
    }

    pub fn original_image(&self) -> Option<&DynamicImage> {
        self.original.as_ref()
    }

    pub fn thumbnail(&self) -> Option<&DynamicImage> {
        self.thumbnail.as_ref().map(|(_, thumb)| thumb)
    }

    // Generation

    /// Decode the original if needed and resize it to the current resolution.
    ///
    /// Decodes from the persisted file when the original has been uploaded,
    /// otherwise from the staged file.
    pub fn generate_thumbnail(&mut self) -> UploadResult<&DynamicImage> {
        self.sync_with_upload();

        let source = self
            .validator
            .current_path()
            .map(Path::to_path_buf)
            .ok_or_else(|| UploadError::PreconditionViolation {
                operation: "generate thumbnail",
                state: self.validator.state().name(),
            })?;

        let original = match self.original.take() {
            Some(img) => img,
            None => self
                .codec
                .decode(&source)
                .map_err(UploadError::DecodeFailure)?,
        };
        let original = self.original.insert(original);

        let thumbnail = match self.thumbnail.take() {
            Some((resolution, thumb)) if resolution == self.resolution => thumb,
            _ => {
                let (width, height) = self.resolution;
                let thumb = self
                    .codec
                    .resize(original, width, height)
                    .map_err(UploadError::ResizeFailure)?;
                tracing::debug!(
                    source = %source.display(),
                    original_dimensions = ?original.dimensions(),
                    thumb_dimensions = ?thumb.dimensions(),
                    "Generated thumbnail"
                );
                self.state = ThumbnailState::Generated;
                thumb
            }
        };

        let (_, thumb) = self.thumbnail.insert((self.resolution, thumbnail));
        Ok(thumb)
    }

    /// Generate (if needed), name (if needed) and write the thumbnail into
    /// the thumbnail directory. Nothing is retried.
    pub fn upload_thumbnail(&mut self) -> UploadResult<PathBuf> {
        self.generate_thumbnail()?;

        let name = match &self.thumb_name {
            Some(name) => name.clone(),
            None => self.set_thumb_name(None)?.to_string(),
        };

        let store = self.validator.store();
        store.ensure_dir(&self.thumb_directory)?;
        let path = self.thumb_directory.join(&name);

        let Some((_, thumb)) = &self.thumbnail else {
            return Err(UploadError::PreconditionViolation {
                operation: "upload thumbnail",
                state: "pending",
            });
        };
        let bytes = self
            .codec
            .encode(thumb, &path)
            .map_err(UploadError::EncodeFailure)?;
        store.write(&path, &bytes)?;

        tracing::info!(
            path = %path.display(),
            size_bytes = bytes.len(),
            "Thumbnail persisted"
        );

        self.state = ThumbnailState::Persisted(path.clone());
        Ok(path)
    }

    /// Drop caches derived from a different upload than the one now loaded.
    ///
    /// Loads and renames made through `validator_mut` are picked up here, so
    /// a rename also recomputes the thumbnail name.
    fn sync_with_upload(&mut self) {
        if self.validator.upload() != self.source_key.as_ref() {
            self.reset_derived();
            self.source_key = self.validator.upload().cloned();
        }
    }

    fn reset_derived(&mut self) {
        self.thumb_name = None;
        self.source_key = None;
        self.original = None;
        self.thumbnail = None;
        self.state = ThumbnailState::Pending;
    }
}
