//! Upload validator
//!
//! Gatekeeping and persistence for a single upload: size limit, allowed
//! extensions, collision-resistant naming and the final move into the
//! destination directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use intake_core::{
    log_error, Clock, FsOperation, HostLimitProvider, SizeUnit, SystemClock, UploadConfig,
    UploadError, UploadResult, DEFAULT_DIRECTORY, DEFAULT_FIELD_NAME,
};
use intake_storage::{FileStore, LocalFileStore};

use crate::upload::{ResolvedUpload, UploadDescriptor, UploadForm, UploadState};

/// Validates and persists one upload at a time.
///
/// Extension matching is case-sensitive: `".JPG"` does not match `".jpg"`.
pub struct UploadValidator {
    host_limit: Arc<dyn HostLimitProvider>,
    clock: Arc<dyn Clock>,
    store: Arc<dyn FileStore>,
    size_limit: u64,
    /// `None` accepts every extension; an empty list accepts none
    allowed_extensions: Option<Vec<String>>,
    destination: PathBuf,
    field_name: String,
    state: UploadState,
}

impl std::fmt::Debug for UploadValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadValidator")
            .field("size_limit", &self.size_limit)
            .field("allowed_extensions", &self.allowed_extensions)
            .field("destination", &self.destination)
            .field("field_name", &self.field_name)
            .field("state", &self.state.name())
            .finish()
    }
}

impl UploadValidator {
    /// Create a validator whose size limit starts at the host ceiling
    pub fn new(host_limit: Arc<dyn HostLimitProvider>) -> UploadResult<Self> {
        let size_limit = host_limit.ceiling_bytes()?;
        Ok(Self {
            host_limit,
            clock: Arc::new(SystemClock),
            store: Arc::new(LocalFileStore::new()),
            size_limit,
            allowed_extensions: None,
            destination: PathBuf::from(DEFAULT_DIRECTORY),
            field_name: DEFAULT_FIELD_NAME.to_string(),
            state: UploadState::Empty,
        })
    }

    pub fn from_config(config: &UploadConfig) -> UploadResult<Self> {
        let mut validator = Self::new(Arc::new(config.host_limit()))?;
        validator.configure(
            config.allowed_extensions.clone(),
            Some(config.destination.clone()),
            Some(config.field_name.clone()),
        );
        Ok(validator)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn FileStore>) -> Self {
        self.store = store;
        self
    }

    /// Store used for persistence, shared with derived artifacts
    pub fn store(&self) -> Arc<dyn FileStore> {
        Arc::clone(&self.store)
    }

    /// Set the initial policy. Unset destination and field name fall back to
    /// `"../"` and `"file"`.
    pub fn configure(
        &mut self,
        allowed_extensions: Option<Vec<String>>,
        destination: Option<PathBuf>,
        field_name: Option<String>,
    ) {
        self.allowed_extensions = allowed_extensions;
        self.destination = destination.unwrap_or_else(|| PathBuf::from(DEFAULT_DIRECTORY));
        self.field_name = field_name.unwrap_or_else(|| DEFAULT_FIELD_NAME.to_string());
    }

    // Size limit

    pub fn host_ceiling(&self) -> UploadResult<u64> {
        self.host_limit.ceiling_bytes()
    }

    /// Accept a new limit only if it is strictly below the host ceiling.
    ///
    /// On rejection the previous limit is kept.
    pub fn set_size_limit(&mut self, size: u64, unit: SizeUnit) -> UploadResult<()> {
        let ceiling = self.host_limit.ceiling_bytes()?;
        let requested = unit.to_bytes(size).unwrap_or(u64::MAX);

        if requested >= ceiling {
            tracing::debug!(
                requested_bytes = requested,
                ceiling_bytes = ceiling,
                limit_bytes = self.size_limit,
                "Size limit not below host ceiling, keeping previous limit"
            );
            return Err(UploadError::SizeLimitAboveCeiling { requested, ceiling });
        }

        self.size_limit = requested;
        Ok(())
    }

    /// Reset the limit to the host ceiling
    pub fn clear_size_limit(&mut self) -> UploadResult<()> {
        self.size_limit = self.host_limit.ceiling_bytes()?;
        Ok(())
    }

    pub fn size_limit(&self) -> u64 {
        self.size_limit
    }

    pub fn size_limit_in(&self, unit: SizeUnit) -> f64 {
        unit.from_bytes(self.size_limit)
    }

    // Allowed extensions

    /// Append a dot-prefixed extension. The token is not checked and
    /// duplicates are kept.
    pub fn add_allowed_extension(&mut self, extension: impl Into<String>) {
        self.allowed_extensions
            .get_or_insert_with(Vec::new)
            .push(extension.into());
    }

    pub fn add_allowed_extensions<I, S>(&mut self, extensions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list = self.allowed_extensions.get_or_insert_with(Vec::new);
        list.extend(extensions.into_iter().map(Into::into));
    }

    /// Remove the restriction entirely so every extension is accepted
    pub fn clear_allowed_extensions(&mut self) {
        self.allowed_extensions = None;
    }

    pub fn allowed_extensions(&self) -> Option<&[String]> {
        self.allowed_extensions.as_deref()
    }

    fn extension_allowed(&self, extension: &str) -> bool {
        match &self.allowed_extensions {
            Some(list) => list.iter().any(|allowed| allowed == extension),
            None => true,
        }
    }

    // Destination and field name

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn set_destination(&mut self, destination: impl Into<PathBuf>) {
        self.destination = destination.into();
    }

    /// Reset the destination to `"../"`
    pub fn clear_destination(&mut self) {
        self.destination = PathBuf::from(DEFAULT_DIRECTORY);
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn set_field_name(&mut self, field_name: impl Into<String>) {
        self.field_name = field_name.into();
    }

    // Loading

    /// Validate `descriptor` and stage it for persistence.
    ///
    /// Any previous attempt is discarded first. On rejection the validator is
    /// left in `Rejected` with no derived fields. When the upload is both too
    /// large and of a disallowed type, `OversizedUpload` is reported.
    pub fn load(&mut self, descriptor: &UploadDescriptor) -> UploadResult<ResolvedUpload> {
        self.state = UploadState::Empty;

        let original_name = basename(&descriptor.declared_name);
        let extension = match extension_of(original_name) {
            Some(extension) => extension.to_string(),
            None => {
                self.state = UploadState::Rejected;
                let err = UploadError::MalformedFilename(descriptor.declared_name.clone());
                log_error(&err);
                return Err(err);
            }
        };
        let generated_name = format!("{}_{}", self.clock.timestamp(), original_name);
        let size = descriptor.size_bytes;

        let oversized = size > self.size_limit;
        let allowed = self.extension_allowed(&extension);

        if oversized || !allowed {
            self.state = UploadState::Rejected;
            let err = if oversized {
                UploadError::OversizedUpload {
                    size,
                    limit: self.size_limit,
                }
            } else {
                UploadError::DisallowedExtension {
                    extension,
                    allowed: self.allowed_extensions.clone().unwrap_or_default(),
                }
            };
            log_error(&err);
            return Err(err);
        }

        tracing::debug!(
            declared_name = %descriptor.declared_name,
            generated_name = %generated_name,
            size_bytes = size,
            "Upload resolved"
        );

        let upload = ResolvedUpload {
            original_name: original_name.to_string(),
            extension,
            generated_name,
            size_bytes: size,
            temp_location: descriptor.temp_location.clone(),
        };
        self.state = UploadState::Resolved(upload.clone());
        Ok(upload)
    }

    /// Load the form entry under `field_name`, or the configured field name
    pub fn load_form(
        &mut self,
        form: &UploadForm,
        field_name: Option<&str>,
    ) -> UploadResult<ResolvedUpload> {
        if let Some(name) = field_name {
            self.field_name = name.to_string();
        }

        match form.get(self.field_name.as_str()) {
            Some(descriptor) => self.load(descriptor),
            None => {
                self.unload();
                let err = UploadError::MissingField(self.field_name.clone());
                log_error(&err);
                Err(err)
            }
        }
    }

    /// Discard the current attempt
    pub fn unload(&mut self) {
        self.state = UploadState::Empty;
    }

    // Renaming

    /// Rename to `<timestamp>_<base_name><extension>`.
    ///
    /// Directory components of `base_name` are dropped.
    pub fn rename(&mut self, base_name: &str) -> UploadResult<&str> {
        let timestamp = self.clock.timestamp();
        let base_name = rename_base(base_name)?;
        let upload = self.resolved_mut("rename")?;
        upload.generated_name = format!("{}_{}{}", timestamp, base_name, upload.extension);
        Ok(upload.generated_name.as_str())
    }

    /// Rename to `<base_name><extension>` with no timestamp prefix.
    ///
    /// The caller is responsible for avoiding collisions. Directory
    /// components of `base_name` are dropped.
    pub fn rename_advanced(&mut self, base_name: &str) -> UploadResult<&str> {
        let base_name = rename_base(base_name)?;
        let upload = self.resolved_mut("rename")?;
        upload.generated_name = format!("{}{}", base_name, upload.extension);
        Ok(upload.generated_name.as_str())
    }

    fn resolved_mut(&mut self, operation: &'static str) -> UploadResult<&mut ResolvedUpload> {
        match &mut self.state {
            UploadState::Resolved(upload) => Ok(upload),
            other => Err(UploadError::PreconditionViolation {
                operation,
                state: other.name(),
            }),
        }
    }

    // Persisting

    /// Move the staged bytes to `destination/generated_name`.
    ///
    /// On failure the upload stays resolved; nothing is retried. A failed
    /// permission change after the move still records the upload as
    /// persisted, since the bytes have already left the staging path.
    pub fn persist(&mut self) -> UploadResult<PathBuf> {
        let upload = match &self.state {
            UploadState::Resolved(upload) => upload.clone(),
            other => {
                return Err(UploadError::PreconditionViolation {
                    operation: "persist",
                    state: other.name(),
                })
            }
        };

        if let Err(err) = self.store.ensure_dir(&self.destination) {
            log_error(&err);
            return Err(err);
        }
        let path = self.destination.join(&upload.generated_name);

        match self.store.move_into(&upload.temp_location, &path) {
            Ok(()) => {}
            Err(
                err @ UploadError::Filesystem {
                    op: FsOperation::Chmod,
                    ..
                },
            ) => {
                log_error(&err);
                self.state = UploadState::Persisted { upload, path };
                return Err(err);
            }
            Err(err) => {
                log_error(&err);
                return Err(err);
            }
        }

        tracing::info!(
            original_name = %upload.original_name,
            path = %path.display(),
            size_bytes = upload.size_bytes,
            "Upload persisted"
        );

        self.state = UploadState::Persisted {
            upload,
            path: path.clone(),
        };
        Ok(path)
    }

    // Accessors

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn upload(&self) -> Option<&ResolvedUpload> {
        self.state.upload()
    }

    pub fn extension(&self) -> Option<&str> {
        self.upload().map(|u| u.extension.as_str())
    }

    pub fn generated_name(&self) -> Option<&str> {
        self.upload().map(|u| u.generated_name.as_str())
    }

    pub fn original_name(&self) -> Option<&str> {
        self.upload().map(|u| u.original_name.as_str())
    }

    pub fn file_size(&self) -> Option<u64> {
        self.upload().map(|u| u.size_bytes)
    }

    pub fn file_size_in(&self, unit: SizeUnit) -> Option<f64> {
        self.file_size().map(|size| unit.from_bytes(size))
    }

    /// Destination joined with the generated name
    pub fn full_path(&self) -> Option<PathBuf> {
        self.upload()
            .map(|u| self.destination.join(&u.generated_name))
    }

    /// Where the bytes currently live: the persisted path, else the staging path
    pub fn current_path(&self) -> Option<&Path> {
        match &self.state {
            UploadState::Persisted { path, .. } => Some(path),
            UploadState::Resolved(upload) => Some(&upload.temp_location),
            UploadState::Empty | UploadState::Rejected => None,
        }
    }
}

/// Last path component of a client-supplied name
fn basename(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Final path component of a caller-supplied rename base
fn rename_base(base_name: &str) -> UploadResult<&str> {
    match basename(base_name) {
        "" | "." | ".." => Err(UploadError::MalformedFilename(base_name.to_string())),
        base => Ok(base),
    }
}

/// Suffix from the last `.`, dot included
fn extension_of(name: &str) -> Option<&str> {
    if name == "." || name == ".." {
        return None;
    }
    name.rfind('.').map(|idx| &name[idx..])
}
