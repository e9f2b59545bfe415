//! Error types module
//!
//! All upload failures are unified under the `UploadError` enum. Validation
//! rejections, filesystem failures, misuse of the upload state machine and
//! failures surfaced by the image collaborator are all plain values returned
//! to the caller; nothing in this workspace is fatal to the process.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for caller mistakes like out-of-order calls
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be reported
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "OVERSIZED_UPLOAD")
    fn error_code(&self) -> &'static str;

    /// Whether the caller can retry with corrected input
    fn is_recoverable(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Filesystem step that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsOperation {
    CreateDir,
    Move,
    Chmod,
    Write,
}

impl fmt::Display for FsOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FsOperation::CreateDir => "create directory",
            FsOperation::Move => "move",
            FsOperation::Chmod => "set permissions",
            FsOperation::Write => "write",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("File too large: {size} bytes (limit: {limit} bytes)")]
    OversizedUpload { size: u64, limit: u64 },

    #[error("Disallowed file extension: {extension} (allowed: {allowed:?})")]
    DisallowedExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Malformed filename (no extension): {0}")]
    MalformedFilename(String),

    #[error("Upload form has no entry for field '{0}'")]
    MissingField(String),

    #[error("Host upload ceiling is unparseable: {0:?}")]
    HostCeilingUnparseable(String),

    #[error("Size limit {requested} bytes is not below the host ceiling of {ceiling} bytes")]
    SizeLimitAboveCeiling { requested: u64, ceiling: u64 },

    #[error("Invalid size unit: {0}")]
    InvalidSizeUnit(String),

    #[error("Failed to {op} {}: {source}", path.display())]
    Filesystem {
        op: FsOperation,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot {operation} while upload is {state}")]
    PreconditionViolation {
        operation: &'static str,
        state: &'static str,
    },

    #[error("Image decode failed: {0}")]
    DecodeFailure(#[source] anyhow::Error),

    #[error("Image resize failed: {0}")]
    ResizeFailure(#[source] anyhow::Error),

    #[error("Image encode failed: {0}")]
    EncodeFailure(#[source] anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for upload operations
pub type UploadResult<T> = Result<T, UploadError>;

impl UploadError {
    pub fn filesystem(op: FsOperation, path: impl Into<PathBuf>, source: io::Error) -> Self {
        UploadError::Filesystem {
            op,
            path: path.into(),
            source,
        }
    }

    /// True for the two validation outcomes `load` is expected to produce
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            UploadError::OversizedUpload { .. }
                | UploadError::DisallowedExtension { .. }
                | UploadError::MalformedFilename(_)
        )
    }
}

impl From<envy::Error> for UploadError {
    fn from(err: envy::Error) -> Self {
        UploadError::Config(err.to_string())
    }
}

impl ErrorMetadata for UploadError {
    fn error_code(&self) -> &'static str {
        match self {
            UploadError::OversizedUpload { .. } => "OVERSIZED_UPLOAD",
            UploadError::DisallowedExtension { .. } => "DISALLOWED_EXTENSION",
            UploadError::MalformedFilename(_) => "MALFORMED_FILENAME",
            UploadError::MissingField(_) => "MISSING_FIELD",
            UploadError::HostCeilingUnparseable(_) => "HOST_CEILING_UNPARSEABLE",
            UploadError::SizeLimitAboveCeiling { .. } => "SIZE_LIMIT_ABOVE_CEILING",
            UploadError::InvalidSizeUnit(_) => "INVALID_SIZE_UNIT",
            UploadError::Filesystem { .. } => "FILESYSTEM_FAILURE",
            UploadError::PreconditionViolation { .. } => "PRECONDITION_VIOLATION",
            UploadError::DecodeFailure(_) => "DECODE_FAILURE",
            UploadError::ResizeFailure(_) => "RESIZE_FAILURE",
            UploadError::EncodeFailure(_) => "ENCODE_FAILURE",
            UploadError::Config(_) => "CONFIG_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            UploadError::OversizedUpload { .. }
                | UploadError::DisallowedExtension { .. }
                | UploadError::MalformedFilename(_)
                | UploadError::MissingField(_)
                | UploadError::SizeLimitAboveCeiling { .. }
                | UploadError::InvalidSizeUnit(_)
        )
    }

    fn log_level(&self) -> LogLevel {
        match self {
            UploadError::OversizedUpload { .. }
            | UploadError::DisallowedExtension { .. }
            | UploadError::MalformedFilename(_)
            | UploadError::MissingField(_)
            | UploadError::SizeLimitAboveCeiling { .. }
            | UploadError::InvalidSizeUnit(_) => LogLevel::Debug,
            UploadError::PreconditionViolation { .. }
            | UploadError::HostCeilingUnparseable(_)
            | UploadError::DecodeFailure(_)
            | UploadError::ResizeFailure(_) => LogLevel::Warn,
            UploadError::Filesystem { .. }
            | UploadError::EncodeFailure(_)
            | UploadError::Config(_) => LogLevel::Error,
        }
    }
}

/// Log `error` at the level its metadata assigns
pub fn log_error(error: &UploadError) {
    let error_code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_code = error_code, "Upload error");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_code = error_code, "Upload error");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_code = error_code, "Upload error");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn captured(error: &UploadError) -> String {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || log_error(error));
        let bytes = logs.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_log_error_uses_metadata_level() {
        let rejection = captured(&UploadError::MissingField("file".to_string()));
        assert!(rejection.contains("DEBUG"));
        assert!(rejection.contains("MISSING_FIELD"));

        let misuse = captured(&UploadError::PreconditionViolation {
            operation: "persist",
            state: "empty",
        });
        assert!(misuse.contains("WARN"));

        let io_failure = captured(&UploadError::filesystem(
            FsOperation::Chmod,
            "/srv/a.txt",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        ));
        assert!(io_failure.contains("ERROR"));
        assert!(io_failure.contains("FILESYSTEM_FAILURE"));
    }

    #[test]
    fn test_rejections_are_recoverable_debug() {
        let err = UploadError::OversizedUpload {
            size: 10,
            limit: 5,
        };
        assert!(err.is_rejection());
        assert!(err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Debug);
        assert_eq!(err.error_code(), "OVERSIZED_UPLOAD");
    }

    #[test]
    fn test_filesystem_error_display() {
        let err = UploadError::filesystem(
            FsOperation::Move,
            "/srv/uploads/a.jpg",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.to_string(), "Failed to move /srv/uploads/a.jpg: gone");
        assert!(!err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_precondition_violation_display() {
        let err = UploadError::PreconditionViolation {
            operation: "persist",
            state: "empty",
        };
        assert_eq!(err.to_string(), "Cannot persist while upload is empty");
        assert_eq!(err.error_code(), "PRECONDITION_VIOLATION");
    }
}
