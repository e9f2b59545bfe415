//! Storage abstraction trait

use std::path::Path;

use intake_core::UploadResult;

/// Filesystem operations needed to persist an upload.
///
/// Implementations block until the operation completes; there is no
/// timeout or cancellation.
pub trait FileStore: Send + Sync {
    /// Create `dir` and any missing parents
    fn ensure_dir(&self, dir: &Path) -> UploadResult<()>;

    /// Move already-staged bytes to `destination` and normalize permissions.
    ///
    /// Permissions are only touched once the move has succeeded.
    fn move_into(&self, staged: &Path, destination: &Path) -> UploadResult<()>;

    /// Write derived bytes to `destination` and normalize permissions
    fn write(&self, destination: &Path, data: &[u8]) -> UploadResult<()>;
}
