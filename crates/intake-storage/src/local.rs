use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;

use intake_core::{FsOperation, UploadError, UploadResult};

use crate::traits::FileStore;

/// Owner read/write, group and other read-only
pub const DEFAULT_FILE_MODE: u32 = 0o644;
/// Directory mode before the process umask is applied
pub const DEFAULT_DIR_MODE: u32 = 0o777;

/// Local filesystem store
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    file_mode: u32,
    dir_mode: u32,
}

impl Default for LocalFileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalFileStore {
    pub fn new() -> Self {
        Self {
            file_mode: DEFAULT_FILE_MODE,
            dir_mode: DEFAULT_DIR_MODE,
        }
    }

    /// Override the mode applied to persisted files.
    ///
    /// World-write bits are always cleared.
    pub fn with_file_mode(mut self, mode: u32) -> Self {
        self.file_mode = mode & !0o002;
        self
    }

    pub fn file_mode(&self) -> u32 {
        self.file_mode
    }

    #[cfg(unix)]
    fn normalize_permissions(&self, path: &Path) -> UploadResult<()> {
        use std::os::unix::fs::PermissionsExt;

        let perms = fs::Permissions::from_mode(self.file_mode);
        fs::set_permissions(path, perms)
            .map_err(|e| UploadError::filesystem(FsOperation::Chmod, path, e))
    }

    #[cfg(not(unix))]
    fn normalize_permissions(&self, path: &Path) -> UploadResult<()> {
        let mut perms = fs::metadata(path)
            .map_err(|e| UploadError::filesystem(FsOperation::Chmod, path, e))?
            .permissions();
        perms.set_readonly(false);
        fs::set_permissions(path, perms)
            .map_err(|e| UploadError::filesystem(FsOperation::Chmod, path, e))
    }

    /// Fallback for renames across filesystems
    fn copy_then_remove(staged: &Path, destination: &Path) -> io::Result<()> {
        if let Err(e) = fs::copy(staged, destination) {
            let _ = fs::remove_file(destination);
            return Err(e);
        }
        if let Err(e) = fs::remove_file(staged) {
            tracing::warn!(
                staged = %staged.display(),
                error = %e,
                "Copied upload but could not remove staged file"
            );
        }
        Ok(())
    }
}

impl FileStore for LocalFileStore {
    fn ensure_dir(&self, dir: &Path) -> UploadResult<()> {
        if dir.is_dir() {
            return Ok(());
        }

        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(self.dir_mode);
        }

        builder
            .create(dir)
            .map_err(|e| UploadError::filesystem(FsOperation::CreateDir, dir, e))?;

        tracing::debug!(dir = %dir.display(), "Created upload directory");
        Ok(())
    }

    fn move_into(&self, staged: &Path, destination: &Path) -> UploadResult<()> {
        let start = Instant::now();

        match fs::rename(staged, destination) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(UploadError::filesystem(FsOperation::Move, staged, e));
            }
            Err(e) => {
                tracing::debug!(
                    staged = %staged.display(),
                    error = %e,
                    "Rename failed, falling back to copy"
                );
                Self::copy_then_remove(staged, destination)
                    .map_err(|e| UploadError::filesystem(FsOperation::Move, destination, e))?;
            }
        }

        self.normalize_permissions(destination)?;

        tracing::info!(
            staged = %staged.display(),
            path = %destination.display(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local store move successful"
        );

        Ok(())
    }

    fn write(&self, destination: &Path, data: &[u8]) -> UploadResult<()> {
        let start = Instant::now();

        let mut file = fs::File::create(destination)
            .map_err(|e| UploadError::filesystem(FsOperation::Write, destination, e))?;

        file.write_all(data)
            .map_err(|e| UploadError::filesystem(FsOperation::Write, destination, e))?;

        file.sync_all()
            .map_err(|e| UploadError::filesystem(FsOperation::Write, destination, e))?;

        self.normalize_permissions(destination)?;

        tracing::info!(
            path = %destination.display(),
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local store write successful"
        );

        Ok(())
    }
}
