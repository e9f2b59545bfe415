//! Test helpers: temporary staging and destination directories.
//!
//! Run from workspace root: `cargo test -p intake-processing`.

#![allow(dead_code)]

pub mod fixtures;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use intake_core::{FixedClock, StaticHostLimit};
use intake_processing::{UploadDescriptor, UploadValidator};
use tempfile::TempDir;

/// Clock reading used by every helper-built validator
pub const TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Host ceiling of 8 MiB
pub const TEST_CEILING: u64 = 8 * 1024 * 1024;

/// Staging area plus destination root, removed on drop.
pub struct TestStorage {
    pub temp_dir: TempDir,
    pub staging: PathBuf,
    pub base_path: PathBuf,
}

impl TestStorage {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let staging = temp_dir.path().join("staging");
        fs::create_dir_all(&staging).expect("Failed to create staging directory");
        let base_path = temp_dir.path().join("uploads");
        Self {
            temp_dir,
            staging,
            base_path,
        }
    }

    /// Write `data` to a staged file and describe it as the client named it
    pub fn stage(&self, declared_name: &str, data: &[u8]) -> UploadDescriptor {
        let temp_location = self
            .staging
            .join(format!("php_{}", declared_name.replace(['/', '\\'], "_")));
        fs::write(&temp_location, data).expect("Failed to stage upload");
        UploadDescriptor::new(declared_name, temp_location, data.len() as u64)
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.base_path.join(relative)
    }
}

impl Default for TestStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// Validator with a fixed clock and an 8 MiB ceiling, persisting under `destination`
pub fn test_validator(destination: &Path) -> UploadValidator {
    let mut validator = UploadValidator::new(Arc::new(StaticHostLimit(TEST_CEILING)))
        .expect("static ceiling")
        .with_clock(Arc::new(FixedClock::from_timestamp(TEST_TIMESTAMP)));
    validator.set_destination(destination);
    validator
}
