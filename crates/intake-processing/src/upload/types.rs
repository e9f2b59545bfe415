//! Types for the upload state machine.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// A file the client has already sent and the host has staged on local disk.
///
/// Field names follow the multi-part form entry shape (`name`, `size`,
/// `tmp_name`) so a decoded form can be deserialized directly.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct UploadDescriptor {
    /// Filename as reported by the client (untrusted)
    #[serde(rename = "name")]
    pub declared_name: String,
    /// Local staging path of the received bytes
    #[serde(rename = "tmp_name")]
    pub temp_location: PathBuf,
    #[serde(rename = "size")]
    pub size_bytes: u64,
}

impl UploadDescriptor {
    pub fn new(
        declared_name: impl Into<String>,
        temp_location: impl Into<PathBuf>,
        size_bytes: u64,
    ) -> Self {
        Self {
            declared_name: declared_name.into(),
            temp_location: temp_location.into(),
            size_bytes,
        }
    }
}

/// Form entries keyed by input field name
pub type UploadForm = HashMap<String, UploadDescriptor>;

/// Derived state of an upload that passed validation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedUpload {
    /// Basename of the declared name
    pub original_name: String,
    /// Suffix after the last `.`, dot included, case preserved
    pub extension: String,
    pub generated_name: String,
    pub size_bytes: u64,
    pub temp_location: PathBuf,
}

/// Lifecycle of one upload attempt.
///
/// `Empty -> {Rejected | Resolved} -> Persisted`. `Rejected` carries no
/// derived data; the caller must load again to retry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum UploadState {
    #[default]
    Empty,
    Rejected,
    Resolved(ResolvedUpload),
    Persisted {
        upload: ResolvedUpload,
        path: PathBuf,
    },
}

impl UploadState {
    pub fn name(&self) -> &'static str {
        match self {
            UploadState::Empty => "empty",
            UploadState::Rejected => "rejected",
            UploadState::Resolved(_) => "resolved",
            UploadState::Persisted { .. } => "persisted",
        }
    }

    /// Derived data, present once validation has passed
    pub fn upload(&self) -> Option<&ResolvedUpload> {
        match self {
            UploadState::Resolved(upload) | UploadState::Persisted { upload, .. } => Some(upload),
            UploadState::Empty | UploadState::Rejected => None,
        }
    }

    pub fn persisted_path(&self) -> Option<&Path> {
        match self {
            UploadState::Persisted { path, .. } => Some(path),
            _ => None,
        }
    }
}
