//! Configuration module
//!
//! Upload policy read from `INTAKE_`-prefixed environment variables (a `.env`
//! file is honoured). Every field has a default so an empty environment
//! yields a usable configuration.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::UploadResult;
use crate::host_limit::{parse_size_limit, ConfiguredHostLimit, DEFAULT_HOST_CEILING};

pub const ENV_PREFIX: &str = "INTAKE_";

/// Directory used when no destination is configured
pub const DEFAULT_DIRECTORY: &str = "../";
/// Form field name used when none is configured
pub const DEFAULT_FIELD_NAME: &str = "file";

const DEFAULT_THUMB_WIDTH: u32 = 800;
const DEFAULT_THUMB_HEIGHT: u32 = 600;
const DEFAULT_THUMB_PREFIX: &str = "thumb_";

fn default_upload_max_filesize() -> String {
    DEFAULT_HOST_CEILING.to_string()
}

fn default_directory() -> PathBuf {
    PathBuf::from(DEFAULT_DIRECTORY)
}

fn default_field_name() -> String {
    DEFAULT_FIELD_NAME.to_string()
}

fn default_thumb_width() -> u32 {
    DEFAULT_THUMB_WIDTH
}

fn default_thumb_height() -> u32 {
    DEFAULT_THUMB_HEIGHT
}

fn default_thumb_prefix() -> String {
    DEFAULT_THUMB_PREFIX.to_string()
}

#[derive(Clone, Debug, Deserialize)]
pub struct UploadConfig {
    /// Host ceiling string, e.g. "8M"
    #[serde(default = "default_upload_max_filesize")]
    pub upload_max_filesize: String,
    #[serde(default = "default_directory")]
    pub destination: PathBuf,
    #[serde(default = "default_field_name")]
    pub field_name: String,
    /// Unset means every extension is accepted
    #[serde(default)]
    pub allowed_extensions: Option<Vec<String>>,
    #[serde(default = "default_directory")]
    pub thumb_directory: PathBuf,
    #[serde(default = "default_thumb_width")]
    pub thumb_width: u32,
    #[serde(default = "default_thumb_height")]
    pub thumb_height: u32,
    #[serde(default = "default_thumb_prefix")]
    pub thumb_prefix: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            upload_max_filesize: default_upload_max_filesize(),
            destination: default_directory(),
            field_name: default_field_name(),
            allowed_extensions: None,
            thumb_directory: default_directory(),
            thumb_width: DEFAULT_THUMB_WIDTH,
            thumb_height: DEFAULT_THUMB_HEIGHT,
            thumb_prefix: default_thumb_prefix(),
        }
    }
}

impl UploadConfig {
    pub fn from_env() -> UploadResult<Self> {
        dotenvy::dotenv().ok();
        let config: UploadConfig = envy::prefixed(ENV_PREFIX).from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Build from explicit `(NAME, value)` pairs using the same prefix as `from_env`
    pub fn from_vars<I>(vars: I) -> UploadResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: UploadConfig = envy::prefixed(ENV_PREFIX).from_iter(vars)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> UploadResult<()> {
        parse_size_limit(&self.upload_max_filesize)?;
        Ok(())
    }

    /// Host ceiling in bytes
    pub fn host_ceiling_bytes(&self) -> UploadResult<u64> {
        parse_size_limit(&self.upload_max_filesize)
    }

    /// Host ceiling provider backed by the configured size string
    pub fn host_limit(&self) -> ConfiguredHostLimit {
        ConfiguredHostLimit(self.upload_max_filesize.clone())
    }

    pub fn thumb_resolution(&self) -> (u32, u32) {
        (self.thumb_width, self.thumb_height)
    }
}
