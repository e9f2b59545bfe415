//! Host upload ceiling
//!
//! The ceiling is the largest upload the hosting environment accepts. It is
//! configured as an `upload_max_filesize`-style string such as `"8M"` or `"2G"`.

use std::env;

use crate::config::ENV_PREFIX;
use crate::error::{UploadError, UploadResult};
use crate::units::SizeUnit;

/// Ceiling used when nothing is configured
pub const DEFAULT_HOST_CEILING: &str = "2M";

/// Source of the host's maximum accepted upload size
pub trait HostLimitProvider: Send + Sync {
    /// Maximum accepted upload size in bytes
    fn ceiling_bytes(&self) -> UploadResult<u64>;
}

/// Fixed ceiling, mainly for tests and embedding callers
#[derive(Debug, Clone, Copy)]
pub struct StaticHostLimit(pub u64);

impl HostLimitProvider for StaticHostLimit {
    fn ceiling_bytes(&self) -> UploadResult<u64> {
        Ok(self.0)
    }
}

/// Ceiling given as a size string, parsed on every lookup
#[derive(Debug, Clone)]
pub struct ConfiguredHostLimit(pub String);

impl HostLimitProvider for ConfiguredHostLimit {
    fn ceiling_bytes(&self) -> UploadResult<u64> {
        parse_size_limit(&self.0)
    }
}

/// Ceiling read from `INTAKE_UPLOAD_MAX_FILESIZE`, looked up on every call.
///
/// Falls back to `"2M"` when the variable is unset.
#[derive(Debug, Clone)]
pub struct EnvHostLimit {
    var: String,
}

impl Default for EnvHostLimit {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvHostLimit {
    pub const VAR: &'static str = "UPLOAD_MAX_FILESIZE";

    pub fn new() -> Self {
        Self {
            var: format!("{}{}", ENV_PREFIX, Self::VAR),
        }
    }

    /// Read the ceiling from `var` instead
    pub fn with_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl HostLimitProvider for EnvHostLimit {
    fn ceiling_bytes(&self) -> UploadResult<u64> {
        dotenvy::dotenv().ok();
        let raw = env::var(&self.var).unwrap_or_else(|_| DEFAULT_HOST_CEILING.to_string());
        parse_size_limit(&raw)
    }
}

/// Parse a size string with a trailing `K`/`M`/`G`/`T` suffix into bytes.
///
/// A number without a recognised suffix yields 0, so every upload is rejected.
/// A string that does not start with digits is `HostCeilingUnparseable`.
pub fn parse_size_limit(raw: &str) -> UploadResult<u64> {
    let trimmed = raw.trim();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, suffix) = trimmed.split_at(digits_end);

    let value: u64 = digits
        .parse()
        .map_err(|_| UploadError::HostCeilingUnparseable(raw.to_string()))?;

    let unit = match suffix.to_uppercase().as_str() {
        "K" => SizeUnit::KB,
        "M" => SizeUnit::MB,
        "G" => SizeUnit::GB,
        "T" => SizeUnit::TB,
        _ => {
            tracing::warn!(
                ceiling = %raw,
                "Host upload ceiling has no recognised unit suffix, rejecting all uploads"
            );
            return Ok(0);
        }
    };

    unit.to_bytes(value)
        .ok_or_else(|| UploadError::HostCeilingUnparseable(raw.to_string()))
}
