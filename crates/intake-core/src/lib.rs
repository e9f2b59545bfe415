//! Intake Core Library
//!
//! This crate provides the error taxonomy, size units, host upload ceiling,
//! clock and configuration shared by the storage and processing crates.

pub mod clock;
pub mod config;
pub mod error;
pub mod host_limit;
pub mod telemetry;
pub mod units;

// Re-export commonly used types
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{UploadConfig, DEFAULT_DIRECTORY, DEFAULT_FIELD_NAME};
pub use error::{log_error, ErrorMetadata, FsOperation, LogLevel, UploadError, UploadResult};
pub use host_limit::{
    parse_size_limit, ConfiguredHostLimit, EnvHostLimit, HostLimitProvider, StaticHostLimit,
};
pub use units::SizeUnit;
