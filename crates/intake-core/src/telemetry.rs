use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "intake=debug";

/// Initialize tracing with an env filter and a fmt layer.
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(default_filter: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let fallback = default_filter.unwrap_or(DEFAULT_FILTER).to_string();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    tracing::debug!("Tracing initialized");
    Ok(())
}
