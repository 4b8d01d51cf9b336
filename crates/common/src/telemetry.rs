use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Settings for log output.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    /// Default level when RUST_LOG is unset (trace, debug, info, warn, error).
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones.
    pub json_output: bool,
}

/// Installs the global tracing subscriber: EnvFilter plus a fmt layer.
///
/// RUST_LOG takes precedence over the configured level. Calling this twice
/// fails, so it belongs in main only.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.json_output {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?;
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()?;
    }
    tracing::debug!(service = %config.service_name, "telemetry initialized");
    Ok(())
}
