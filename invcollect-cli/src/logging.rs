//! Logging initialization.
//!
//! Logs always go to stderr; stdout carries Notify lines and reports.

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use invcollect_core::config::GeneralConfig;

/// Initialize the global tracing subscriber.
///
/// Filter precedence: `RUST_LOG`, then `--log-level`, then `general.log_level`.
///
/// # Formats
///
/// * `"json"` - one JSON object per line
/// * `"pretty"` - multi-line human-readable output
pub fn init_tracing(config: &GeneralConfig, level_override: Option<&str>) -> Result<()> {
    let level = level_override.unwrap_or(&config.log_level);
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| anyhow!("invalid log level '{level}': {e}"))?,
    };

    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.log_format.as_str() {
        "json" => registry.with(layer.json().with_current_span(false)).try_init(),
        "pretty" => registry.with(layer.pretty()).try_init(),
        other => {
            return Err(anyhow!(
                "unknown log format '{other}', expected 'json' or 'pretty'"
            ));
        }
    };
    installed.map_err(|e| {
        anyhow!(
            "failed to initialize {} tracing subscriber: {e}",
            config.log_format
        )
    })
}
