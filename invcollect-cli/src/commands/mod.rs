//! Command handlers -- one module per subcommand

use std::path::PathBuf;

use invcollect_core::config::AgentConfig;

pub mod collect;
pub mod config;
pub mod encode;

/// External settings file location: `--settings`, then `[settings] path`.
///
/// `None` means the version-scoped default location.
pub fn settings_path(explicit: Option<PathBuf>, agent: &AgentConfig) -> Option<PathBuf> {
    explicit.or_else(|| {
        let configured = agent.settings.path.trim();
        (!configured.is_empty()).then(|| PathBuf::from(configured))
    })
}
