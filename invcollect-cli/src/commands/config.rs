//! `invcollect config` command handler

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use colored::Colorize;
use serde::Serialize;
use tracing::info;

use invcollect_core::config::AgentConfig;
use invcollect_core::effective::{
    EffectiveConfig, SettingDefaults, SettingSource, resolve_effective_config,
};
use invcollect_core::error::InvcollectError;
use invcollect_core::params::decode_params;
use invcollect_core::settings::SettingsFile;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::commands::settings_path;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `config` command.
///
/// `agent` is the outcome of loading the agent config file; `validate`
/// reports a load failure instead of propagating it.
pub fn execute(
    args: ConfigArgs,
    config_path: &Path,
    agent: Result<AgentConfig, InvcollectError>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Show { params, settings } => {
            let report = show(&params, settings, &agent?)?;
            writer.render(&report)
        }
        ConfigAction::Validate => execute_validate(config_path, agent, writer),
    }
}

/// Resolve the run configuration for `params` and redact its secrets.
pub fn show(
    params: &str,
    settings: Option<PathBuf>,
    agent: &AgentConfig,
) -> Result<ConfigReport, CliError> {
    let params = decode_params(params)?;
    let explicit = settings_path(settings, agent);
    let settings_file = match &explicit {
        Some(path) => Some(path.clone()),
        None => params
            .get_non_blank("version")
            .and_then(|v| SettingsFile::default_path(v).ok()),
    };
    let config = resolve_effective_config(
        &params,
        explicit.as_deref(),
        &SettingDefaults::from_agent(agent),
    )?;
    info!(
        settings_count = config.sources.len(),
        "resolved run configuration for display"
    );

    Ok(ConfigReport {
        settings_file: settings_file.map(|p| p.display().to_string()),
        config: config.redacted(),
    })
}

fn execute_validate(
    config_path: &Path,
    agent: Result<AgentConfig, InvcollectError>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating agent configuration");

    let (valid, failure) = match agent {
        Ok(_) => (true, None),
        Err(e) => (false, Some(e)),
    };
    let report = ConfigValidationReport {
        source: config_path.display().to_string(),
        exists: config_path.exists(),
        valid,
        errors: failure.iter().map(ToString::to_string).collect(),
    };
    writer.render(&report)?;

    match failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Effective run configuration (secrets redacted).
#[derive(Debug, Serialize)]
pub struct ConfigReport {
    /// External settings file consulted (if it could be determined)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings_file: Option<String>,
    pub config: EffectiveConfig,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        let settings = self.settings_file.as_deref().unwrap_or("(none)");
        writeln!(w, "Run configuration (settings: {})", settings.bold())?;
        writeln!(w)?;

        let value = serde_json::to_value(&self.config).map_err(std::io::Error::other)?;
        let fields: BTreeMap<String, serde_json::Value> = match value {
            serde_json::Value::Object(map) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        };
        for (name, value) in &fields {
            if name == "extra" || name == "sources" {
                continue;
            }
            writeln!(w, "  {name} = {}", display_value(value))?;
        }

        writeln!(w)?;
        writeln!(w, "Sources:")?;
        for (name, source) in &self.config.sources {
            let label = match source {
                SettingSource::Parameter => "parameter".green(),
                SettingSource::File => "file".cyan(),
                SettingSource::Default => "default".dimmed(),
            };
            writeln!(w, "  {name}: {label}")?;
        }

        if !self.config.extra.is_empty() {
            writeln!(w)?;
            writeln!(w, "Parameters:")?;
            for (key, value) in &self.config.extra {
                writeln!(w, "  {key} = {value}")?;
            }
        }
        Ok(())
    }
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "(unset)".to_owned(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Agent configuration validation result.
#[derive(Debug, Serialize)]
pub struct ConfigValidationReport {
    pub source: String,
    /// A missing file is valid (defaults apply)
    pub exists: bool,
    pub valid: bool,
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Config Validation: {}", self.source.bold())?;
        if !self.exists {
            writeln!(w, "  File not found, defaults apply")?;
        }
        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }
        Ok(())
    }
}
