//! `invcollect collect` command handler
//!
//! ```text
//! params blob -> EffectiveConfig -> GET apiUrl (+ nextLink pages)
//!     -> map_record per JSON record -> flush_to_dir(dataDir)
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use invcollect_core::config::AgentConfig;
use invcollect_core::effective::{EffectiveConfig, SettingDefaults, resolve_effective_config};
use invcollect_core::error::ConfigError;
use invcollect_core::notify::{Category, ItemResult, NotifyEvent, State};
use invcollect_core::params::decode_params;
use invcollect_http::url::split_url;
use invcollect_http::{HttpClient, HttpResult, HttpTransport, Method};
use invcollect_inventory::{EntityAccumulator, InventoryWriter};

use crate::cli::CollectArgs;
use crate::commands::settings_path;
use crate::error::CliError;
use crate::mapper::map_record;

/// Notify event name for this command
pub const EVENT_NAME: &str = "collect";

/// Members that may carry the URL of the next page
const NEXT_LINK_MEMBERS: &[&str] = &["@odata.nextLink", "nextLink"];

/// Members that may carry the record array of a page
const RECORD_MEMBERS: &[&str] = &["value", "items"];

/// Execute the `collect` command.
pub async fn execute(args: CollectArgs, agent: &AgentConfig) -> Result<(), CliError> {
    let params = decode_params(&args.params)?;
    let settings = settings_path(args.settings, agent);
    let config = resolve_effective_config(
        &params,
        settings.as_deref(),
        &SettingDefaults::from_agent(agent),
    )?;
    let client = HttpClient::from_config(&config, &agent.http)?;

    let summary = collect(&client, &config, args.url.as_deref()).await?;

    NotifyEvent::new(
        Category::Info,
        EVENT_NAME,
        format!(
            "collected {} of {} records from {} page(s)",
            summary.entities, summary.records, summary.pages
        ),
    )
    .with_item_name(&config.entity_name)
    .with_state(State::Finished)
    .with_info(summary.path.display().to_string())
    .with_item_result(ItemResult::Ok)
    .emit();
    Ok(())
}

/// Outcome of a collection run.
#[derive(Debug, Clone, Serialize)]
pub struct CollectSummary {
    pub pages: u32,
    pub records: usize,
    pub skipped: usize,
    pub entities: usize,
    pub path: PathBuf,
}

/// Walk all pages starting at `url_override` (or `apiUrl`), map every record
/// and write one inventory file into `dataDir`.
///
/// A record that cannot be mapped is reported with a Warning Notify line and
/// dropped. A failed request aborts the run.
pub async fn collect<T: HttpTransport>(
    client: &HttpClient<T>,
    config: &EffectiveConfig,
    url_override: Option<&str>,
) -> Result<CollectSummary, CliError> {
    let start_url = url_override
        .map(str::to_owned)
        .or_else(|| config.api_url.clone())
        .ok_or_else(|| ConfigError::MissingRequired {
            name: "apiUrl".to_owned(),
        })?;

    let bearer = config.api_token.as_ref().map(|t| format!("Bearer {t}"));
    let mut headers: Vec<(&str, &str)> = vec![("Accept", "application/json")];
    if let Some(bearer) = &bearer {
        headers.push(("Authorization", bearer.as_str()));
    }

    let mut acc = EntityAccumulator::new();
    let mut next = Some(start_url);
    let mut pages: u32 = 0;
    let mut records = 0usize;
    let mut skipped = 0usize;

    while let Some(url) = next.take() {
        if pages >= config.page_limit {
            warn!(page_limit = config.page_limit, next = %url, "page limit reached, stopping");
            break;
        }
        if pages > 0 && config.request_delay_seconds > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(config.request_delay_seconds)).await;
        }

        let result = client.request(Method::Get, &url, &headers, None).await?;
        pages += 1;
        let page = parse_page(&url, &result)?;

        let page_records = page_records(&page);
        info!(page = pages, records = page_records.len(), url = %url, "page fetched");
        for record in page_records {
            records += 1;
            if let Err(e) = map_record(&mut acc, &config.entity_name, record) {
                skipped += 1;
                if record.is_object() {
                    acc.discard_current();
                }
                NotifyEvent::new(Category::Warning, EVENT_NAME, format!("record skipped: {e}"))
                    .with_item_name(record_label(record))
                    .with_state(State::Executing)
                    .with_item_result(ItemResult::Error)
                    .emit();
            }
        }

        next = next_link(&page).map(|link| resolve_link(&url, link));
    }

    let entities = acc.len();
    let writer = InventoryWriter::new(&config.version, &config.agent_name)
        .use_data_namespace(config.use_data_namespace);
    let path = writer.flush_to_dir(&mut acc, &config.data_dir)?;

    info!(pages, records, skipped, entities, path = %path.display(), "collection finished");
    Ok(CollectSummary {
        pages,
        records,
        skipped,
        entities,
        path,
    })
}

fn parse_page(url: &str, result: &HttpResult) -> Result<Value, CliError> {
    if !result.is_success {
        let status = if result.status_code == 0 {
            result.status_description.clone()
        } else {
            format!("{} {}", result.status_code, result.status_description)
        };
        return Err(CliError::Request {
            url: url.to_owned(),
            status,
            message: result.body.clone(),
        });
    }
    result.json().map_err(|e| CliError::Response {
        url: url.to_owned(),
        reason: e.to_string(),
    })
}

/// Records of a page: a root array, a `value`/`items` array, or the object itself.
fn page_records(page: &Value) -> Vec<&Value> {
    if let Value::Array(items) = page {
        return items.iter().collect();
    }
    RECORD_MEMBERS
        .iter()
        .find_map(|member| page.get(*member).and_then(Value::as_array))
        .map_or_else(|| vec![page], |items| items.iter().collect())
}

fn next_link(page: &Value) -> Option<&str> {
    NEXT_LINK_MEMBERS
        .iter()
        .find_map(|member| page.get(*member).and_then(Value::as_str))
        .map(str::trim)
        .filter(|link| !link.is_empty())
}

/// Absolute links pass through; `/path` links reuse the current origin.
fn resolve_link(current: &str, link: &str) -> String {
    if link.contains("://") {
        return link.to_owned();
    }
    match split_url(current) {
        Ok(parts) if link.starts_with('/') => format!("{}{link}", parts.origin),
        Ok(parts) => format!("{}/{link}", parts.origin),
        Err(_) => link.to_owned(),
    }
}

/// Short identification of a record for Notify lines.
fn record_label(record: &Value) -> String {
    ["id", "name", "displayName"]
        .iter()
        .find_map(|member| record.get(*member))
        .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_owned))
        .unwrap_or_default()
}
