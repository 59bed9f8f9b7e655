use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::clipboard::NoopClipboard;
use crate::config::{self, ConfigError};
use crate::contract::{AddResponse, ListResponse, LoadMoreResponse, PinResponse};
use crate::core_service::{CoreService, ServiceError};
use crate::history::LoadMoreOutcome;
use crate::logging::{self, LoggingError};
use crate::model::{now_epoch_ms, HistoryItem, ItemId};
use crate::search::SearchMode;
use crate::settings::SettingsChange;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("service error: {0}")]
    Service(#[from] ServiceError),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    List,
    /// Pages to append; every remaining page when absent.
    More { pages: Option<usize> },
    Add { text: String, app: Option<String> },
    Search { query: String, mode: Option<SearchMode> },
    Pin { id: ItemId },
    Delete { id: ItemId },
    Clear,
    ClearAll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeOptions {
    pub config_path: Option<PathBuf>,
    pub command: CliCommand,
}

pub fn usage() -> &'static str {
    "usage: clipstack-core [--config PATH] <command>\n\
     commands:\n  \
       list\n  \
       more [PAGES]\n  \
       add TEXT [--app NAME]\n  \
       search QUERY [--mode exact|fuzzy|regexp|mixed]\n  \
       pin ID\n  \
       delete ID\n  \
       clear\n  \
       clear-all"
}

pub fn parse_cli_args(args: &[String]) -> Result<RuntimeOptions, String> {
    let mut config_path = None;
    let mut rest = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let value = iter.next().ok_or("--config requires a path")?;
                config_path = Some(PathBuf::from(value));
            }
            _ => rest.push(arg.as_str()),
        }
    }

    let Some((name, params)) = rest.split_first() else {
        return Ok(RuntimeOptions {
            config_path,
            command: CliCommand::List,
        });
    };

    let command = match *name {
        "list" => CliCommand::List,
        "more" => {
            let pages = params
                .first()
                .map(|value| {
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("invalid page count '{value}'"))
                })
                .transpose()?;
            CliCommand::More { pages }
        }
        "add" => {
            let (text, flags) = params.split_first().ok_or("add requires TEXT")?;
            let app = flag_value(flags, "--app")?;
            CliCommand::Add {
                text: (*text).to_string(),
                app,
            }
        }
        "search" => {
            let (query, flags) = params.split_first().ok_or("search requires QUERY")?;
            let mode = flag_value(flags, "--mode")?
                .map(|value| parse_search_mode(&value))
                .transpose()?;
            CliCommand::Search {
                query: (*query).to_string(),
                mode,
            }
        }
        "pin" => CliCommand::Pin {
            id: parse_id(params.first())?,
        },
        "delete" => CliCommand::Delete {
            id: parse_id(params.first())?,
        },
        "clear" => CliCommand::Clear,
        "clear-all" => CliCommand::ClearAll,
        other => return Err(format!("unknown command '{other}'\n{}", usage())),
    };

    Ok(RuntimeOptions {
        config_path,
        command,
    })
}

fn flag_value(flags: &[&str], name: &str) -> Result<Option<String>, String> {
    match flags {
        [] => Ok(None),
        [flag, value] if *flag == name => Ok(Some((*value).to_string())),
        _ => Err(format!("unexpected arguments: {}", flags.join(" "))),
    }
}

fn parse_id(value: Option<&&str>) -> Result<ItemId, String> {
    let value = value.ok_or("missing item id")?;
    value
        .parse::<ItemId>()
        .map_err(|_| format!("invalid item id '{value}'"))
}

fn parse_search_mode(value: &str) -> Result<SearchMode, String> {
    match value.to_ascii_lowercase().as_str() {
        "exact" => Ok(SearchMode::Exact),
        "fuzzy" => Ok(SearchMode::Fuzzy),
        "regexp" => Ok(SearchMode::Regexp),
        "mixed" => Ok(SearchMode::Mixed),
        _ => Err(format!("unknown search mode '{value}'")),
    }
}

pub async fn run_with_options(options: RuntimeOptions) -> Result<(), RuntimeError> {
    let config = config::load(options.config_path.as_deref())?;
    let _guard = logging::init(&config.log_dir)?;
    info!(
        config_path = %config.config_path.display(),
        db_path = %config.db_path.display(),
        command = ?options.command,
        "clipstack-core starting"
    );

    let service = CoreService::open(config, Arc::new(NoopClipboard))?;
    execute(&service, options.command).await
}

async fn execute(service: &CoreService, command: CliCommand) -> Result<(), RuntimeError> {
    match command {
        CliCommand::List => {
            service.load().await?;
            print_json(&ListResponse::from(&service.snapshot().await?))
        }
        CliCommand::More { pages } => {
            service.load().await?;
            let mut outcomes = Vec::new();
            while pages.map_or(true, |limit| outcomes.len() < limit) {
                let outcome = service.load_more().await?;
                let appended = matches!(outcome, LoadMoreOutcome::Appended(_));
                outcomes.push(LoadMoreResponse::from(outcome));
                if !appended {
                    break;
                }
            }
            let listing = ListResponse::from(&service.snapshot().await?);
            print_json(&serde_json::json!({ "pages": outcomes, "listing": listing }))
        }
        CliCommand::Add { text, app } => {
            let mut item = HistoryItem::text(&text);
            if let Some(app) = app.as_deref() {
                item = item.with_application(app);
            }
            service.load().await?;
            let id = service.add(item, now_epoch_ms()).await?;
            print_json(&AddResponse { id })
        }
        CliCommand::Search { query, mode } => {
            service.load().await?;
            if let Some(mode) = mode {
                service.apply_settings(SettingsChange::SearchMode(mode)).await?;
            }
            let snapshot = service.search_now(&query).await?;
            print_json(&ListResponse::from(&snapshot))
        }
        CliCommand::Pin { id } => {
            service.load().await?;
            let pin = service.toggle_pin(id).await?;
            print_json(&PinResponse { id, pin })
        }
        CliCommand::Delete { id } => {
            service.load().await?;
            service.delete(id).await?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
        CliCommand::Clear => {
            service.load().await?;
            service.clear().await?;
            print_json(&ListResponse::from(&service.snapshot().await?))
        }
        CliCommand::ClearAll => {
            service.load().await?;
            service.clear_all().await?;
            print_json(&ListResponse::from(&service.snapshot().await?))
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), RuntimeError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
