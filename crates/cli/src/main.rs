use crate::{
    commands::{BookmarkCommand, Commands},
    config::SyncConfig,
    error::CliError,
    shutdown::ExitCode,
};
use clap::Parser;
use connectors::sql::mysql::adapter::MySqlAdapter;
use engine_core::{
    connectors::sink::JsonLinesSink,
    state::{BookmarkStore, sled_store::SledBookmarkStore},
    version::EpochMillisVersions,
};
use engine_processing::full_table::{SchemaProbe, SyncCoordinator, SyncMode};
use model::{core::identifiers::StreamId, state::bookmark::Bookmark, stream::Stream};
use serde_json::{Value as JsonValue, json};
use std::{path::Path, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "fullsync",
    version = "0.1.0",
    about = "Resumable full-table extraction from MySQL"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    // stdout carries the message stream, so logs go to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let outcome = tokio::select! {
        result = run(cli.command) => result,
        _ = shutdown::wait_for_signal() => {
            info!("Interrupted; the next sync resumes from the last checkpoint");
            std::process::exit(ExitCode::Interrupted.as_i32());
        }
    };

    if let Err(err) = outcome {
        error!("{err}");
        std::process::exit(ExitCode::GeneralError.as_i32());
    }
}

async fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Sync { config, stream } => {
            let config = SyncConfig::load(Path::new(&config)).await?;
            sync(&config, stream.as_deref()).await
        }
        Commands::Check { config } => {
            let config = SyncConfig::load(Path::new(&config)).await?;
            check(&config).await
        }
        Commands::Bookmark { command } => match command {
            BookmarkCommand::Show {
                config,
                stream,
                history,
            } => {
                let config = SyncConfig::load(Path::new(&config)).await?;
                show_bookmark(&config, &stream, history).await
            }
            BookmarkCommand::Reset { config, stream } => {
                let config = SyncConfig::load(Path::new(&config)).await?;
                let id = resolve_stream(&config, &stream)?;
                open_store(&config)?.reset(&id).await?;
                info!(stream = %id, "Bookmark reset; the next sync starts a fresh version");
                Ok(())
            }
        },
    }
}

async fn sync(config: &SyncConfig, only: Option<&str>) -> Result<(), CliError> {
    let streams = config.select_streams(only)?;
    let store = open_store(config)?;
    let adapter = Arc::new(MySqlAdapter::connect(config.source_url()?)?);

    let coordinator = SyncCoordinator::new(
        adapter.clone(),
        adapter.clone(),
        store,
        Arc::new(EpochMillisVersions::new()),
        Arc::new(JsonLinesSink::stdout()),
        config.settings(),
    );

    let outcome = sync_streams(&coordinator, &streams).await;

    drop(coordinator);
    if let Ok(adapter) = Arc::try_unwrap(adapter)
        && let Err(err) = adapter.disconnect().await
    {
        warn!("Failed to close the source pool cleanly: {err}");
    }
    outcome
}

/// Streams run one after another; the first failure stops the run.
async fn sync_streams(coordinator: &SyncCoordinator, streams: &[&Stream]) -> Result<(), CliError> {
    for stream in streams {
        match coordinator.run(stream).await {
            Ok(report) => info!(
                stream = %report.stream,
                mode = ?report.mode,
                resumed = report.resumed,
                rows = report.rows_emitted,
                version = %report.version,
                "Stream synced"
            ),
            Err(err) => {
                error!(stream = %stream.id, error = %err, "Stream sync failed");
                return Err(err.into());
            }
        }
    }
    Ok(())
}

async fn check(config: &SyncConfig) -> Result<(), CliError> {
    let adapter = MySqlAdapter::connect(config.source_url()?)?;
    let probe = SchemaProbe::new(&adapter);

    let mut report = Vec::with_capacity(config.streams.len());
    for stream in &config.streams {
        let mode = if probe.detect_ordered_pagination(stream).await {
            SyncMode::Paginated
        } else {
            SyncMode::SinglePass
        };
        report.push(json!({
            "stream": stream.id.as_str(),
            "table": format!("{}.{}", stream.database, stream.table),
            "key_columns": stream.key_columns,
            "mode": format!("{mode:?}"),
            "fails_without_pagination": stream.require_pagination && mode == SyncMode::SinglePass,
        }));
    }

    adapter.disconnect().await?;
    output::print_json(&report)
}

async fn show_bookmark(config: &SyncConfig, stream: &str, history: bool) -> Result<(), CliError> {
    let id = resolve_stream(config, stream)?;
    let store = open_store(config)?;

    let raw = store.load_bookmark(&id).await?.unwrap_or(JsonValue::Null);
    let loaded = Bookmark::load(&raw);
    for repair in &loaded.repairs {
        warn!(stream = %id, repair = %repair, "Persisted bookmark needs repair on next load");
    }
    output::print_json(&loaded.bookmark.to_json())?;

    if history {
        let entries = store.checkpoints(&id).await?;
        output::print_checkpoints(id.as_str(), &entries);
    }
    Ok(())
}

fn resolve_stream(config: &SyncConfig, stream: &str) -> Result<StreamId, CliError> {
    let selected = config.select_streams(Some(stream))?;
    selected
        .first()
        .map(|s| s.id.clone())
        .ok_or_else(|| CliError::UnknownStream(stream.to_string()))
}

fn open_store(config: &SyncConfig) -> Result<Arc<dyn BookmarkStore>, CliError> {
    let path = config.state_dir()?;
    let store = SledBookmarkStore::open(&path).map_err(|err| {
        CliError::Unexpected(format!(
            "Failed to open bookmark store at {}: {err}",
            path.display()
        ))
    })?;
    Ok(Arc::new(store))
}
