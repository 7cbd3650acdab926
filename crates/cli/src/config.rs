use crate::error::CliError;
use engine_processing::full_table::SyncSettings;
use model::stream::Stream;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Overrides `source.url` so credentials can stay out of the config file.
pub const SOURCE_URL_ENV: &str = "FULLSYNC_SOURCE_URL";

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub source: SourceConfig,
    /// Directory of the sled bookmark store. Defaults to `~/.fullsync/state`.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
    #[serde(default)]
    pub batch_size: Option<usize>,
    pub streams: Vec<Stream>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceConfig {
    pub url: Option<String>,
}

impl SyncConfig {
    pub fn parse(source: &str) -> Result<Self, CliError> {
        let config: SyncConfig = serde_json::from_str(source)?;
        for (i, stream) in config.streams.iter().enumerate() {
            if config.streams[..i].iter().any(|s| s.id == stream.id) {
                return Err(CliError::Config(format!(
                    "stream id '{}' is declared more than once",
                    stream.id
                )));
            }
        }
        Ok(config)
    }

    pub async fn load(path: &Path) -> Result<Self, CliError> {
        let source = tokio::fs::read_to_string(path).await?;
        let config = Self::parse(&source)?;
        Ok(config.with_source_url(std::env::var(SOURCE_URL_ENV).ok()))
    }

    pub fn with_source_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.is_empty()) {
            self.source.url = Some(url);
        }
        self
    }

    pub fn source_url(&self) -> Result<&str, CliError> {
        self.source.url.as_deref().ok_or_else(|| {
            CliError::Config(format!("source.url is not set and {SOURCE_URL_ENV} is empty"))
        })
    }

    pub fn state_dir(&self) -> Result<PathBuf, CliError> {
        if let Some(dir) = &self.state_dir {
            return Ok(dir.clone());
        }
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Unexpected("Could not determine home directory".into()))?;
        Ok(home.join(".fullsync/state"))
    }

    pub fn settings(&self) -> SyncSettings {
        match self.batch_size {
            Some(size) => SyncSettings::default().with_batch_size(size),
            None => SyncSettings::default(),
        }
    }

    /// All streams, or just the one named by `only`.
    pub fn select_streams(&self, only: Option<&str>) -> Result<Vec<&Stream>, CliError> {
        match only {
            None => Ok(self.streams.iter().collect()),
            Some(id) => self
                .streams
                .iter()
                .find(|s| s.id.as_str() == id)
                .map(|s| vec![s])
                .ok_or_else(|| CliError::UnknownStream(id.to_string())),
        }
    }
}
