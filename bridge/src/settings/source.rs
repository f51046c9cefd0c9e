use std::path::PathBuf;

use async_trait::async_trait;

use super::{Settings, SettingsError};

/// Where settings come from.
#[async_trait]
pub trait SettingsSource: Send + Sync {
    async fn fetch(&self) -> Result<Settings, SettingsError>;
}

/// Settings stored as a JSON object in a file.
pub struct FileSettingsSource {
    path: PathBuf,
}

impl FileSettingsSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SettingsSource for FileSettingsSource {
    async fn fetch(&self) -> Result<Settings, SettingsError> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        Settings::from_json(&text)
    }
}

/// Fixed settings held in memory. `unavailable()` models a collaborator that
/// cannot be reached.
pub struct StaticSettingsSource {
    settings: Option<Settings>,
}

impl StaticSettingsSource {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Some(settings),
        }
    }

    pub fn unavailable() -> Self {
        Self { settings: None }
    }
}

#[async_trait]
impl SettingsSource for StaticSettingsSource {
    async fn fetch(&self) -> Result<Settings, SettingsError> {
        self.settings.clone().ok_or(SettingsError::Unavailable)
    }
}

/// Fetches settings without ever failing: a broken or unreachable source
/// falls back to the last settings seen, then to the defaults.
pub struct SettingsStore {
    source: Box<dyn SettingsSource>,
    last_known: Option<Settings>,
}

impl SettingsStore {
    pub fn new(source: Box<dyn SettingsSource>) -> Self {
        Self {
            source,
            last_known: None,
        }
    }

    pub async fn load(&mut self) -> Settings {
        match self.source.fetch().await {
            Ok(settings) => {
                self.last_known = Some(settings.clone());
                settings
            }
            Err(e) => match &self.last_known {
                Some(settings) => {
                    tracing::warn!("Failed to load settings ({}), keeping last known", e);
                    settings.clone()
                }
                None => {
                    tracing::warn!("Failed to load settings ({}), using defaults", e);
                    Settings::default()
                }
            },
        }
    }

    /// Record settings that arrived as a push update.
    pub fn remember(&mut self, settings: Settings) {
        self.last_known = Some(settings);
    }
}
