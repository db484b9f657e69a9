//! File-backed config storage (JSON or YAML), watched with `notify`.

use super::backend::{ChangeListener, ConfigBackend};
use crate::types::Subscription;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use notify::{EventKind, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
}

impl FileFormat {
    /// `.yaml`/`.yml` select YAML, anything else JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            _ => FileFormat::Json,
        }
    }
}

/// Stores the raw config document in a single file.
///
/// A missing file reads as `{}`. Writes go to a sibling temp file first and
/// are renamed into place.
pub struct FileBackend {
    path: PathBuf,
    format: FileFormat,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = FileFormat::from_path(&path);
        Self { path, format }
    }

    pub fn with_format(mut self, format: FileFormat) -> Self {
        self.format = format;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn context(&self) -> ErrorContext {
        ErrorContext::new()
            .with_field_path(self.path.display().to_string())
            .with_source("file_backend")
    }

    fn decode(&self, content: &str) -> Result<serde_json::Value> {
        if content.trim().is_empty() {
            return Ok(serde_json::Value::Object(Default::default()));
        }
        match self.format {
            FileFormat::Json => Ok(serde_json::from_str(content)?),
            FileFormat::Yaml => serde_yaml::from_str(content).map_err(|e| {
                Error::backend_with_context(format!("invalid YAML: {}", e), self.context())
            }),
        }
    }

    fn encode(&self, value: &serde_json::Value) -> Result<String> {
        match self.format {
            FileFormat::Json => Ok(serde_json::to_string_pretty(value)?),
            FileFormat::Yaml => serde_yaml::to_string(value).map_err(|e| {
                Error::backend_with_context(format!("YAML encode failed: {}", e), self.context())
            }),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ConfigBackend for FileBackend {
    async fn get(&self) -> Result<serde_json::Value> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => self.decode(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(serde_json::Value::Object(Default::default()))
            }
            Err(e) => Err(Error::backend_with_context(
                format!("read failed: {}", e),
                self.context(),
            )),
        }
    }

    async fn set(&self, value: serde_json::Value) -> Result<()> {
        let content = self.encode(&value)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, content).await.map_err(|e| {
            Error::backend_with_context(format!("write failed: {}", e), self.context())
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            Error::backend_with_context(format!("rename failed: {}", e), self.context())
        })?;
        tracing::debug!(path = %self.path.display(), "config file written");
        Ok(())
    }

    fn subscribe(&self, listener: ChangeListener) -> Option<Subscription> {
        let target = self.path.file_name()?.to_os_string();
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(p) => p.to_path_buf(),
            None => PathBuf::from("."),
        };

        let mut watcher =
            match notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
                let event = match res {
                    Ok(ev) => ev,
                    Err(e) => {
                        tracing::warn!(error = %e, "config watch error");
                        return;
                    }
                };
                let relevant = matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) && event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == Some(target.as_os_str()));
                if relevant {
                    listener();
                }
            }) {
                Ok(w) => w,
                Err(e) => {
                    tracing::warn!(error = %e, "config file watcher unavailable");
                    return None;
                }
            };

        if let Err(e) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
            tracing::warn!(error = %e, dir = %dir.display(), "failed to watch config directory");
            return None;
        }

        Some(Subscription::new(move || drop(watcher)))
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
