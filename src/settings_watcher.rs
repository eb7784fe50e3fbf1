//! Settings hot-reload.
//!
//! Watches the settings file's directory and re-parses the file when it
//! changes. Polled from the host's event loop; never blocks.

use crate::settings::EditorSettings;
use anyhow::{Context, Result};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, channel};
use tracing::{debug, info, warn};

pub use crate::settings::default_settings_path;

/// Result of a poll.
#[derive(Debug, Clone)]
pub enum SettingsEvent {
    Changed(EditorSettings),
    Error(String),
}

pub struct SettingsWatcher {
    path: PathBuf,
    rx: Receiver<notify::Result<Event>>,
    _watcher: RecommendedWatcher,
}

impl SettingsWatcher {
    pub fn new(path: PathBuf) -> Result<Self> {
        let (tx, rx) = channel();
        let mut watcher = notify::recommended_watcher(tx).context("failed to create settings watcher")?;

        // Watch the directory: editors often replace the file instead of writing in place.
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", dir.display()))?;

        debug!(path = %path.display(), "watching settings");
        Ok(Self {
            path,
            rx,
            _watcher: watcher,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drain pending file events; reload once if any touched the settings file.
    pub fn poll(&mut self) -> Option<SettingsEvent> {
        let mut touched = false;
        while let Ok(result) = self.rx.try_recv() {
            match result {
                Ok(event) => {
                    if (event.kind.is_modify() || event.kind.is_create())
                        && event.paths.iter().any(|p| p.file_name() == self.path.file_name())
                    {
                        touched = true;
                    }
                }
                Err(e) => warn!(error = %e, "settings watcher error"),
            }
        }
        if !touched {
            return None;
        }

        match EditorSettings::load(&self.path) {
            Ok(settings) => {
                info!(path = %self.path.display(), "settings reloaded");
                Some(SettingsEvent::Changed(settings))
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "settings reload failed");
                Some(SettingsEvent::Error(e.to_string()))
            }
        }
    }
}
