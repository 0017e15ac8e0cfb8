//! Hot reload of the configuration file.
//!
//! Every modify or create event on the watched file triggers a full
//! load + validate. Only configurations that pass are forwarded; a broken
//! edit leaves the running configuration in place.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::SockJsConfig;

/// Poll interval for backends without native change notification.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

pub struct ConfigWatcher {
    path: PathBuf,
    updates: mpsc::UnboundedSender<SockJsConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end of its updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<SockJsConfig>) {
        let (updates, rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            updates,
        };
        (watcher, rx)
    }

    /// Start watching. Dropping the returned handle stops the watch.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, updates } = self;
        let reload_path = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if let Some(config) = reload(&reload_path, &event) {
                        let _ = updates.send(config);
                    }
                }
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(POLL_INTERVAL),
        )?;
        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %path.display(), "Config watcher started");
        Ok(watcher)
    }
}

/// The configuration to apply after `event`, if any.
fn reload(path: &Path, event: &Event) -> Option<SockJsConfig> {
    if !(event.kind.is_modify() || event.kind.is_create()) {
        return None;
    }

    tracing::info!(path = %path.display(), "Config file changed, reloading");
    match load_config(path) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::error!(error = %e, "Config reload rejected, keeping current configuration");
            None
        }
    }
}
