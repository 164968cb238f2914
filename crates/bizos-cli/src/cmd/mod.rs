pub mod artifact;
pub mod complete;
pub mod config;
pub mod init;
pub mod next;
pub mod select;
pub mod status;
pub mod watch;

use anyhow::Context;
use bizos_core::{config::Config, FileStore, Tracker};
use std::path::Path;
use std::sync::Arc;

/// Everything a command needs to talk to the project's store.
pub struct Workspace {
    pub config: Config,
    pub store: Arc<FileStore>,
    pub tracker: Tracker<Arc<FileStore>>,
}

pub fn open(root: &Path) -> anyhow::Result<Workspace> {
    let config = Config::load_or_default(root).context("failed to load config")?;
    let path = config.store_path(root);
    tracing::debug!(store = %path.display(), "opening store");
    let store = Arc::new(FileStore::open(path));
    let tracker = Tracker::new(store.clone());
    Ok(Workspace {
        config,
        store,
        tracker,
    })
}
