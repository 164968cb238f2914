use crate::paths::is_app_key;
use crate::store::FileStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// Something changed; observers should re-read progress from the store.
/// Events carry no state on purpose: the store is the only source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Written by this process.
    Local,
    /// Another process changed `key`.
    External { key: String },
}

/// Progress-changed broadcaster shared by everything in one process.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<ProgressEvent>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.tx.subscribe()
    }

    /// Emit after a write in this process. Delivery is synchronous into each
    /// receiver's queue; having no receivers is fine.
    pub fn notify_local(&self) {
        let _ = self.tx.send(ProgressEvent::Local);
    }

    pub fn notify_external(&self, key: &str) {
        let _ = self.tx.send(ProgressEvent::External {
            key: key.to_string(),
        });
    }
}

// ---------------------------------------------------------------------------
// StoreWatcher
// ---------------------------------------------------------------------------

/// Polls a shared [`FileStore`] for writes made by other processes and
/// rebroadcasts them on the local [`Notifier`]. Keys outside the
/// application namespace are ignored.
pub struct StoreWatcher {
    store: Arc<FileStore>,
    notifier: Notifier,
}

impl StoreWatcher {
    pub fn new(store: Arc<FileStore>, notifier: Notifier) -> Self {
        Self { store, notifier }
    }

    /// One poll. Returns the number of events emitted.
    ///
    /// Always diffs the file against the observed snapshot: two writes can
    /// share an mtime, so the timestamp alone cannot rule out a change.
    pub fn tick(&mut self) -> usize {
        let changed: Vec<String> = self
            .store
            .refresh()
            .into_iter()
            .filter(|k| is_app_key(k))
            .collect();
        for key in &changed {
            tracing::debug!(key = %key, "external store change");
            self.notifier.notify_external(key);
        }
        changed.len()
    }

    /// Poll forever. Fire-and-forget: a missed change only delays a refresh.
    pub async fn run(mut self, interval: Duration) {
        loop {
            tokio::time::sleep(interval).await;
            self.tick();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use tempfile::TempDir;
    use tokio::sync::broadcast::error::TryRecvError;

    fn drain(rx: &mut broadcast::Receiver<ProgressEvent>) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(ev) => events.push(ev),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                Err(TryRecvError::Lagged(_)) => continue,
            }
        }
        events
    }

    #[test]
    fn local_notification_reaches_every_subscriber() {
        let notifier = Notifier::new();
        let mut a = notifier.subscribe();
        let mut b = notifier.clone().subscribe();
        notifier.notify_local();
        assert_eq!(drain(&mut a), vec![ProgressEvent::Local]);
        assert_eq!(drain(&mut b), vec![ProgressEvent::Local]);
    }

    #[test]
    fn notify_without_subscribers_is_harmless() {
        let notifier = Notifier::new();
        notifier.notify_local();
        notifier.notify_external("ai-business-os:phase-progress");
    }

    #[test]
    fn watcher_reports_other_process_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let ours = Arc::new(FileStore::open(&path));
        let theirs = FileStore::open(&path);

        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();
        let mut watcher = StoreWatcher::new(ours, notifier);

        theirs.set("ai-business-os:phase-progress", "{}");
        theirs.set("unrelated-widget", "1");

        assert_eq!(watcher.tick(), 1);
        assert_eq!(
            drain(&mut rx),
            vec![ProgressEvent::External {
                key: "ai-business-os:phase-progress".to_string()
            }]
        );
    }

    #[test]
    fn watcher_reports_writes_sharing_an_mtime() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let ours = Arc::new(FileStore::open(&path));
        let theirs = FileStore::open(&path);

        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();
        let mut watcher = StoreWatcher::new(ours, notifier);

        theirs.set("ai-business-os:business-name", "Crumb");
        assert_eq!(watcher.tick(), 1);
        let first = std::fs::metadata(&path).unwrap().modified().unwrap();

        theirs.set("ai-business-os:business-name", "Crumb & Co");
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(first)
            .unwrap();

        assert_eq!(watcher.tick(), 1);
        assert_eq!(drain(&mut rx).len(), 2);
    }

    #[test]
    fn watcher_never_reports_own_writes() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileStore::open(dir.path().join("store.json")));
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();
        let mut watcher = StoreWatcher::new(store.clone(), notifier);

        store.set("ai-business-os:phase-progress", "{}");
        assert_eq!(watcher.tick(), 0);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let ev = ProgressEvent::External {
            key: "ai-business-os:selected-idea".to_string(),
        };
        assert_eq!(
            serde_json::to_value(ev).unwrap(),
            serde_json::json!({ "type": "external", "key": "ai-business-os:selected-idea" })
        );
    }

    #[tokio::test]
    async fn run_loop_picks_up_changes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let ours = Arc::new(FileStore::open(&path));
        let theirs = FileStore::open(&path);

        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();
        let handle = tokio::spawn(
            StoreWatcher::new(ours, notifier).run(Duration::from_millis(10)),
        );

        theirs.set("ai-business-os:selected-idea", "{}");
        let ev = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("watcher did not fire")
            .unwrap();
        assert_eq!(
            ev,
            ProgressEvent::External {
                key: "ai-business-os:selected-idea".to_string()
            }
        );
        handle.abort();
    }
}
