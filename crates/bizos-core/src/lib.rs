pub mod artifact;
pub mod config;
pub mod error;
pub mod io;
pub mod legal;
pub mod notify;
pub mod paths;
pub mod progress;
pub mod selection;
pub mod store;
pub mod types;

pub use error::{BizosError, Result};
pub use notify::{Notifier, ProgressEvent, StoreWatcher};
pub use progress::Tracker;
pub use store::{FileStore, MemoryStore, NullStore, Store};
pub use types::{PhaseId, PhaseProgress, PhaseProgressState};
