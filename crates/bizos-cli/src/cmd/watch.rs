use crate::output::print_json;
use anyhow::Context;
use bizos_core::{ProgressEvent, StoreWatcher};
use std::path::Path;
use tokio::sync::broadcast::error::RecvError;

/// Print the recommended phase now and again after every change, whether it
/// came from this process or another one sharing the store.
pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new().context("failed to start runtime")?;
    rt.block_on(watch(root, json))
}

async fn watch(root: &Path, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let mut rx = ws.tracker.notifier().subscribe();

    let interval = ws.config.watch.poll_interval();
    let watcher = StoreWatcher::new(ws.store.clone(), ws.tracker.notifier().clone());
    tokio::spawn(watcher.run(interval));
    tracing::info!(store = %ws.store.path().display(), ?interval, "watching for progress changes");

    report(&ws, None, json)?;
    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Ok(event) => report(&ws, Some(&event), json)?,
                Err(RecvError::Lagged(n)) => {
                    tracing::debug!(skipped = n, "watch lagged, re-reading");
                    report(&ws, None, json)?;
                }
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

fn report(ws: &super::Workspace, event: Option<&ProgressEvent>, json: bool) -> anyhow::Result<()> {
    let state = ws.tracker.read_phase_progress();
    let recommended = state.recommended_phase();

    if json {
        return print_json(&serde_json::json!({
            "event": event,
            "recommended": recommended,
            "completed": state.completed_count(),
            "fully_complete": state.is_fully_complete(),
        }));
    }

    let source = match event {
        None => "current",
        Some(ProgressEvent::Local) => "local",
        Some(ProgressEvent::External { .. }) => "external",
    };
    if state.is_fully_complete() {
        println!("[{source}] all phases complete");
    } else {
        println!(
            "[{source}] {}/5 done, next: {recommended} ({})",
            state.completed_count(),
            recommended.title()
        );
    }
    Ok(())
}
