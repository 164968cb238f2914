use crate::output::print_json;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let state = ws.tracker.read_phase_progress();
    let phase = ws.tracker.recommended_phase(Some(&state));
    let done = state.is_fully_complete();

    if json {
        return print_json(&serde_json::json!({
            "phase": phase,
            "title": phase.title(),
            "done": done,
        }));
    }

    if done {
        println!("{phase} (all phases complete)");
    } else {
        println!("{phase} — {}", phase.title());
    }
    Ok(())
}
