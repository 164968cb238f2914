use crate::output::print_json;
use anyhow::Context;
use bizos_core::PhaseId;
use std::path::Path;
use std::str::FromStr;

pub fn run(root: &Path, phase_str: &str, completed: bool, json: bool) -> anyhow::Result<()> {
    let phase =
        PhaseId::from_str(phase_str).with_context(|| format!("unknown phase: {phase_str}"))?;

    let ws = super::open(root)?;
    ws.tracker.set_phase_completed(phase, completed);
    let state = ws.tracker.read_phase_progress();
    let recommended = state.recommended_phase();

    if json {
        print_json(&serde_json::json!({
            "phase": phase,
            "completed": state.is_completed(phase),
            "recommended": recommended,
        }))?;
    } else {
        let verb = if completed { "Completed" } else { "Reopened" };
        println!("{verb}: {phase} ({})", phase.title());
        if state.is_fully_complete() {
            println!("All phases complete.");
        } else {
            println!("Next: {recommended}");
        }
    }
    Ok(())
}

pub fn reset(root: &Path, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    ws.tracker.reset_progress();
    let state = ws.tracker.read_phase_progress();

    if json {
        print_json(&serde_json::json!({
            "reset": true,
            "phases": state,
        }))?;
    } else {
        println!("Progress cleared.");
        if state.is_completed(PhaseId::Phase1) {
            println!("phase1 stays complete: an idea is selected.");
        }
    }
    Ok(())
}
