use crate::output::{print_json, print_table};
use bizos_core::{artifact, selection, PhaseId, PhaseProgressState};
use chrono::SecondsFormat;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct StatusOutput<'a> {
    business_name: String,
    phases: &'a PhaseProgressState,
    completed: usize,
    recommended: PhaseId,
    fully_complete: bool,
}

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let state = ws.tracker.read_phase_progress();
    let business_name = artifact::business_name(&*ws.store);

    if json {
        return print_json(&StatusOutput {
            business_name,
            phases: &state,
            completed: state.completed_count(),
            recommended: state.recommended_phase(),
            fully_complete: state.is_fully_complete(),
        });
    }

    if business_name.is_empty() {
        println!("Business: (no idea selected)");
    } else {
        println!("Business: {business_name}");
    }
    if let Some(sel) = selection::read_selection(&*ws.store) {
        let location = match sel.founder.location.trim() {
            "" => ws.config.default_location.as_str(),
            loc => loc,
        };
        println!("Location: {location}");
    }
    println!();

    let recommended = state.recommended_phase();
    let rows = state
        .iter()
        .map(|(phase, p)| {
            let marker = if phase == recommended && !state.is_fully_complete() {
                "→"
            } else {
                ""
            };
            vec![
                marker.to_string(),
                phase.to_string(),
                phase.title().to_string(),
                if p.completed { "done" } else { "-" }.to_string(),
                p.updated_at
                    .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true))
                    .unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["", "PHASE", "TITLE", "STATUS", "UPDATED"], rows);

    println!();
    if state.is_fully_complete() {
        println!("All phases complete.");
    } else {
        println!("Next: {recommended} ({})", recommended.title());
    }
    Ok(())
}
