use crate::output::{print_json, print_table};
use anyhow::Context;
use bizos_core::selection::{self, BusinessState};
use std::path::Path;

pub fn run(root: &Path, business_file: &Path, idea_id: Option<&str>, json: bool) -> anyhow::Result<()> {
    let data = std::fs::read_to_string(business_file)
        .with_context(|| format!("failed to read {}", business_file.display()))?;
    let business: BusinessState = serde_json::from_str(&data)
        .with_context(|| format!("{} is not a business state document", business_file.display()))?;

    let Some(idea_id) = idea_id else {
        return list_ideas(&business, json);
    };

    let ws = super::open(root)?;
    let selected = selection::select_idea(&*ws.store, &business, idea_id)
        .with_context(|| format!("failed to select idea '{idea_id}'"))?;
    // Reconcile right away so a switched idea resets downstream phases now,
    // not on whichever command happens to read next.
    let state = ws.tracker.read_phase_progress();

    if json {
        print_json(&serde_json::json!({
            "selected": selected.idea,
            "savedAt": selected.saved_at,
            "recommended": state.recommended_phase(),
        }))?;
    } else {
        println!("Selected: {} ({})", selected.idea.name, selected.idea.id);
        println!("Next: {}", state.recommended_phase());
    }
    Ok(())
}

fn list_ideas(business: &BusinessState, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&business.ideas);
    }
    if business.ideas.is_empty() {
        println!("No ideas in this document.");
        return Ok(());
    }
    let rows = business
        .ideas
        .iter()
        .map(|i| {
            vec![
                i.id.clone(),
                i.name.clone(),
                format!("{:.0}", i.viability_score),
                serde_json::to_value(i.recommendation)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "VIABILITY", "RECOMMENDATION"], rows);
    Ok(())
}

pub fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let current = selection::read_selection(&*ws.store);
    let fingerprint = selection::fingerprint(&*ws.store);

    if json {
        return print_json(&serde_json::json!({
            "selection": current,
            "fingerprint": fingerprint,
        }));
    }

    match current {
        Some(sel) => {
            println!("Idea:     {} ({})", sel.idea.name, sel.idea.id);
            if !sel.idea.description.is_empty() {
                println!("About:    {}", sel.idea.description);
            }
            let location = match sel.founder.location.trim() {
                "" => ws.config.default_location.as_str(),
                loc => loc,
            };
            println!("Location: {location}");
            println!("Saved:    {}", sel.saved_at);
        }
        None => println!("No idea selected. Run: bizos select --business <file> --idea <id>"),
    }
    Ok(())
}
