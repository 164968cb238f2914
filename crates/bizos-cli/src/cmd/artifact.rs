use crate::output::{print_json, print_table};
use anyhow::Context;
use bizos_core::artifact::{self, ArtifactKind};
use bizos_core::legal;
use clap::Subcommand;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Subcommand)]
pub enum ArtifactSubcommand {
    /// Print a phase output
    Show { kind: String },
    /// Record a phase output (completes its phase, except for phase 2)
    Set {
        kind: String,
        /// Inline value (text for business-name, JSON otherwise)
        #[arg(long, conflicts_with = "file")]
        value: Option<String>,
        /// Read the value from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Remove a phase output (progress is left alone)
    Clear { kind: String },
    /// List the legal checklist for the founder's location
    Steps,
    /// Tick a legal checklist step; ticking the last one completes phase 2
    Step {
        /// Step number as shown by `steps`
        number: usize,
        /// Untick instead
        #[arg(long)]
        undo: bool,
    },
}

pub fn run(root: &Path, subcmd: ArtifactSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ArtifactSubcommand::Show { kind } => show(root, &kind, json),
        ArtifactSubcommand::Set { kind, value, file } => set(root, &kind, value, file, json),
        ArtifactSubcommand::Clear { kind } => clear(root, &kind, json),
        ArtifactSubcommand::Steps => steps(root, json),
        ArtifactSubcommand::Step { number, undo } => step(root, number, !undo, json),
    }
}

fn parse_kind(kind_str: &str) -> anyhow::Result<ArtifactKind> {
    ArtifactKind::from_str(kind_str).with_context(|| format!("unknown artifact: {kind_str}"))
}

fn show(root: &Path, kind_str: &str, json: bool) -> anyhow::Result<()> {
    let kind = parse_kind(kind_str)?;
    let ws = super::open(root)?;
    let value = artifact::load(&*ws.store, kind);

    if json {
        return print_json(&serde_json::json!({
            "kind": kind,
            "phase": kind.phase(),
            "value": value,
        }));
    }

    match value {
        Some(Value::String(text)) => println!("{text}"),
        Some(other) => println!("{}", serde_json::to_string_pretty(&other)?),
        None => println!("No {kind} saved yet."),
    }
    Ok(())
}

fn set(
    root: &Path,
    kind_str: &str,
    value: Option<String>,
    file: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let kind = parse_kind(kind_str)?;
    let raw = match (value, file) {
        (Some(v), _) => v,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => anyhow::bail!("provide --value or --file"),
    };
    let parsed = if kind.is_text() {
        Value::String(raw)
    } else {
        serde_json::from_str(&raw).with_context(|| format!("{kind} must be valid JSON"))?
    };

    let ws = super::open(root)?;
    let finished = artifact::save_and_complete(&ws.tracker, kind, &parsed)
        .with_context(|| format!("failed to save {kind}"))?;

    if json {
        print_json(&serde_json::json!({
            "kind": kind,
            "phase": kind.phase(),
            "saved": true,
            "completed": finished,
        }))?;
    } else {
        println!("Saved: {kind}");
        if let Some(phase) = finished {
            println!("Completed: {phase}");
        }
    }
    Ok(())
}

fn clear(root: &Path, kind_str: &str, json: bool) -> anyhow::Result<()> {
    let kind = parse_kind(kind_str)?;
    let ws = super::open(root)?;
    artifact::clear(&*ws.store, kind);

    if json {
        print_json(&serde_json::json!({ "kind": kind, "cleared": true }))?;
    } else {
        println!("Cleared: {kind}");
    }
    Ok(())
}

fn steps(root: &Path, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let location = legal::location(&*ws.store, &ws.config.default_location);
    let rows = legal::steps(&*ws.store, &location);
    let progress = legal::progress(&*ws.store, &location);

    if json {
        return print_json(&serde_json::json!({
            "location": location,
            "steps": rows,
            "progress": progress,
            "percent": progress.percent(),
        }));
    }

    if rows.is_empty() {
        println!("No legal checklist yet. Save one with 'bizos artifact set legal-setup'.");
        return Ok(());
    }
    let table = rows
        .iter()
        .map(|r| {
            vec![
                r.number.to_string(),
                if r.done { "x" } else { " " }.to_string(),
                r.step.clone(),
            ]
        })
        .collect();
    print_table(&["#", "DONE", "STEP"], table);
    println!(
        "\n{}/{} completed ({}%) for {location}",
        progress.completed,
        progress.total,
        progress.percent()
    );
    Ok(())
}

fn step(root: &Path, number: usize, done: bool, json: bool) -> anyhow::Result<()> {
    let ws = super::open(root)?;
    let location = legal::location(&*ws.store, &ws.config.default_location);
    let progress = legal::set_step_done(&ws.tracker, &location, number, done)
        .with_context(|| format!("failed to update legal step {number}"))?;

    if json {
        print_json(&serde_json::json!({
            "step": number,
            "done": done,
            "progress": progress,
            "complete": progress.is_complete(),
        }))?;
    } else {
        println!("Step {number}: {}", if done { "done" } else { "not done" });
        println!("{}/{} legal steps completed", progress.completed, progress.total);
        if progress.is_complete() {
            println!("Completed: phase2");
        }
    }
    Ok(())
}
