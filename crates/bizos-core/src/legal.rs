//! Phase 2 legal checklist.
//!
//! The checklist comes from the saved legal setup. Which steps the founder
//! has ticked off lives under a separate per-location key, so regenerating
//! the setup for the same location keeps the ticks for steps that survive.
//! Phase 2 completes when the last outstanding step is ticked.

use crate::artifact::{self, ArtifactKind};
use crate::error::{BizosError, Result};
use crate::paths::legal_steps_key;
use crate::progress::Tracker;
use crate::selection;
use crate::store::Store;
use crate::types::PhaseId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegalSetup {
    pub recommended_structure: String,
    pub checklist: Vec<ChecklistItem>,
    pub templates: Vec<Template>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecklistItem {
    pub step: String,
    /// Initial state suggested by the generator. Only used until the
    /// founder ticks anything for this location.
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Template {
    pub name: String,
    pub link: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LegalProgress {
    pub completed: usize,
    pub total: usize,
}

impl LegalProgress {
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed as f64 / self.total as f64) * 100.0).round() as u32
    }

    /// An empty checklist is never complete.
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

/// One checklist row as shown to the founder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepStatus {
    pub number: usize,
    pub step: String,
    pub done: bool,
}

/// Saved legal setup, `None` when absent or unreadable.
pub fn setup(store: &dyn Store) -> Option<LegalSetup> {
    let value = artifact::load(store, ArtifactKind::LegalSetup)?;
    serde_json::from_value(value).ok()
}

/// Location the checklist applies to: the selected founder's, else `default`.
pub fn location(store: &dyn Store, default: &str) -> String {
    selection::read_selection(store)
        .map(|s| s.founder.location.trim().to_string())
        .filter(|loc| !loc.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn done_set(store: &dyn Store, location: &str, setup: &LegalSetup) -> BTreeSet<String> {
    match store.get(&legal_steps_key(location)) {
        Some(raw) => serde_json::from_str(&raw).unwrap_or_default(),
        None => setup
            .checklist
            .iter()
            .filter(|item| item.completed)
            .map(|item| item.step.clone())
            .collect(),
    }
}

/// Checklist rows, numbered from 1. Empty when no setup is saved.
pub fn steps(store: &dyn Store, location: &str) -> Vec<StepStatus> {
    let Some(setup) = setup(store) else {
        return Vec::new();
    };
    let done = done_set(store, location, &setup);
    setup
        .checklist
        .iter()
        .enumerate()
        .map(|(i, item)| StepStatus {
            number: i + 1,
            step: item.step.clone(),
            done: done.contains(&item.step),
        })
        .collect()
}

pub fn progress(store: &dyn Store, location: &str) -> LegalProgress {
    let rows = steps(store, location);
    LegalProgress {
        completed: rows.iter().filter(|r| r.done).count(),
        total: rows.len(),
    }
}

/// Tick or untick step `number` (1-based). Finishing the last outstanding
/// step marks phase 2 complete; unticking never reopens it.
pub fn set_step_done<S: Store>(
    tracker: &Tracker<S>,
    location: &str,
    number: usize,
    done: bool,
) -> Result<LegalProgress> {
    let store = tracker.store();
    let setup = setup(store).ok_or(BizosError::NoLegalSetup)?;
    let item = number
        .checked_sub(1)
        .and_then(|i| setup.checklist.get(i))
        .ok_or(BizosError::InvalidStep(number))?;

    let before = progress(store, location);
    let mut set = done_set(store, location, &setup);
    if done {
        set.insert(item.step.clone());
    } else {
        set.remove(&item.step);
    }
    store.set(&legal_steps_key(location), &serde_json::to_string(&set)?);

    let after = progress(store, location);
    if after.is_complete() && !before.is_complete() {
        tracing::info!(location, "legal checklist finished");
        tracker.set_phase_completed(PhaseId::Phase2, true);
    }
    Ok(after)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::LEGAL_STEPS_PREFIX;
    use crate::selection::tests::business;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    fn setup_with(store: &dyn Store, steps: &[(&str, bool)]) {
        let checklist: Vec<_> = steps
            .iter()
            .map(|(step, completed)| json!({ "step": step, "completed": completed }))
            .collect();
        artifact::save(
            store,
            ArtifactKind::LegalSetup,
            &json!({ "recommendedStructure": "LLC", "checklist": checklist, "notes": "" }),
        )
        .unwrap();
    }

    fn selected() -> (Arc<MemoryStore>, Tracker<Arc<MemoryStore>>) {
        let store = Arc::new(MemoryStore::new());
        let tracker = Tracker::new(store.clone());
        selection::select_idea(&*store, &business(), "a1").unwrap();
        (store, tracker)
    }

    #[test]
    fn location_prefers_founder_then_default() {
        let store = MemoryStore::new();
        assert_eq!(location(&store, "USA"), "USA");
        selection::select_idea(&store, &business(), "a1").unwrap();
        assert_eq!(location(&store, "USA"), "Austin, TX");
    }

    #[test]
    fn no_setup_means_no_steps() {
        let (store, tracker) = selected();
        assert!(steps(&*store, "USA").is_empty());
        assert!(!progress(&*store, "USA").is_complete());
        let err = set_step_done(&tracker, "USA", 1, true).unwrap_err();
        assert!(matches!(err, BizosError::NoLegalSetup));
    }

    #[test]
    fn out_of_range_step_rejected() {
        let (store, tracker) = selected();
        setup_with(&*store, &[("Register LLC", false)]);
        assert!(matches!(
            set_step_done(&tracker, "USA", 0, true).unwrap_err(),
            BizosError::InvalidStep(0)
        ));
        assert!(matches!(
            set_step_done(&tracker, "USA", 2, true).unwrap_err(),
            BizosError::InvalidStep(2)
        ));
    }

    #[test]
    fn finishing_every_step_completes_phase2() {
        let (store, tracker) = selected();
        setup_with(&*store, &[("Register LLC", false), ("Get EIN", false)]);

        let p = set_step_done(&tracker, "USA", 1, true).unwrap();
        assert_eq!((p.completed, p.total, p.percent()), (1, 2, 50));
        assert!(!tracker.read_phase_progress().is_completed(PhaseId::Phase2));

        let p = set_step_done(&tracker, "USA", 2, true).unwrap();
        assert!(p.is_complete());
        assert!(tracker.read_phase_progress().is_completed(PhaseId::Phase2));

        let raw = store.get(&format!("{LEGAL_STEPS_PREFIX}usa")).unwrap();
        let saved: BTreeSet<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(saved.len(), 2);
    }

    #[test]
    fn unticking_keeps_phase2_complete() {
        let (store, tracker) = selected();
        setup_with(&*store, &[("Register LLC", false)]);
        set_step_done(&tracker, "USA", 1, true).unwrap();

        let p = set_step_done(&tracker, "USA", 1, false).unwrap();
        assert_eq!(p.completed, 0);
        assert!(tracker.read_phase_progress().is_completed(PhaseId::Phase2));
    }

    #[test]
    fn generated_flags_seed_until_first_tick() {
        let (store, tracker) = selected();
        setup_with(&*store, &[("Register LLC", true), ("Get EIN", false)]);
        assert_eq!(progress(&*store, "USA").completed, 1);

        set_step_done(&tracker, "USA", 1, false).unwrap();
        assert_eq!(progress(&*store, "USA").completed, 0);
    }

    #[test]
    fn ticks_are_per_location() {
        let (store, tracker) = selected();
        setup_with(&*store, &[("Register LLC", false)]);
        set_step_done(&tracker, "Austin, TX", 1, true).unwrap();

        assert!(progress(&*store, "Austin, TX").is_complete());
        assert_eq!(progress(&*store, "USA").completed, 0);
    }

    #[test]
    fn malformed_done_set_reads_empty() {
        let (store, _tracker) = selected();
        setup_with(&*store, &[("Register LLC", true)]);
        store.set(&legal_steps_key("USA"), "not json");
        assert_eq!(progress(&*store, "USA").completed, 0);
    }
}
