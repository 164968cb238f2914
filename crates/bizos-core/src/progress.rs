//! Phase-progress tracking.
//!
//! [`Tracker`] is the only writer of the progress and selection-context
//! keys. Progress is tied to the selected idea: when the selection's
//! fingerprint changes, phases 2-5 are wiped because their outputs were
//! produced for a different business.

use crate::notify::Notifier;
use crate::paths::{PHASE_PROGRESS_KEY, PROGRESS_CONTEXT_KEY};
use crate::selection;
use crate::store::Store;
use crate::types::{PhaseId, PhaseProgress, PhaseProgressState};

pub struct Tracker<S: Store> {
    store: S,
    notifier: Notifier,
}

impl<S: Store> Tracker<S> {
    pub fn new(store: S) -> Self {
        Self::with_notifier(store, Notifier::new())
    }

    pub fn with_notifier(store: S, notifier: Notifier) -> Self {
        Self { store, notifier }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    // -----------------------------------------------------------------------
    // Public operations
    // -----------------------------------------------------------------------

    /// Current progress, reconciled against the selected idea.
    ///
    /// Never fails: missing or malformed data reads as all-incomplete.
    /// May write (reset on idea switch, phase-1 inference) and notify.
    pub fn read_phase_progress(&self) -> PhaseProgressState {
        if !self.store.is_available() {
            return PhaseProgressState::new();
        }
        let (state, changed) = self.load_reconciled();
        if changed {
            self.notifier.notify_local();
        }
        state
    }

    /// Persist `state` verbatim and notify observers.
    pub fn write_phase_progress(&self, state: &PhaseProgressState) {
        if !self.store.is_available() {
            return;
        }
        self.persist(state);
        if let Some(ctx) = self.current_context() {
            self.store.set(PROGRESS_CONTEXT_KEY, &ctx);
        }
        self.notifier.notify_local();
    }

    /// Mark `phase` complete or incomplete. Emits exactly one notification,
    /// even if reading the current state also reconciled it.
    pub fn set_phase_completed(&self, phase: PhaseId, completed: bool) {
        if !self.store.is_available() {
            return;
        }
        let (mut state, _) = self.load_reconciled();
        state.set(phase, PhaseProgress::stamped(completed));
        tracing::debug!(phase = %phase, completed, "phase progress updated");
        self.write_phase_progress(&state);
    }

    /// Recommended next phase. Pure when `state` is supplied.
    pub fn recommended_phase(&self, state: Option<&PhaseProgressState>) -> PhaseId {
        match state {
            Some(state) => state.recommended_phase(),
            None => self.read_phase_progress().recommended_phase(),
        }
    }

    /// Clear every phase. The next read re-infers phase 1 if an idea is
    /// still selected.
    pub fn reset_progress(&self) {
        self.write_phase_progress(&PhaseProgressState::new());
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn load_raw(&self) -> PhaseProgressState {
        self.store
            .get(PHASE_PROGRESS_KEY)
            .and_then(|raw| PhaseProgressState::parse(&raw))
            .unwrap_or_default()
    }

    fn persist(&self, state: &PhaseProgressState) {
        match serde_json::to_string(state) {
            Ok(json) => self.store.set(PHASE_PROGRESS_KEY, &json),
            Err(e) => tracing::warn!(error = %e, "failed to encode phase progress"),
        }
    }

    fn current_context(&self) -> Option<String> {
        selection::fingerprint(&self.store)
    }

    /// Load, reset on idea switch, then infer phase 1, in that order.
    /// Returns the state and whether anything was written that observers
    /// should hear about.
    fn load_reconciled(&self) -> (PhaseProgressState, bool) {
        let state = self.load_raw();
        let (mut state, mut changed) = self.reconcile_context(state);

        if selection::has_selection(&self.store) && !state.is_completed(PhaseId::Phase1) {
            let phase1 = state.get_mut(PhaseId::Phase1);
            phase1.completed = true;
            phase1.updated_at = phase1.updated_at.or_else(|| Some(crate::types::now()));
            self.persist(&state);

            if let Some(ctx) = self.current_context() {
                if self.store.get(PROGRESS_CONTEXT_KEY).as_deref() != Some(ctx.as_str()) {
                    self.store.set(PROGRESS_CONTEXT_KEY, &ctx);
                }
            }
            changed = true;
        }

        (state, changed)
    }

    fn reconcile_context(&self, state: PhaseProgressState) -> (PhaseProgressState, bool) {
        let Some(current) = self.current_context() else {
            return (state, false);
        };

        match self.store.get(PROGRESS_CONTEXT_KEY) {
            Some(stored) if stored != current => {
                tracing::info!("selected idea changed, resetting downstream phase progress");
                let reset = PhaseProgressState::reset_for_new_selection();
                self.persist(&reset);
                self.store.set(PROGRESS_CONTEXT_KEY, &current);
                (reset, true)
            }
            Some(_) => (state, false),
            None => {
                self.store.set(PROGRESS_CONTEXT_KEY, &current);
                (state, false)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
