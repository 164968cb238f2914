use crate::error::{BizosError, Result};
use crate::paths::{BRANDING_KEY, BUSINESS_NAME_KEY, GROWTH_KEY, LEGAL_SETUP_KEY, MARKETING_KEY};
use crate::progress::Tracker;
use crate::selection;
use crate::store::Store;
use crate::types::PhaseId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ---------------------------------------------------------------------------
// ArtifactKind
// ---------------------------------------------------------------------------

/// Generated output of a phase. Each lives under its own key and survives
/// progress resets; only the user clears it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    BusinessName,
    LegalSetup,
    Branding,
    Marketing,
    Growth,
}

impl ArtifactKind {
    pub fn all() -> &'static [ArtifactKind] {
        &[
            ArtifactKind::BusinessName,
            ArtifactKind::LegalSetup,
            ArtifactKind::Branding,
            ArtifactKind::Marketing,
            ArtifactKind::Growth,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::BusinessName => "business-name",
            ArtifactKind::LegalSetup => "legal-setup",
            ArtifactKind::Branding => "branding",
            ArtifactKind::Marketing => "marketing",
            ArtifactKind::Growth => "growth",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            ArtifactKind::BusinessName => BUSINESS_NAME_KEY,
            ArtifactKind::LegalSetup => LEGAL_SETUP_KEY,
            ArtifactKind::Branding => BRANDING_KEY,
            ArtifactKind::Marketing => MARKETING_KEY,
            ArtifactKind::Growth => GROWTH_KEY,
        }
    }

    /// Phase whose page produces this output.
    pub fn phase(self) -> PhaseId {
        match self {
            ArtifactKind::BusinessName | ArtifactKind::LegalSetup => PhaseId::Phase2,
            ArtifactKind::Branding => PhaseId::Phase3,
            ArtifactKind::Marketing => PhaseId::Phase4,
            ArtifactKind::Growth => PhaseId::Phase5,
        }
    }

    /// Phase that saving this output finishes. Phase 2 has none: it is done
    /// only once every legal checklist step is (see [`crate::legal`]).
    pub fn completes_phase(self) -> Option<PhaseId> {
        match self {
            ArtifactKind::BusinessName | ArtifactKind::LegalSetup => None,
            other => Some(other.phase()),
        }
    }

    /// Plain-text slots are stored as-is; the rest hold JSON documents.
    pub fn is_text(self) -> bool {
        matches!(self, ArtifactKind::BusinessName)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ArtifactKind {
    type Err = BizosError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "business-name" | "business_name" | "name" => Ok(ArtifactKind::BusinessName),
            "legal-setup" | "legal_setup" | "legal" => Ok(ArtifactKind::LegalSetup),
            "branding" => Ok(ArtifactKind::Branding),
            "marketing" => Ok(ArtifactKind::Marketing),
            "growth" => Ok(ArtifactKind::Growth),
            _ => Err(BizosError::InvalidArtifact(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Slot operations
// ---------------------------------------------------------------------------

/// Load an artifact. Text slots come back as a JSON string; blank or
/// malformed content is `None`.
pub fn load(store: &dyn Store, kind: ArtifactKind) -> Option<Value> {
    let raw = store.get(kind.key())?;
    if kind.is_text() {
        let trimmed = raw.trim();
        return (!trimmed.is_empty()).then(|| Value::String(trimmed.to_string()));
    }
    serde_json::from_str(&raw).ok().filter(|v: &Value| !v.is_null())
}

/// Store an artifact. Text slots accept a JSON string and are trimmed;
/// a blank name is ignored rather than overwriting a good one.
pub fn save(store: &dyn Store, kind: ArtifactKind, value: &Value) -> Result<()> {
    if kind.is_text() {
        let text = match value {
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        };
        if !text.is_empty() {
            store.set(kind.key(), &text);
        }
        return Ok(());
    }
    store.set(kind.key(), &serde_json::to_string(value)?);
    Ok(())
}

pub fn clear(store: &dyn Store, kind: ArtifactKind) {
    store.remove(kind.key());
}

/// Record a freshly generated artifact and mark phase 1 done, since
/// generating anything requires a selected idea. Returns the further phase
/// this output finished, if any.
pub fn save_and_complete<S: Store>(
    tracker: &Tracker<S>,
    kind: ArtifactKind,
    value: &Value,
) -> Result<Option<PhaseId>> {
    if !selection::has_selection(tracker.store()) {
        return Err(BizosError::NoSelection);
    }
    save(tracker.store(), kind, value)?;
    tracker.set_phase_completed(PhaseId::Phase1, true);
    let finished = kind.completes_phase();
    if let Some(phase) = finished {
        tracker.set_phase_completed(phase, true);
    }
    Ok(finished)
}

/// Name to carry through phases 2-5: the saved business name, falling back
/// to the selected idea's name.
pub fn business_name(store: &dyn Store) -> String {
    if let Some(Value::String(name)) = load(store, ArtifactKind::BusinessName) {
        return name;
    }
    selection::read_selection(store)
        .map(|s| s.idea.name)
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
