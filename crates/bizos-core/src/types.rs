use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

// ---------------------------------------------------------------------------
// PhaseId
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseId {
    Phase1,
    Phase2,
    Phase3,
    Phase4,
    Phase5,
}

impl PhaseId {
    pub fn all() -> &'static [PhaseId] {
        &[
            PhaseId::Phase1,
            PhaseId::Phase2,
            PhaseId::Phase3,
            PhaseId::Phase4,
            PhaseId::Phase5,
        ]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<PhaseId> {
        PhaseId::all().get(self.index() + 1).copied()
    }

    pub fn last() -> PhaseId {
        PhaseId::Phase5
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PhaseId::Phase1 => "phase1",
            PhaseId::Phase2 => "phase2",
            PhaseId::Phase3 => "phase3",
            PhaseId::Phase4 => "phase4",
            PhaseId::Phase5 => "phase5",
        }
    }

    /// Human-facing name of the wizard stage.
    pub fn title(self) -> &'static str {
        match self {
            PhaseId::Phase1 => "Business Idea",
            PhaseId::Phase2 => "Business Setup & Legal",
            PhaseId::Phase3 => "Branding & Website",
            PhaseId::Phase4 => "Marketing & Analytics",
            PhaseId::Phase5 => "Continuous Growth & Automation",
        }
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PhaseId {
    type Err = crate::error::BizosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "phase1" | "1" => Ok(PhaseId::Phase1),
            "phase2" | "2" => Ok(PhaseId::Phase2),
            "phase3" | "3" => Ok(PhaseId::Phase3),
            "phase4" | "4" => Ok(PhaseId::Phase4),
            "phase5" | "5" => Ok(PhaseId::Phase5),
            _ => Err(crate::error::BizosError::InvalidPhase(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Current time at millisecond precision, matching what survives a store round trip.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_timestamp<S: Serializer>(
    ts: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match ts {
        Some(ts) => serializer.serialize_str(&format_timestamp(ts)),
        None => serializer.serialize_none(),
    }
}

// ---------------------------------------------------------------------------
// PhaseProgress
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseProgress {
    pub completed: bool,
    #[serde(serialize_with = "serialize_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PhaseProgress {
    pub fn stamped(completed: bool) -> Self {
        Self {
            completed,
            updated_at: Some(now()),
        }
    }

    /// Lenient decode of one phase entry. Non-objects yield `None`.
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let completed = obj.get("completed").map(truthy).unwrap_or(false);
        // A non-RFC 3339 `updatedAt` is dropped, so the entry reads as never stamped.
        let updated_at = obj
            .get("updatedAt")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|ts| ts.with_timezone(&Utc));
        Some(Self {
            completed,
            updated_at,
        })
    }
}

/// Loose boolean coercion for values written by older or foreign clients.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ---------------------------------------------------------------------------
// PhaseProgressState
// ---------------------------------------------------------------------------

/// Completion record for every phase. Always holds exactly one entry per
/// [`PhaseId`]; there is no way to represent a missing or extra phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhaseProgressState {
    phases: [PhaseProgress; 5],
}

impl PhaseProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, phase: PhaseId) -> &PhaseProgress {
        &self.phases[phase.index()]
    }

    pub fn get_mut(&mut self, phase: PhaseId) -> &mut PhaseProgress {
        &mut self.phases[phase.index()]
    }

    pub fn set(&mut self, phase: PhaseId, progress: PhaseProgress) {
        self.phases[phase.index()] = progress;
    }

    pub fn is_completed(&self, phase: PhaseId) -> bool {
        self.get(phase).completed
    }

    pub fn iter(&self) -> impl Iterator<Item = (PhaseId, &PhaseProgress)> {
        PhaseId::all().iter().map(|p| (*p, self.get(*p)))
    }

    pub fn completed_count(&self) -> usize {
        self.phases.iter().filter(|p| p.completed).count()
    }

    pub fn is_fully_complete(&self) -> bool {
        self.phases.iter().all(|p| p.completed)
    }

    /// First incomplete phase in wizard order. A fully complete state
    /// recommends the last phase; use [`Self::is_fully_complete`] to tell
    /// the two apart.
    pub fn recommended_phase(&self) -> PhaseId {
        self.iter()
            .find(|(_, p)| !p.completed)
            .map(|(phase, _)| phase)
            .unwrap_or_else(PhaseId::last)
    }

    /// Fresh state after the user switched ideas: phase 1 is satisfied by
    /// the selection itself, everything downstream starts over.
    pub fn reset_for_new_selection() -> Self {
        let mut state = Self::default();
        state.set(PhaseId::Phase1, PhaseProgress::stamped(true));
        state
    }

    /// Lenient decode. Top-level non-objects yield `None`; unknown keys are
    /// dropped and malformed phase entries fall back to their default.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let mut state = Self::default();
        for phase in PhaseId::all() {
            if let Some(progress) = obj.get(phase.as_str()).and_then(PhaseProgress::from_value) {
                state.set(*phase, progress);
            }
        }
        Some(state)
    }

    /// Parse persisted JSON, returning `None` for anything unusable.
    pub fn parse(raw: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(raw).ok()?;
        Self::from_value(&value)
    }
}

impl Serialize for PhaseProgressState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.phases.len()))?;
        for (phase, progress) in self.iter() {
            map.serialize_entry(phase.as_str(), progress)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PhaseProgressState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom("phase progress must be an object"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(flags: [bool; 5]) -> PhaseProgressState {
        let mut state = PhaseProgressState::new();
        for (phase, done) in PhaseId::all().iter().zip(flags) {
            state.get_mut(*phase).completed = done;
        }
        state
    }

    #[test]
    fn phase_order_and_next() {
        assert_eq!(PhaseId::Phase1.next(), Some(PhaseId::Phase2));
        assert_eq!(PhaseId::Phase5.next(), None);
        assert!(PhaseId::Phase2 < PhaseId::Phase3);
        assert_eq!(PhaseId::all().len(), 5);
    }

    #[test]
    fn phase_from_str_accepts_id_and_number() {
        assert_eq!("phase3".parse::<PhaseId>().unwrap(), PhaseId::Phase3);
        assert_eq!("4".parse::<PhaseId>().unwrap(), PhaseId::Phase4);
        assert_eq!("Phase1".parse::<PhaseId>().unwrap(), PhaseId::Phase1);
        assert!("phase6".parse::<PhaseId>().is_err());
        assert!("".parse::<PhaseId>().is_err());
    }

    #[test]
    fn phase_serializes_as_id() {
        assert_eq!(
            serde_json::to_string(&PhaseId::Phase2).unwrap(),
            "\"phase2\""
        );
    }

    #[test]
    fn default_state_serializes_all_phases() {
        let json = serde_json::to_value(PhaseProgressState::new()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 5);
        for phase in PhaseId::all() {
            assert_eq!(
                obj[phase.as_str()],
                serde_json::json!({ "completed": false, "updatedAt": null })
            );
        }
    }

    #[test]
    fn timestamps_use_millisecond_iso_format() {
        let mut state = PhaseProgressState::new();
        state.get_mut(PhaseId::Phase1).updated_at = Some(
            DateTime::parse_from_rfc3339("2025-03-01T10:20:30.456Z")
                .unwrap()
                .with_timezone(&Utc),
        );
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"updatedAt\":\"2025-03-01T10:20:30.456Z\""));
    }

    #[test]
    fn parse_rejects_non_json_and_non_objects() {
        assert!(PhaseProgressState::parse("not json").is_none());
        assert!(PhaseProgressState::parse("[]").is_none());
        assert!(PhaseProgressState::parse("null").is_none());
        assert!(PhaseProgressState::parse("42").is_none());
    }

    #[test]
    fn parse_wrong_type_phase_falls_back_to_default() {
        let state = PhaseProgressState::parse(r#"{"phase1": "yes"}"#).unwrap();
        assert_eq!(state, PhaseProgressState::new());
    }

    #[test]
    fn parse_drops_unknown_keys_and_coerces_completed() {
        let raw = r#"{
            "phase2": { "completed": 1, "updatedAt": "2025-01-01T00:00:00.000Z" },
            "phase3": { "completed": "", "updatedAt": 17 },
            "phase9": { "completed": true },
            "extra": "ignored"
        }"#;
        let state = PhaseProgressState::parse(raw).unwrap();
        assert!(state.is_completed(PhaseId::Phase2));
        assert!(state.get(PhaseId::Phase2).updated_at.is_some());
        assert!(!state.is_completed(PhaseId::Phase3));
        assert!(state.get(PhaseId::Phase3).updated_at.is_none());

        let reserialized = serde_json::to_value(state).unwrap();
        assert_eq!(reserialized.as_object().unwrap().len(), 5);
    }

    #[test]
    fn round_trip_preserves_state() {
        let mut state = state_with([true, true, false, false, false]);
        state.set(PhaseId::Phase2, PhaseProgress::stamped(true));
        let json = serde_json::to_string(&state).unwrap();
        let back: PhaseProgressState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn recommended_is_first_incomplete() {
        let state = state_with([true, true, false, false, false]);
        assert_eq!(state.recommended_phase(), PhaseId::Phase3);

        let state = state_with([false, true, true, true, true]);
        assert_eq!(state.recommended_phase(), PhaseId::Phase1);
    }

    #[test]
    fn recommended_when_all_complete_is_last_phase() {
        let state = state_with([true; 5]);
        assert_eq!(state.recommended_phase(), PhaseId::Phase5);
        assert!(state.is_fully_complete());

        let state = state_with([true, true, true, true, false]);
        assert_eq!(state.recommended_phase(), PhaseId::Phase5);
        assert!(!state.is_fully_complete());
    }

    #[test]
    fn reset_for_new_selection_completes_only_phase1() {
        let state = PhaseProgressState::reset_for_new_selection();
        assert!(state.is_completed(PhaseId::Phase1));
        assert!(state.get(PhaseId::Phase1).updated_at.is_some());
        assert_eq!(state.completed_count(), 1);
    }
}
