use crate::error::{BizosError, Result};
use crate::paths::SELECTION_KEY;
use crate::store::Store;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Founder profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTolerance {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FounderGoal {
    SideHustle,
    Startup,
    ScaleExisting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FounderProfile {
    #[serde(default)]
    pub skills: Vec<String>,
    pub experience_level: ExperienceLevel,
    /// USD
    pub budget: f64,
    /// Hours per week.
    pub time_per_week: f64,
    pub risk_tolerance: RiskTolerance,
    pub goals: FounderGoal,
    #[serde(default)]
    pub location: String,
}

// ---------------------------------------------------------------------------
// Business idea
// ---------------------------------------------------------------------------

/// 0-100 scores from idea generation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketScores {
    pub demand: f64,
    pub competition: f64,
    pub saturation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeasibilityScores {
    pub profitability: f64,
    pub difficulty: f64,
    pub entry_barriers: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Proceed,
    #[default]
    Caution,
    #[serde(alias = "no-go")]
    NoGo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessIdea {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_persona: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing_model: Option<String>,
    #[serde(default)]
    pub fit_score: f64,
    #[serde(default)]
    pub market: MarketScores,
    #[serde(default)]
    pub feasibility: FeasibilityScores,
    #[serde(default)]
    pub viability_score: f64,
    #[serde(default)]
    pub recommendation: Recommendation,
}

/// Output of phase-1 idea generation: the founder plus candidate ideas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessState {
    pub founder: FounderProfile,
    #[serde(default)]
    pub ideas: Vec<BusinessIdea>,
    pub created_at: String,
}

impl BusinessState {
    pub fn find_idea(&self, id: &str) -> Option<&BusinessIdea> {
        self.ideas.iter().find(|i| i.id == id)
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// The idea the founder chose to build. Timestamps are kept as the strings
/// that were written so the fingerprint stays byte-stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub saved_at: String,
    pub founder: FounderProfile,
    pub idea: BusinessIdea,
    #[serde(default)]
    pub created_at: String,
}

/// Equality token over the fields that identify "which idea". Field order
/// is part of the persisted format.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Fingerprint<'a> {
    idea_name: &'a str,
    founder_loc: &'a str,
    created_at: &'a str,
    saved_at: &'a str,
}

pub fn has_selection(store: &dyn Store) -> bool {
    store
        .get(SELECTION_KEY)
        .is_some_and(|raw| !raw.is_empty())
}

/// Read the current selection. Absent, malformed, or incomplete records
/// (no founder or no idea) are `None`.
pub fn read_selection(store: &dyn Store) -> Option<Selection> {
    let raw = store.get(SELECTION_KEY)?;
    match serde_json::from_str(&raw) {
        Ok(selection) => Some(selection),
        Err(e) => {
            tracing::debug!(error = %e, "ignoring unreadable selection");
            None
        }
    }
}

/// Fingerprint of the stored selection, or `None` when there is nothing
/// parseable to fingerprint. Works on the raw JSON so partially written
/// records still produce a stable token.
pub fn fingerprint(store: &dyn Store) -> Option<String> {
    let raw = store.get(SELECTION_KEY).filter(|r| !r.is_empty())?;
    let parsed: Value = serde_json::from_str(&raw).ok()?;
    let fp = Fingerprint {
        idea_name: text_at(&parsed, &["idea", "name"]),
        founder_loc: text_at(&parsed, &["founder", "location"]),
        created_at: text_at(&parsed, &["createdAt"]),
        saved_at: text_at(&parsed, &["savedAt"]),
    };
    serde_json::to_string(&fp).ok()
}

/// String at `path`, or `""` if any segment is missing or the leaf is not a string.
fn text_at<'a>(value: &'a Value, path: &[&str]) -> &'a str {
    path.iter()
        .try_fold(value, |node, segment| node.get(*segment))
        .and_then(Value::as_str)
        .unwrap_or("")
}

/// Persist `idea` as the current selection, stamping `savedAt` now.
pub fn save_selection(
    store: &dyn Store,
    business: &BusinessState,
    idea: &BusinessIdea,
) -> Result<Selection> {
    save_selection_at(store, business, idea, Utc::now())
}

pub fn save_selection_at(
    store: &dyn Store,
    business: &BusinessState,
    idea: &BusinessIdea,
    saved_at: DateTime<Utc>,
) -> Result<Selection> {
    let selection = Selection {
        saved_at: saved_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        founder: business.founder.clone(),
        idea: idea.clone(),
        created_at: business.created_at.clone(),
    };
    store.set(SELECTION_KEY, &serde_json::to_string(&selection)?);
    tracing::debug!(idea = %idea.name, "selection saved");
    Ok(selection)
}

/// Select an idea from a generation result by id.
pub fn select_idea(store: &dyn Store, business: &BusinessState, idea_id: &str) -> Result<Selection> {
    let idea = business
        .find_idea(idea_id)
        .ok_or_else(|| BizosError::IdeaNotFound(idea_id.to_string()))?;
    save_selection(store, business, idea)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::store::MemoryStore;

    pub(crate) fn founder(location: &str) -> FounderProfile {
        FounderProfile {
            skills: vec!["baking".to_string()],
            experience_level: ExperienceLevel::Beginner,
            budget: 5000.0,
            time_per_week: 10.0,
            risk_tolerance: RiskTolerance::Low,
            goals: FounderGoal::SideHustle,
            location: location.to_string(),
        }
    }

    pub(crate) fn idea(id: &str, name: &str) -> BusinessIdea {
        BusinessIdea {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            rationale: String::new(),
            customer_persona: None,
            pricing_model: None,
            fit_score: 80.0,
            market: MarketScores::default(),
            feasibility: FeasibilityScores::default(),
            viability_score: 70.0,
            recommendation: Recommendation::Proceed,
        }
    }

    pub(crate) fn business() -> BusinessState {
        BusinessState {
            founder: founder("Austin, TX"),
            ideas: vec![idea("a1", "Bakery"), idea("b2", "Dog Walking")],
            created_at: "2025-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn no_selection_means_no_fingerprint() {
        let store = MemoryStore::new();
        assert!(!has_selection(&store));
        assert!(read_selection(&store).is_none());
        assert!(fingerprint(&store).is_none());
    }

    #[test]
    fn fingerprint_has_fixed_field_order() {
        let store = MemoryStore::new();
        let saved_at = DateTime::parse_from_rfc3339("2025-01-02T03:04:05.006Z")
            .unwrap()
            .with_timezone(&Utc);
        save_selection_at(&store, &business(), &idea("a1", "Bakery"), saved_at).unwrap();
        assert_eq!(
            fingerprint(&store).unwrap(),
            r#"{"ideaName":"Bakery","founderLoc":"Austin, TX","createdAt":"2025-01-01T00:00:00.000Z","savedAt":"2025-01-02T03:04:05.006Z"}"#
        );
    }

    #[test]
    fn fingerprint_changes_with_idea_name() {
        let store = MemoryStore::new();
        let at = Utc::now();
        save_selection_at(&store, &business(), &idea("a1", "Bakery"), at).unwrap();
        let f1 = fingerprint(&store).unwrap();
        save_selection_at(&store, &business(), &idea("b2", "Dog Walking"), at).unwrap();
        let f2 = fingerprint(&store).unwrap();
        assert_ne!(f1, f2);
    }

    #[test]
    fn fingerprint_tolerates_partial_records() {
        let store = MemoryStore::new();
        store.set(SELECTION_KEY, r#"{"idea":{"name":"Solo"}}"#);
        assert_eq!(
            fingerprint(&store).unwrap(),
            r#"{"ideaName":"Solo","founderLoc":"","createdAt":"","savedAt":""}"#
        );
        // Incomplete record is not a usable selection, but it is present.
        assert!(has_selection(&store));
        assert!(read_selection(&store).is_none());
    }

    #[test]
    fn malformed_selection_has_no_fingerprint() {
        let store = MemoryStore::new();
        store.set(SELECTION_KEY, "{broken");
        assert!(fingerprint(&store).is_none());
        assert!(read_selection(&store).is_none());
    }

    #[test]
    fn select_idea_round_trips() {
        let store = MemoryStore::new();
        let saved = select_idea(&store, &business(), "b2").unwrap();
        let read = read_selection(&store).unwrap();
        assert_eq!(read, saved);
        assert_eq!(read.idea.name, "Dog Walking");
        assert_eq!(read.created_at, "2025-01-01T00:00:00.000Z");
    }

    #[test]
    fn select_unknown_idea_fails() {
        let store = MemoryStore::new();
        let err = select_idea(&store, &business(), "zzz").unwrap_err();
        assert!(matches!(err, BizosError::IdeaNotFound(id) if id == "zzz"));
        assert!(!has_selection(&store));
    }

    #[test]
    fn recommendation_accepts_dash_spelling() {
        let r: Recommendation = serde_json::from_str("\"no-go\"").unwrap();
        assert_eq!(r, Recommendation::NoGo);
        assert_eq!(serde_json::to_string(&r).unwrap(), "\"no_go\"");
    }
}
