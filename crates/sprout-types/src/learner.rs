//! Per-learner facts: achievements, skill states, and learner identity.
//!
//! Achievements are append-only records owned by the persistence
//! collaborator; this crate only reads them. The engine never deduplicates
//! achievements -- it derives from whatever list it is handed.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Level a fully achieved milestone is assigned when deriving skill state
/// from an achievement list.
pub const ACHIEVED_LEVEL: f64 = 3.0;

// ---------------------------------------------------------------------------
// Achievements
// ---------------------------------------------------------------------------

/// One recorded achievement of a milestone. Many records per learner are
/// allowed; only the node id matters for state derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub node_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_id: Option<uuid::Uuid>,
}

impl Achievement {
    /// Bare achievement of a node, no timestamp or evidence.
    pub fn of(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            at: None,
            evidence_id: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Learner identity
// ---------------------------------------------------------------------------

/// A learner tracked against the genome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Learner {
    pub id: String,
    pub name: String,
    /// Date of birth; drives the age-proximity readiness factor.
    pub dob: NaiveDate,
}

impl Learner {
    /// Age in whole months on the given date. Clamps to zero for dates
    /// before the date of birth.
    pub fn age_months(&self, on: NaiveDate) -> u32 {
        let years = on.year() - self.dob.year();
        let mut months = years * 12 + (on.month() as i32 - self.dob.month() as i32);
        if on.day() < self.dob.day() {
            months -= 1;
        }
        months.max(0) as u32
    }
}

// ---------------------------------------------------------------------------
// Skill state
// ---------------------------------------------------------------------------

/// Observed state of one milestone for one learner.
///
/// `level` runs 0..3 (0 = not started, 1 = emerging, 2 = mastered,
/// 3 = achieved with evidence); `confidence` runs 0..1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillState {
    #[serde(default)]
    pub level: f64,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub evidence: u32,
}

/// All recorded skill states for one learner, keyed by node id. Nodes with
/// no entry are treated as level 0, confidence 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearnerState(pub HashMap<String, SkillState>);

impl LearnerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State for a node, or the all-zero default when nothing is recorded.
    pub fn get(&self, node_id: &str) -> SkillState {
        self.0.get(node_id).copied().unwrap_or_default()
    }

    pub fn insert(&mut self, node_id: impl Into<String>, state: SkillState) {
        self.0.insert(node_id.into(), state);
    }

    /// Derive skill state from an achievement list: each achieved node gets
    /// level 3 by convention, with `evidence` counting its records.
    /// Confidence stays unset; it is an observation, not implied by the
    /// achievement fact.
    pub fn from_achievements(achievements: &[Achievement]) -> Self {
        let mut map: HashMap<String, SkillState> = HashMap::new();
        for a in achievements {
            let entry = map.entry(a.node_id.clone()).or_insert(SkillState {
                level: ACHIEVED_LEVEL,
                confidence: 0.0,
                evidence: 0,
            });
            entry.evidence += 1;
        }
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_months_simple() {
        let learner = Learner {
            id: "c1".into(),
            name: "Asha".into(),
            dob: NaiveDate::from_ymd_opt(2023, 3, 15).unwrap(),
        };
        let on = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        assert_eq!(learner.age_months(on), 14);
    }

    #[test]
    fn test_age_months_day_not_yet_reached() {
        let learner = Learner {
            id: "c1".into(),
            name: "Asha".into(),
            dob: NaiveDate::from_ymd_opt(2023, 3, 15).unwrap(),
        };
        let on = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        assert_eq!(learner.age_months(on), 13);
    }

    #[test]
    fn test_age_months_clamps_before_birth() {
        let learner = Learner {
            id: "c1".into(),
            name: "Asha".into(),
            dob: NaiveDate::from_ymd_opt(2023, 3, 15).unwrap(),
        };
        let on = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert_eq!(learner.age_months(on), 0);
    }

    #[test]
    fn test_from_achievements_level_three_convention() {
        let achievements = vec![
            Achievement::of("GM_SIT"),
            Achievement::of("GM_SIT"),
            Achievement::of("GM_CRAWL"),
        ];
        let state = LearnerState::from_achievements(&achievements);
        assert_eq!(state.get("GM_SIT").level, ACHIEVED_LEVEL);
        assert_eq!(state.get("GM_SIT").evidence, 2);
        assert_eq!(state.get("GM_CRAWL").evidence, 1);
        assert_eq!(state.get("GM_WALK").level, 0.0);
    }

    #[test]
    fn test_unrecorded_node_is_all_zero() {
        let state = LearnerState::new();
        let s = state.get("anything");
        assert_eq!(s.level, 0.0);
        assert_eq!(s.confidence, 0.0);
        assert_eq!(s.evidence, 0);
    }

    #[test]
    fn test_achievement_tolerates_missing_optionals() {
        let json = r#"{ "nodeId": "GM_SIT" }"#;
        let a: Achievement = serde_json::from_str(json).unwrap();
        assert_eq!(a.node_id, "GM_SIT");
        assert!(a.at.is_none());
        assert!(a.evidence_id.is_none());
    }
}
