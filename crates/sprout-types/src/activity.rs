//! Activity catalogue types and the filters used when matching activities
//! to milestones.
//!
//! Activities arrive in two schemas: the planner shape (leveled target
//! lists) and the visualizer shape (flat `links` to node ids). Both are
//! representable here; [`Activity::target_nodes`] resolves the declared
//! targets regardless of shape.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Activity schema
// ---------------------------------------------------------------------------

/// Difficulty tier of a leveled target list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Foundational,
    Core,
    Stretch,
}

/// One difficulty tier of an activity with the milestone nodes it targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLevelSpec {
    pub level: ActivityLevel,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub adaptations: Vec<String>,
}

/// A link from an activity to a milestone node, optionally naming the exit
/// criterion the activity evidences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLink {
    pub node_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meets_exit: Option<String>,
}

/// A practicable activity from the catalogue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub levels: Vec<ActivityLevelSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<ActivityLink>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Activity {
    /// The milestone nodes this activity declares as targets.
    ///
    /// Prefers the core level, falls back to the first level present, and
    /// finally to the flat `links` list for visualizer-schema activities.
    pub fn target_nodes(&self) -> Vec<&str> {
        let preferred = self
            .levels
            .iter()
            .find(|l| l.level == ActivityLevel::Core)
            .or_else(|| self.levels.first());

        match preferred {
            Some(spec) => spec.targets.iter().map(String::as_str).collect(),
            None => self.links.iter().map(|l| l.node_id.as_str()).collect(),
        }
    }

    /// Whether this activity references the given node through any level or
    /// link.
    pub fn references(&self, node_id: &str) -> bool {
        self.levels
            .iter()
            .any(|l| l.targets.iter().any(|t| t == node_id))
            || self.links.iter().any(|l| l.node_id == node_id)
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Caller-supplied constraints when measuring activity coverage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityFilters {
    /// Keep activities whose environment overlaps this list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Vec<String>>,
    /// Keep activities at or under this duration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration_minutes: Option<u32>,
}

impl ActivityFilters {
    /// True when the activity passes both the environment-overlap and the
    /// duration-ceiling constraints (absent constraints always pass).
    pub fn matches(&self, activity: &Activity) -> bool {
        if let Some(ref envs) = self.environment {
            let overlaps = activity.environment.iter().any(|e| envs.contains(e));
            if !envs.is_empty() && !overlaps {
                return false;
            }
        }
        if let Some(max) = self.max_duration_minutes {
            if let Some(dur) = activity.duration_min {
                if dur > max {
                    return false;
                }
            }
        }
        true
    }
}
