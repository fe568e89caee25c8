//! Frontier backlogs: not-yet-explored work items per domain.
//!
//! Items are removed only when their round merges successfully, and grow
//! back when accepted findings reveal follow-up targets. The `mode` field
//! stays a free string on disk; a missing or empty mode means the default
//! mode for its domain, while an unrecognized mode is never scheduled and
//! simply remains queued.

use serde::{Deserialize, Serialize};

/// Sort weight used when an item carries no explicit priority.
pub const UNPRIORITIZED: i64 = 1000;

/// Versioned frontier document, `{version, items: [...]}` on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontierFile<T> {
    #[serde(default = "default_frontier_version")]
    pub version: u32,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

const fn default_frontier_version() -> u32 {
    1
}

impl<T> Default for FrontierFile<T> {
    fn default() -> Self {
        Self {
            version: default_frontier_version(),
            items: Vec::new(),
        }
    }
}

/// An unexplored journey target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JourneyFrontierItem {
    pub id: String,
    pub mode: String,
    pub role: String,
    pub route: String,
    pub state: String,
    pub note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

impl Default for JourneyFrontierItem {
    fn default() -> Self {
        Self {
            id: String::new(),
            mode: "discover_new".to_string(),
            role: String::new(),
            route: String::new(),
            state: String::new(),
            note: String::new(),
            priority: None,
        }
    }
}

impl JourneyFrontierItem {
    pub fn sort_priority(&self) -> i64 {
        self.priority.unwrap_or(UNPRIORITIZED)
    }
}

/// An unexplored feature interaction target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureFrontierItem {
    pub id: String,
    pub mode: String,
    pub role: String,
    pub route: String,
    pub state: String,
    pub selector: String,
    pub action: String,
    pub note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

impl Default for FeatureFrontierItem {
    fn default() -> Self {
        Self {
            id: String::new(),
            mode: "inventory".to_string(),
            role: String::new(),
            route: String::new(),
            state: String::new(),
            selector: String::new(),
            action: String::new(),
            note: String::new(),
            priority: None,
        }
    }
}

impl FeatureFrontierItem {
    pub fn sort_priority(&self) -> i64 {
        self.priority.unwrap_or(UNPRIORITIZED)
    }
}

impl FrontierFile<JourneyFrontierItem> {
    /// Seed frontier written by `init`: first-level discovery from the
    /// dashboard for the two journey-bearing roles.
    pub fn seeded() -> Self {
        Self {
            version: default_frontier_version(),
            items: vec![
                JourneyFrontierItem {
                    id: "seed-journey-admin-dashboard".to_string(),
                    mode: "discover_new".to_string(),
                    role: "admin".to_string(),
                    route: "/dashboard".to_string(),
                    state: "default".to_string(),
                    note: "Start from dashboard and discover first-level journeys.".to_string(),
                    priority: Some(1),
                },
                JourneyFrontierItem {
                    id: "seed-journey-manager-dashboard".to_string(),
                    mode: "discover_new".to_string(),
                    role: "manager".to_string(),
                    route: "/dashboard".to_string(),
                    state: "default".to_string(),
                    note: "Start from dashboard and discover manager-specific journeys."
                        .to_string(),
                    priority: Some(1),
                },
            ],
        }
    }
}

impl FrontierFile<FeatureFrontierItem> {
    /// Seed frontier written by `init`.
    pub fn seeded() -> Self {
        Self {
            version: default_frontier_version(),
            items: vec![FeatureFrontierItem {
                id: "seed-feature-admin-dashboard-filter".to_string(),
                mode: "inventory".to_string(),
                role: "admin".to_string(),
                route: "/dashboard".to_string(),
                state: "default".to_string(),
                selector: "button[aria-label*='filter'], button:has-text('Filter')".to_string(),
                action: "click".to_string(),
                note: "Open filter popup and enumerate all interactive controls.".to_string(),
                priority: Some(1),
            }],
        }
    }
}
