//! Discovery modes and the agent types derived from them.
//!
//! Journey and feature frontiers are sharded per mode; each non-empty shard
//! is dispatched to one subagent of the matching agent type.

use serde::{Deserialize, Serialize};

/// Discovery strategy for journey frontier items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneyMode {
    /// Explore from an entrypoint and map new journeys
    #[default]
    DiscoverNew,
    /// Extend an already-accepted journey deeper
    ExtendExisting,
}

impl JourneyMode {
    pub const ALL: [Self; 2] = [Self::DiscoverNew, Self::ExtendExisting];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DiscoverNew => "discover_new",
            Self::ExtendExisting => "extend_existing",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "discover_new" => Some(Self::DiscoverNew),
            "extend_existing" => Some(Self::ExtendExisting),
            _ => None,
        }
    }

    /// Resolve a frontier item's mode string; empty means the default mode.
    pub fn from_item_mode(s: &str) -> Option<Self> {
        if s.is_empty() {
            Some(Self::default())
        } else {
            Self::from_str(s)
        }
    }

    pub fn agent_type(&self) -> AgentType {
        match self {
            Self::DiscoverNew => AgentType::JourneyDiscoverNew,
            Self::ExtendExisting => AgentType::JourneyExtendExisting,
        }
    }
}

/// Discovery strategy for feature frontier items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureMode {
    /// Enumerate interactive controls on a route/state
    #[default]
    Inventory,
    /// Execute an interaction and assert its effect
    Exercise,
    /// Recrawl UI revealed by a prior interaction
    Expansion,
}

impl FeatureMode {
    pub const ALL: [Self; 3] = [Self::Inventory, Self::Exercise, Self::Expansion];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inventory => "inventory",
            Self::Exercise => "exercise",
            Self::Expansion => "expansion",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "inventory" => Some(Self::Inventory),
            "exercise" => Some(Self::Exercise),
            "expansion" => Some(Self::Expansion),
            _ => None,
        }
    }

    /// Resolve a frontier item's mode string; empty means the default mode.
    pub fn from_item_mode(s: &str) -> Option<Self> {
        if s.is_empty() {
            Some(Self::default())
        } else {
            Self::from_str(s)
        }
    }

    pub fn agent_type(&self) -> AgentType {
        match self {
            Self::Inventory => AgentType::FeatureInventory,
            Self::Exercise => AgentType::FeatureExercise,
            Self::Expansion => AgentType::FeatureExpansion,
        }
    }
}

/// Subagent family a task is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentType {
    JourneyDiscoverNew,
    JourneyExtendExisting,
    FeatureInventory,
    FeatureExercise,
    FeatureExpansion,
}

impl AgentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JourneyDiscoverNew => "journey-discover-new",
            Self::JourneyExtendExisting => "journey-extend-existing",
            Self::FeatureInventory => "feature-inventory",
            Self::FeatureExercise => "feature-exercise",
            Self::FeatureExpansion => "feature-expansion",
        }
    }

    /// True for the journey agent family, false for the feature family.
    pub fn is_journey(&self) -> bool {
        matches!(self, Self::JourneyDiscoverNew | Self::JourneyExtendExisting)
    }

    /// Prompt file the worker consumes for this agent type.
    pub fn prompt_file(&self) -> String {
        format!("docs/subagent-prompts/{}.md", self.as_str())
    }

    /// Context files handed to the worker alongside the prompt.
    pub fn context_files(&self) -> Vec<String> {
        if self.is_journey() {
            vec![
                "docs/journey-map.md".to_string(),
                "docs/feature-map.md".to_string(),
                "docs/subagent-prompts/output-schemas.md".to_string(),
            ]
        } else {
            vec![
                "docs/feature-map.md".to_string(),
                "docs/subagent-prompts/output-schemas.md".to_string(),
            ]
        }
    }
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_round_trips_through_str() {
        for mode in JourneyMode::ALL {
            assert_eq!(JourneyMode::from_str(mode.as_str()), Some(mode));
        }
        for mode in FeatureMode::ALL {
            assert_eq!(FeatureMode::from_str(mode.as_str()), Some(mode));
        }
    }

    #[test]
    fn agent_type_serializes_kebab_case() {
        let json = serde_json::to_string(&AgentType::JourneyDiscoverNew).unwrap();
        assert_eq!(json, "\"journey-discover-new\"");
    }

    #[test]
    fn unknown_mode_is_none() {
        assert_eq!(JourneyMode::from_str("audit"), None);
        assert_eq!(FeatureMode::from_str("discover_new"), None);
    }

    #[test]
    fn empty_item_mode_resolves_to_default() {
        assert_eq!(JourneyMode::from_item_mode(""), Some(JourneyMode::DiscoverNew));
        assert_eq!(FeatureMode::from_item_mode(""), Some(FeatureMode::Inventory));
        assert_eq!(
            JourneyMode::from_item_mode("extend_existing"),
            Some(JourneyMode::ExtendExisting)
        );
        assert_eq!(JourneyMode::from_item_mode("audit"), None);
    }
}
