//! Round artifacts: dispatched worker tasks and the round manifest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::frontier::{FeatureFrontierItem, JourneyFrontierItem};
use super::mode::AgentType;

/// Directory slug for a round, `round-001` style.
pub fn round_slug(round: u32) -> String {
    format!("round-{round:03}")
}

/// Items assigned to one task; always a single domain.
///
/// Serializes as a bare item array. Deserialization happens through
/// [`WorkerTask`], which routes on the task's `agentType`; the two item
/// shapes overlap (a feature item is a journey item plus selector/action),
/// so the array alone cannot identify the domain.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TaskItems {
    Journey(Vec<JourneyFrontierItem>),
    Feature(Vec<FeatureFrontierItem>),
}

impl TaskItems {
    pub fn len(&self) -> usize {
        match self {
            Self::Journey(items) => items.len(),
            Self::Feature(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<String> {
        match self {
            Self::Journey(items) => items.iter().map(|item| item.id.clone()).collect(),
            Self::Feature(items) => items.iter().map(|item| item.id.clone()).collect(),
        }
    }
}

/// The contract a worker consumes: one file per dispatched shard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerTask {
    pub task_id: String,
    pub round: u32,
    pub round_slug: String,
    pub agent_type: AgentType,
    pub prompt_file: String,
    pub output_path: String,
    pub context_files: Vec<String>,
    pub items: TaskItems,
}

impl<'de> Deserialize<'de> for WorkerTask {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Raw {
            task_id: String,
            round: u32,
            round_slug: String,
            agent_type: AgentType,
            prompt_file: String,
            output_path: String,
            context_files: Vec<String>,
            items: serde_json::Value,
        }

        let raw = Raw::deserialize(deserializer)?;
        let items = if raw.agent_type.is_journey() {
            TaskItems::Journey(serde_json::from_value(raw.items).map_err(serde::de::Error::custom)?)
        } else {
            TaskItems::Feature(serde_json::from_value(raw.items).map_err(serde::de::Error::custom)?)
        };
        Ok(Self {
            task_id: raw.task_id,
            round: raw.round,
            round_slug: raw.round_slug,
            agent_type: raw.agent_type,
            prompt_file: raw.prompt_file,
            output_path: raw.output_path,
            context_files: raw.context_files,
            items,
        })
    }
}

/// Lifecycle of a round: prepared until its outputs are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Prepared,
    Merged,
}

/// Per-task summary stored in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestTask {
    pub task_id: String,
    pub agent_type: AgentType,
    pub prompt_file: String,
    pub item_count: usize,
    pub ids: Vec<String>,
}

/// Compact merge result recorded back onto the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestMergeSummary {
    pub accepted_journeys: usize,
    pub accepted_features: usize,
    pub completed: bool,
}

/// Round manifest, `docs/agent-runs/round-NNN/manifest.json`.
///
/// The pending-round invariant lives in the orchestration state; the
/// manifest records what was actually dispatched so the merge can
/// reconcile unreported tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundManifest {
    pub round: u32,
    pub round_slug: String,
    pub created_at: DateTime<Utc>,
    pub status: RoundStatus,
    pub selected_journey_ids: Vec<String>,
    pub selected_feature_ids: Vec<String>,
    pub tasks: Vec<ManifestTask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_summary: Option<ManifestMergeSummary>,
}
