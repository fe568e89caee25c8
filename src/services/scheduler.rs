//! Frontier scheduling: shard pending items into worker tasks for a round.
//!
//! Items are grouped per discovery mode, capped at the configured shard
//! size, and the resulting groups compete for the per-round worker cap by
//! minimum item priority. Groups that lose simply stay frontier-side for a
//! later round.

use tracing::debug;

use crate::domain::models::{
    round_slug, AgentType, FeatureFrontierItem, FeatureMode, FrontierFile, JourneyFrontierItem,
    JourneyMode, OrchestrationConfig, TaskItems, WorkerTask,
};

/// Result of scheduling one round.
#[derive(Debug, Clone)]
pub struct SchedulePlan {
    pub tasks: Vec<WorkerTask>,
    pub selected_journey_ids: Vec<String>,
    pub selected_feature_ids: Vec<String>,
}

impl SchedulePlan {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

struct ShardGroup {
    items: TaskItems,
    agent_type: AgentType,
    group_priority: i64,
}

/// Shard both frontiers into at most `max_workers_per_round` tasks.
///
/// Deterministic: items sort by `(priority ascending, id ascending)`, mode
/// groups are visited in declaration order, and surviving groups keep their
/// priority order when task indexes are assigned.
pub fn schedule(
    journey_frontier: &FrontierFile<JourneyFrontierItem>,
    feature_frontier: &FrontierFile<FeatureFrontierItem>,
    config: &OrchestrationConfig,
    round: u32,
) -> SchedulePlan {
    let shard_size = config.default_shard_size.max(1);
    let worker_limit = config.max_workers_per_round.max(1);

    let mut journey_items = journey_frontier.items.clone();
    journey_items.sort_by(|a, b| {
        a.sort_priority()
            .cmp(&b.sort_priority())
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut feature_items = feature_frontier.items.clone();
    feature_items.sort_by(|a, b| {
        a.sort_priority()
            .cmp(&b.sort_priority())
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut groups: Vec<ShardGroup> = Vec::new();

    for mode in JourneyMode::ALL {
        let shard: Vec<JourneyFrontierItem> = journey_items
            .iter()
            .filter(|item| JourneyMode::from_item_mode(&item.mode) == Some(mode))
            .take(shard_size)
            .cloned()
            .collect();
        if shard.is_empty() {
            continue;
        }
        let group_priority = shard.iter().map(JourneyFrontierItem::sort_priority).min().unwrap_or(0);
        groups.push(ShardGroup {
            items: TaskItems::Journey(shard),
            agent_type: mode.agent_type(),
            group_priority,
        });
    }

    for mode in FeatureMode::ALL {
        let shard: Vec<FeatureFrontierItem> = feature_items
            .iter()
            .filter(|item| FeatureMode::from_item_mode(&item.mode) == Some(mode))
            .take(shard_size)
            .cloned()
            .collect();
        if shard.is_empty() {
            continue;
        }
        let group_priority = shard.iter().map(FeatureFrontierItem::sort_priority).min().unwrap_or(0);
        groups.push(ShardGroup {
            items: TaskItems::Feature(shard),
            agent_type: mode.agent_type(),
            group_priority,
        });
    }

    // Stable sort keeps journey-before-feature order on priority ties.
    groups.sort_by_key(|group| group.group_priority);
    groups.truncate(worker_limit);

    let slug = round_slug(round);
    let mut tasks = Vec::with_capacity(groups.len());
    let mut selected_journey_ids = Vec::new();
    let mut selected_feature_ids = Vec::new();

    for (index, group) in groups.into_iter().enumerate() {
        let task_id = format!("task-{:02}-{}", index + 1, group.agent_type.as_str());
        match &group.items {
            TaskItems::Journey(items) => {
                selected_journey_ids.extend(items.iter().map(|item| item.id.clone()));
            }
            TaskItems::Feature(items) => {
                selected_feature_ids.extend(items.iter().map(|item| item.id.clone()));
            }
        }
        tasks.push(WorkerTask {
            output_path: format!("docs/agent-runs/{slug}/outputs/{task_id}.json"),
            prompt_file: group.agent_type.prompt_file(),
            context_files: group.agent_type.context_files(),
            agent_type: group.agent_type,
            round,
            round_slug: slug.clone(),
            items: group.items,
            task_id,
        });
    }

    debug!(
        round,
        tasks = tasks.len(),
        journeys = selected_journey_ids.len(),
        features = selected_feature_ids.len(),
        "scheduled round shards"
    );

    SchedulePlan {
        tasks,
        selected_journey_ids,
        selected_feature_ids,
    }
}
