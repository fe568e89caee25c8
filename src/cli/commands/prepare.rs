//! Implementation of the `uxmap prepare-round` command.

use anyhow::Result;
use chrono::Utc;
use std::path::Path;

use crate::cli::display::list_table;
use crate::cli::output::{output, CommandOutput};
use crate::domain::errors::OrchestratorError;
use crate::domain::models::{
    round_slug, FeatureFrontierItem, FrontierFile, JourneyFrontierItem, ManifestTask,
    OrchestrationState, RoundManifest, RoundStatus,
};
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::workspace::Workspace;
use crate::services::scheduler;

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareOutput {
    pub success: bool,
    pub round: u32,
    pub round_slug: String,
    pub tasks: Vec<PreparedTask>,
    pub selected_journeys: usize,
    pub selected_features: usize,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedTask {
    pub task_id: String,
    pub agent_type: String,
    pub item_count: usize,
}

impl CommandOutput for PrepareOutput {
    fn to_human(&self) -> String {
        if self.tasks.is_empty() {
            return "No frontier items available to schedule.".to_string();
        }
        let mut table = list_table(&["task", "agent", "items"]);
        for task in &self.tasks {
            table.add_row(vec![
                task.task_id.clone(),
                task.agent_type.clone(),
                task.item_count.to_string(),
            ]);
        }
        format!(
            "Prepared {} with {} task(s).\n{table}\n\nSave worker outputs to docs/agent-runs/{}/outputs/, then run `uxmap merge-round`.",
            self.round_slug,
            self.tasks.len(),
            self.round_slug,
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Schedule the next round. Refuses while a round is pending merge; a run
/// that schedules nothing leaves the state untouched.
pub fn execute(root: &Path, json_mode: bool) -> Result<()> {
    let ws = Workspace::new(root);
    let config = ConfigLoader::load(&ws.config_path())?;
    let mut state: OrchestrationState = ws.read_json(&ws.state_path())?;

    if let Some(pending) = state.pending_round {
        return Err(OrchestratorError::RoundPending(pending).into());
    }

    let journey_frontier: FrontierFile<JourneyFrontierItem> =
        ws.read_json(&ws.journey_frontier_path())?;
    let feature_frontier: FrontierFile<FeatureFrontierItem> =
        ws.read_json(&ws.feature_frontier_path())?;

    let round = state.round + 1;
    let slug = round_slug(round);
    ws.ensure_dir(&ws.tasks_dir(&slug))?;
    ws.ensure_dir(&ws.outputs_dir(&slug))?;
    ws.ensure_dir(&ws.screenshots_dir(&slug))?;

    let plan = scheduler::schedule(&journey_frontier, &feature_frontier, &config, round);

    if plan.is_empty() {
        let result = PrepareOutput {
            success: true,
            round,
            round_slug: slug,
            tasks: vec![],
            selected_journeys: 0,
            selected_features: 0,
        };
        output(&result, json_mode);
        return Ok(());
    }

    for task in &plan.tasks {
        let path = ws.tasks_dir(&slug).join(format!("{}.json", task.task_id));
        ws.write_json(&path, task)?;
    }

    let now = Utc::now();
    let manifest = RoundManifest {
        round,
        round_slug: slug.clone(),
        created_at: now,
        status: RoundStatus::Prepared,
        selected_journey_ids: plan.selected_journey_ids.clone(),
        selected_feature_ids: plan.selected_feature_ids.clone(),
        tasks: plan
            .tasks
            .iter()
            .map(|task| ManifestTask {
                task_id: task.task_id.clone(),
                agent_type: task.agent_type,
                prompt_file: task.prompt_file.clone(),
                item_count: task.items.len(),
                ids: task.items.ids(),
            })
            .collect(),
        merged_at: None,
        merge_summary: None,
    };
    ws.write_json(&ws.manifest_path(&slug), &manifest)?;

    let instructions = [
        format!("# {slug}"),
        String::new(),
        "1. For each task file in `tasks/`, run one subagent.".to_string(),
        "2. Use the task `promptFile` and the assigned `items` shard.".to_string(),
        "3. Save JSON output to `outputs/<task-id>.json`.".to_string(),
        "4. Run `uxmap merge-round` to review, dedupe, and merge accepted findings.".to_string(),
    ];
    ws.write_text(
        &ws.round_instructions_path(&slug),
        &format!("{}\n", instructions.join("\n")),
    )?;

    state.pending_round = Some(round);
    state.last_run_at = Some(now);
    ws.write_json(&ws.state_path(), &state)?;

    let result = PrepareOutput {
        success: true,
        round,
        round_slug: slug,
        tasks: plan
            .tasks
            .iter()
            .map(|task| PreparedTask {
                task_id: task.task_id.clone(),
                agent_type: task.agent_type.to_string(),
                item_count: task.items.len(),
            })
            .collect(),
        selected_journeys: plan.selected_journey_ids.len(),
        selected_features: plan.selected_feature_ids.len(),
    };
    output(&result, json_mode);
    Ok(())
}
