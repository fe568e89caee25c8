//! Implementation of the `uxmap init` command.

use anyhow::Result;
use std::path::Path;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{
    CoverageFile, FeatureCoverageSummary, FeatureFrontierItem, FeatureMap, FrontierFile,
    JourneyCoverageSummary, JourneyFrontierItem, JourneyMap, OrchestrationConfig,
    OrchestrationState,
};
use crate::infrastructure::workspace::Workspace;
use crate::services::report;

const PROMPT_STUBS: &[(&str, &str)] = &[
    (
        "output-schemas.md",
        "# Output Schemas\n\nSubagents must return JSON only.\n",
    ),
    ("journey-discover-new.md", "# Journey Discover-New Agent Prompt\n"),
    (
        "journey-extend-existing.md",
        "# Journey Extend-Existing Agent Prompt\n",
    ),
    ("journey-reviewer.md", "# Journey Reviewer Agent Prompt\n"),
    ("feature-inventory.md", "# Feature Inventory Agent Prompt\n"),
    ("feature-exercise.md", "# Feature Exercise Agent Prompt\n"),
    ("feature-expansion.md", "# Feature Expansion Agent Prompt\n"),
    ("feature-audit.md", "# Feature Audit Agent Prompt\n"),
];

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub workspace: String,
    pub files_created: Vec<String>,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if !self.files_created.is_empty() {
            lines.push("\nCreated:".to_string());
            for file in &self.files_created {
                lines.push(format!("  - {file}"));
            }
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Scaffold the docs/ workspace. Idempotent: existing files are never
/// overwritten, so re-running after rounds have merged is safe.
pub fn execute(root: &Path, json_mode: bool) -> Result<()> {
    let ws = Workspace::new(root);
    let config = OrchestrationConfig::default();
    let mut created: Vec<String> = Vec::new();

    ws.ensure_dir(&ws.docs_dir())?;
    ws.ensure_dir(&ws.runs_dir())?;
    ws.ensure_dir(&ws.prompts_dir())?;

    let mut track = |name: &str, was_created: bool| {
        if was_created {
            created.push(name.to_string());
        }
    };

    track(
        "docs/orchestration.config.json",
        ws.ensure_json(&ws.config_path(), &config)?,
    );
    track(
        "docs/orchestration-state.json",
        ws.ensure_json(&ws.state_path(), &OrchestrationState::default())?,
    );
    track(
        "docs/journey-frontier.json",
        ws.ensure_json(
            &ws.journey_frontier_path(),
            &FrontierFile::<JourneyFrontierItem>::seeded(),
        )?,
    );
    track(
        "docs/feature-frontier.json",
        ws.ensure_json(
            &ws.feature_frontier_path(),
            &FrontierFile::<FeatureFrontierItem>::seeded(),
        )?,
    );
    track(
        "docs/journey-map.json",
        ws.ensure_json(&ws.journey_map_path(), &JourneyMap::default())?,
    );
    track(
        "docs/feature-map.json",
        ws.ensure_json(&ws.feature_map_path(), &FeatureMap::default())?,
    );
    track(
        "docs/journey-coverage.json",
        ws.ensure_json(
            &ws.journey_coverage_path(),
            &CoverageFile::<JourneyCoverageSummary>::default(),
        )?,
    );
    track(
        "docs/feature-coverage.json",
        ws.ensure_json(
            &ws.feature_coverage_path(),
            &CoverageFile::<FeatureCoverageSummary>::default(),
        )?,
    );
    track(
        "docs/journey-map.md",
        ws.ensure_file(
            &ws.journey_map_md_path(),
            &report::journey_markdown(&JourneyMap::default(), &config),
        )?,
    );
    track(
        "docs/feature-map.md",
        ws.ensure_file(
            &ws.feature_map_md_path(),
            &report::feature_markdown(&FeatureMap::default()),
        )?,
    );
    track(
        "docs/journey-candidates.jsonl",
        ws.ensure_file(&ws.journey_candidates_path(), "")?,
    );
    track(
        "docs/feature-candidates.jsonl",
        ws.ensure_file(&ws.feature_candidates_path(), "")?,
    );
    track(
        "docs/agent-runs/.gitkeep",
        ws.ensure_file(&ws.runs_dir().join(".gitkeep"), "")?,
    );

    for (file_name, content) in PROMPT_STUBS {
        track(
            &format!("docs/subagent-prompts/{file_name}"),
            ws.ensure_file(&ws.prompts_dir().join(file_name), content)?,
        );
    }

    let result = InitOutput {
        success: true,
        message: "Initialized ux-map workspace.".to_string(),
        workspace: ws.root().display().to_string(),
        files_created: created,
    };
    output(&result, json_mode);
    Ok(())
}
