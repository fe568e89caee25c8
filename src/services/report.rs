//! Human-readable markdown projections of the accepted maps.
//!
//! The `.md` files are regenerated from the `.json` maps on every merge and
//! are never read back; hand edits do not survive the next round.

use crate::domain::models::{FeatureMap, JourneyMap, OrchestrationConfig};

/// Escape a value for a markdown table cell.
fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

/// Render `docs/journey-map.md` from the journey map.
pub fn journey_markdown(map: &JourneyMap, config: &OrchestrationConfig) -> String {
    let mut lines = vec![
        "# Journey Map".to_string(),
        String::new(),
        "Accepted end-to-end journeys discovered by subagents.".to_string(),
        String::new(),
        "## Completion Gates".to_string(),
        String::new(),
        format!(
            "- Route coverage target: `{}%` of expected routes (if configured)",
            config.target_route_coverage_pct
        ),
        "- Role coverage target: all configured roles should have accepted journeys".to_string(),
        "- Frontier must be empty".to_string(),
        format!(
            "- No-new-findings streak must meet threshold (default: `{}` rounds)",
            config.stagnation_threshold
        ),
        String::new(),
        "## Accepted Journeys".to_string(),
        String::new(),
        "| id | role | goal | entrypoint | terminal_state | key_routes | status | evidence |"
            .to_string(),
        "| --- | --- | --- | --- | --- | --- | --- | --- |".to_string(),
    ];

    for journey in &map.journeys {
        let key_routes = journey.key_routes.join(" -> ");
        let evidence = journey
            .evidence
            .iter()
            .filter_map(|entry| {
                entry
                    .path
                    .clone()
                    .filter(|s| !s.is_empty())
                    .or_else(|| entry.url.clone().filter(|s| !s.is_empty()))
                    .or_else(|| entry.note.clone().filter(|s| !s.is_empty()))
            })
            .take(2)
            .collect::<Vec<_>>()
            .join("; ");

        lines.push(format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} |",
            escape_cell(&journey.id),
            escape_cell(&journey.role),
            escape_cell(&journey.goal),
            escape_cell(&journey.entrypoint),
            escape_cell(&journey.terminal_state),
            escape_cell(&key_routes),
            escape_cell(&journey.status),
            escape_cell(&evidence),
        ));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Render `docs/feature-map.md` from the feature map.
pub fn feature_markdown(map: &FeatureMap) -> String {
    let mut lines = vec![
        "# Feature Map".to_string(),
        String::new(),
        "Accepted feature-level interactions discovered by subagents.".to_string(),
        String::new(),
        "## Interaction Contract".to_string(),
        String::new(),
        "1. Control is visible and enabled.".to_string(),
        "2. Interaction is executed.".to_string(),
        "3. Expected effect is asserted.".to_string(),
        "4. Newly revealed UI is recrawled and added to frontier.".to_string(),
        String::new(),
        "## Accepted Features".to_string(),
        String::new(),
        "| id | role | route | state | selector | action | expected | discovered_after | status | evidence |"
            .to_string(),
        "| --- | --- | --- | --- | --- | --- | --- | --- | --- | --- |".to_string(),
    ];

    for feature in &map.features {
        let evidence = feature
            .evidence
            .screenshot
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| feature.evidence.assertion.clone().filter(|s| !s.is_empty()))
            .or_else(|| feature.evidence.url.clone().filter(|s| !s.is_empty()))
            .unwrap_or_default();

        lines.push(format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {} |",
            escape_cell(&feature.id),
            escape_cell(&feature.role),
            escape_cell(&feature.route),
            escape_cell(&feature.state),
            escape_cell(&feature.selector),
            escape_cell(&feature.action),
            escape_cell(&feature.expected),
            escape_cell(&feature.discovered_after),
            escape_cell(&feature.status),
            escape_cell(&evidence),
        ));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
