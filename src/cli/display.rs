//! Table and emphasis helpers shared by command output.

use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};
use console::style;

/// Create a standard list table with the given headers.
///
/// Uses the NOTHING preset (no borders) for a clean CLI aesthetic.
pub fn list_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h.to_uppercase()).set_alignment(CellAlignment::Left)),
        );
    table
}

/// Render a pass/fail gate marker.
pub fn gate_marker(pass: bool) -> String {
    if pass {
        style("pass").green().to_string()
    } else {
        style("open").yellow().to_string()
    }
}

/// Render a percentage, or a dash when the target is inapplicable.
pub fn pct_or_dash(pct: Option<f64>) -> String {
    match pct {
        Some(value) => format!("{value}%"),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pct_renders_dash_for_none() {
        assert_eq!(pct_or_dash(None), "-");
        assert_eq!(pct_or_dash(Some(66.67)), "66.67%");
    }

    #[test]
    fn table_headers_are_uppercased() {
        let table = list_table(&["task", "agent"]);
        let rendered = table.to_string();
        assert!(rendered.contains("TASK"));
        assert!(rendered.contains("AGENT"));
    }
}
