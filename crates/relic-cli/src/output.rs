//! Output formatting for listings
//!
//! Text output goes through `comfy_table`; the JSON formats serialize a
//! `serde_json::Value` built by each command.

use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Table, presets};
use serde_json::Value;

use crate::OutputFormat;

/// Table with the given column headers
pub fn create_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_HORIZONTAL_ONLY)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| header_cell(h)));
    table
}

/// Bold, left-aligned header cell
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .add_attribute(Attribute::Bold)
        .set_alignment(CellAlignment::Left)
}

/// Right-aligned numeric cell
pub fn numeric_cell(value: impl ToString) -> Cell {
    Cell::new(value.to_string()).set_alignment(CellAlignment::Right)
}

/// Left-aligned text cell
pub fn regular_cell(text: impl ToString) -> Cell {
    Cell::new(text.to_string()).set_alignment(CellAlignment::Left)
}

/// Render `value` in one of the JSON formats
///
/// Returns `None` for [`OutputFormat::Text`], which callers render as a table.
pub fn render_json(value: &Value, format: OutputFormat) -> serde_json::Result<Option<String>> {
    match format {
        OutputFormat::Text => Ok(None),
        OutputFormat::Json => serde_json::to_string(value).map(Some),
        OutputFormat::JsonPretty => serde_json::to_string_pretty(value).map(Some),
    }
}

/// Print `value` as JSON or `table` as text, depending on `format`
pub fn print_listing(value: &Value, table: &Table, format: OutputFormat) -> serde_json::Result<()> {
    match render_json(value, format)? {
        Some(json) => println!("{json}"),
        None => println!("{table}"),
    }
    Ok(())
}

/// Human-readable byte count
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KiB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MiB");
    }

    #[test]
    fn test_render_json() {
        let value = json!({"files": 2});
        assert_eq!(render_json(&value, OutputFormat::Text).unwrap(), None);
        assert_eq!(
            render_json(&value, OutputFormat::Json).unwrap().as_deref(),
            Some(r#"{"files":2}"#)
        );
        assert!(
            render_json(&value, OutputFormat::JsonPretty)
                .unwrap()
                .unwrap()
                .contains('\n')
        );
    }

    #[test]
    fn test_table_lists_rows() {
        let mut table = create_table(&["Index", "Name"]);
        table.add_row(vec![numeric_cell(7), regular_cell("INTRO.MVE")]);
        let text = table.to_string();
        assert!(text.contains("Index"));
        assert!(text.contains("INTRO.MVE"));
    }
}
