pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Sections that hold the headline numbers, in the order they are printed.
/// Engine outputs either wrap them in a `result` envelope or carry them at
/// the top level under these names.
pub const HEADLINE_SECTIONS: [&str; 4] = ["result", "metrics", "deltas", "sale"];

/// Render a scalar cell; nested values fall back to compact JSON.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// The first row-shaped array inside the output: a yearly breakdown, a
/// comparison table, per-scenario results or schedule rows.
pub fn find_rows(map: &Map<String, Value>) -> Option<&Vec<Value>> {
    const ROW_KEYS: [&str; 5] = ["yearly_breakdown", "scenarios", "results", "rows", "matrix"];

    let scope = map.get("result").and_then(Value::as_object).unwrap_or(map);
    ROW_KEYS
        .iter()
        .filter_map(|key| scope.get(*key).and_then(Value::as_array))
        .find(|rows| !rows.is_empty())
}
