use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{find_rows, format_value, HEADLINE_SECTIONS};

/// Format output as tables: one field/value table per headline section,
/// then any row-shaped data, then warnings and suggestions.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => print_report(map),
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{value}"),
    }
}

fn print_report(map: &Map<String, Value>) {
    let mut printed = false;
    for section in HEADLINE_SECTIONS {
        if let Some(Value::Object(inner)) = map.get(section) {
            if printed {
                println!();
            }
            println!("{}", title(section));
            print_fields(inner);
            printed = true;
        }
    }
    if !printed {
        print_fields(map);
    }

    if let Some(rows) = find_rows(map) {
        println!();
        print_array_table(rows);
    }

    for list in ["warnings", "suggestions", "validation_errors"] {
        print_messages(map, list);
    }

    if let Some(Value::String(meth)) = map.get("methodology") {
        println!("\nMethodology: {meth}");
    }
}

fn title(section: &str) -> &'static str {
    match section {
        "metrics" => "Metrics",
        "deltas" => "Change vs base",
        "sale" => "Sale",
        _ => "Result",
    }
}

/// Scalar fields only; nested sections, rows and messages are printed separately.
fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        if val.is_object() || val.is_array() {
            continue;
        }
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_messages(map: &Map<String, Value>, key: &str) {
    if let Some(Value::Array(items)) = map.get(key) {
        if items.is_empty() {
            return;
        }
        println!("\n{}:", capitalise(key));
        for item in items.iter().filter_map(Value::as_str) {
            println!("  - {item}");
        }
    }
}

fn capitalise(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    match arr.first() {
        Some(Value::Object(first)) => {
            let headers: Vec<String> = first.keys().cloned().collect();
            let mut builder = Builder::default();
            builder.push_record(&headers);

            for item in arr.iter().filter_map(Value::as_object) {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| item.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
            println!("{}", Table::from(builder));
        }
        // Sensitivity matrix: one row of cells per variable_1 value
        Some(Value::Array(_)) => {
            let mut builder = Builder::default();
            for row in arr.iter().filter_map(Value::as_array) {
                builder.push_record(row.iter().map(format_value));
            }
            println!("{}", Table::from(builder));
        }
        _ => {
            for item in arr {
                println!("{}", format_value(item));
            }
        }
    }
}
