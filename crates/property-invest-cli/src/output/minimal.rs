use serde_json::Value;

use super::{format_value, HEADLINE_SECTIONS};

/// Headline fields in order of priority, covering the pipeline result, the
/// sale analysis, scenario deltas, comparisons and weighted scenarios.
const PRIORITY_KEYS: [&str; 9] = [
    "net_cash_flow",
    "total_return",
    "best_total_return",
    "probability_weighted_net_cash_flow",
    "annual_roi",
    "total_roi",
    "base_case_value",
    "total_paid",
    "npv",
];

/// Print just the key answer value from the output.
///
/// Looks for the headline fields in the `result` envelope and the named
/// sections first, then at the top level, then falls back to the first field.
pub fn print_minimal(value: &Value) {
    let Some(map) = value.as_object() else {
        println!("{}", format_value(value));
        return;
    };

    let mut scopes: Vec<&serde_json::Map<String, Value>> = HEADLINE_SECTIONS
        .iter()
        .filter_map(|section| map.get(*section).and_then(Value::as_object))
        .collect();
    if let Some(steps) = map
        .get("steps")
        .and_then(|s| s.get("property_cash_flow"))
        .and_then(Value::as_object)
    {
        scopes.push(steps);
    }
    scopes.push(map);

    for key in PRIORITY_KEYS {
        for scope in &scopes {
            if let Some(val) = scope.get(key).filter(|v| !v.is_null()) {
                println!("{}", format_value(val));
                return;
            }
        }
    }

    if let Some((key, val)) = map.iter().next() {
        println!("{}: {}", key, format_value(val));
    }
}
