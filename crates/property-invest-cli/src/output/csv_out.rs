use serde_json::{Map, Value};
use std::io;

use super::{find_rows, format_value, HEADLINE_SECTIONS};

/// Write output as CSV to stdout. Row-shaped data (yearly breakdown,
/// comparison, schedule) becomes a table; otherwise the headline sections
/// are written as `section,field,value` triples.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let written = match value {
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        Value::Object(map) => match find_rows(map) {
            Some(rows) => write_array_csv(&mut wtr, rows),
            None => write_fields_csv(&mut wtr, map),
        },
        _ => wtr.write_record([format_value(value)]),
    };

    if let Err(e) = written.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        tracing::error!(error = %e, "CSV output failed");
    }
}

fn write_fields_csv(
    wtr: &mut csv::Writer<io::StdoutLock<'_>>,
    map: &Map<String, Value>,
) -> csv::Result<()> {
    wtr.write_record(["section", "field", "value"])?;
    let mut sections: Vec<(&str, &Map<String, Value>)> = HEADLINE_SECTIONS
        .iter()
        .filter_map(|s| map.get(*s).and_then(Value::as_object).map(|m| (*s, m)))
        .collect();
    if sections.is_empty() {
        sections.push(("", map));
    }

    for (section, fields) in sections {
        for (key, val) in fields {
            if val.is_object() || val.is_array() {
                continue;
            }
            wtr.write_record([section, key.as_str(), &format_value(val)])?;
        }
    }
    Ok(())
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) -> csv::Result<()> {
    match arr.first() {
        Some(Value::Object(first)) => {
            let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
            wtr.write_record(&headers)?;

            for item in arr.iter().filter_map(Value::as_object) {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| item.get(*h).map(format_value).unwrap_or_default())
                    .collect();
                wtr.write_record(&row)?;
            }
        }
        Some(Value::Array(_)) => {
            for row in arr.iter().filter_map(Value::as_array) {
                wtr.write_record(row.iter().map(format_value))?;
            }
        }
        _ => {
            for item in arr {
                wtr.write_record([format_value(item)])?;
            }
        }
    }
    Ok(())
}
