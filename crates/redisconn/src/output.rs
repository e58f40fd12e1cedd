use anyhow::Result;
use comfy_table::Table;
use serde::Serialize;
use serde_json::Value;

pub use crate::cli::OutputFormat;

/// Print data in the requested format
pub fn print_output<T: Serialize>(data: T, format: OutputFormat) -> Result<()> {
    let json_value = serde_json::to_value(data)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json_value)?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(&json_value)?);
        }
        OutputFormat::Table => {
            println!("{}", render_table(&json_value));
        }
    }

    Ok(())
}

/// Render a value as a table
///
/// Objects become field/value rows, arrays of objects get one column per key.
fn render_table(value: &Value) -> String {
    match value {
        Value::Array(arr) if !arr.is_empty() => {
            let mut table = Table::new();

            if let Value::Object(first) = &arr[0] {
                let headers: Vec<String> = first.keys().cloned().collect();
                table.set_header(headers.clone());

                for item in arr {
                    if let Value::Object(obj) = item {
                        let row: Vec<String> = headers
                            .iter()
                            .map(|h| format_cell(obj.get(h).unwrap_or(&Value::Null)))
                            .collect();
                        table.add_row(row);
                    }
                }
            } else {
                table.set_header(vec!["Value"]);
                for item in arr {
                    table.add_row(vec![format_cell(item)]);
                }
            }

            table.to_string()
        }
        Value::Object(obj) => {
            let mut table = Table::new();
            table.set_header(vec!["Field", "Value"]);
            for (key, val) in obj {
                table.add_row(vec![key.clone(), format_cell(val)]);
            }
            table.to_string()
        }
        other => format_cell(other),
    }
}

fn format_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
        other => other.to_string(),
    }
}
