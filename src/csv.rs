use serde::Serialize;
use serde_json::Value;

pub const CSV_CONTENT_TYPE: &str = "text/csv;charset=utf-8";

/// Renders records as CSV text, or `None` when there is nothing to export.
///
/// The header is the key list of the first record and every row follows that
/// order. Values are joined with bare commas: embedded commas, quotes and
/// newlines are not escaped.
pub fn export_csv<T: Serialize>(rows: &[T]) -> Result<Option<String>, serde_json::Error> {
    let objects = rows
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;

    let Some(first) = objects.first() else {
        return Ok(None);
    };

    let header: Vec<String> = match first {
        Value::Object(map) => map.keys().cloned().collect(),
        _ => Vec::new(),
    };

    let body = objects
        .iter()
        .map(|row| {
            header
                .iter()
                .map(|key| render_cell(row.get(key)))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n");

    Ok(Some(format!("{}\n{}", header.join(","), body)))
}

fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
