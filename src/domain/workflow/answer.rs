//! Answers that do not come from the generation service

use serde_json::Value;

use crate::domain::query::Row;

/// Answer for a query that matched nothing
pub const NO_MATCH_ANSWER: &str =
    "I couldn't find any phones matching your question in the database. Try widening the criteria or asking about a different model.";

/// Plain listing of the fetched rows, used when answer generation fails
pub fn fallback_answer(rows: &[Row]) -> String {
    if rows.is_empty() {
        return NO_MATCH_ANSWER.to_string();
    }

    let noun = if rows.len() == 1 { "phone" } else { "phones" };
    let mut out = format!("I found {} matching {}:\n", rows.len(), noun);

    for row in rows {
        out.push_str("- ");
        out.push_str(&describe_row(row));
        out.push('\n');
    }

    out.trim_end().to_string()
}

fn describe_row(row: &Row) -> String {
    let name = row.get("name").map(scalar_text);

    let rest = row
        .iter()
        .filter(|(key, _)| key.as_str() != "name")
        .map(|(key, value)| format!("{}: {}", key, scalar_text(value)))
        .collect::<Vec<_>>()
        .join(", ");

    match (name, rest.is_empty()) {
        (Some(name), true) => name,
        (Some(name), false) => format!("{} ({})", name, rest),
        (None, _) => rest,
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => "n/a".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
