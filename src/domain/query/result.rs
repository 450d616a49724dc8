use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One result row: field name to scalar value
pub type Row = Map<String, Value>;

/// Rows returned by a query, in the store's natural order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub rows: Vec<Row>,
    pub row_count: usize,
}

impl QueryResult {
    pub fn new(rows: Vec<Row>) -> Self {
        let row_count = rows.len();
        Self { rows, row_count }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drops rows beyond `limit`
    pub fn truncated(mut self, limit: usize) -> Self {
        self.rows.truncate(limit);
        self.row_count = self.rows.len();
        self
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(name: &str) -> Row {
        json!({ "name": name }).as_object().unwrap().clone()
    }

    #[test]
    fn test_row_count_tracks_rows() {
        let result = QueryResult::new(vec![row("Galaxy S25"), row("Galaxy S24")]);
        assert_eq!(result.row_count, 2);
        assert!(!result.is_empty());
        assert!(QueryResult::empty().is_empty());
    }

    #[test]
    fn test_truncated_keeps_order() {
        let result = QueryResult::new(vec![row("a"), row("b"), row("c")]).truncated(2);

        assert_eq!(result.row_count, 2);
        assert_eq!(result.rows[0]["name"], "a");
        assert_eq!(result.rows[1]["name"], "b");
    }
}
