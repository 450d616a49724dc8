//! Prompt templates

use crate::domain::query::Row;
use crate::domain::schema::{FewShotExamples, SchemaDescriptor};
use crate::domain::workflow::Rejection;
use crate::domain::Turn;

pub const QUERY_SYSTEM_PROMPT: &str = "You are a SQL expert. Generate valid PostgreSQL queries.";

pub const ANSWER_SYSTEM_PROMPT: &str =
    "You are a knowledgeable phone advisor who explains specifications clearly.";

const HISTORY_ANSWER_CHARS: usize = 200;

pub fn query_prompt(
    schema: &SchemaDescriptor,
    examples: &FewShotExamples,
    question: &str,
    history: &[Turn],
    feedback: Option<&Rejection>,
) -> String {
    let mut prompt = format!(
        "You are an expert at converting natural language questions into PostgreSQL queries.\n\n\
         DATABASE SCHEMA:\n{}\n\
         EXAMPLE QUERIES:\n{}\n\n\
         RULES:\n\
         1. Generate syntactically correct PostgreSQL only\n\
         2. Query only the {} table and only the columns listed above\n\
         3. Use ILIKE for case-insensitive string matching\n\
         4. Include LIMIT 5 unless specified otherwise\n\
         5. Return ONLY the SQL query, no explanations or markdown\n\
         6. Handle NULL values appropriately\n\
         7. Never modify data; a single SELECT statement only\n",
        schema.render(),
        examples.render(),
        schema.relation(),
    );

    if !history.is_empty() {
        prompt.push_str("\nCONVERSATION SO FAR:\n");

        for turn in history {
            prompt.push_str(&format!(
                "Question: {}\nSQL: {}\nAnswer: {}\n\n",
                turn.question(),
                turn.query().unwrap_or("(none)"),
                turn.answer_summary(HISTORY_ANSWER_CHARS),
            ));
        }
    }

    if let Some(rejection) = feedback {
        prompt.push_str(&format!(
            "\nYOUR PREVIOUS QUERY WAS REJECTED:\n{}\nReason: {}\nWrite a corrected query that follows every rule.\n",
            rejection.query, rejection.reason,
        ));
    }

    prompt.push_str(&format!("\nUSER QUESTION:\n{}\n\nSQL QUERY:", question.trim()));
    prompt
}

pub fn answer_prompt(question: &str, query: &str, rows: &[Row]) -> String {
    let results = serde_json::to_string_pretty(rows).unwrap_or_else(|_| "[]".to_string());

    format!(
        "You are a helpful Samsung smartphone expert assistant.\n\n\
         USER QUESTION:\n{}\n\n\
         QUERY USED:\n{}\n\n\
         DATABASE RESULTS ({} rows):\n{}\n\n\
         TASK:\n\
         - Explain the results in clear, conversational English\n\
         - Highlight key specifications and differences\n\
         - Be specific with numbers and details\n\
         - If comparing phones, present side-by-side comparisons\n\
         - Only use facts present in the results\n\
         - Keep response concise but informative (100-200 words)\n\
         - Don't mention SQL or databases\n\n\
         ANSWER:",
        question.trim(),
        query,
        rows.len(),
        results,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValidationError;
    use serde_json::json;

    #[test]
    fn test_query_prompt_sections() {
        let prompt = query_prompt(
            &SchemaDescriptor::phones(),
            &FewShotExamples::builtin(),
            "  Which phones have 5G?  ",
            &[],
            None,
        );

        assert!(prompt.contains("DATABASE SCHEMA:\nTable: samsung_phones"));
        assert!(prompt.contains("Question: Which phones have 5G?\nSQL: SELECT"));
        assert!(prompt.contains("Query only the samsung_phones table"));
        assert!(prompt.ends_with("USER QUESTION:\nWhich phones have 5G?\n\nSQL QUERY:"));
        assert!(!prompt.contains("CONVERSATION SO FAR"));
        assert!(!prompt.contains("REJECTED"));
    }

    #[test]
    fn test_query_prompt_with_history_and_feedback() {
        let history = vec![Turn::answered(
            "Which phones have 5G?",
            "SELECT name FROM samsung_phones LIMIT 5",
            vec![],
            "The Galaxy S25 and S24 support 5G.",
        )];
        let rejection = Rejection {
            query: "DELETE FROM samsung_phones".to_string(),
            reason: ValidationError::NotReadOnly("DELETE".to_string()),
        };

        let prompt = query_prompt(
            &SchemaDescriptor::phones(),
            &FewShotExamples::default(),
            "Which of those is lighter?",
            &history,
            Some(&rejection),
        );

        assert!(prompt.contains("CONVERSATION SO FAR:\nQuestion: Which phones have 5G?"));
        assert!(prompt.contains("Answer: The Galaxy S25 and S24 support 5G."));
        assert!(prompt.contains("DELETE FROM samsung_phones\nReason: query is not read-only: DELETE"));
        assert!(prompt.contains("No examples available."));
    }

    #[test]
    fn test_answer_prompt_embeds_rows() {
        let rows = vec![json!({"name": "Galaxy S25"}).as_object().cloned().unwrap()];
        let prompt = answer_prompt("Lightest phone?", "SELECT name FROM samsung_phones", &rows);

        assert!(prompt.contains("DATABASE RESULTS (1 rows):"));
        assert!(prompt.contains("\"name\": \"Galaxy S25\""));
        assert!(prompt.ends_with("ANSWER:"));
    }
}
