//! Bulk loading of scraped phone records

use std::path::Path;

use serde_json::Value;
use sqlx::postgres::{PgPool, Postgres};
use sqlx::QueryBuilder;
use tracing::{info, warn};

use super::pool::quote_ident;
use crate::domain::schema::{FieldDescriptor, FieldType, SchemaDescriptor};
use crate::domain::{DomainError, Row};

/// Field that identifies a record across loads
const UPSERT_KEY: &str = "url";

/// Rows per INSERT statement; keeps bind parameters under the protocol limit
const BATCH_SIZE: usize = 500;

/// `CREATE TABLE IF NOT EXISTS` statement plus indexes for the descriptor
pub fn create_table_sql(schema: &SchemaDescriptor) -> String {
    let columns = schema
        .fields()
        .iter()
        .map(column_definition)
        .collect::<Vec<_>>()
        .join(",\n    ");

    let table = quote_ident(schema.relation());
    let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (\n    {}\n);", table, columns);

    for indexed in ["name", "launch_announced"] {
        if schema.has_field(indexed) {
            sql.push_str(&format!(
                "\nCREATE INDEX IF NOT EXISTS {} ON {} ({});",
                quote_ident(&format!("idx_{}_{}", schema.relation(), indexed)),
                table,
                quote_ident(indexed)
            ));
        }
    }

    sql
}

fn column_definition(field: &FieldDescriptor) -> String {
    let name = quote_ident(&field.name);

    match (field.generated, field.field_type) {
        (true, FieldType::Integer) => format!("{} SERIAL PRIMARY KEY", name),
        (true, FieldType::Timestamp) => format!("{} TIMESTAMP DEFAULT CURRENT_TIMESTAMP", name),
        _ if field.name == UPSERT_KEY => format!("{} {} UNIQUE NOT NULL", name, field.field_type.sql_type()),
        _ => format!("{} {}", name, field.field_type.sql_type()),
    }
}

fn is_textual(field_type: FieldType) -> bool {
    matches!(field_type, FieldType::Text | FieldType::Varchar(_))
}

/// Value bound for one field of a scraped record; missing text becomes ''
fn field_value(field: &FieldDescriptor, record: &Row) -> Option<String> {
    match record.get(&field.name) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None if is_textual(field.field_type) => Some(String::new()),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    }
}

/// Writes scraped records into the phone table
#[derive(Debug, Clone)]
pub struct PhoneLoader {
    pool: PgPool,
    schema: SchemaDescriptor,
}

impl PhoneLoader {
    pub fn new(pool: PgPool, schema: SchemaDescriptor) -> Self {
        Self { pool, schema }
    }

    pub async fn ensure_table(&self) -> Result<(), DomainError> {
        sqlx::raw_sql(&create_table_sql(&self.schema))
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create table: {}", e)))?;

        info!(table = %self.schema.relation(), "Table created/verified");
        Ok(())
    }

    /// Load a JSON array of records from `path`, returning how many were written
    pub async fn load_file(&self, path: impl AsRef<Path>) -> Result<usize, DomainError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            DomainError::validation(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let records: Vec<Row> = serde_json::from_str(&content).map_err(|e| {
            DomainError::validation(format!("{} is not a JSON array of objects: {}", path.display(), e))
        })?;

        info!(count = records.len(), file = %path.display(), "Loaded records");
        self.upsert(&records).await
    }

    /// Insert or update records keyed by their URL
    pub async fn upsert(&self, records: &[Row]) -> Result<usize, DomainError> {
        if !self.schema.has_field(UPSERT_KEY) {
            return Err(DomainError::configuration(format!(
                "Schema for '{}' has no '{}' field to upsert on",
                self.schema.relation(),
                UPSERT_KEY
            )));
        }

        let keyed: Vec<&Row> = records
            .iter()
            .filter(|record| match record.get(UPSERT_KEY) {
                Some(Value::String(url)) if !url.is_empty() => true,
                _ => {
                    warn!("Skipping record without a url");
                    false
                }
            })
            .collect();

        let fields: Vec<&FieldDescriptor> = self.schema.producer_fields().collect();
        let mut written = 0;

        for batch in keyed.chunks(BATCH_SIZE) {
            let mut builder = self.insert_statement(&fields);

            builder.push_values(batch, |mut row, record| {
                for field in &fields {
                    row.push_bind(field_value(field, record));
                    if !is_textual(field.field_type) {
                        row.push_unseparated(format!("::{}", field.field_type.sql_type()));
                    }
                }
            });

            self.push_conflict_clause(&mut builder, &fields);

            let result = builder
                .build()
                .execute(&self.pool)
                .await
                .map_err(|e| DomainError::storage(format!("Failed to upsert phones: {}", e)))?;

            written += result.rows_affected() as usize;
        }

        info!(written, "Upserted phones");
        Ok(written)
    }

    fn insert_statement(&self, fields: &[&FieldDescriptor]) -> QueryBuilder<'static, Postgres> {
        let columns = fields
            .iter()
            .map(|f| quote_ident(&f.name))
            .collect::<Vec<_>>()
            .join(", ");

        QueryBuilder::new(format!(
            "INSERT INTO {} ({}) ",
            quote_ident(self.schema.relation()),
            columns
        ))
    }

    fn push_conflict_clause(&self, builder: &mut QueryBuilder<'static, Postgres>, fields: &[&FieldDescriptor]) {
        let mut updates: Vec<String> = fields
            .iter()
            .filter(|f| f.name != UPSERT_KEY)
            .map(|f| format!("{0} = EXCLUDED.{0}", quote_ident(&f.name)))
            .collect();

        if self.schema.has_field("updated_at") {
            updates.push("\"updated_at\" = CURRENT_TIMESTAMP".to_string());
        }

        builder.push(format!(" ON CONFLICT ({}) DO ", quote_ident(UPSERT_KEY)));

        if updates.is_empty() {
            builder.push("NOTHING");
        } else {
            builder.push("UPDATE SET ");
            builder.push(updates.join(", "));
        }
    }
}
