//! Fixed, parameterized catalogue lookups behind the `/v1/phones` endpoints

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::postgres::PgPool;

use super::executor::map_sqlx_error;
use super::pool::quote_ident;
use crate::domain::{ExecutionError, Row};

const SEARCH_COLUMNS: &str = "id, name, image_url, platform_os, main_camera, battery_type, misc_price";
const POPULAR_COLUMNS: &str = "id, name, image_url, launch_announced, platform_os, main_camera";
const POPULAR_LIMIT: i64 = 10;

/// Aggregate figures about the catalogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_phones: i64,
    pub unique_chipsets: i64,
    pub phones_with_5g: i64,
}

#[derive(Debug, Clone)]
pub struct PhoneCatalog {
    pool: PgPool,
    table: String,
}

impl PhoneCatalog {
    pub fn new(pool: PgPool, relation: &str) -> Self {
        Self {
            pool,
            table: quote_ident(relation),
        }
    }

    /// Phones whose name contains `text`, case-insensitively
    pub async fn search(&self, text: &str, limit: i64) -> Result<Vec<Row>, ExecutionError> {
        let sql = format!(
            "SELECT row_to_json(p) FROM (SELECT {} FROM {} WHERE name ILIKE $1 ORDER BY name LIMIT $2) p",
            SEARCH_COLUMNS, self.table
        );

        let rows: Vec<(Value,)> = sqlx::query_as(&sql)
            .bind(format!("%{}%", escape_like(text)))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(into_rows(rows))
    }

    /// Most recently added phones that have an announcement date
    pub async fn popular(&self) -> Result<Vec<Row>, ExecutionError> {
        let sql = format!(
            "SELECT row_to_json(p) FROM (SELECT {} FROM {} WHERE launch_announced <> '' ORDER BY id DESC LIMIT $1) p",
            POPULAR_COLUMNS, self.table
        );

        let rows: Vec<(Value,)> = sqlx::query_as(&sql)
            .bind(POPULAR_LIMIT)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(into_rows(rows))
    }

    /// Every stored field of one phone
    pub async fn find(&self, id: i32) -> Result<Option<Row>, ExecutionError> {
        let sql = format!("SELECT row_to_json(p) FROM {} p WHERE p.id = $1", self.table);

        let row: Option<(Value,)> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.and_then(|(value,)| match value {
            Value::Object(map) => Some(map),
            _ => None,
        }))
    }

    pub async fn stats(&self) -> Result<CatalogStats, ExecutionError> {
        let sql = format!(
            "SELECT COUNT(*), COUNT(DISTINCT platform_chipset), \
             COUNT(*) FILTER (WHERE network_5g_bands <> '') FROM {}",
            self.table
        );

        let (total_phones, unique_chipsets, phones_with_5g): (i64, i64, i64) =
            sqlx::query_as(&sql)
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(CatalogStats {
            total_phones,
            unique_chipsets,
            phones_with_5g,
        })
    }
}

fn into_rows(rows: Vec<(Value,)>) -> Vec<Row> {
    rows.into_iter()
        .filter_map(|(value,)| match value {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect()
}

/// Escape LIKE wildcards so user text matches literally
fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}
