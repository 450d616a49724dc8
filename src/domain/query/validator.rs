//! Static safety and shape checks for candidate queries
//!
//! The validator is pure: it never touches the store. A candidate passes only if it is a
//! single read-only `SELECT` over the designated relation that references known fields.
//! Every passing query leaves with a LIMIT no larger than the configured row cap.

use std::collections::HashSet;
use std::ops::ControlFlow;

use once_cell::sync::Lazy;
use regex::Regex;
use sqlparser::ast::{
    visit_expressions, visit_relations, visit_statements, Expr, Ident, ObjectName, Query,
    SelectItem, SetExpr, Statement, TableFactor, TableWithJoins, Value,
};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use thiserror::Error;

use crate::domain::schema::SchemaDescriptor;

static STRING_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"'(?:[^']|'')*'").unwrap());

static FORBIDDEN_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(insert|update|delete|merge|upsert|drop|alter|create|truncate|grant|revoke|copy|vacuum|analyze|reindex|cluster|refresh|comment|call|execute|prepare|deallocate|listen|notify|lock|set|reset|do|begin|commit|rollback|savepoint)\b",
    )
    .unwrap()
});

const DENIED_FUNCTION_PREFIXES: &[&str] = &["pg_", "lo_", "dblink"];

const DENIED_FUNCTIONS: &[&str] = &[
    "set_config",
    "current_setting",
    "nextval",
    "setval",
    "currval",
    "query_to_xml",
    "query_to_xml_and_xmlschema",
    "table_to_xml",
    "schema_to_xml",
    "database_to_xml",
    "cursor_to_xml",
    "txid_current",
];

/// Reason a candidate query was rejected
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("query is empty")]
    Empty,

    #[error("query could not be parsed: {0}")]
    Unparseable(String),

    #[error("expected exactly one statement, found {0}")]
    MultipleStatements(usize),

    #[error("query is not read-only: {0}")]
    NotReadOnly(String),

    #[error("query references relation '{found}', only '{allowed}' may be queried")]
    ForbiddenRelation { found: String, allowed: String },

    #[error("query does not read from '{0}'")]
    MissingRelation(String),

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("function '{0}' is not allowed")]
    ForbiddenFunction(String),

    #[error("unsupported clause: {0}")]
    UnsupportedClause(String),
}

/// A query that passed validation, with its effective row cap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuery {
    sql: String,
    limit: usize,
}

impl ValidatedQuery {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    #[cfg(test)]
    pub(crate) fn for_tests(sql: impl Into<String>, limit: usize) -> Self {
        Self {
            sql: sql.into(),
            limit,
        }
    }
}

/// Outcome of validating a candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid(ValidatedQuery),
    Invalid(ValidationError),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// Row caps applied to validated queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// LIMIT injected when the candidate has none
    pub default_limit: usize,
    /// Upper bound for any LIMIT
    pub max_rows: usize,
}

impl ValidatorConfig {
    pub fn new(default_limit: usize, max_rows: usize) -> Self {
        let max_rows = max_rows.max(1);

        Self {
            default_limit: default_limit.clamp(1, max_rows),
            max_rows,
        }
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self::new(5, 50)
    }
}

/// Names a query may legitimately use besides schema fields
#[derive(Debug, Default)]
struct Scope {
    ctes: HashSet<String>,
    table_aliases: HashSet<String>,
    column_aliases: HashSet<String>,
}

impl Scope {
    fn collect(query: &Query) -> Self {
        let mut scope = Self::default();
        scope.add_query(query);
        scope
    }

    fn add_query(&mut self, query: &Query) {
        if let Some(with) = &query.with {
            for cte in &with.cte_tables {
                self.ctes.insert(lower(&cte.alias.name));
                self.column_aliases
                    .extend(cte.alias.columns.iter().map(lower));
                self.add_query(&cte.query);
            }
        }

        self.add_set_expr(&query.body);
    }

    fn add_set_expr(&mut self, body: &SetExpr) {
        match body {
            SetExpr::Select(select) => {
                for item in &select.projection {
                    if let SelectItem::ExprWithAlias { alias, .. } = item {
                        self.column_aliases.insert(lower(alias));
                    }
                }

                for table in &select.from {
                    self.add_table_with_joins(table);
                }
            }
            SetExpr::Query(query) => self.add_query(query),
            SetExpr::SetOperation { left, right, .. } => {
                self.add_set_expr(left);
                self.add_set_expr(right);
            }
            _ => {}
        }
    }

    fn add_table_with_joins(&mut self, table: &TableWithJoins) {
        self.add_table_factor(&table.relation);

        for join in &table.joins {
            self.add_table_factor(&join.relation);
        }
    }

    fn add_table_factor(&mut self, factor: &TableFactor) {
        match factor {
            TableFactor::Table { alias, .. } => {
                if let Some(alias) = alias {
                    self.table_aliases.insert(lower(&alias.name));
                }
            }
            TableFactor::Derived {
                subquery, alias, ..
            } => {
                if let Some(alias) = alias {
                    self.table_aliases.insert(lower(&alias.name));
                    self.column_aliases.extend(alias.columns.iter().map(lower));
                }
                self.add_query(subquery);
            }
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => self.add_table_with_joins(table_with_joins),
            _ => {}
        }
    }
}

fn lower(ident: &Ident) -> String {
    ident.value.to_lowercase()
}

/// Pure validator for candidate queries
#[derive(Debug, Clone, Default)]
pub struct QueryValidator {
    config: ValidatorConfig,
}

impl QueryValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Check a candidate against the schema
    pub fn validate(&self, candidate: &str, schema: &SchemaDescriptor) -> Verdict {
        match self.check(candidate, schema) {
            Ok(query) => Verdict::Valid(query),
            Err(error) => Verdict::Invalid(error),
        }
    }

    fn check(
        &self,
        candidate: &str,
        schema: &SchemaDescriptor,
    ) -> Result<ValidatedQuery, ValidationError> {
        let candidate = candidate.trim();

        if candidate.is_empty() {
            return Err(ValidationError::Empty);
        }

        screen_keywords(candidate)?;

        let mut statements = Parser::parse_sql(&PostgreSqlDialect {}, candidate)
            .map_err(|e| ValidationError::Unparseable(e.to_string()))?;

        match statements.len() {
            0 => return Err(ValidationError::Empty),
            1 => {}
            n => return Err(ValidationError::MultipleStatements(n)),
        }

        let mut statement = statements.remove(0);

        let scope = match &statement {
            Statement::Query(query) => {
                ensure_read_only(&statement, query)?;
                check_relations(query, schema)?;
                Scope::collect(query)
            }
            other => return Err(ValidationError::NotReadOnly(statement_kind(other))),
        };

        check_expressions(&statement, schema, &scope)?;

        let limit = self.apply_limit(&mut statement);

        Ok(ValidatedQuery {
            sql: statement.to_string(),
            limit,
        })
    }

    fn apply_limit(&self, statement: &mut Statement) -> usize {
        let Statement::Query(query) = statement else {
            return self.config.default_limit;
        };

        let limit = match &query.limit {
            Some(Expr::Value(Value::Number(n, _))) => n
                .parse::<usize>()
                .map(|requested| requested.min(self.config.max_rows))
                .unwrap_or(self.config.default_limit),
            _ => self.config.default_limit,
        };

        query.limit = Some(Expr::Value(Value::Number(limit.to_string(), false)));
        limit
    }
}

fn screen_keywords(candidate: &str) -> Result<(), ValidationError> {
    let without_literals = STRING_LITERAL.replace_all(candidate, "''");

    match FORBIDDEN_KEYWORD.captures(&without_literals) {
        Some(caps) => Err(ValidationError::NotReadOnly(caps[1].to_uppercase())),
        None => Ok(()),
    }
}

fn statement_kind(statement: &Statement) -> String {
    statement
        .to_string()
        .split_whitespace()
        .next()
        .unwrap_or("statement")
        .to_uppercase()
}

fn ensure_read_only(statement: &Statement, query: &Query) -> Result<(), ValidationError> {
    let nested = visit_statements(statement, |s| match s {
        Statement::Query(_) => ControlFlow::Continue(()),
        other => ControlFlow::Break(statement_kind(other)),
    });

    if let ControlFlow::Break(kind) = nested {
        return Err(ValidationError::NotReadOnly(kind));
    }

    check_query_shape(query)
}

fn check_query_shape(query: &Query) -> Result<(), ValidationError> {
    if !query.locks.is_empty() {
        return Err(ValidationError::NotReadOnly("row locking clause".to_string()));
    }

    if query.fetch.is_some() {
        return Err(ValidationError::UnsupportedClause("FETCH".to_string()));
    }

    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            check_query_shape(&cte.query)?;
        }
    }

    check_set_expr(&query.body)
}

fn check_set_expr(body: &SetExpr) -> Result<(), ValidationError> {
    match body {
        SetExpr::Select(select) => {
            if select.into.is_some() {
                return Err(ValidationError::NotReadOnly("SELECT INTO".to_string()));
            }

            for table in &select.from {
                check_table_with_joins(table)?;
            }

            Ok(())
        }
        SetExpr::Query(query) => check_query_shape(query),
        SetExpr::SetOperation { left, right, .. } => {
            check_set_expr(left)?;
            check_set_expr(right)
        }
        SetExpr::Values(_) => Ok(()),
        _ => Err(ValidationError::NotReadOnly(
            "unsupported query body".to_string(),
        )),
    }
}

fn check_table_with_joins(table: &TableWithJoins) -> Result<(), ValidationError> {
    check_table_factor(&table.relation)?;

    for join in &table.joins {
        check_table_factor(&join.relation)?;
    }

    Ok(())
}

fn check_table_factor(factor: &TableFactor) -> Result<(), ValidationError> {
    match factor {
        TableFactor::Derived { subquery, .. } => check_query_shape(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => check_table_with_joins(table_with_joins),
        _ => Ok(()),
    }
}

/// Resolves every relation reference against the CTE names visible where it appears
struct RelationWalker<'a> {
    schema: &'a SchemaDescriptor,
    walked: HashSet<*const Query>,
    checked: usize,
    touches_relation: bool,
}

impl<'a> RelationWalker<'a> {
    fn new(schema: &'a SchemaDescriptor) -> Self {
        Self {
            schema,
            walked: HashSet::new(),
            checked: 0,
            touches_relation: false,
        }
    }

    fn walk_query(&mut self, query: &Query, outer: &[String]) -> Result<(), ValidationError> {
        self.walked.insert(query as *const Query);
        let mut visible = outer.to_vec();

        if let Some(with) = &query.with {
            if with.recursive {
                visible.extend(with.cte_tables.iter().map(|cte| identifier(&cte.alias.name)));
            }

            for cte in &with.cte_tables {
                if is_catalog_name(&cte.alias.name.value) {
                    return Err(self.forbidden(cte.alias.name.value.clone()));
                }

                self.walk_query(&cte.query, &visible)?;

                if !with.recursive {
                    visible.push(identifier(&cte.alias.name));
                }
            }
        }

        self.walk_set_expr(&query.body, &visible)?;
        self.walk_expression_subqueries(query, &visible)
    }

    fn walk_set_expr(&mut self, body: &SetExpr, visible: &[String]) -> Result<(), ValidationError> {
        match body {
            SetExpr::Select(select) => {
                for table in &select.from {
                    self.walk_table_with_joins(table, visible)?;
                }

                Ok(())
            }
            SetExpr::Query(query) => self.walk_query(query, visible),
            SetExpr::SetOperation { left, right, .. } => {
                self.walk_set_expr(left, visible)?;
                self.walk_set_expr(right, visible)
            }
            SetExpr::Values(_) => Ok(()),
            _ => Err(ValidationError::NotReadOnly(
                "unsupported query body".to_string(),
            )),
        }
    }

    fn walk_table_with_joins(
        &mut self,
        table: &TableWithJoins,
        visible: &[String],
    ) -> Result<(), ValidationError> {
        self.walk_table_factor(&table.relation, visible)?;

        for join in &table.joins {
            self.walk_table_factor(&join.relation, visible)?;
        }

        Ok(())
    }

    fn walk_table_factor(
        &mut self,
        factor: &TableFactor,
        visible: &[String],
    ) -> Result<(), ValidationError> {
        match factor {
            TableFactor::Table { name, args: None, .. } => self.check_relation(name, visible),
            TableFactor::Table { name, .. } => Err(self.forbidden(name.to_string())),
            TableFactor::Derived { subquery, .. } => self.walk_query(subquery, visible),
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => self.walk_table_with_joins(table_with_joins, visible),
            other => Err(ValidationError::UnsupportedClause(format!(
                "table source {}",
                other
            ))),
        }
    }

    // Subqueries in expressions see the CTEs of the query they appear in. Nested ones are
    // reached by the inner walk first, so the outer visit skips them.
    fn walk_expression_subqueries(
        &mut self,
        query: &Query,
        visible: &[String],
    ) -> Result<(), ValidationError> {
        let flow = visit_expressions(query, |expr| {
            let nested = match expr {
                Expr::Subquery(nested)
                | Expr::ArraySubquery(nested)
                | Expr::InSubquery {
                    subquery: nested, ..
                }
                | Expr::Exists {
                    subquery: nested, ..
                } => nested,
                _ => return ControlFlow::Continue(()),
            };

            if self.walked.contains(&(&**nested as *const Query)) {
                return ControlFlow::Continue(());
            }

            match self.walk_query(nested, visible) {
                Ok(()) => ControlFlow::Continue(()),
                Err(error) => ControlFlow::Break(error),
            }
        });

        match flow {
            ControlFlow::Break(error) => Err(error),
            ControlFlow::Continue(()) => Ok(()),
        }
    }

    fn check_relation(&mut self, name: &ObjectName, visible: &[String]) -> Result<(), ValidationError> {
        self.checked += 1;

        let allowed = match name.0.as_slice() {
            [table] if visible.contains(&identifier(table)) => true,
            [table] if self.schema.is_relation(&table.value) => {
                self.touches_relation = true;
                true
            }
            [namespace, table] => {
                let ok = namespace.value.eq_ignore_ascii_case("public")
                    && self.schema.is_relation(&table.value);
                self.touches_relation |= ok;
                ok
            }
            _ => false,
        };

        if allowed {
            Ok(())
        } else {
            Err(self.forbidden(name.to_string()))
        }
    }

    fn forbidden(&self, found: String) -> ValidationError {
        ValidationError::ForbiddenRelation {
            found,
            allowed: self.schema.relation().to_string(),
        }
    }
}

/// Name as Postgres resolves it: unquoted identifiers fold to lower case
fn identifier(ident: &Ident) -> String {
    match ident.quote_style {
        Some(_) => ident.value.clone(),
        None => ident.value.to_lowercase(),
    }
}

fn is_catalog_name(name: &str) -> bool {
    let name = name.to_lowercase();
    name.starts_with("pg_") || name == "information_schema"
}

fn check_relations(query: &Query, schema: &SchemaDescriptor) -> Result<(), ValidationError> {
    let mut walker = RelationWalker::new(schema);
    walker.walk_query(query, &[])?;

    // Every relation in the tree must have been resolved in some scope
    let mut total = 0;
    let _ = visit_relations(query, |_: &ObjectName| {
        total += 1;
        ControlFlow::<()>::Continue(())
    });

    if total != walker.checked {
        return Err(ValidationError::UnsupportedClause(
            "relation outside a supported position".to_string(),
        ));
    }

    if !walker.touches_relation {
        return Err(ValidationError::MissingRelation(
            schema.relation().to_string(),
        ));
    }

    Ok(())
}

fn check_expressions(
    statement: &Statement,
    schema: &SchemaDescriptor,
    scope: &Scope,
) -> Result<(), ValidationError> {
    let known_column =
        |ident: &Ident| schema.has_field(&ident.value) || scope.column_aliases.contains(&lower(ident));

    let known_qualifier = |qualifier: &[Ident]| match qualifier {
        [name] => {
            schema.is_relation(&name.value)
                || scope.table_aliases.contains(&lower(name))
                || scope.ctes.contains(&lower(name))
        }
        [namespace, name] => {
            namespace.value.eq_ignore_ascii_case("public") && schema.is_relation(&name.value)
        }
        _ => false,
    };

    let flow = visit_expressions(statement, |expr| {
        match expr {
            Expr::Identifier(ident) if !known_column(ident) => {
                return ControlFlow::Break(ValidationError::UnknownField(ident.value.clone()));
            }
            Expr::CompoundIdentifier(parts) => {
                if let Some((column, qualifier)) = parts.split_last() {
                    if !known_qualifier(qualifier) || !known_column(column) {
                        let name = parts
                            .iter()
                            .map(|p| p.value.as_str())
                            .collect::<Vec<_>>()
                            .join(".");
                        return ControlFlow::Break(ValidationError::UnknownField(name));
                    }
                }
            }
            Expr::Function(function) => {
                let name = function.name.to_string().to_lowercase();
                let base = name.rsplit('.').next().unwrap_or(&name).trim_matches('"');

                if is_denied_function(base) {
                    return ControlFlow::Break(ValidationError::ForbiddenFunction(base.to_string()));
                }
            }
            Expr::Subquery(query)
            | Expr::ArraySubquery(query)
            | Expr::InSubquery {
                subquery: query, ..
            }
            | Expr::Exists {
                subquery: query, ..
            } => {
                if let Err(error) = check_query_shape(query) {
                    return ControlFlow::Break(error);
                }
            }
            _ => {}
        }

        ControlFlow::Continue(())
    });

    match flow {
        ControlFlow::Break(error) => Err(error),
        ControlFlow::Continue(()) => Ok(()),
    }
}

fn is_denied_function(name: &str) -> bool {
    DENIED_FUNCTION_PREFIXES.iter().any(|p| name.starts_with(p)) || DENIED_FUNCTIONS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::{FieldDescriptor, FieldType};

    fn phones_schema() -> SchemaDescriptor {
        SchemaDescriptor::new(
            "phones",
            vec![
                FieldDescriptor::new("id", FieldType::Integer, "primary key"),
                FieldDescriptor::new("name", FieldType::Text, "model name"),
                FieldDescriptor::new("has_5g", FieldType::Boolean, "5G support"),
                FieldDescriptor::new("battery_mah", FieldType::Integer, "battery capacity"),
            ],
        )
        .unwrap()
    }

    fn validator() -> QueryValidator {
        QueryValidator::new(ValidatorConfig::new(5, 50))
    }

    fn accept(sql: &str, schema: &SchemaDescriptor) -> ValidatedQuery {
        match validator().validate(sql, schema) {
            Verdict::Valid(query) => query,
            Verdict::Invalid(error) => panic!("expected '{}' to pass, got: {}", sql, error),
        }
    }

    fn reject(sql: &str, schema: &SchemaDescriptor) -> ValidationError {
        match validator().validate(sql, schema) {
            Verdict::Valid(query) => panic!("expected '{}' to be rejected, got: {}", sql, query.sql()),
            Verdict::Invalid(error) => error,
        }
    }

    #[test]
    fn test_accepts_simple_select_with_limit() {
        let query = accept(
            "SELECT name FROM phones WHERE has_5g = true LIMIT 5",
            &phones_schema(),
        );

        assert_eq!(query.limit(), 5);
        assert!(query.sql().starts_with("SELECT name FROM phones"));
        assert!(query.sql().ends_with("LIMIT 5"));
    }

    #[test]
    fn test_injects_limit_when_missing() {
        let query = accept("SELECT name FROM samsung_phones", &SchemaDescriptor::phones());

        assert_eq!(query.limit(), 5);
        assert!(query.sql().ends_with("LIMIT 5"));
    }

    #[test]
    fn test_clamps_oversized_limit() {
        let query = accept("SELECT name FROM phones LIMIT 1000", &phones_schema());

        assert_eq!(query.limit(), 50);
        assert!(query.sql().ends_with("LIMIT 50"));
    }

    #[test]
    fn test_keeps_smaller_limit() {
        let query = accept("SELECT name FROM phones ORDER BY battery_mah DESC LIMIT 3", &phones_schema());
        assert_eq!(query.limit(), 3);
    }

    #[test]
    fn test_rejects_mutating_statements() {
        let schema = phones_schema();

        for sql in [
            "DELETE FROM phones",
            "UPDATE phones SET name = 'x'",
            "INSERT INTO phones (name) VALUES ('x')",
            "DROP TABLE phones",
            "TRUNCATE phones",
            "ALTER TABLE phones ADD COLUMN x TEXT",
            "CREATE TABLE t (id INTEGER)",
            "GRANT SELECT ON phones TO public",
            "SELECT name FROM phones FOR UPDATE",
            "WITH gone AS (DELETE FROM phones RETURNING name) SELECT name FROM gone",
        ] {
            let error = reject(sql, &schema);
            assert!(
                matches!(error, ValidationError::NotReadOnly(_)),
                "'{}' gave {:?}",
                sql,
                error
            );
        }
    }

    #[test]
    fn test_delete_reason_names_the_keyword() {
        let error = reject("DELETE FROM phones", &phones_schema());
        assert_eq!(error, ValidationError::NotReadOnly("DELETE".to_string()));
    }

    #[test]
    fn test_rejects_select_into() {
        let error = reject("SELECT name INTO backup FROM phones", &phones_schema());
        assert_eq!(error, ValidationError::NotReadOnly("SELECT INTO".to_string()));
    }

    #[test]
    fn test_rejects_share_lock() {
        assert!(!validator()
            .validate("SELECT name FROM phones FOR SHARE", &phones_schema())
            .is_valid());
    }

    #[test]
    fn test_keywords_inside_literals_are_allowed() {
        let query = accept(
            "SELECT name FROM phones WHERE name ILIKE '%update%' OR name = 'Drop''s'",
            &phones_schema(),
        );
        assert_eq!(query.limit(), 5);
    }

    #[test]
    fn test_rejects_multiple_statements() {
        let error = reject("SELECT name FROM phones; SELECT id FROM phones", &phones_schema());
        assert_eq!(error, ValidationError::MultipleStatements(2));
    }

    #[test]
    fn test_rejects_injection_after_semicolon() {
        let error = reject("SELECT name FROM phones; DROP TABLE phones", &phones_schema());
        assert!(matches!(error, ValidationError::NotReadOnly(_)));
    }

    #[test]
    fn test_rejects_unknown_field() {
        let error = reject("SELECT password FROM phones", &phones_schema());
        assert_eq!(error, ValidationError::UnknownField("password".to_string()));
    }

    #[test]
    fn test_rejects_unknown_qualified_field() {
        let error = reject("SELECT p.secret FROM phones p", &phones_schema());
        assert_eq!(error, ValidationError::UnknownField("p.secret".to_string()));
    }

    #[test]
    fn test_rejects_other_relations() {
        let schema = phones_schema();

        let error = reject("SELECT usename FROM pg_user", &schema);
        assert!(matches!(error, ValidationError::ForbiddenRelation { .. }));

        let error = reject("SELECT name FROM phones JOIN users ON users.id = phones.id", &schema);
        assert_eq!(
            error,
            ValidationError::ForbiddenRelation {
                found: "users".to_string(),
                allowed: "phones".to_string()
            }
        );

        let error = reject("SELECT name FROM other.phones", &schema);
        assert!(matches!(error, ValidationError::ForbiddenRelation { .. }));
    }

    #[test]
    fn test_requires_the_designated_relation() {
        let error = reject("SELECT 1", &phones_schema());
        assert_eq!(error, ValidationError::MissingRelation("phones".to_string()));
    }

    #[test]
    fn test_accepts_schema_qualified_relation() {
        accept("SELECT name FROM public.phones", &phones_schema());
    }

    #[test]
    fn test_accepts_aliases_and_aggregates() {
        let schema = phones_schema();

        accept(
            "SELECT name, COUNT(*) AS total FROM phones GROUP BY name ORDER BY total DESC",
            &schema,
        );
        accept(
            "SELECT p.name FROM phones AS p WHERE p.battery_mah > 4500 ORDER BY p.battery_mah DESC",
            &schema,
        );
        accept("SELECT phones.name FROM phones", &schema);
    }

    #[test]
    fn test_accepts_cte_and_subqueries() {
        let schema = phones_schema();

        accept(
            "WITH fast AS (SELECT name, battery_mah FROM phones WHERE has_5g) SELECT name FROM fast LIMIT 3",
            &schema,
        );
        accept(
            "SELECT name FROM phones WHERE id IN (SELECT id FROM phones WHERE battery_mah > 5000)",
            &schema,
        );
    }

    #[test]
    fn test_nested_cte_does_not_shadow_catalog_relations() {
        let schema = SchemaDescriptor::phones();

        for sql in [
            "SELECT query FROM (WITH pg_stat_activity(query) AS (SELECT name FROM samsung_phones) SELECT query FROM pg_stat_activity) d UNION ALL SELECT query FROM pg_stat_activity",
            "SELECT usename FROM (WITH pg_user(usename) AS (SELECT name FROM samsung_phones) SELECT usename FROM pg_user) d UNION ALL SELECT usename FROM pg_user",
        ] {
            let error = reject(sql, &schema);
            assert!(
                matches!(error, ValidationError::ForbiddenRelation { .. }),
                "'{}' gave {:?}",
                sql,
                error
            );
        }
    }

    #[test]
    fn test_cte_names_are_scoped_to_their_query() {
        let schema = phones_schema();

        let error = reject(
            "SELECT name FROM (WITH fast AS (SELECT name FROM phones) SELECT name FROM fast) d UNION ALL SELECT name FROM fast",
            &schema,
        );
        assert_eq!(
            error,
            ValidationError::ForbiddenRelation {
                found: "fast".to_string(),
                allowed: "phones".to_string()
            }
        );

        let error = reject(
            "SELECT name FROM phones WHERE id IN (WITH fast AS (SELECT id FROM phones) SELECT id FROM fast) UNION ALL SELECT name FROM fast",
            &schema,
        );
        assert!(matches!(error, ValidationError::ForbiddenRelation { .. }));
    }

    #[test]
    fn test_outer_cte_is_visible_in_nested_queries() {
        let schema = phones_schema();

        accept(
            "WITH fast AS (SELECT id, name FROM phones WHERE has_5g) SELECT name FROM phones WHERE id IN (SELECT id FROM fast)",
            &schema,
        );
        accept(
            "WITH fast AS (SELECT name FROM phones) SELECT name FROM (SELECT name FROM fast) d",
            &schema,
        );
        accept(
            "WITH fast AS (SELECT id, name FROM phones), named AS (SELECT name FROM fast) SELECT name FROM named",
            &schema,
        );
    }

    #[test]
    fn test_cte_cannot_read_itself_without_recursive() {
        let error = reject(
            "WITH leak AS (SELECT name FROM leak) SELECT name FROM phones UNION ALL SELECT name FROM leak",
            &phones_schema(),
        );
        assert!(matches!(error, ValidationError::ForbiddenRelation { .. }));
    }

    #[test]
    fn test_quoted_cte_name_does_not_match_unquoted_reference() {
        let error = reject(
            r#"WITH "Leak"(name) AS (SELECT name FROM phones) SELECT name FROM phones UNION ALL SELECT name FROM leak"#,
            &phones_schema(),
        );
        assert_eq!(
            error,
            ValidationError::ForbiddenRelation {
                found: "leak".to_string(),
                allowed: "phones".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_catalog_named_cte() {
        let error = reject(
            "WITH pg_user(usename) AS (SELECT name FROM phones) SELECT usename FROM pg_user",
            &phones_schema(),
        );
        assert!(matches!(error, ValidationError::ForbiddenRelation { .. }));
    }

    #[test]
    fn test_array_subquery_cannot_read_other_relations() {
        let error = reject(
            "SELECT ARRAY(SELECT usename FROM pg_user) FROM phones",
            &phones_schema(),
        );
        assert!(matches!(error, ValidationError::ForbiddenRelation { .. }));
    }

    #[test]
    fn test_rejects_table_functions() {
        assert!(!validator()
            .validate("SELECT name FROM phones, pg_ls_dir('.')", &phones_schema())
            .is_valid());
    }

    #[test]
    fn test_rejects_denied_functions() {
        let schema = phones_schema();

        let error = reject("SELECT pg_sleep(10) FROM phones", &schema);
        assert_eq!(error, ValidationError::ForbiddenFunction("pg_sleep".to_string()));

        let error = reject("SELECT nextval('phones_id_seq') FROM phones", &schema);
        assert_eq!(error, ValidationError::ForbiddenFunction("nextval".to_string()));
    }

    #[test]
    fn test_rejects_unparseable_and_empty() {
        let schema = phones_schema();

        assert!(matches!(reject("SELEC name FROM", &schema), ValidationError::Unparseable(_)));
        assert_eq!(reject("   ", &schema), ValidationError::Empty);
    }

    #[test]
    fn test_original_few_shot_queries_pass() {
        let schema = SchemaDescriptor::phones();

        for example in crate::domain::schema::FewShotExamples::builtin().iter() {
            accept(&example.query, &schema);
        }
    }

    #[test]
    fn test_validated_query_never_exceeds_cap() {
        let schema = phones_schema();

        for sql in [
            "SELECT name FROM phones",
            "SELECT name FROM phones LIMIT 7",
            "SELECT name FROM phones LIMIT 99999",
            "SELECT name FROM phones LIMIT 2 + 2",
            "SELECT name FROM phones UNION SELECT name FROM phones",
        ] {
            let query = accept(sql, &schema);
            assert!(query.limit() <= 50, "{} -> {}", sql, query.limit());
            assert!(query.sql().contains(&format!("LIMIT {}", query.limit())));
        }
    }

    #[test]
    fn test_config_keeps_default_within_cap() {
        let config = ValidatorConfig::new(100, 10);
        assert_eq!(config.default_limit, 10);

        let config = ValidatorConfig::new(0, 0);
        assert_eq!(config.default_limit, 1);
        assert_eq!(config.max_rows, 1);
    }
}
