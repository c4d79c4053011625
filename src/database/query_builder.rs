use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{FromRow, PgPool, Postgres};
use thiserror::Error;
use uuid::Uuid;

use crate::types::TodoStatus;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryBuildError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("{0} statement has nothing to write")]
    Empty(&'static str),

    #[error("refusing to build {0} without a WHERE predicate")]
    Unconstrained(&'static str),

    #[error("nil identifier for column {0}")]
    NilIdentifier(String),
}

/// A bound parameter. Only the shapes the repositories actually write.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Uuid(Uuid),
    Text(String),
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        SqlValue::Uuid(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<TodoStatus> for SqlValue {
    fn from(v: TodoStatus) -> Self {
        SqlValue::Text(v.as_str().to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlValue>,
}

enum Assignment {
    Value(&'static str, SqlValue),
    Now(&'static str),
}

/// Entry point mirroring a statement-builder with `$n` placeholders
pub struct Statement;

impl Statement {
    pub fn insert(table: &'static str) -> InsertBuilder {
        InsertBuilder { table, columns: vec![], values: vec![], returning: vec![] }
    }

    pub fn select(table: &'static str, columns: &[&'static str]) -> SelectBuilder {
        SelectBuilder { table, columns: columns.to_vec(), predicates: vec![], order_by: None }
    }

    pub fn update(table: &'static str) -> UpdateBuilder {
        UpdateBuilder { table, assignments: vec![], predicates: vec![] }
    }

    pub fn delete(table: &'static str) -> DeleteBuilder {
        DeleteBuilder { table, predicates: vec![] }
    }
}

pub struct InsertBuilder {
    table: &'static str,
    columns: Vec<&'static str>,
    values: Vec<SqlValue>,
    returning: Vec<&'static str>,
}

impl InsertBuilder {
    pub fn value(mut self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.columns.push(column);
        self.values.push(value.into());
        self
    }

    pub fn returning(mut self, columns: &[&'static str]) -> Self {
        self.returning = columns.to_vec();
        self
    }

    pub fn to_sql(self) -> Result<SqlResult, QueryBuildError> {
        validate_identifier(self.table)?;
        if self.columns.is_empty() {
            return Err(QueryBuildError::Empty("INSERT"));
        }
        let columns = quote_all(&self.columns)?;
        let placeholders = (1..=self.values.len()).map(|i| format!("${}", i)).collect::<Vec<_>>().join(", ");

        let mut query = format!("INSERT INTO \"{}\" ({}) VALUES ({})", self.table, columns, placeholders);
        if !self.returning.is_empty() {
            query.push_str(&format!(" RETURNING {}", quote_all(&self.returning)?));
        }
        Ok(SqlResult { query, params: self.values })
    }
}

pub struct SelectBuilder {
    table: &'static str,
    columns: Vec<&'static str>,
    predicates: Vec<(&'static str, SqlValue)>,
    order_by: Option<&'static str>,
}

impl SelectBuilder {
    pub fn where_eq(mut self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.predicates.push((column, value.into()));
        self
    }

    pub fn order_by(mut self, column: &'static str) -> Self {
        self.order_by = Some(column);
        self
    }

    pub fn to_sql(self) -> Result<SqlResult, QueryBuildError> {
        validate_identifier(self.table)?;
        if self.columns.is_empty() {
            return Err(QueryBuildError::Empty("SELECT"));
        }
        let mut query = format!("SELECT {} FROM \"{}\"", quote_all(&self.columns)?, self.table);

        let mut params = Vec::with_capacity(self.predicates.len());
        if let Some(clause) = where_clause(&self.predicates, &mut params)? {
            query.push_str(&clause);
        }
        if let Some(column) = self.order_by {
            validate_identifier(column)?;
            query.push_str(&format!(" ORDER BY \"{}\"", column));
        }
        Ok(SqlResult { query, params })
    }
}

pub struct UpdateBuilder {
    table: &'static str,
    assignments: Vec<Assignment>,
    predicates: Vec<(&'static str, SqlValue)>,
}

impl UpdateBuilder {
    pub fn set(mut self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.assignments.push(Assignment::Value(column, value.into()));
        self
    }

    /// Assign the database clock rather than a bound value
    pub fn set_now(mut self, column: &'static str) -> Self {
        self.assignments.push(Assignment::Now(column));
        self
    }

    pub fn where_eq(mut self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.predicates.push((column, value.into()));
        self
    }

    pub fn to_sql(self) -> Result<SqlResult, QueryBuildError> {
        validate_identifier(self.table)?;
        if self.assignments.is_empty() {
            return Err(QueryBuildError::Empty("UPDATE"));
        }
        if self.predicates.is_empty() {
            return Err(QueryBuildError::Unconstrained("UPDATE"));
        }

        let mut params = Vec::new();
        let mut sets = Vec::with_capacity(self.assignments.len());
        for assignment in self.assignments {
            match assignment {
                Assignment::Value(column, value) => {
                    validate_identifier(column)?;
                    params.push(value);
                    sets.push(format!("\"{}\" = ${}", column, params.len()));
                }
                Assignment::Now(column) => {
                    validate_identifier(column)?;
                    sets.push(format!("\"{}\" = NOW()", column));
                }
            }
        }

        let mut query = format!("UPDATE \"{}\" SET {}", self.table, sets.join(", "));
        if let Some(clause) = where_clause(&self.predicates, &mut params)? {
            query.push_str(&clause);
        }
        Ok(SqlResult { query, params })
    }
}

pub struct DeleteBuilder {
    table: &'static str,
    predicates: Vec<(&'static str, SqlValue)>,
}

impl DeleteBuilder {
    pub fn where_eq(mut self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.predicates.push((column, value.into()));
        self
    }

    pub fn to_sql(self) -> Result<SqlResult, QueryBuildError> {
        validate_identifier(self.table)?;
        if self.predicates.is_empty() {
            return Err(QueryBuildError::Unconstrained("DELETE"));
        }
        let mut params = Vec::with_capacity(self.predicates.len());
        let mut query = format!("DELETE FROM \"{}\"", self.table);
        if let Some(clause) = where_clause(&self.predicates, &mut params)? {
            query.push_str(&clause);
        }
        Ok(SqlResult { query, params })
    }
}

/// Render `WHERE a = $n AND b = $m`, numbering after any params already pushed
fn where_clause(
    predicates: &[(&'static str, SqlValue)],
    params: &mut Vec<SqlValue>,
) -> Result<Option<String>, QueryBuildError> {
    if predicates.is_empty() {
        return Ok(None);
    }
    let mut parts = Vec::with_capacity(predicates.len());
    for (column, value) in predicates {
        validate_identifier(column)?;
        if let SqlValue::Uuid(id) = value {
            if id.is_nil() {
                return Err(QueryBuildError::NilIdentifier(column.to_string()));
            }
        }
        params.push(value.clone());
        parts.push(format!("\"{}\" = ${}", column, params.len()));
    }
    Ok(Some(format!(" WHERE {}", parts.join(" AND "))))
}

fn quote_all(columns: &[&'static str]) -> Result<String, QueryBuildError> {
    let mut quoted = Vec::with_capacity(columns.len());
    for column in columns {
        validate_identifier(column)?;
        quoted.push(format!("\"{}\"", column));
    }
    Ok(quoted.join(", "))
}

fn validate_identifier(name: &str) -> Result<(), QueryBuildError> {
    let mut chars = name.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(QueryBuildError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

pub fn bind_query<'q>(
    q: sqlx::query::Query<'q, Postgres, PgArguments>,
    v: &'q SqlValue,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match v {
        SqlValue::Uuid(id) => q.bind(*id),
        SqlValue::Text(s) => q.bind(s.as_str()),
    }
}

pub fn bind_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, Postgres, O, PgArguments>,
    v: &'q SqlValue,
) -> sqlx::query::QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        SqlValue::Uuid(id) => q.bind(*id),
        SqlValue::Text(s) => q.bind(s.as_str()),
    }
}

impl SqlResult {
    /// Run a write statement and report how many rows it touched
    pub async fn execute(&self, pool: &PgPool) -> Result<u64, sqlx::Error> {
        let mut q = sqlx::query(&self.query);
        for p in &self.params {
            q = bind_query(q, p);
        }
        Ok(q.execute(pool).await?.rows_affected())
    }

    pub async fn fetch_all<T>(&self, pool: &PgPool) -> Result<Vec<T>, sqlx::Error>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut q = sqlx::query_as::<_, T>(&self.query);
        for p in &self.params {
            q = bind_query_as(q, p);
        }
        q.fetch_all(pool).await
    }

    pub async fn fetch_optional<T>(&self, pool: &PgPool) -> Result<Option<T>, sqlx::Error>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut q = sqlx::query_as::<_, T>(&self.query);
        for p in &self.params {
            q = bind_query_as(q, p);
        }
        q.fetch_optional(pool).await
    }

    pub async fn fetch_one<T>(&self, pool: &PgPool) -> Result<T, sqlx::Error>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut q = sqlx::query_as::<_, T>(&self.query);
        for p in &self.params {
            q = bind_query_as(q, p);
        }
        q.fetch_one(pool).await
    }
}
