//! Statement builders.
//!
//! Convenience constructors that synthesize a SQL template from a table
//! name plus a record/filter parameter map and delegate to the executor.
//! Column order in the generated SQL is the sorted key order of the map.
//! All templates end in `RETURNING *`, so callers receive the affected
//! row(s).
//!
//! Update and delete namespace their parameters: record columns bind as
//! `:i_column` and filter columns as `:f_column`, so a column named in both
//! the record and the filter never collides.
//!
//! An empty record or filter synthesizes malformed SQL (`VALUES ()`, empty
//! `SET`, empty `WHERE`). That is a caller error and is not handled here;
//! the driver rejects the statement.

use crate::error::SqlResult;
use crate::executor::{Executor, QueryOptions, QueryOutput, QuerySource};
use crate::row::Record;
use crate::value::Params;
use sqlx::PgPool;

const INPUT_PREFIX: &str = "i_";
const FILTER_PREFIX: &str = "f_";

/// Synthesize an `INSERT ... RETURNING *` template from the record's keys.
fn insert_sql(table: &str, record: &Params) -> String {
    let columns: Vec<&str> = record.keys().map(String::as_str).collect();
    let placeholders: Vec<String> = columns.iter().map(|c| format!(":{c}")).collect();
    format!(
        "INSERT INTO {table} ({}) VALUES ({}) RETURNING *",
        columns.join(", "),
        placeholders.join(", ")
    )
}

/// Synthesize an `UPDATE ... RETURNING *` template with namespaced params.
fn update_sql(table: &str, record: &Params, filter: &Params) -> String {
    let sets: Vec<String> = record
        .keys()
        .map(|c| format!("{c} = :{INPUT_PREFIX}{c}"))
        .collect();
    let wheres: Vec<String> = filter
        .keys()
        .map(|c| format!("{c} = :{FILTER_PREFIX}{c}"))
        .collect();
    format!(
        "UPDATE {table} SET {} WHERE {} RETURNING *",
        sets.join(", "),
        wheres.join(" AND ")
    )
}

/// Synthesize a `DELETE ... RETURNING *` template with namespaced params.
fn delete_sql(table: &str, filter: &Params) -> String {
    let wheres: Vec<String> = filter
        .keys()
        .map(|c| format!("{c} = :{FILTER_PREFIX}{c}"))
        .collect();
    format!(
        "DELETE FROM {table} WHERE {} RETURNING *",
        wheres.join(" AND ")
    )
}

/// Re-key a parameter map under a prefix.
fn prefixed(params: Params, prefix: &str) -> impl Iterator<Item = (String, crate::value::SqlValue)> {
    params
        .into_iter()
        .map(move |(name, value)| (format!("{prefix}{name}"), value))
}

/// An `INSERT` bound to a table.
///
/// Always yields a single record: `single` is forced regardless of the
/// options supplied.
pub struct InsertStatement {
    table: String,
    options: QueryOptions,
}

impl InsertStatement {
    pub fn new(table: impl Into<String>) -> Self {
        Self::with_options(table, QueryOptions::new())
    }

    pub fn with_options(table: impl Into<String>, options: QueryOptions) -> Self {
        Self {
            table: table.into(),
            options: options.with_single(true),
        }
    }

    /// Insert `record` and return the stored row, as the database sees it
    /// (defaults applied, id assigned). `None` only when an out-converter
    /// dropped the returned row.
    pub async fn run(
        &self,
        executor: &Executor,
        record: Params,
        connection: Option<&PgPool>,
    ) -> SqlResult<Option<Record>> {
        let source = QuerySource::Template(insert_sql(&self.table, &record));
        let output = executor
            .execute(&source, record, &self.options, connection)
            .await?;
        Ok(output.into_single())
    }
}

/// An `UPDATE` bound to a table, filtered by `AND`-joined equality clauses.
pub struct UpdateStatement {
    table: String,
    options: QueryOptions,
}

impl UpdateStatement {
    pub fn new(table: impl Into<String>) -> Self {
        Self::with_options(table, QueryOptions::new())
    }

    pub fn with_options(table: impl Into<String>, options: QueryOptions) -> Self {
        Self {
            table: table.into(),
            options,
        }
    }

    /// Apply `record` to every row matching `filter`, returning the
    /// affected row(s). Shape follows the `single` option.
    pub async fn run(
        &self,
        executor: &Executor,
        record: Params,
        filter: Params,
        connection: Option<&PgPool>,
    ) -> SqlResult<QueryOutput> {
        let source = QuerySource::Template(update_sql(&self.table, &record, &filter));
        let parameters: Params = prefixed(record, INPUT_PREFIX)
            .chain(prefixed(filter, FILTER_PREFIX))
            .collect();
        executor
            .execute(&source, parameters, &self.options, connection)
            .await
    }
}

/// A `DELETE` bound to a table, filtered by `AND`-joined equality clauses.
pub struct DeleteStatement {
    table: String,
    options: QueryOptions,
}

impl DeleteStatement {
    pub fn new(table: impl Into<String>) -> Self {
        Self::with_options(table, QueryOptions::new())
    }

    pub fn with_options(table: impl Into<String>, options: QueryOptions) -> Self {
        Self {
            table: table.into(),
            options,
        }
    }

    /// Delete every row matching `filter`, returning the deleted row(s).
    pub async fn run(
        &self,
        executor: &Executor,
        filter: Params,
        connection: Option<&PgPool>,
    ) -> SqlResult<QueryOutput> {
        let source = QuerySource::Template(delete_sql(&self.table, &filter));
        let parameters: Params = prefixed(filter, FILTER_PREFIX).collect();
        executor
            .execute(&source, parameters, &self.options, connection)
            .await
    }
}

/// A reusable query: pass-through over the executor, no synthesis.
pub struct QueryStatement {
    source: QuerySource,
    options: QueryOptions,
}

impl QueryStatement {
    pub fn new(source: impl Into<QuerySource>) -> Self {
        Self::with_options(source, QueryOptions::new())
    }

    pub fn with_options(source: impl Into<QuerySource>, options: QueryOptions) -> Self {
        Self {
            source: source.into(),
            options,
        }
    }

    pub async fn run(
        &self,
        executor: &Executor,
        parameters: Params,
        connection: Option<&PgPool>,
    ) -> SqlResult<QueryOutput> {
        executor
            .execute(&self.source, parameters, &self.options, connection)
            .await
    }
}
