//! Query execution pipeline.
//!
//! Every statement, whether built by hand or by the statement builders,
//! passes through [`Executor::execute`]. The pipeline order is fixed:
//! in-conversion of parameters, query resolution, named binding (or
//! positional pass-through), debug logging, connection acquisition,
//! execution, then result shaping with the optional out-converter.

use crate::bind::{BoundStatement, bind_named};
use crate::registry::ConnectionRegistry;
use crate::row::{Record, record_from_row};
use crate::value::{Params, SqlValue, bind_value};
use crate::error::SqlResult;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::debug;

/// Hook applied to the parameter map before binding.
pub type InConverter = Box<dyn Fn(Params) -> Params + Send + Sync>;

/// Hook applied to each fetched record; returning `None` drops the record
/// from the result (absence, not an error).
pub type OutConverter = Box<dyn Fn(Record) -> Option<Record> + Send + Sync>;

/// Behavioral options for a query.
#[derive(Default)]
pub struct QueryOptions {
    /// Collapse the result to one record (or none).
    pub single: bool,
    /// Applied to parameters before binding.
    pub in_converter: Option<InConverter>,
    /// Applied per output record after fetch.
    pub out_converter: Option<OutConverter>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_single(mut self, single: bool) -> Self {
        self.single = single;
        self
    }

    pub fn with_in_converter(
        mut self,
        converter: impl Fn(Params) -> Params + Send + Sync + 'static,
    ) -> Self {
        self.in_converter = Some(Box::new(converter));
        self
    }

    pub fn with_out_converter(
        mut self,
        converter: impl Fn(Record) -> Option<Record> + Send + Sync + 'static,
    ) -> Self {
        self.out_converter = Some(Box::new(converter));
        self
    }
}

impl std::fmt::Debug for QueryOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryOptions")
            .field("single", &self.single)
            .field("has_in_converter", &self.in_converter.is_some())
            .field("has_out_converter", &self.out_converter.is_some())
            .finish()
    }
}

/// The form a resolved query request takes.
#[derive(Debug, Clone)]
pub enum QueryForm {
    /// A template with `:name` placeholders, to be translated.
    Named(String),
    /// Pre-positioned SQL and values, passed to the driver untouched. The
    /// escape hatch for variable-shape statements such as `IN (...)` lists.
    Positional { sql: String, values: Vec<SqlValue> },
}

/// A query request: a static named template, or a generator invoked with
/// the (already in-converted) parameters to produce the statement.
pub enum QuerySource {
    Template(String),
    Generator(Box<dyn Fn(&Params) -> QueryForm + Send + Sync>),
}

impl QuerySource {
    /// Wrap a generator function.
    pub fn generator(f: impl Fn(&Params) -> QueryForm + Send + Sync + 'static) -> Self {
        Self::Generator(Box::new(f))
    }
}

impl From<&str> for QuerySource {
    fn from(sql: &str) -> Self {
        Self::Template(sql.to_string())
    }
}

impl From<String> for QuerySource {
    fn from(sql: String) -> Self {
        Self::Template(sql)
    }
}

impl std::fmt::Debug for QuerySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Template(sql) => f.debug_tuple("Template").field(sql).finish(),
            Self::Generator(_) => f.debug_tuple("Generator").field(&"<fn>").finish(),
        }
    }
}

/// Shaped query result: a single optional record, or a collection.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Single(Option<Record>),
    Rows(Vec<Record>),
}

impl QueryOutput {
    /// Collapse to at most one record.
    pub fn into_single(self) -> Option<Record> {
        match self {
            Self::Single(record) => record,
            Self::Rows(rows) => rows.into_iter().next(),
        }
    }

    /// Flatten to a collection.
    pub fn into_rows(self) -> Vec<Record> {
        match self {
            Self::Single(Some(record)) => vec![record],
            Self::Single(None) => Vec::new(),
            Self::Rows(rows) => rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(record) => record.is_none(),
            Self::Rows(rows) => rows.is_empty(),
        }
    }
}

/// Query executor bound to a connection registry.
#[derive(Clone)]
pub struct Executor {
    registry: Arc<ConnectionRegistry>,
}

impl Executor {
    /// Create an executor over the given registry.
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this executor acquires default connections from.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Execute a query request and shape its result.
    ///
    /// When `connection` is given it is used as-is; otherwise the
    /// default-named pool is obtained from the registry, creating it from
    /// environment settings if needed. Driver errors propagate verbatim.
    pub async fn execute(
        &self,
        source: &QuerySource,
        parameters: Params,
        options: &QueryOptions,
        connection: Option<&PgPool>,
    ) -> SqlResult<QueryOutput> {
        let parameters = match &options.in_converter {
            Some(convert) => convert(parameters),
            None => parameters,
        };

        let form = match source {
            QuerySource::Template(sql) => QueryForm::Named(sql.clone()),
            QuerySource::Generator(generate) => generate(&parameters),
        };

        let bound = match form {
            QueryForm::Named(sql) => bind_named(&sql, &parameters)?,
            QueryForm::Positional { sql, values } => BoundStatement::positional(sql, values),
        };

        self.registry.debug(&json!({
            "query": &bound.sql,
            "parameters": &bound.values,
        }));
        debug!(sql = %bound.sql, params = bound.values.len(), "Executing query");

        let rows = match connection {
            Some(pool) => fetch_records(pool, &bound).await?,
            None => {
                let pool = self.registry.get_or_create(None, None).await?;
                fetch_records(&pool, &bound).await?
            }
        };

        Ok(shape(rows, options))
    }
}

/// Run a bound statement and decode every returned row.
async fn fetch_records(pool: &PgPool, bound: &BoundStatement) -> SqlResult<Vec<Record>> {
    let mut query = sqlx::query(&bound.sql);
    for value in &bound.values {
        query = bind_value(query, value);
    }
    let rows = query.fetch_all(pool).await?;
    Ok(rows.iter().map(record_from_row).collect())
}

/// Shape fetched records according to the query options.
///
/// With `single`, only the first row is a candidate and the out-converter
/// runs on it alone; a converted-to-absent sole candidate yields
/// `Single(None)` rather than an error.
fn shape(rows: Vec<Record>, options: &QueryOptions) -> QueryOutput {
    let candidates: Vec<Record> = if options.single {
        rows.into_iter().take(1).collect()
    } else {
        rows
    };

    let records: Vec<Record> = match &options.out_converter {
        Some(convert) => candidates.into_iter().filter_map(convert).collect(),
        None => candidates,
    };

    if options.single {
        QueryOutput::Single(records.into_iter().next())
    } else {
        QueryOutput::Rows(records)
    }
}
