//! sqlkit
//!
//! A thin parameterized-SQL helper for PostgreSQL: named `:placeholder`
//! templates, a registry of named connection pools, a single query-execution
//! pipeline with conversion hooks, and INSERT/UPDATE/DELETE/SELECT statement
//! builders that return the affected rows.
//!
//! ```no_run
//! use sqlkit::{ConnectionRegistry, Executor, InsertStatement, params};
//! use std::sync::Arc;
//!
//! # async fn example() -> sqlkit::SqlResult<()> {
//! let registry = Arc::new(ConnectionRegistry::new());
//! let executor = Executor::new(registry);
//!
//! let add_user = InsertStatement::new("users");
//! let user = add_user
//!     .run(&executor, params! { "name" => "ada" }, None)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod bind;
pub mod config;
pub mod error;
pub mod executor;
pub mod registry;
pub mod row;
pub mod statements;
pub mod value;

pub use bind::{BoundStatement, bind_named, positional_list};
pub use config::{ConnectionSettings, PoolSettings};
pub use error::{SqlError, SqlResult};
pub use executor::{Executor, QueryForm, QueryOptions, QueryOutput, QuerySource};
pub use registry::{ConnectionRegistry, DEFAULT_CONNECTION, DebugSink, TracingSink};
pub use row::Record;
pub use statements::{DeleteStatement, InsertStatement, QueryStatement, UpdateStatement};
pub use value::{Params, SqlValue};
