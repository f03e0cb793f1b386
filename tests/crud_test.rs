//! End-to-end tests against a live PostgreSQL server.
//!
//! Set `DB_DATABASE` (plus `DB_HOST`/`DB_USER`/`DB_PASSWORD`/`DB_PORT` as
//! needed) to run these; they are skipped otherwise.

use serde_json::json;
use sqlkit::{
    ConnectionRegistry, DeleteStatement, Executor, InsertStatement, Params, QueryForm,
    QueryOptions, QuerySource, QueryStatement, SqlValue, UpdateStatement, positional_list,
};
use sqlkit::config::ENV_DATABASE;
use sqlkit::params;
use std::sync::Arc;

async fn setup() -> Option<(Executor, sqlx::PgPool)> {
    if std::env::var(ENV_DATABASE).is_err() {
        eprintln!("Skipping: set {ENV_DATABASE} to run live-database tests");
        return None;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let registry = Arc::new(ConnectionRegistry::new());
    let pool = registry.get_or_create(None, None).await.unwrap();
    Some((Executor::new(registry), pool))
}

#[tokio::test]
async fn crud_round_trip() {
    let Some((executor, pool)) = setup().await else {
        return;
    };

    sqlx::query("drop table if exists sqlkit_crud")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(
        "create table sqlkit_crud (
            id serial not null primary key,
            field1 varchar not null,
            field2 boolean not null default true
        )",
    )
    .execute(&pool)
    .await
    .unwrap();

    let insert = InsertStatement::new("sqlkit_crud");
    let row = insert
        .run(&executor, params! { "field1" => "test1" }, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row["id"], json!(1));
    assert_eq!(row["field1"], json!("test1"));
    assert_eq!(row["field2"], json!(true));

    let update = UpdateStatement::with_options(
        "sqlkit_crud",
        QueryOptions::new().with_single(true),
    );
    let row = update
        .run(
            &executor,
            params! { "field1" => "changed", "field2" => false },
            params! { "id" => 1 },
            None,
        )
        .await
        .unwrap()
        .into_single()
        .unwrap();
    assert_eq!(row["id"], json!(1));
    assert_eq!(row["field1"], json!("changed"));
    assert_eq!(row["field2"], json!(false));

    let delete = DeleteStatement::new("sqlkit_crud");
    let deleted = delete
        .run(&executor, params! { "id" => 1 }, None)
        .await
        .unwrap()
        .into_rows();
    assert_eq!(deleted.len(), 1);

    sqlx::query("drop table if exists sqlkit_crud")
        .execute(&pool)
        .await
        .unwrap();
    executor.registry().close(None).await.unwrap();
}

#[tokio::test]
async fn single_select_collapses_to_one_record() {
    let Some((executor, _pool)) = setup().await else {
        return;
    };

    let get_flag = QueryStatement::with_options(
        "select true as bool_val",
        QueryOptions::new().with_single(true),
    );
    let row = get_flag
        .run(&executor, Params::new(), None)
        .await
        .unwrap()
        .into_single()
        .unwrap();
    assert_eq!(row["bool_val"], json!(true));

    executor.registry().close(None).await.unwrap();
}

#[tokio::test]
async fn generator_query_with_positional_in_list() {
    let Some((executor, _pool)) = setup().await else {
        return;
    };

    let pick = QueryStatement::new(QuerySource::generator(|params: &Params| {
        let wanted: Vec<i64> = match params.get("ns") {
            Some(SqlValue::Json(serde_json::Value::Array(values))) => {
                values.iter().filter_map(|v| v.as_i64()).collect()
            }
            _ => Vec::new(),
        };
        QueryForm::Positional {
            sql: format!(
                "select n from (values (1), (2), (3)) as t(n) where n in ({}) order by n",
                positional_list(wanted.len())
            ),
            values: wanted.into_iter().map(SqlValue::from).collect(),
        }
    }));

    let rows = pick
        .run(&executor, params! { "ns" => json!([1, 3]) }, None)
        .await
        .unwrap()
        .into_rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["n"], json!(1));
    assert_eq!(rows[1]["n"], json!(3));

    executor.registry().close(None).await.unwrap();
}

#[tokio::test]
async fn in_converter_rewrites_parameters_before_binding() {
    let Some((executor, _pool)) = setup().await else {
        return;
    };

    let greet = QueryStatement::with_options(
        "select :name as name",
        QueryOptions::new()
            .with_single(true)
            .with_in_converter(|mut params| {
                params.insert("name".to_string(), SqlValue::from("bob"));
                params
            }),
    );
    let row = greet
        .run(&executor, Params::new(), None)
        .await
        .unwrap()
        .into_single()
        .unwrap();
    assert_eq!(row["name"], json!("bob"));

    executor.registry().close(None).await.unwrap();
}
