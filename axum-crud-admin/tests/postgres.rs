//! Tests against a live PostgreSQL server
//!
//! Skipped unless `DATABASE_URL` points at a disposable database; the
//! managed tables are truncated.

use axum_crud_admin::database::traits::{SYNTAX_ERROR, UNIQUE_VIOLATION};
use axum_crud_admin::fixtures::{fixtures, MANAGED_TABLES};
use axum_crud_admin::resource::FormValues;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum_crud_admin::{
    AdminLayer, CrudService, DatabaseError, DatabaseProvider, MaintenanceProvider, Page,
    PostgresProvider, SessionKeys,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::sync::Mutex;
use tower::ServiceExt;

/// Tests share one database; run them one at a time
fn database_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

async fn provider() -> Option<PostgresProvider> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };
    let pool = PgPool::connect(&url).await.expect("connect to DATABASE_URL");
    let provider = PostgresProvider::new(pool);
    provider.run_migrations().await.expect("create tables");
    provider.clear_tables(MANAGED_TABLES).await.expect("clear tables");
    Some(provider)
}

fn form(pairs: &[(&str, &str)]) -> FormValues {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

#[tokio::test]
async fn test_select_one() {
    let _guard = database_lock().lock().await;
    let Some(provider) = provider().await else { return };

    let rows = provider.execute_query("select 1").await.unwrap();
    assert_eq!(serde_json::to_value(&rows).unwrap(), json!([{ "?column?": 1 }]));
}

#[tokio::test]
async fn test_statements_without_rows() {
    let _guard = database_lock().lock().await;
    let Some(provider) = provider().await else { return };

    assert!(provider.execute_query("select 1 where false").await.unwrap().is_empty());
    assert!(provider.execute_query("delete from page").await.unwrap().is_empty());

    let inserted = provider
        .execute_query(
            "INSERT INTO public.page (slug, content, created_at, updated_at) \
             VALUES ( 'contact', 'Get in touch with us at contact@example.com', NOW(), NOW() );",
        )
        .await
        .unwrap();
    assert!(inserted.is_empty());

    let rows = provider.execute_query("select * from page").await.unwrap();
    assert_eq!(rows.len(), 1);
    let columns: Vec<&str> = rows[0].column_names().collect();
    assert_eq!(columns, vec!["id", "slug", "content", "created_at", "updated_at"]);
    assert_eq!(rows[0].get("slug"), Some(&json!("contact")));
    assert!(rows[0].get("id").unwrap().is_i64());
    assert!(rows[0].get("created_at").unwrap().is_string());
}

#[tokio::test]
async fn test_syntax_error_text() {
    let _guard = database_lock().lock().await;
    let Some(provider) = provider().await else { return };

    let error = provider.execute_query("select 1 from 1").await.unwrap_err();
    let DatabaseError::Engine(engine_error) = &error else {
        panic!("expected an engine error, got {error:?}");
    };
    assert_eq!(engine_error.code.as_deref(), Some(SYNTAX_ERROR));
    assert!(error.to_string().starts_with("ERROR: syntax error"));
    assert!(error.to_string().ends_with("(SQLSTATE 42601)"));
}

#[tokio::test]
async fn test_duplicate_slug_is_rejected_by_engine() {
    let _guard = database_lock().lock().await;
    let Some(provider) = provider().await else { return };

    let values = form(&[("slug", "about"), ("content", "x")]);
    CrudService::create::<Page, _>(&provider, &values).await.unwrap();
    let error = CrudService::create::<Page, _>(&provider, &values).await.unwrap_err();

    assert_eq!(
        error.to_string(),
        "ERROR: duplicate key value violates unique constraint \"page_slug_key\" (SQLSTATE 23505)"
    );
    let axum_crud_admin::Error::Database(DatabaseError::Engine(engine_error)) = &error else {
        panic!("expected an engine error, got {error:?}");
    };
    assert_eq!(engine_error.code.as_deref(), Some(UNIQUE_VIOLATION));
}

#[tokio::test]
async fn test_clear_and_seed_are_repeatable() {
    let _guard = database_lock().lock().await;
    let Some(provider) = provider().await else { return };

    for _ in 0..2 {
        provider.clear_tables(MANAGED_TABLES).await.unwrap();
        provider.insert_fixtures(&fixtures().await.unwrap()).await.unwrap();

        let pages = CrudService::list::<Page, _>(&provider).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].id, 1);
        assert_eq!(pages[0].slug, "about");
    }

    let error = provider
        .insert_fixtures(&fixtures().await.unwrap())
        .await
        .unwrap_err();
    assert!(error.is_unique_violation());
}

#[tokio::test]
async fn test_update_and_delete_round_trip() {
    let _guard = database_lock().lock().await;
    let Some(provider) = provider().await else { return };

    let page: Page = CrudService::create(&provider, &form(&[("slug", "draft"), ("content", "x")]))
        .await
        .unwrap();
    let updated: Page = CrudService::update(&provider, page.id, &form(&[("slug", "final"), ("content", "y")]))
        .await
        .unwrap();
    assert_eq!(updated.slug, "final");
    assert_eq!(updated.created_at, page.created_at);

    assert!(CrudService::find_by::<Page, _>(&provider, "slug", "draft").await.unwrap().is_none());
    assert!(CrudService::delete::<Page, _>(&provider, page.id).await.unwrap());
    assert!(!CrudService::delete::<Page, _>(&provider, page.id).await.unwrap());
}

#[tokio::test]
async fn test_column_types() {
    let _guard = database_lock().lock().await;
    let Some(provider) = provider().await else { return };

    let rows = provider
        .execute_query(
            "select null as n, true as b, 1.5::float8 as f, '{\"x\": 1}'::jsonb as j, \
             '{\"y\": [2]}'::json as js, '\\x0102'::bytea as by, 'ab'::char(3) as c, \
             1.25::numeric as num, 1 as d, 2 as d",
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    let columns: Vec<&str> = rows[0].column_names().collect();
    assert_eq!(columns, vec!["n", "b", "f", "j", "js", "by", "c", "num", "d"]);
    assert_eq!(
        serde_json::to_value(&rows[0]).unwrap(),
        json!({
            "n": null,
            "b": true,
            "f": 1.5,
            "j": { "x": 1 },
            "js": { "y": [2] },
            "by": "[BLOB: 2 bytes]",
            "c": "ab ",
            "num": "1.25",
            "d": 2
        })
    );
}

#[tokio::test]
async fn test_values_without_host_form_use_engine_text() {
    let _guard = database_lock().lock().await;
    let Some(provider) = provider().await else { return };

    let rows = provider
        .execute_query(
            "select 'infinity'::timestamptz as t, '-infinity'::timestamp as ts, \
             '-infinity'::date as d, '0044-03-15 BC'::date as bc, \
             'Infinity'::float8 as g, '-Infinity'::float4 as h, 'NaN'::float8 as nan",
        )
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&rows[0]).unwrap(),
        json!({
            "t": "infinity",
            "ts": "-infinity",
            "d": "-infinity",
            "bc": "0044-03-15 BC",
            "g": "Infinity",
            "h": "-Infinity",
            "nan": "NaN"
        })
    );
}

#[tokio::test]
async fn test_slow_query_times_out() {
    let _guard = database_lock().lock().await;
    let Some(provider) = provider().await else { return };
    let provider = provider.with_query_timeout(Duration::from_secs(1));

    let error = provider.execute_query("select pg_sleep(3)").await.unwrap_err();
    assert!(matches!(error, DatabaseError::Timeout), "{error:?}");
    assert_eq!(error.to_string(), "query timeout exceeded");
}

#[tokio::test]
async fn test_sql_tool_reports_timeout() {
    let _guard = database_lock().lock().await;
    let Some(provider) = provider().await else { return };
    let router = AdminLayer::new(provider.with_query_timeout(Duration::from_secs(1)), SessionKeys::new(b"secret"))
        .with_tools(true)
        .into_router();

    let request = Request::builder()
        .uri("/tools/sql?q=select%20pg_sleep(3)")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        body,
        json!({ "error": "Error executing SQL query: query timeout exceeded" })
    );
}
