//! E2E smoke tests — verify the container, the scaffolding, and one
//! end-to-end case before the heavier suites run.

mod common;

use common::TestDb;
use fdwcheck::fixture::Fixture;
use fdwcheck::harness::{CaseOutcome, QueryCase};

#[tokio::test]
async fn test_container_starts() {
    let db = TestDb::new().await;
    let version = db
        .harness
        .session()
        .query_scalar_text("SELECT version()")
        .await
        .expect("version query");
    assert!(
        version.contains("PostgreSQL 18"),
        "Expected PostgreSQL 18, got: {version}"
    );
}

#[tokio::test]
async fn test_prepare_creates_table_pair() {
    let db = TestDb::prepared(&Fixture::mixed_sample()).await;

    let ref_count = db
        .harness
        .session()
        .query_scalar_text("SELECT count(*)::text FROM fdwcheck_ref")
        .await
        .expect("reference count");
    assert_eq!(ref_count, "20");

    let for_count = db
        .harness
        .session()
        .query_scalar_text("SELECT count(*)::text FROM fdwcheck_for")
        .await
        .expect("foreign count");
    assert_eq!(for_count, "20");
}

#[tokio::test]
async fn test_prepare_is_idempotent() {
    let db = TestDb::prepared(&Fixture::mixed_sample()).await;
    db.harness
        .prepare(&Fixture::mixed_sample())
        .await
        .expect("second prepare over existing tables");
}

#[tokio::test]
async fn test_select_star_passes() {
    let db = TestDb::prepared(&Fixture::mixed_sample()).await;
    let case = QueryCase::unordered("smoke", "SELECT * FROM {table}");
    assert_eq!(db.harness.run_case(&case).await, CaseOutcome::Pass);
}

#[tokio::test]
async fn test_empty_fixture_compares_equal() {
    let fixture = Fixture::from_csv("id INTEGER, v TEXT", "id,v\n").expect("fixture");
    let db = TestDb::prepared(&fixture).await;
    let case = QueryCase::unordered("empty", "SELECT * FROM {table}");
    assert_eq!(db.harness.run_case(&case).await, CaseOutcome::Pass);
}

#[tokio::test]
async fn test_teardown_drops_everything() {
    let db = TestDb::prepared(&Fixture::mixed_sample()).await;
    db.harness.teardown().await.expect("teardown");

    let remaining = db
        .harness
        .session()
        .query_scalar_text(
            "SELECT count(*)::text FROM information_schema.tables \
             WHERE table_name IN ('fdwcheck_ref', 'fdwcheck_for')",
        )
        .await
        .expect("table lookup");
    assert_eq!(remaining, "0");

    let servers = db
        .harness
        .session()
        .query_scalar_text(
            "SELECT count(*)::text FROM pg_foreign_server WHERE srvname = 'fdwcheck_srv'",
        )
        .await
        .expect("server lookup");
    assert_eq!(servers, "0");
}
