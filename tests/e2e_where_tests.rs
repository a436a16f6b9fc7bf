//! E2E WHERE-clause cases: comparisons, boolean logic, and LIKE patterns.
//!
//! These are the cases most likely to expose qual pushdown bugs in a
//! wrapper; against the loopback postgres_fdw they must all pass.

mod common;

use common::TestDb;
use fdwcheck::fixture::Fixture;
use fdwcheck::harness::{CaseOutcome, QueryCase};
use fdwcheck::suite;

#[tokio::test]
async fn test_comparisons_group_passes() {
    let db = TestDb::prepared(&Fixture::mixed_sample()).await;
    let (_, results) = db.run(&suite::comparisons()).await;
    TestDb::assert_all_pass(&results);
}

#[tokio::test]
async fn test_logical_group_passes() {
    let db = TestDb::prepared(&Fixture::mixed_sample()).await;
    let (_, results) = db.run(&suite::logical()).await;
    TestDb::assert_all_pass(&results);
}

#[tokio::test]
async fn test_pattern_group_passes() {
    let db = TestDb::prepared(&Fixture::mixed_sample()).await;
    let (_, results) = db.run(&suite::pattern_matching()).await;
    TestDb::assert_all_pass(&results);
}

#[tokio::test]
async fn test_null_predicate_finds_fixture_nulls() {
    // int1 carries exactly one NULL in the mixed fixture; the case must
    // pass and the predicate must actually select that row.
    let db = TestDb::prepared(&Fixture::mixed_sample()).await;
    let case = QueryCase::unordered("null_probe", "SELECT * FROM {table} WHERE int1 IS NULL");
    assert_eq!(db.harness.run_case(&case).await, CaseOutcome::Pass);

    let n = db
        .harness
        .session()
        .query_scalar_text("SELECT count(*)::text FROM fdwcheck_for WHERE int1 IS NULL")
        .await
        .expect("count");
    assert_eq!(n, "1");
}
