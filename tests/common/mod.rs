//! Shared test helpers for integration tests using Testcontainers.

use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;

use fdwcheck::fixture::Fixture;
use fdwcheck::harness::{CaseOutcome, Harness, Outcomes, QueryCase};
use fdwcheck::{HarnessConfig, PgConn};

/// A test database backed by a Testcontainers PostgreSQL 18.1 instance,
/// with a connected harness.
///
/// The container is automatically cleaned up when `TestDb` is dropped.
pub struct TestDb {
    pub harness: Harness,
    _container: ContainerAsync<Postgres>,
}

#[allow(dead_code)]
impl TestDb {
    /// Start a fresh PostgreSQL 18.1 container and connect the harness
    /// with default configuration.
    pub async fn new() -> Self {
        Self::with_config(HarnessConfig::default()).await
    }

    /// Start a fresh container and connect with the given configuration.
    /// The `[conn]` section is overwritten with the container's address.
    pub async fn with_config(mut config: HarnessConfig) -> Self {
        let container = Postgres::default()
            .with_tag("18.1-alpine")
            .start()
            .await
            .expect("Failed to start PostgreSQL 18.1 container");

        let port = container
            .get_host_port_ipv4(5432)
            .await
            .expect("Failed to get mapped port");

        config.conn = PgConn {
            host: "127.0.0.1".to_string(),
            port,
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            dbname: "postgres".to_string(),
        };

        let harness = Harness::connect(config)
            .await
            .expect("Failed to connect to test database");

        TestDb {
            harness,
            _container: container,
        }
    }

    /// Start a container and prepare the table pair from a fixture.
    pub async fn prepared(fixture: &Fixture) -> Self {
        let db = Self::new().await;
        db.harness
            .prepare(fixture)
            .await
            .expect("Failed to prepare table pair");
        db
    }

    /// Run cases and return the tally plus per-case outcomes.
    pub async fn run(&self, cases: &[QueryCase]) -> (Outcomes, Vec<(String, CaseOutcome)>) {
        self.harness.run_cases(cases).await
    }

    /// Assert that no case in the batch failed.
    pub fn assert_all_pass(results: &[(String, CaseOutcome)]) {
        for (name, outcome) in results {
            assert!(!outcome.is_failure(), "case {name} failed: {outcome}");
        }
    }
}
