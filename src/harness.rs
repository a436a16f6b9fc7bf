//! Twin-query execution and outcome classification.
//!
//! The harness owns one [`Session`] and the table pair. [`Harness::prepare`]
//! loads a fixture into the reference table and scaffolds the foreign table
//! over it; [`Harness::run_case`] then runs a case's SQL against both tables
//! and classifies the comparison into a [`CaseOutcome`]. Per-case SQL
//! failures are outcomes, not errors — a wrapper that rejects a query it
//! should support is a conformance result. Only connection and setup
//! failures propagate as [`HarnessError`].

use std::fmt;
use std::ops;

use crate::compare::{self, CompareMode, Mismatch};
use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::fixture::Fixture;
use crate::scaffold::ForeignScaffold;
use crate::session::Session;

/// Placeholder in case SQL, replaced with the table under test.
pub const TABLE_PLACEHOLDER: &str = "{table}";

/// Whether a case is expected to pass or to fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expect {
    Pass,
    /// Known-divergent case; the reason is reported, never asserted on.
    Fail(String),
}

/// One conformance case: a SQL template run against both tables.
#[derive(Debug, Clone)]
pub struct QueryCase {
    pub name: String,
    /// SQL with `{table}` standing in for the table under test.
    pub sql: String,
    pub mode: CompareMode,
    pub expect: Expect,
}

impl QueryCase {
    /// Case whose SQL carries `ORDER BY`; rows compare positionally.
    pub fn ordered(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
            mode: CompareMode::Ordered,
            expect: Expect::Pass,
        }
    }

    /// Case without a total order; rows compare as a multiset.
    pub fn unordered(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
            mode: CompareMode::Unordered,
            expect: Expect::Pass,
        }
    }

    /// Mark this case as expected to fail.
    pub fn xfail(mut self, reason: impl Into<String>) -> Self {
        self.expect = Expect::Fail(reason.into());
        self
    }

    fn sql_for(&self, table: &str) -> String {
        self.sql.replace(TABLE_PLACEHOLDER, table)
    }
}

/// Classified result of one case.
#[derive(Debug, Clone, PartialEq)]
pub enum CaseOutcome {
    Pass,
    /// An expected failure failed, as predicted.
    ExpectedFailure(String),
    /// The two sides disagreed.
    Mismatch(Mismatch),
    /// An expected failure passed instead.
    UnexpectedPass,
    /// The reference query itself errored; the case proves nothing.
    ReferenceError(String),
    /// The foreign query errored where the reference succeeded.
    ForeignError(String),
}

impl CaseOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            CaseOutcome::Mismatch(_)
                | CaseOutcome::UnexpectedPass
                | CaseOutcome::ReferenceError(_)
                | CaseOutcome::ForeignError(_)
        )
    }

    fn index(&self) -> usize {
        match self {
            CaseOutcome::Pass => 0,
            CaseOutcome::ExpectedFailure(_) => 1,
            CaseOutcome::Mismatch(_) => 2,
            CaseOutcome::UnexpectedPass => 3,
            CaseOutcome::ReferenceError(_) => 4,
            CaseOutcome::ForeignError(_) => 5,
        }
    }
}

impl fmt::Display for CaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseOutcome::Pass => write!(f, "pass"),
            CaseOutcome::ExpectedFailure(reason) => write!(f, "expected failure ({reason})"),
            CaseOutcome::Mismatch(m) => write!(f, "mismatch: {m}"),
            CaseOutcome::UnexpectedPass => write!(f, "unexpected pass"),
            CaseOutcome::ReferenceError(e) => write!(f, "reference error: {e}"),
            CaseOutcome::ForeignError(e) => write!(f, "foreign error: {e}"),
        }
    }
}

const OUTCOME_NAMES: [&str; 6] = [
    "pass",
    "expected-failure",
    "mismatch",
    "unexpected-pass",
    "reference-error",
    "foreign-error",
];

/// Tally of outcomes across a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcomes([usize; 6]);

impl Outcomes {
    pub fn record(&mut self, outcome: &CaseOutcome) {
        self.0[outcome.index()] += 1;
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    pub fn passed(&self) -> usize {
        self.0[0] + self.0[1]
    }

    pub fn any_failed(&self) -> bool {
        self.0[2] + self.0[3] + self.0[4] + self.0[5] > 0
    }

    pub fn as_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (name, count) in OUTCOME_NAMES.iter().zip(self.0) {
            map.insert(name.to_string(), count.into());
        }
        map.insert("total".to_string(), self.total().into());
        serde_json::Value::Object(map)
    }
}

impl ops::AddAssign for Outcomes {
    fn add_assign(&mut self, rhs: Self) {
        for (lhs, rhs) in self.0.iter_mut().zip(rhs.0) {
            *lhs += rhs;
        }
    }
}

impl fmt::Display for Outcomes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} passed", self.passed(), self.total())?;
        let mut details = Vec::new();
        for (name, count) in OUTCOME_NAMES.iter().zip(self.0) {
            if count > 0 {
                details.push(format!("{name}: {count}"));
            }
        }
        if !details.is_empty() {
            write!(f, " ({})", details.join(", "))?;
        }
        Ok(())
    }
}

/// The harness: one session, one prepared table pair.
pub struct Harness {
    session: Session,
    config: HarnessConfig,
}

impl Harness {
    /// Connect to the configured database.
    pub async fn connect(config: HarnessConfig) -> Result<Self, HarnessError> {
        let session = Session::connect(&config.conn).await?;
        Ok(Self { session, config })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Create and populate the reference table, then scaffold the foreign
    /// table over it.
    ///
    /// The loopback defaults are filled from the server's own view of its
    /// port and database: the harness may be connecting through a mapped
    /// port the server cannot reach itself on.
    pub async fn prepare(&self, fixture: &Fixture) -> Result<(), HarnessError> {
        self.drop_tables().await?;
        self.session
            .execute(&fixture.create_table_sql(&self.config.ref_table))
            .await?;
        if let Some(insert) = fixture.insert_sql(&self.config.ref_table) {
            self.session.execute(&insert).await?;
        }

        let port = self
            .session
            .query_scalar_text("SELECT current_setting('port')")
            .await?;
        let dbname = self
            .session
            .query_scalar_text("SELECT current_database()")
            .await?;
        let scaffold = ForeignScaffold::loopback(
            &self.config.fdw,
            &port,
            &dbname,
            &self.config.conn.user,
            &self.config.conn.password,
        );

        for stmt in scaffold.setup_sql() {
            self.session.batch_execute(&stmt).await?;
        }
        self.session
            .batch_execute(&scaffold.foreign_table_sql(
                &self.config.foreign_table,
                &fixture.columns_sql(),
                &self.config.ref_table,
            ))
            .await?;
        tracing::info!(
            server = scaffold.server(),
            ref_table = %self.config.ref_table,
            foreign_table = %self.config.foreign_table,
            rows = fixture.rows.len(),
            "prepared table pair"
        );
        Ok(())
    }

    /// Run one case against both tables and classify the result.
    pub async fn run_case(&self, case: &QueryCase) -> CaseOutcome {
        let ref_sql = case.sql_for(&self.config.ref_table);
        let for_sql = case.sql_for(&self.config.foreign_table);

        let reference = match self.session.query(&ref_sql).await {
            Ok(set) => set,
            Err(e) => return self.classify_failure(case, CaseOutcome::ReferenceError(e.to_string())),
        };
        let foreign = match self.session.query(&for_sql).await {
            Ok(set) => set,
            Err(e) => return self.classify_failure(case, CaseOutcome::ForeignError(e.to_string())),
        };

        let result = compare::compare(
            &reference,
            &foreign,
            case.mode,
            &self.config.tolerance,
            Some(&self.config.key_column),
        );
        match result {
            Ok(()) => match &case.expect {
                Expect::Pass => CaseOutcome::Pass,
                Expect::Fail(_) => CaseOutcome::UnexpectedPass,
            },
            Err(mismatch) => self.classify_failure(case, CaseOutcome::Mismatch(mismatch)),
        }
    }

    /// An expected failure converts any failing outcome into
    /// [`CaseOutcome::ExpectedFailure`].
    fn classify_failure(&self, case: &QueryCase, outcome: CaseOutcome) -> CaseOutcome {
        match &case.expect {
            Expect::Pass => outcome,
            Expect::Fail(reason) => CaseOutcome::ExpectedFailure(reason.clone()),
        }
    }

    /// Run a batch of cases, logging each failure, and tally the outcomes.
    pub async fn run_cases(&self, cases: &[QueryCase]) -> (Outcomes, Vec<(String, CaseOutcome)>) {
        let mut outcomes = Outcomes::default();
        let mut results = Vec::with_capacity(cases.len());
        for case in cases {
            let outcome = self.run_case(case).await;
            outcomes.record(&outcome);
            if outcome.is_failure() {
                tracing::warn!(case = %case.name, outcome = %outcome, "case failed");
            } else {
                tracing::debug!(case = %case.name, outcome = %outcome, "case done");
            }
            results.push((case.name.clone(), outcome));
        }
        (outcomes, results)
    }

    /// Drop the foreign side, the server, and the reference table.
    pub async fn teardown(&self) -> Result<(), HarnessError> {
        let scaffold = ForeignScaffold::new(&self.config.fdw);
        for stmt in scaffold.teardown_sql(&self.config.foreign_table) {
            self.session.batch_execute(&stmt).await?;
        }
        self.session
            .batch_execute(&format!("DROP TABLE IF EXISTS {}", self.config.ref_table))
            .await?;
        Ok(())
    }

    async fn drop_tables(&self) -> Result<(), HarnessError> {
        self.session
            .batch_execute(&format!(
                "DROP FOREIGN TABLE IF EXISTS {}",
                self.config.foreign_table
            ))
            .await?;
        self.session
            .batch_execute(&format!("DROP TABLE IF EXISTS {}", self.config.ref_table))
            .await?;
        Ok(())
    }
}
