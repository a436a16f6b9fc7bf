//! Error types for fdwcheck.
//!
//! All infrastructure failures are represented by [`HarnessError`] and
//! propagated via `Result<T, HarnessError>`. A conformance *mismatch* is not
//! an error — it is data, carried by [`crate::compare::Mismatch`] and tallied
//! as a case outcome. Errors here mean the harness itself could not do its
//! job: no connection, broken DDL, unparsable fixture.
//!
//! # Error Classification
//!
//! - **Config** — bad harness configuration. Fix the config file or flags.
//! - **Connection** — the database could not be reached.
//! - **Sql** — a statement the harness issued failed (DDL, fixture load).
//! - **Fixture** — fixture CSV or column spec could not be parsed.

use std::fmt;

/// Primary error type for the harness.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// The configuration file could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),

    /// The database connection could not be established or was lost.
    #[error("connection error: {0}")]
    Connection(#[source] tokio_postgres::Error),

    /// A SQL statement failed. Carries the statement for context.
    #[error("SQL failed: {source}\n  statement: {sql}")]
    Sql {
        sql: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// A result row could not be decoded into harness values.
    #[error("row decode error in column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Fixture CSV or column specification was malformed.
    #[error("fixture error: {0}")]
    Fixture(String),
}

/// Coarse classification for logging and exit-code decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessErrorKind {
    Config,
    Connection,
    Sql,
    Fixture,
}

impl fmt::Display for HarnessErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessErrorKind::Config => write!(f, "CONFIG"),
            HarnessErrorKind::Connection => write!(f, "CONNECTION"),
            HarnessErrorKind::Sql => write!(f, "SQL"),
            HarnessErrorKind::Fixture => write!(f, "FIXTURE"),
        }
    }
}

impl HarnessError {
    /// Classify the error for logging.
    pub fn kind(&self) -> HarnessErrorKind {
        match self {
            HarnessError::Config(_) => HarnessErrorKind::Config,
            HarnessError::Connection(_) => HarnessErrorKind::Connection,
            HarnessError::Sql { .. } | HarnessError::Decode { .. } => HarnessErrorKind::Sql,
            HarnessError::Fixture(_) => HarnessErrorKind::Fixture,
        }
    }

    /// Attach statement context to a driver error.
    pub fn sql(sql: impl Into<String>, source: tokio_postgres::Error) -> Self {
        HarnessError::Sql {
            sql: sql.into(),
            source,
        }
    }
}
