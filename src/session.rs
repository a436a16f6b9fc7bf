//! Single-connection SQL executor.
//!
//! The harness is deliberately synchronous in shape: one connection, one
//! statement at a time, no shared mutable state beyond the database itself.
//! [`Session`] wraps a `tokio_postgres::Client` plus its spawned connection
//! task and attaches statement context to every driver error.

use tokio_postgres::NoTls;

use crate::config::PgConn;
use crate::error::HarnessError;
use crate::resultset::ResultSet;

/// One open connection to the database under test.
pub struct Session {
    client: tokio_postgres::Client,
}

impl Session {
    /// Connect and spawn the connection driver task.
    pub async fn connect(conn: &PgConn) -> Result<Self, HarnessError> {
        let (client, connection) = tokio_postgres::connect(&conn.conn_string(), NoTls)
            .await
            .map_err(HarnessError::Connection)?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "database connection terminated");
            }
        });

        Ok(Session { client })
    }

    /// Execute a statement that returns no rows (DDL, INSERT).
    pub async fn execute(&self, sql: &str) -> Result<u64, HarnessError> {
        tracing::debug!(sql, "execute");
        self.client
            .execute(sql, &[])
            .await
            .map_err(|e| HarnessError::sql(sql, e))
    }

    /// Execute several statements in one round trip (simple protocol).
    pub async fn batch_execute(&self, sql: &str) -> Result<(), HarnessError> {
        tracing::debug!(sql, "batch execute");
        self.client
            .batch_execute(sql)
            .await
            .map_err(|e| HarnessError::sql(sql, e))
    }

    /// Run a query and capture its full output.
    pub async fn query(&self, sql: &str) -> Result<ResultSet, HarnessError> {
        tracing::debug!(sql, "query");
        let rows = self
            .client
            .query(sql, &[])
            .await
            .map_err(|e| HarnessError::sql(sql, e))?;
        ResultSet::from_rows(&rows)
    }

    /// Run a query expected to return exactly one text-castable scalar.
    pub async fn query_scalar_text(&self, sql: &str) -> Result<String, HarnessError> {
        let row = self
            .client
            .query_one(sql, &[])
            .await
            .map_err(|e| HarnessError::sql(sql, e))?;
        row.try_get::<_, String>(0).map_err(|e| HarnessError::Decode {
            column: row.columns()[0].name().to_string(),
            message: e.to_string(),
        })
    }
}
