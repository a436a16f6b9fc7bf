//! Harness configuration.
//!
//! Everything is loadable from a TOML file with every field defaulted, so a
//! bare `HarnessConfig::default()` runs the loopback `postgres_fdw` suite
//! against a local PostgreSQL. The CLI layers environment variables and
//! flags on top.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::compare::Tolerance;
use crate::error::HarnessError;

/// Connection parameters for the database under test.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PgConn {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
}

impl Default for PgConn {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            dbname: "postgres".to_string(),
        }
    }
}

impl PgConn {
    /// Key/value connection string for tokio-postgres.
    pub fn conn_string(&self) -> String {
        format!(
            "host={} port={} user={} password={} dbname={}",
            self.host, self.port, self.user, self.password, self.dbname
        )
    }
}

/// Which FDW to scaffold and how.
///
/// Empty option maps mean "derive the loopback postgres_fdw defaults at
/// prepare time". Fill them in to put a different wrapper under test.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FdwConfig {
    /// Extension to `CREATE EXTENSION` (empty string to skip).
    pub extension: String,
    /// Foreign data wrapper name for `CREATE SERVER`.
    pub wrapper: String,
    /// Name of the foreign server object.
    pub server: String,
    /// `OPTIONS (...)` for `CREATE SERVER`.
    pub server_options: BTreeMap<String, String>,
    /// `OPTIONS (...)` for `CREATE USER MAPPING`.
    pub user_mapping_options: BTreeMap<String, String>,
    /// `OPTIONS (...)` for `CREATE FOREIGN TABLE`. Values may contain the
    /// `{table}` placeholder, replaced with the reference table name.
    pub table_options: BTreeMap<String, String>,
}

impl Default for FdwConfig {
    fn default() -> Self {
        Self {
            extension: "postgres_fdw".to_string(),
            wrapper: "postgres_fdw".to_string(),
            server: "fdwcheck_srv".to_string(),
            server_options: BTreeMap::new(),
            user_mapping_options: BTreeMap::new(),
            table_options: BTreeMap::new(),
        }
    }
}

/// Top-level harness configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub conn: PgConn,
    pub fdw: FdwConfig,
    /// Name of the native reference table.
    pub ref_table: String,
    /// Name of the FDW-backed foreign table.
    pub foreign_table: String,
    /// Alignment key for unordered comparison.
    pub key_column: String,
    pub tolerance: Tolerance,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            conn: PgConn::default(),
            fdw: FdwConfig::default(),
            ref_table: "fdwcheck_ref".to_string(),
            foreign_table: "fdwcheck_for".to_string(),
            key_column: "id".to_string(),
            tolerance: Tolerance::default(),
        }
    }
}

impl HarnessConfig {
    /// Parse a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, HarnessError> {
        toml::from_str(text).map_err(|e| HarnessError::Config(e.to_string()))
    }

    /// Load a TOML config file.
    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| HarnessError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = HarnessConfig::default();
        assert_eq!(cfg.ref_table, "fdwcheck_ref");
        assert_eq!(cfg.foreign_table, "fdwcheck_for");
        assert_eq!(cfg.key_column, "id");
        assert_eq!(cfg.fdw.extension, "postgres_fdw");
        assert!(cfg.fdw.server_options.is_empty());
    }

    #[test]
    fn test_conn_string() {
        let conn = PgConn {
            host: "db.example".into(),
            port: 5433,
            user: "u".into(),
            password: "p".into(),
            dbname: "d".into(),
        };
        assert_eq!(
            conn.conn_string(),
            "host=db.example port=5433 user=u password=p dbname=d"
        );
    }

    #[test]
    fn test_partial_toml_overrides() {
        let cfg = HarnessConfig::from_toml_str(
            r#"
            key_column = "pk"

            [conn]
            host = "10.0.0.7"
            dbname = "conformance"

            [fdw]
            extension = "multicorn"
            wrapper = "multicorn"

            [fdw.server_options]
            wrapper = "multicorn.sqlalchemyfdw.SqlAlchemyFdw"

            [tolerance]
            rel_eps = 1e-6
            abs_eps = 1e-9
            "#,
        )
        .unwrap();
        assert_eq!(cfg.key_column, "pk");
        assert_eq!(cfg.conn.host, "10.0.0.7");
        assert_eq!(cfg.conn.port, 5432, "unset fields keep defaults");
        assert_eq!(cfg.fdw.extension, "multicorn");
        assert_eq!(
            cfg.fdw.server_options["wrapper"],
            "multicorn.sqlalchemyfdw.SqlAlchemyFdw"
        );
        assert_eq!(cfg.tolerance.rel_eps, 1e-6);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = HarnessConfig::from_toml_str("conn = 42").unwrap_err();
        assert_eq!(err.kind(), crate::error::HarnessErrorKind::Config);
    }
}
