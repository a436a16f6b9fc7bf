//! FDW scaffolding DDL.
//!
//! Builds the statements that wire up the foreign side of a query pair:
//! extension, foreign server, user mapping, and the foreign table itself,
//! plus teardown in reverse order. The default configuration is a loopback
//! `postgres_fdw` pointing the foreign table at the reference table in the
//! same database, so a conforming stack passes the whole suite against
//! stock PostgreSQL.

use std::collections::BTreeMap;

use crate::config::FdwConfig;

/// Placeholder in table option values, replaced with the reference table.
pub const TABLE_PLACEHOLDER: &str = "{table}";

/// Resolved scaffolding for one foreign server + table.
#[derive(Debug, Clone)]
pub struct ForeignScaffold {
    extension: String,
    wrapper: String,
    server: String,
    server_options: BTreeMap<String, String>,
    user_mapping_options: BTreeMap<String, String>,
    table_options: BTreeMap<String, String>,
}

impl ForeignScaffold {
    /// Scaffold exactly as configured, no defaults filled in.
    pub fn new(fdw: &FdwConfig) -> Self {
        Self {
            extension: fdw.extension.clone(),
            wrapper: fdw.wrapper.clone(),
            server: fdw.server.clone(),
            server_options: fdw.server_options.clone(),
            user_mapping_options: fdw.user_mapping_options.clone(),
            table_options: fdw.table_options.clone(),
        }
    }

    /// Scaffold with loopback `postgres_fdw` defaults filled into any empty
    /// option map.
    ///
    /// `port` and `dbname` must be the *server-side* values (from
    /// `current_setting('port')` and `current_database()`), not the
    /// client's — the server connects to itself, and under port mapping
    /// the two differ.
    pub fn loopback(fdw: &FdwConfig, port: &str, dbname: &str, user: &str, password: &str) -> Self {
        let mut scaffold = Self::new(fdw);
        if scaffold.server_options.is_empty() {
            scaffold
                .server_options
                .insert("host".to_string(), "localhost".to_string());
            scaffold
                .server_options
                .insert("port".to_string(), port.to_string());
            scaffold
                .server_options
                .insert("dbname".to_string(), dbname.to_string());
        }
        if scaffold.user_mapping_options.is_empty() {
            scaffold
                .user_mapping_options
                .insert("user".to_string(), user.to_string());
            scaffold
                .user_mapping_options
                .insert("password".to_string(), password.to_string());
        }
        if scaffold.table_options.is_empty() {
            scaffold
                .table_options
                .insert("table_name".to_string(), TABLE_PLACEHOLDER.to_string());
        }
        scaffold
    }

    /// Statements that create extension, server, and user mapping.
    ///
    /// The server is dropped first so a stale run never leaks options into
    /// this one.
    pub fn setup_sql(&self) -> Vec<String> {
        let mut stmts = Vec::new();
        if !self.extension.is_empty() {
            stmts.push(format!(
                "CREATE EXTENSION IF NOT EXISTS {}",
                self.extension
            ));
        }
        stmts.push(format!("DROP SERVER IF EXISTS {} CASCADE", self.server));
        stmts.push(format!(
            "CREATE SERVER {} FOREIGN DATA WRAPPER {}{}",
            self.server,
            self.wrapper,
            options_clause(&self.server_options)
        ));
        stmts.push(format!(
            "CREATE USER MAPPING FOR CURRENT_USER SERVER {}{}",
            self.server,
            options_clause(&self.user_mapping_options)
        ));
        stmts
    }

    /// `CREATE FOREIGN TABLE` with the `{table}` placeholder in option
    /// values resolved to the reference table name.
    pub fn foreign_table_sql(&self, foreign_table: &str, columns_sql: &str, ref_table: &str) -> String {
        let resolved: BTreeMap<String, String> = self
            .table_options
            .iter()
            .map(|(k, v)| (k.clone(), v.replace(TABLE_PLACEHOLDER, ref_table)))
            .collect();
        format!(
            "CREATE FOREIGN TABLE {} ({}) SERVER {}{}",
            foreign_table,
            columns_sql,
            self.server,
            options_clause(&resolved)
        )
    }

    /// Teardown in reverse order of creation. The extension is left
    /// installed; it is harmless and may be shared.
    pub fn teardown_sql(&self, foreign_table: &str) -> Vec<String> {
        vec![
            format!("DROP FOREIGN TABLE IF EXISTS {foreign_table}"),
            format!("DROP SERVER IF EXISTS {} CASCADE", self.server),
        ]
    }

    pub fn server(&self) -> &str {
        &self.server
    }
}

/// Render an `OPTIONS (key 'value', ...)` clause, empty string when there
/// are no options. BTreeMap keeps the order deterministic.
fn options_clause(options: &BTreeMap<String, String>) -> String {
    if options.is_empty() {
        return String::new();
    }
    let body = options
        .iter()
        .map(|(k, v)| format!("{k} '{}'", quote_literal(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(" OPTIONS ({body})")
}

/// Double embedded single quotes for a SQL string literal.
pub fn quote_literal(s: &str) -> String {
    s.replace('\'', "''")
}
