//! fdwcheck CLI: run the FDW conformance suite and report per-group results.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use comfy_table::{presets, Cell, Table};
use tracing_subscriber::EnvFilter;

use fdwcheck::fixture::Fixture;
use fdwcheck::harness::{CaseOutcome, Harness, Outcomes};
use fdwcheck::suite;
use fdwcheck::{HarnessConfig, HarnessError};

#[derive(Parser, Debug)]
#[command(
    name = "fdwcheck",
    version,
    about = "Conformance harness for PostgreSQL foreign data wrappers"
)]
struct Args {
    /// TOML config file; flags below override its [conn] section.
    #[arg(long, env = "FDWCHECK_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "FDWCHECK_HOST")]
    host: Option<String>,

    #[arg(long, env = "FDWCHECK_PORT")]
    port: Option<u16>,

    #[arg(long, env = "FDWCHECK_USER")]
    user: Option<String>,

    #[arg(long, env = "FDWCHECK_PASSWORD")]
    password: Option<String>,

    #[arg(long, env = "FDWCHECK_DBNAME")]
    dbname: Option<String>,

    /// Run only cases whose name contains this substring.
    #[arg(long)]
    filter: Option<String>,

    /// Emit the outcome tally as JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Leave the reference and foreign tables in place after the run.
    #[arg(long)]
    keep_tables: bool,
}

impl Args {
    fn into_config(self) -> Result<(HarnessConfig, Option<String>, bool, bool), HarnessError> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::load(path)?,
            None => HarnessConfig::default(),
        };
        if let Some(host) = self.host {
            config.conn.host = host;
        }
        if let Some(port) = self.port {
            config.conn.port = port;
        }
        if let Some(user) = self.user {
            config.conn.user = user;
        }
        if let Some(password) = self.password {
            config.conn.password = password;
        }
        if let Some(dbname) = self.dbname {
            config.conn.dbname = dbname;
        }
        Ok((config, self.filter, self.json, self.keep_tables))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(outcomes) => {
            if outcomes.any_failed() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            tracing::error!(kind = %e.kind(), error = %e, "harness error");
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> Result<Outcomes, HarnessError> {
    let (config, filter, json, keep_tables) = args.into_config()?;

    let harness = Harness::connect(config).await?;
    harness.prepare(&Fixture::mixed_sample()).await?;

    let mut total = Outcomes::default();
    let mut rows: Vec<(String, Outcomes, Vec<(String, CaseOutcome)>)> = Vec::new();
    for group in suite::groups() {
        let cases: Vec<_> = match &filter {
            Some(needle) => group
                .cases
                .into_iter()
                .filter(|c| c.name.contains(needle.as_str()))
                .collect(),
            None => group.cases,
        };
        if cases.is_empty() {
            continue;
        }
        let (outcomes, results) = harness.run_cases(&cases).await;
        total += outcomes;
        rows.push((group.name.to_string(), outcomes, results));
    }

    if !keep_tables {
        harness.teardown().await?;
    }

    if json {
        let mut report = serde_json::Map::new();
        for (name, outcomes, _) in &rows {
            report.insert(name.clone(), outcomes.as_json());
        }
        report.insert("total".to_string(), total.as_json());
        println!("{}", serde_json::Value::Object(report));
    } else {
        print_table(&rows, &total);
    }
    Ok(total)
}

fn print_table(rows: &[(String, Outcomes, Vec<(String, CaseOutcome)>)], total: &Outcomes) {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_header(vec!["group", "result"]);
    for (name, outcomes, _) in rows {
        table.add_row(vec![Cell::new(name), Cell::new(outcomes.to_string())]);
    }
    table.add_row(vec![Cell::new("total"), Cell::new(total.to_string())]);
    println!("{table}");

    for (_, _, results) in rows {
        for (case, outcome) in results {
            if outcome.is_failure() {
                println!("FAIL {case}: {outcome}");
            }
        }
    }
}
