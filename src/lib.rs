//! fdwcheck: a conformance harness for PostgreSQL foreign data wrappers.
//!
//! The harness runs identical SQL against a native reference table and an
//! FDW-backed foreign table over the same data, then asserts the two result
//! sets are equivalent. Out of the box it scaffolds a loopback
//! `postgres_fdw` so the full suite passes against stock PostgreSQL; point
//! the `[fdw]` config section at another wrapper to put it under test.
//!
//! The pieces, bottom up:
//!
//! - [`value`] / [`resultset`]: dynamic decoding of query output.
//! - [`compare`]: the equivalence oracle (ordered, key-aligned, multiset).
//! - [`session`] / [`scaffold`] / [`fixture`]: database plumbing.
//! - [`harness`] / [`suite`]: case execution and the built-in case grids.

pub mod compare;
pub mod config;
pub mod error;
pub mod fixture;
pub mod harness;
pub mod resultset;
pub mod scaffold;
pub mod session;
pub mod suite;
pub mod value;

pub use compare::{compare, CompareMode, Mismatch, Tolerance};
pub use config::{FdwConfig, HarnessConfig, PgConn};
pub use error::{HarnessError, HarnessErrorKind};
pub use fixture::Fixture;
pub use harness::{CaseOutcome, Expect, Harness, Outcomes, QueryCase};
pub use resultset::ResultSet;
pub use value::Value;
