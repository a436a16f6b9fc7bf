//! The built-in conformance suite.
//!
//! Case generators over the mixed fixture's columns. Each generator expands
//! a small template grid into concrete [`QueryCase`]s: every numeric column
//! gets the same arithmetic probes, every time column the same range
//! probes, and so on. Queries with `ORDER BY` become ordered cases; the
//! rest compare as multisets.

use crate::harness::QueryCase;

/// Integer and real columns of the mixed fixture.
pub const NUMERIC_COLUMNS: [&str; 4] = ["int1", "int2", "real1", "real2"];

/// Date and timestamp columns of the mixed fixture.
pub const TIME_COLUMNS: [&str; 4] = ["date1", "date2", "timestamp1", "timestamp2"];

/// All columns of the mixed fixture, in table order.
pub const ALL_COLUMNS: [&str; 9] = [
    "int1",
    "int2",
    "real1",
    "real2",
    "date1",
    "date2",
    "timestamp1",
    "timestamp2",
    "string",
];

/// A named group of cases, the unit of selection on the CLI.
pub struct SuiteGroup {
    pub name: &'static str,
    pub cases: Vec<QueryCase>,
}

/// Whole-table and single-row smoke cases.
pub fn basic() -> Vec<QueryCase> {
    vec![
        QueryCase::unordered("basic/select_star", "SELECT * FROM {table}"),
        QueryCase::unordered("basic/count", "SELECT count(*) FROM {table}"),
        QueryCase::unordered("basic/limit", "SELECT count(*) FROM (SELECT * FROM {table} LIMIT 5) AS t"),
        QueryCase::unordered("basic/distinct_string", "SELECT DISTINCT string FROM {table}"),
        QueryCase::unordered("basic/constant", "SELECT 1, 'x' FROM {table}"),
    ]
}

/// Column projections: each column alone, pairs, and aliasing.
pub fn projections() -> Vec<QueryCase> {
    let mut cases = Vec::new();
    for col in ALL_COLUMNS {
        cases.push(QueryCase::unordered(
            format!("projections/{col}"),
            format!("SELECT {col} FROM {{table}}"),
        ));
    }
    cases.push(QueryCase::unordered(
        "projections/pair",
        "SELECT int1, string FROM {table}",
    ));
    cases.push(QueryCase::unordered(
        "projections/alias",
        "SELECT int1 AS a, int2 AS b FROM {table}",
    ));
    cases
}

/// Arithmetic over the numeric columns.
pub fn arithmetic() -> Vec<QueryCase> {
    let mut cases = Vec::new();
    for col in NUMERIC_COLUMNS {
        for (op, label) in [("+", "add"), ("-", "sub"), ("*", "mul")] {
            cases.push(QueryCase::unordered(
                format!("arithmetic/{col}_{label}"),
                format!("SELECT {col} {op} 2 FROM {{table}}"),
            ));
        }
        cases.push(QueryCase::unordered(
            format!("arithmetic/{col}_div"),
            format!("SELECT {col} / 3 FROM {{table}}"),
        ));
        cases.push(QueryCase::unordered(
            format!("arithmetic/{col}_pow"),
            format!("SELECT {col} ^ 2 FROM {{table}}"),
        ));
        cases.push(QueryCase::unordered(
            format!("arithmetic/{col}_neg"),
            format!("SELECT -{col} FROM {{table}}"),
        ));
    }
    cases.push(QueryCase::unordered(
        "arithmetic/cross_column",
        "SELECT int1 + int2, real1 * real2 FROM {table}",
    ));
    cases
}

/// Scalar functions: abs/round on numerics, extract on times, string ops.
pub fn functions() -> Vec<QueryCase> {
    let mut cases = Vec::new();
    for col in NUMERIC_COLUMNS {
        for func in ["abs", "floor", "ceiling", "sign"] {
            cases.push(QueryCase::unordered(
                format!("functions/{func}_{col}"),
                format!("SELECT {func}({col}) FROM {{table}}"),
            ));
        }
        cases.push(QueryCase::unordered(
            format!("functions/round_{col}"),
            format!("SELECT round({col}::numeric, 1) FROM {{table}}"),
        ));
        cases.push(QueryCase::unordered(
            format!("functions/sign_where_{col}"),
            format!("SELECT * FROM {{table}} WHERE sign({col}) = 1"),
        ));
    }
    // exp overflows float8 past ~709; the int columns stay well under.
    cases.push(QueryCase::unordered(
        "functions/exp_int1",
        "SELECT exp(int1) FROM {table}",
    ));
    for col in TIME_COLUMNS {
        cases.push(QueryCase::unordered(
            format!("functions/extract_year_{col}"),
            format!("SELECT extract(year FROM {col}) FROM {{table}}"),
        ));
    }
    cases.push(QueryCase::unordered(
        "functions/upper",
        "SELECT upper(string) FROM {table}",
    ));
    cases.push(QueryCase::unordered(
        "functions/length",
        "SELECT length(string) FROM {table}",
    ));
    cases.push(QueryCase::unordered(
        "functions/concat",
        "SELECT string || '_x' FROM {table}",
    ));
    cases.push(QueryCase::unordered(
        "functions/coalesce",
        "SELECT coalesce(int1, 0) FROM {table}",
    ));
    cases
}

/// WHERE-clause comparison operators over every column family.
pub fn comparisons() -> Vec<QueryCase> {
    let mut cases = Vec::new();
    for col in NUMERIC_COLUMNS {
        for (op, label) in [
            ("=", "eq"),
            ("<>", "ne"),
            ("<", "lt"),
            ("<=", "le"),
            (">", "gt"),
            (">=", "ge"),
        ] {
            cases.push(QueryCase::unordered(
                format!("comparisons/{col}_{label}"),
                format!("SELECT * FROM {{table}} WHERE {col} {op} 0"),
            ));
        }
    }
    for col in TIME_COLUMNS {
        cases.push(QueryCase::unordered(
            format!("comparisons/{col}_after"),
            format!("SELECT * FROM {{table}} WHERE {col} > '2050-01-01'"),
        ));
        cases.push(QueryCase::unordered(
            format!("comparisons/{col}_before"),
            format!("SELECT * FROM {{table}} WHERE {col} <= '2050-01-01'"),
        ));
    }
    for col in ALL_COLUMNS {
        cases.push(QueryCase::unordered(
            format!("comparisons/{col}_is_null"),
            format!("SELECT * FROM {{table}} WHERE {col} IS NULL"),
        ));
        cases.push(QueryCase::unordered(
            format!("comparisons/{col}_not_null"),
            format!("SELECT * FROM {{table}} WHERE {col} IS NOT NULL"),
        ));
    }
    cases.push(QueryCase::unordered(
        "comparisons/string_eq",
        "SELECT * FROM {table} WHERE string = 'flb'",
    ));
    cases.push(QueryCase::unordered(
        "comparisons/in_list",
        "SELECT * FROM {table} WHERE int1 IN (14, -95, 23)",
    ));
    cases.push(QueryCase::unordered(
        "comparisons/not_in_list",
        "SELECT * FROM {table} WHERE int1 NOT IN (14, -95, 23)",
    ));
    cases.push(QueryCase::unordered(
        "comparisons/between",
        "SELECT * FROM {table} WHERE int1 BETWEEN -50 AND 50",
    ));
    cases.push(QueryCase::unordered(
        "comparisons/cast_in_where",
        "SELECT * FROM {table} WHERE int1::float8 > 0.5",
    ));
    cases.push(QueryCase::unordered(
        "comparisons/cast_in_select",
        "SELECT int1::text, real1::numeric(10,2) FROM {table}",
    ));
    cases
}

/// AND/OR/NOT combinations.
pub fn logical() -> Vec<QueryCase> {
    vec![
        QueryCase::unordered(
            "logical/and",
            "SELECT * FROM {table} WHERE int1 > 0 AND int2 < 0",
        ),
        QueryCase::unordered(
            "logical/or",
            "SELECT * FROM {table} WHERE int1 > 50 OR int2 > 50",
        ),
        QueryCase::unordered(
            "logical/not",
            "SELECT * FROM {table} WHERE NOT (real1 < 0)",
        ),
        QueryCase::unordered(
            "logical/nested",
            "SELECT * FROM {table} WHERE (int1 > 0 OR int2 > 0) AND real1 < 0",
        ),
    ]
}

/// LIKE and ILIKE patterns on the text column.
pub fn pattern_matching() -> Vec<QueryCase> {
    let mut cases = Vec::new();
    for (op, label) in [
        ("LIKE", "like"),
        ("ILIKE", "ilike"),
        ("NOT LIKE", "not_like"),
        ("NOT ILIKE", "not_ilike"),
    ] {
        for (pattern, plabel) in [("w%", "prefix"), ("%g", "suffix"), ("%l%", "infix")] {
            cases.push(QueryCase::unordered(
                format!("pattern/{label}_{plabel}"),
                format!("SELECT * FROM {{table}} WHERE string {op} '{pattern}'"),
            ));
        }
    }
    cases.push(QueryCase::unordered(
        "pattern/underscore",
        "SELECT * FROM {table} WHERE string LIKE '_a_'",
    ));
    cases
}

/// Aggregates, GROUP BY, and HAVING.
pub fn grouping() -> Vec<QueryCase> {
    let mut cases = Vec::new();
    for col in NUMERIC_COLUMNS {
        for agg in ["min", "max", "count"] {
            cases.push(QueryCase::unordered(
                format!("grouping/{agg}_{col}"),
                format!("SELECT {agg}({col}) FROM {{table}}"),
            ));
        }
        // sum over REAL accumulates in float4, where summation order shows
        // up above the tolerance; widen before aggregating.
        cases.push(QueryCase::unordered(
            format!("grouping/sum_{col}"),
            format!("SELECT sum({col}::float8) FROM {{table}}"),
        ));
        // avg produces a float subject to plan-dependent rounding; keep it
        // in the suite, the tolerance absorbs the difference.
        cases.push(QueryCase::unordered(
            format!("grouping/avg_{col}"),
            format!("SELECT avg({col})::float8 FROM {{table}}"),
        ));
    }
    cases.push(QueryCase::unordered(
        "grouping/group_by_sign",
        "SELECT int1 > 0, count(*) FROM {table} GROUP BY int1 > 0",
    ));
    cases.push(QueryCase::unordered(
        "grouping/having",
        "SELECT string, count(*) FROM {table} GROUP BY string HAVING count(*) >= 1",
    ));
    cases
}

/// Subqueries and joins of the table with itself.
pub fn subqueries() -> Vec<QueryCase> {
    vec![
        QueryCase::unordered(
            "subqueries/in_subquery",
            "SELECT * FROM {table} WHERE int1 IN (SELECT int1 FROM {table} WHERE int1 > 0)",
        ),
        QueryCase::unordered(
            "subqueries/exists",
            "SELECT * FROM {table} t WHERE EXISTS \
             (SELECT 1 FROM {table} u WHERE u.int1 = t.int2)",
        ),
        QueryCase::unordered(
            "subqueries/scalar",
            "SELECT int1 - (SELECT min(int1) FROM {table}) FROM {table}",
        ),
        QueryCase::unordered(
            "subqueries/self_join",
            "SELECT a.string, b.string FROM {table} a \
             JOIN {table} b ON a.int1 = b.int1",
        ),
        QueryCase::unordered(
            "subqueries/derived_table",
            "SELECT t.s FROM (SELECT string AS s, int1 FROM {table}) t WHERE t.int1 > 0",
        ),
    ]
}

/// Window functions over deterministic frames.
pub fn window() -> Vec<QueryCase> {
    vec![
        QueryCase::unordered(
            "window/row_number",
            "SELECT string, row_number() OVER (ORDER BY string NULLS LAST, int1 NULLS LAST) \
             FROM {table}",
        ),
        QueryCase::unordered(
            "window/rank",
            "SELECT int1, rank() OVER (ORDER BY int1 NULLS LAST) FROM {table}",
        ),
        QueryCase::unordered(
            "window/sum_over",
            "SELECT int1, sum(int2) OVER () FROM {table}",
        ),
        QueryCase::unordered(
            "window/partition",
            "SELECT string, count(*) OVER (PARTITION BY int1 > 0) FROM {table}",
        ),
    ]
}

/// ORDER BY grids: every column, both directions, both NULL placements.
pub fn ordering() -> Vec<QueryCase> {
    let mut cases = Vec::new();
    for col in ALL_COLUMNS {
        for dir in ["ASC", "DESC"] {
            for nulls in ["NULLS FIRST", "NULLS LAST"] {
                let label = format!(
                    "ordering/{col}_{}_{}",
                    dir.to_lowercase(),
                    nulls.replace(' ', "_").to_lowercase()
                );
                cases.push(QueryCase::ordered(
                    label,
                    format!("SELECT * FROM {{table}} ORDER BY {col} {dir} {nulls}, string NULLS LAST, int1 NULLS LAST"),
                ));
            }
        }
    }
    cases.push(QueryCase::ordered(
        "ordering/multi_key",
        "SELECT * FROM {table} ORDER BY int1 > 0 NULLS LAST, string DESC NULLS LAST, int2 NULLS LAST",
    ));
    cases.push(QueryCase::ordered(
        "ordering/expression",
        "SELECT * FROM {table} ORDER BY abs(int1) NULLS LAST, string NULLS LAST, int2 NULLS LAST",
    ));
    cases
}

/// Cases the oracle is expected to flag: non-deterministic orderings.
pub fn failing() -> Vec<QueryCase> {
    vec![
        QueryCase::ordered("failing/order_by_random", "SELECT * FROM {table} ORDER BY random()")
            .xfail("row order is non-deterministic"),
        QueryCase::ordered(
            "failing/order_by_random_desc",
            "SELECT * FROM {table} ORDER BY random() DESC",
        )
        .xfail("row order is non-deterministic"),
        QueryCase::unordered(
            "failing/where_random",
            "SELECT * FROM {table} WHERE random() < 0.5",
        )
        .xfail("row selection is non-deterministic"),
    ]
}

/// All groups, in run order.
pub fn groups() -> Vec<SuiteGroup> {
    vec![
        SuiteGroup { name: "basic", cases: basic() },
        SuiteGroup { name: "projections", cases: projections() },
        SuiteGroup { name: "arithmetic", cases: arithmetic() },
        SuiteGroup { name: "functions", cases: functions() },
        SuiteGroup { name: "comparisons", cases: comparisons() },
        SuiteGroup { name: "logical", cases: logical() },
        SuiteGroup { name: "pattern", cases: pattern_matching() },
        SuiteGroup { name: "grouping", cases: grouping() },
        SuiteGroup { name: "subqueries", cases: subqueries() },
        SuiteGroup { name: "window", cases: window() },
        SuiteGroup { name: "ordering", cases: ordering() },
        SuiteGroup { name: "failing", cases: failing() },
    ]
}

/// Every case of every group, flattened.
pub fn full_suite() -> Vec<QueryCase> {
    groups().into_iter().flat_map(|g| g.cases).collect()
}
