//! CSV fixture data and table DDL.
//!
//! Fixtures are CSV documents whose header row names the columns and whose
//! cells use the `<None>` token for SQL NULL. A [`Fixture`] pairs the parsed
//! rows with a column specification ("name TYPE" pairs) and renders the
//! CREATE TABLE and INSERT statements for the reference side.
//!
//! Two built-in datasets ship with the harness: the 20-row mixed dataset
//! the main suite runs against, and a small keyed dataset for ordered and
//! key-aligned cases.

use crate::error::HarnessError;

/// Token marking a NULL cell in fixture CSV.
pub const NULL_TOKEN: &str = "<None>";

/// One column of a fixture table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub sql_type: String,
}

impl ColumnSpec {
    /// Parse a comma-separated DDL fragment such as
    /// `"int1 INTEGER, real1 REAL, string TEXT"`.
    ///
    /// Commas inside parentheses (e.g. `DECIMAL(20,10)`) do not split.
    pub fn parse_list(spec: &str) -> Result<Vec<ColumnSpec>, HarnessError> {
        let mut columns = Vec::new();
        for part in split_top_level(spec) {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (name, sql_type) = part.split_once(char::is_whitespace).ok_or_else(|| {
                HarnessError::Fixture(format!("column spec '{part}' has no type"))
            })?;
            columns.push(ColumnSpec {
                name: name.trim().to_string(),
                sql_type: sql_type.trim().to_string(),
            });
        }
        if columns.is_empty() {
            return Err(HarnessError::Fixture("empty column spec".to_string()));
        }
        Ok(columns)
    }
}

/// Split on commas outside parentheses.
fn split_top_level(spec: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in spec.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

/// A parsed fixture: columns plus rows of optional (nullable) cell text.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Fixture {
    /// Parse fixture CSV against a column spec.
    ///
    /// The CSV header must name exactly the spec's columns, in order.
    pub fn from_csv(columns_spec: &str, csv_text: &str) -> Result<Self, HarnessError> {
        let columns = ColumnSpec::parse_list(columns_spec)?;
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(csv_text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| HarnessError::Fixture(e.to_string()))?
            .clone();
        let expected: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        let found: Vec<&str> = headers.iter().collect();
        if found != expected {
            return Err(HarnessError::Fixture(format!(
                "CSV header mismatch: expected [{}], found [{}]",
                expected.join(", "),
                found.join(", ")
            )));
        }

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(|e| HarnessError::Fixture(e.to_string()))?;
            if record.len() != columns.len() {
                return Err(HarnessError::Fixture(format!(
                    "row {} has {} fields, expected {}",
                    line + 1,
                    record.len(),
                    columns.len()
                )));
            }
            rows.push(
                record
                    .iter()
                    .map(|cell| {
                        if cell == NULL_TOKEN {
                            None
                        } else {
                            Some(cell.to_string())
                        }
                    })
                    .collect(),
            );
        }
        Ok(Fixture { columns, rows })
    }

    /// The column list as a DDL fragment, usable for both the reference
    /// table and the foreign table definition.
    pub fn columns_sql(&self) -> String {
        self.columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.sql_type))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `CREATE TABLE` for the reference side.
    pub fn create_table_sql(&self, table: &str) -> String {
        format!("CREATE TABLE {} ({})", table, self.columns_sql())
    }

    /// Multi-row `INSERT` loading every fixture row, or `None` when the
    /// fixture is empty. Cells are rendered as untyped string literals and
    /// coerced by PostgreSQL to the column types.
    pub fn insert_sql(&self, table: &str) -> Option<String> {
        if self.rows.is_empty() {
            return None;
        }
        let names = self
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let values = self
            .rows
            .iter()
            .map(|row| {
                let cells = row.iter().map(|cell| literal(cell)).collect::<Vec<_>>();
                format!("({})", cells.join(", "))
            })
            .collect::<Vec<_>>()
            .join(", ");
        Some(format!("INSERT INTO {table} ({names}) VALUES {values}"))
    }

    /// The 20-row mixed dataset: paired int, real, date, and timestamp
    /// columns plus a text column, with NULLs sprinkled through every type.
    pub fn mixed_sample() -> Fixture {
        Self::from_csv(MIXED_COLUMNS, MIXED_CSV).expect("built-in mixed fixture is valid")
    }

    /// The keyed dataset: four rows with a distinct `id`, for ordered and
    /// key-aligned comparison cases.
    pub fn keyed_sample() -> Fixture {
        Self::from_csv(KEYED_COLUMNS, KEYED_CSV).expect("built-in keyed fixture is valid")
    }
}

/// Render one cell as a SQL literal.
fn literal(cell: &Option<String>) -> String {
    match cell {
        None => "NULL".to_string(),
        Some(text) => format!("'{}'", crate::scaffold::quote_literal(text)),
    }
}

/// Columns of the mixed dataset.
pub const MIXED_COLUMNS: &str = "int1 INTEGER, int2 INTEGER, real1 REAL, real2 REAL, \
     date1 DATE, date2 DATE, timestamp1 TIMESTAMP, timestamp2 TIMESTAMP, string TEXT";

const MIXED_CSV: &str = "\
int1,int2,real1,real2,date1,date2,timestamp1,timestamp2,string
14,63,-8.37,97.10,2218-02-26,2050-11-18,2075-07-21 22:20:56,2044-09-10 22:47:56,flb
-95,-13,-35.82,35.98,2193-09-18,2100-09-09,2141-09-05 04:22:18,2219-07-11 02:04:03,hag
-92,-67,-49.05,-43.24,2137-10-18,2204-10-20,2123-08-27 09:22:46,2041-04-03 17:52:27,wbk
-51,62,-68.16,73.70,2005-02-25,2040-01-30,2206-06-14 12:17:12,2164-05-26 11:05:36,wmw
23,-90,-72.61,27.02,2007-06-17,2190-10-19,1995-10-22 02:04:46,2160-01-05 15:46:46,rin
<None>,-74,-87.11,-10.60,2230-07-22,2157-08-02,1991-11-11 04:41:25,2145-06-03 02:50:33,gfj
37,-18,-5.96,-20.12,2014-04-11,2209-11-30,1977-05-03 11:37:58,2044-05-29 05:32:52,xok
-76,58,-85.43,34.83,2228-05-24,2208-06-11,2037-10-29 10:49:42,2228-03-04 15:30:33,wlf
-67,-87,-83.23,71.59,2031-07-07,2192-10-01,2005-11-17 00:30:29,1983-10-03 08:45:50,lzg
75,<None>,92.83,-7.07,2016-12-03,2045-01-18,2085-06-29 17:51:53,2195-08-05 02:15:00,kgy
26,-14,-0.07,54.62,2183-03-09,2001-01-01,2141-09-02 20:58:52,2098-06-21 06:45:00,jja
-62,-90,-52.98,84.41,2118-09-04,1983-11-19,2060-07-30 17:00:35,2059-11-22 08:43:47,mup
-8,-48,19.06,<None>,1991-04-27,2003-10-27,2167-10-16 18:34:11,<None>,rhq
83,90,-63.16,34.44,2054-08-07,2124-01-23,2023-08-12 23:52:50,2109-06-29 06:03:20,uuh
86,68,-24.80,57.00,2031-02-23,<None>,2030-06-05 16:03:21,2103-12-14 14:33:01,rjd
-73,38,2.84,-89.88,2126-08-24,2123-12-03,2048-02-03 13:14:07,2223-04-01 03:25:42,vht
-89,31,-11.42,64.13,2207-08-09,1973-09-16,2122-02-28 18:31:33,1972-07-20 00:05:28,mnh
-80,48,-56.49,-19.11,2111-10-14,2205-09-06,2126-05-18 00:26:52,2237-07-12 05:22:13,<None>
-23,65,84.00,-5.08,2121-10-15,2129-08-30,2005-11-01 11:18:51,1995-02-23 22:11:44,iom
40,34,-70.76,-61.05,2103-05-20,1984-02-15,2013-09-29 12:36:21,2075-11-04 12:05:36,hpb
";

/// Columns of the keyed dataset.
pub const KEYED_COLUMNS: &str =
    "id INTEGER, adate DATE, atimestamp TIMESTAMP, anumeric NUMERIC, avarchar VARCHAR";

const KEYED_CSV: &str = "\
id,adate,atimestamp,anumeric,avarchar
1,1980-01-01,1980-01-01 11:01:21.132912,3.4,Test
2,1990-03-05,1998-03-02 10:40:18.321023,12.2,Another Test
3,1972-01-02,1972-01-02 16:12:54,4000,another Test
4,1922-11-02,1962-01-02 23:12:54,-3000,<None>
";
