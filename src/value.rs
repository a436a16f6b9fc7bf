//! Dynamically typed result cells.
//!
//! The harness runs arbitrary generated SQL, so it cannot know result column
//! types at compile time. [`Value`] is a lenient decoding target: all integer
//! widths collapse to `Int`, both float widths to `Float`, and `NUMERIC`
//! arrives as its decimal text rendering. Anything the harness does not
//! understand is kept as raw bytes and compared byte-wise, which is still a
//! valid equivalence check because both sides of a query pair produce the
//! same wire type.
//!
//! Only `Float` participates in tolerance comparison; every other variant is
//! compared exactly.

use std::error::Error;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tokio_postgres::types::{FromSql, Type};

/// A single result cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Arbitrary-precision numeric, kept as its decimal text rendering.
    Numeric(String),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    /// Raw bytes: `bytea`, or any type the harness does not decode.
    Bytes(Vec<u8>),
}

impl Value {
    /// Canonical text form, used for multiset bucketing and key sorting.
    ///
    /// Floats are rendered at 10 significant digits so that values within
    /// the default tolerance land in the same bucket; `-0.0` normalizes
    /// to `0.0`.
    pub fn canonical(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(true) => "t".to_string(),
            Value::Bool(false) => "f".to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => canonical_float(*v),
            Value::Numeric(s) => s.clone(),
            Value::Text(s) => s.clone(),
            Value::Date(d) => d.to_string(),
            Value::Timestamp(ts) => ts.to_string(),
            Value::TimestampTz(ts) => ts.to_rfc3339(),
            Value::Bytes(b) => {
                let mut s = String::with_capacity(2 + b.len() * 2);
                s.push_str("\\x");
                for byte in b {
                    s.push_str(&format!("{byte:02x}"));
                }
                s
            }
        }
    }

    /// Whether this cell is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// Render a float at 10 significant digits.
fn canonical_float(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    // Normalize negative zero so 0.0 and -0.0 bucket together.
    let v = if v == 0.0 { 0.0 } else { v };
    format!("{v:.9e}")
}

impl<'a> FromSql<'a> for Value {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        // The stock driver is strict (INT4 only decodes to i32); the oracle
        // needs lenient rules because generated queries produce whatever
        // width PostgreSQL infers.
        let value = if *ty == Type::BOOL {
            Value::Bool(bool::from_sql(ty, raw)?)
        } else if *ty == Type::INT2 {
            Value::Int(i16::from_sql(ty, raw)? as i64)
        } else if *ty == Type::INT4 {
            Value::Int(i32::from_sql(ty, raw)? as i64)
        } else if *ty == Type::INT8 {
            Value::Int(i64::from_sql(ty, raw)?)
        } else if *ty == Type::OID {
            Value::Int(u32::from_sql(ty, raw)? as i64)
        } else if *ty == Type::FLOAT4 {
            Value::Float(f32::from_sql(ty, raw)? as f64)
        } else if *ty == Type::FLOAT8 {
            Value::Float(f64::from_sql(ty, raw)?)
        } else if *ty == Type::NUMERIC {
            Value::Numeric(numeric_text(raw)?)
        } else if *ty == Type::TEXT
            || *ty == Type::VARCHAR
            || *ty == Type::BPCHAR
            || *ty == Type::NAME
            || *ty == Type::UNKNOWN
        {
            Value::Text(String::from_sql(ty, raw)?)
        } else if *ty == Type::DATE {
            Value::Date(NaiveDate::from_sql(ty, raw)?)
        } else if *ty == Type::TIMESTAMP {
            Value::Timestamp(NaiveDateTime::from_sql(ty, raw)?)
        } else if *ty == Type::TIMESTAMPTZ {
            Value::TimestampTz(DateTime::<Utc>::from_sql(ty, raw)?)
        } else {
            Value::Bytes(raw.to_vec())
        };
        Ok(value)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

// ── Binary NUMERIC decoding ────────────────────────────────────────────────

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

/// Decode the PostgreSQL binary `numeric` wire format into decimal text.
///
/// Layout: `ndigits:u16 weight:i16 sign:u16 dscale:u16` followed by
/// `ndigits` base-10000 digit groups, each `u16`. `weight` is the base-10000
/// exponent of the first group.
fn numeric_text(raw: &[u8]) -> Result<String, Box<dyn Error + Sync + Send>> {
    if raw.len() < 8 {
        return Err("numeric value too short".into());
    }
    let ndigits = u16::from_be_bytes([raw[0], raw[1]]) as usize;
    let weight = i16::from_be_bytes([raw[2], raw[3]]) as isize;
    let sign = u16::from_be_bytes([raw[4], raw[5]]);
    let dscale = (u16::from_be_bytes([raw[6], raw[7]]) & 0x3FFF) as usize;

    match sign {
        NUMERIC_NAN => return Ok("NaN".to_string()),
        NUMERIC_PINF => return Ok("Infinity".to_string()),
        NUMERIC_NINF => return Ok("-Infinity".to_string()),
        NUMERIC_POS | NUMERIC_NEG => {}
        other => return Err(format!("bad numeric sign: {other:#06x}").into()),
    }
    if raw.len() < 8 + ndigits * 2 {
        return Err("numeric digit groups truncated".into());
    }
    let group = |j: isize| -> u16 {
        if j >= 0 && (j as usize) < ndigits {
            let off = 8 + (j as usize) * 2;
            u16::from_be_bytes([raw[off], raw[off + 1]])
        } else {
            0
        }
    };

    let mut out = String::new();
    if sign == NUMERIC_NEG {
        out.push('-');
    }

    // Integer part: groups 0..=weight (first group unpadded).
    if weight < 0 {
        out.push('0');
    } else {
        for j in 0..=weight {
            if j == 0 {
                out.push_str(&group(j).to_string());
            } else {
                out.push_str(&format!("{:04}", group(j)));
            }
        }
    }

    // Fractional part: groups after `weight`, truncated to dscale digits.
    if dscale > 0 {
        let mut frac = String::with_capacity(dscale + 4);
        let mut j = weight + 1;
        while frac.len() < dscale {
            frac.push_str(&format!("{:04}", group(j)));
            j += 1;
        }
        frac.truncate(dscale);
        out.push('.');
        out.push_str(&frac);
    }

    Ok(out)
}
