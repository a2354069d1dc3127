//! Runtime values for materialized rows.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;

/// A runtime SQL value, as reported by the driver for one result cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL
    Null,

    /// Boolean
    Bool(bool),

    /// 16-bit signed integer (SMALLINT)
    I16(i16),

    /// 32-bit signed integer (INTEGER)
    I32(i32),

    /// 64-bit signed integer (BIGINT)
    I64(i64),

    /// 32-bit float (REAL)
    F32(f32),

    /// 64-bit float (DOUBLE PRECISION)
    F64(f64),

    /// Arbitrary-precision numeric (NUMERIC)
    Numeric(Decimal),

    /// Text (TEXT, VARCHAR, etc.)
    String(String),

    /// Binary data (BYTEA)
    Bytes(Vec<u8>),

    /// TIMESTAMP
    Timestamp(NaiveDateTime),

    /// TIMESTAMPTZ
    TimestampTz(DateTime<Utc>),

    /// DATE
    Date(NaiveDate),
}

impl Value {
    /// Returns true if this is a NULL value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}
