//! Row materialization from driver-reported column types.

use tokio_postgres::Row;
use tokio_postgres::types::Type;

use super::Value;
use crate::Error;

/// Extract every cell of a row into a [`Value`], picking the Rust type
/// from the column type the driver reports.
pub fn row_values(row: &Row) -> Result<Vec<Value>, Error> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| value_at(row, idx, col.type_()))
        .collect()
}

fn value_at(row: &Row, idx: usize, ty: &Type) -> Result<Value, Error> {
    let value = match *ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(idx)?.map(Value::Bool),
        Type::INT2 => row.try_get::<_, Option<i16>>(idx)?.map(Value::I16),
        Type::INT4 => row.try_get::<_, Option<i32>>(idx)?.map(Value::I32),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx)?.map(Value::I64),
        Type::FLOAT4 => row.try_get::<_, Option<f32>>(idx)?.map(Value::F32),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx)?.map(Value::F64),
        Type::NUMERIC => row
            .try_get::<_, Option<rust_decimal::Decimal>>(idx)?
            .map(Value::Numeric),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
            row.try_get::<_, Option<String>>(idx)?.map(Value::String)
        }
        Type::BYTEA => row.try_get::<_, Option<Vec<u8>>>(idx)?.map(Value::Bytes),
        Type::TIMESTAMP => row
            .try_get::<_, Option<chrono::NaiveDateTime>>(idx)?
            .map(Value::Timestamp),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)?
            .map(Value::TimestampTz),
        Type::DATE => row
            .try_get::<_, Option<chrono::NaiveDate>>(idx)?
            .map(Value::Date),
        ref other => return Err(Error::UnsupportedType(other.to_string())),
    };
    Ok(value.unwrap_or(Value::Null))
}
