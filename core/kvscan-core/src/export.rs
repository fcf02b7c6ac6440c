//! Arrow export: turns buffered rows into a columnar `RecordBatch`.
//!
//! Column types are inferred from the first non-null value in each column.
//! Lists and objects are rendered as JSON text.

use crate::error::{ScanError, ScanResult};
use crate::row::{Row, RowBatch};
use crate::value::Value;
use arrow::array::{
    ArrayRef, BinaryBuilder, BooleanBuilder, Float64Builder, Int64Builder, NullArray,
    StringBuilder,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use arrow::util::pretty::pretty_format_batches;
use std::sync::Arc;

/// Convert rows sharing one shape into a `RecordBatch` named by `names`.
pub fn rows_to_record_batch(names: &[String], rows: &[Row]) -> ScanResult<RecordBatch> {
    if let Some(bad) = rows.iter().find(|r| r.column_count() != names.len()) {
        return Err(ScanError::InvalidArguments(format!(
            "expected {} columns, got {}",
            names.len(),
            bad.column_count()
        )));
    }

    let mut fields = Vec::with_capacity(names.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(names.len());
    for (col_idx, name) in names.iter().enumerate() {
        let data_type = infer_type(rows, col_idx);
        columns.push(build_column(rows, col_idx, &data_type)?);
        fields.push(Field::new(name, data_type, true));
    }

    let options = RecordBatchOptions::new().with_row_count(Some(rows.len()));
    Ok(RecordBatch::try_new_with_options(
        Arc::new(Schema::new(fields)),
        columns,
        &options,
    )?)
}

/// Convert whatever a [`RowBatch`] holds.
pub fn row_batch_to_record_batch(names: &[String], batch: &RowBatch) -> ScanResult<RecordBatch> {
    match batch {
        RowBatch::Empty => rows_to_record_batch(names, &[]),
        RowBatch::Row(row) => rows_to_record_batch(names, std::slice::from_ref(row)),
        RowBatch::Rows(rows) => rows_to_record_batch(names, rows),
    }
}

/// Render rows as an ASCII table, for logs and debugging.
pub fn format_rows(names: &[String], rows: &[Row]) -> ScanResult<String> {
    let batch = rows_to_record_batch(names, rows)?;
    Ok(pretty_format_batches(&[batch])?.to_string())
}

fn infer_type(rows: &[Row], col_idx: usize) -> DataType {
    rows.iter()
        .map(|r| &r[col_idx])
        .find(|v| !v.is_null())
        .map_or(DataType::Null, |v| match v {
            Value::Boolean(_) => DataType::Boolean,
            Value::Int64(_) => DataType::Int64,
            Value::Float64(_) => DataType::Float64,
            Value::Bytes(_) => DataType::Binary,
            Value::Utf8(_) | Value::List(_) | Value::Object(_) => DataType::Utf8,
            Value::Null => DataType::Null,
        })
}

fn mismatch(expected: &str, actual: &Value) -> ScanError {
    ScanError::TypeMismatch {
        expected: expected.to_string(),
        actual: actual.type_name().to_string(),
    }
}

/// Build a single column array from row data.
fn build_column(rows: &[Row], col_idx: usize, data_type: &DataType) -> ScanResult<ArrayRef> {
    match data_type {
        DataType::Boolean => {
            let mut builder = BooleanBuilder::with_capacity(rows.len());
            for row in rows {
                match &row[col_idx] {
                    Value::Boolean(v) => builder.append_value(*v),
                    Value::Null => builder.append_null(),
                    other => return Err(mismatch("Boolean", other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        DataType::Int64 => {
            let mut builder = Int64Builder::with_capacity(rows.len());
            for row in rows {
                match &row[col_idx] {
                    Value::Int64(v) => builder.append_value(*v),
                    Value::Null => builder.append_null(),
                    other => return Err(mismatch("Int64", other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        DataType::Float64 => {
            let mut builder = Float64Builder::with_capacity(rows.len());
            for row in rows {
                match &row[col_idx] {
                    Value::Float64(v) => builder.append_value(*v),
                    Value::Null => builder.append_null(),
                    other => return Err(mismatch("Float64", other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        DataType::Binary => {
            let mut builder = BinaryBuilder::with_capacity(rows.len(), 256);
            for row in rows {
                match &row[col_idx] {
                    Value::Bytes(v) => builder.append_value(v),
                    Value::Null => builder.append_null(),
                    other => return Err(mismatch("Bytes", other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        DataType::Utf8 => {
            let mut builder = StringBuilder::with_capacity(rows.len(), 256);
            for row in rows {
                match &row[col_idx] {
                    Value::Utf8(v) => builder.append_value(v),
                    Value::Null => builder.append_null(),
                    nested @ (Value::List(_) | Value::Object(_)) => {
                        builder.append_value(serde_json::to_string(&nested.to_json())?)
                    }
                    other => return Err(mismatch("Utf8", other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        _ => Ok(Arc::new(NullArray::new(rows.len()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, AsArray};
    use arrow::datatypes::Int64Type;

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn infers_types_and_nulls() {
        let rows = vec![
            Row::new(vec![Value::Null, Value::from("a"), Value::Null]),
            Row::new(vec![Value::from(2), Value::from("b"), Value::Null]),
        ];
        let batch = rows_to_record_batch(&names(&["n", "s", "z"]), &rows).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema().field(0).data_type(), &DataType::Int64);
        assert_eq!(batch.schema().field(2).data_type(), &DataType::Null);

        let ints = batch.column(0).as_primitive::<Int64Type>();
        assert!(ints.is_null(0));
        assert_eq!(ints.value(1), 2);
        assert_eq!(batch.column(1).as_string::<i32>().value(1), "b");
    }

    #[test]
    fn nested_values_render_as_json() {
        let rows = vec![Row::new(vec![Value::object([("x", Value::from(1))])])];
        let batch = rows_to_record_batch(&names(&["o"]), &rows).unwrap();
        assert_eq!(batch.column(0).as_string::<i32>().value(0), r#"{"x":1}"#);
    }

    #[test]
    fn mixed_column_types_fail() {
        let rows = vec![
            Row::new(vec![Value::from(1)]),
            Row::new(vec![Value::from("x")]),
        ];
        assert!(matches!(
            rows_to_record_batch(&names(&["c"]), &rows),
            Err(ScanError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn empty_batch_and_single_row() {
        let batch = row_batch_to_record_batch(&names(&["a"]), &RowBatch::Empty).unwrap();
        assert_eq!(batch.num_rows(), 0);

        let one = RowBatch::Row(Row::new(vec![Value::from(true)]));
        let batch = row_batch_to_record_batch(&names(&["a"]), &one).unwrap();
        assert_eq!(batch.num_rows(), 1);
        assert!(batch.column(0).as_boolean().value(0));
    }

    #[test]
    fn pretty_table_lists_values() {
        let rows = vec![
            Row::new(vec![Value::from(1), Value::from("ann")]),
            Row::new(vec![Value::from(2), Value::Null]),
        ];
        let table = format_rows(&names(&["id", "name"]), &rows).unwrap();
        assert!(table.contains("| id | name |"));
        assert!(table.contains("ann"));
    }

    #[test]
    fn width_mismatch_rejected() {
        let rows = vec![Row::new(vec![Value::from(1)])];
        assert!(rows_to_record_batch(&names(&["a", "b"]), &rows).is_err());
    }
}
