//! Rows and row batches exchanged between operators.

use crate::value::Value;
use std::ops::Index;

/// Fixed-width heap row. Column order is the producing operator's
/// projection order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Box<[Value]>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values: values.into_boxed_slice(),
        }
    }

    pub fn column_count(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values.into_vec()
    }
}

impl Index<usize> for Row {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.values[index]
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row::new(values)
    }
}

/// What an operator exposes after `advance`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RowBatch {
    /// No current row (before the first fetch, or after exhaustion).
    #[default]
    Empty,
    /// Exactly one row.
    Row(Row),
    /// Multiple rows, for consumers that pull whole batches.
    Rows(Vec<Row>),
}

impl RowBatch {
    pub fn row_count(&self) -> usize {
        match self {
            RowBatch::Empty => 0,
            RowBatch::Row(_) => 1,
            RowBatch::Rows(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        match self {
            RowBatch::Empty => None,
            RowBatch::Row(row) => (index == 0).then_some(row),
            RowBatch::Rows(rows) => rows.get(index),
        }
    }

    /// The single row of a one-row batch.
    pub fn as_row(&self) -> Option<&Row> {
        match self {
            RowBatch::Row(row) => Some(row),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        (0..self.row_count()).filter_map(move |i| self.row(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_access() {
        let row = Row::new(vec![Value::from(1), Value::from("a")]);
        assert_eq!(row.column_count(), 2);
        assert_eq!(row[1], Value::from("a"));
        assert_eq!(row.get(2), None);
    }

    #[test]
    fn batch_shapes() {
        assert!(RowBatch::Empty.is_empty());
        assert_eq!(RowBatch::default(), RowBatch::Empty);

        let one = RowBatch::Row(Row::new(vec![Value::from(1)]));
        assert_eq!(one.row_count(), 1);
        assert!(one.row(1).is_none());
        assert!(one.as_row().is_some());

        let many = RowBatch::Rows(vec![Row::new(vec![]), Row::new(vec![])]);
        assert_eq!(many.iter().count(), 2);
        assert!(many.as_row().is_none());
    }
}
