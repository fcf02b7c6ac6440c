//! Row construction: extraction, filtering and projection of one record.

use crate::error::{ScanError, ScanResult};
use crate::expr::Expr;
use crate::extract::{Accessor, FieldExtractor};
use crate::row::Row;
use crate::table::ScanPlan;
use crate::value::Value;
use std::sync::Arc;

/// Turns a decoded `(key, value)` pair into an output row.
///
/// Only fields referenced by the projection or the filter are extracted;
/// the intermediate row keeps full table width with `Null` in the other
/// slots so filter column indices stay valid.
pub struct RowBuilder {
    /// (field index, accessor, nullable) for every referenced field
    extractions: Vec<(usize, Arc<Accessor>, bool)>,
    width: usize,
    projection: Vec<usize>,
    filter: Option<Expr>,
}

impl RowBuilder {
    pub fn new(plan: &ScanPlan, extractor: &FieldExtractor) -> ScanResult<Self> {
        let mut referenced: Vec<usize> = plan.projection().to_vec();
        if let Some(filter) = plan.filter() {
            filter.column_refs(&mut referenced);
        }
        referenced.sort_unstable();
        referenced.dedup();

        let fields = plan.table().fields();
        let extractions = referenced
            .into_iter()
            .map(|i| {
                let field = &fields[i];
                Ok((i, extractor.resolve(&field.name)?, field.nullable))
            })
            .collect::<ScanResult<Vec<_>>>()?;

        Ok(Self {
            extractions,
            width: plan.table().width(),
            projection: plan.projection().to_vec(),
            filter: plan.filter().cloned(),
        })
    }

    /// Build the output row, or `None` when the filter does not pass.
    pub fn build(&self, key: &Value, value: &Value) -> ScanResult<Option<Row>> {
        let mut row = vec![Value::Null; self.width];
        for (i, accessor, nullable) in &self.extractions {
            let extracted = accessor.extract(key, value);
            if extracted.is_null() && !nullable {
                return Err(ScanError::extraction(
                    accessor.path(),
                    "non-nullable field is absent",
                ));
            }
            row[*i] = extracted;
        }

        if let Some(filter) = &self.filter
            && filter.evaluate_predicate(&row)? != Some(true)
        {
            return Ok(None);
        }

        Ok(Some(Row::new(
            self.projection.iter().map(|&i| row[i].clone()).collect(),
        )))
    }

    /// Number of output columns.
    pub fn column_count(&self) -> usize {
        self.projection.len()
    }
}
