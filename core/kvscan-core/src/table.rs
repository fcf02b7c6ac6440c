//! Table descriptors and scan plans: the fixed inputs of a scan operator.

use crate::error::{ScanError, ScanResult};
use crate::expr::Expr;

/// One field of a table: its attribute path and nullability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub nullable: bool,
}

/// Table identity plus its ordered field list.
///
/// Field names are attribute paths (`__key`, `__key.id`, `this`, `a.b[0]`);
/// the path decides whether a field is read from the key or the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    id: String,
    fields: Vec<FieldDescriptor>,
}

impl TableDescriptor {
    /// Table whose fields are all nullable.
    pub fn new<I, S>(id: impl Into<String>, field_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            fields: field_names
                .into_iter()
                .map(|name| FieldDescriptor {
                    name: name.into(),
                    nullable: true,
                })
                .collect(),
        }
    }

    /// Mark `name` as non-nullable.
    pub fn with_required(mut self, name: &str) -> ScanResult<Self> {
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.name == name)
            .ok_or_else(|| ScanError::InvalidArguments(format!("unknown field '{name}'")))?;
        field.nullable = false;
        Ok(self)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn width(&self) -> usize {
        self.fields.len()
    }
}

/// Everything a scan needs besides its record feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPlan {
    table: TableDescriptor,
    projection: Vec<usize>,
    filter: Option<Expr>,
}

impl ScanPlan {
    /// Validates projection and filter column indices against the field list.
    pub fn new(table: TableDescriptor, projection: Vec<usize>, filter: Option<Expr>) -> ScanResult<Self> {
        let width = table.width();
        if let Some(bad) = projection.iter().find(|&&i| i >= width) {
            return Err(ScanError::InvalidArguments(format!(
                "projection index {bad} out of range ({width} fields in '{}')",
                table.id()
            )));
        }
        if let Some(filter) = &filter {
            let mut refs = Vec::new();
            filter.column_refs(&mut refs);
            if let Some(bad) = refs.iter().find(|&&i| i >= width) {
                return Err(ScanError::InvalidArguments(format!(
                    "filter column {bad} out of range ({width} fields in '{}')",
                    table.id()
                )));
            }
        }
        Ok(Self {
            table,
            projection,
            filter,
        })
    }

    /// Plan projecting every field in table order, without a filter.
    pub fn full(table: TableDescriptor) -> Self {
        let projection = (0..table.width()).collect();
        Self {
            table,
            projection,
            filter: None,
        }
    }

    pub fn table(&self) -> &TableDescriptor {
        &self.table
    }

    pub fn projection(&self) -> &[usize] {
        &self.projection
    }

    pub fn filter(&self) -> Option<&Expr> {
        self.filter.as_ref()
    }

    /// Output column names in projection order.
    pub fn output_names(&self) -> Vec<String> {
        self.projection
            .iter()
            .map(|&i| self.table.fields[i].name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_validated() {
        let table = TableDescriptor::new("t", ["a", "b"]);
        assert!(ScanPlan::new(table.clone(), vec![1, 0], None).is_ok());
        assert!(matches!(
            ScanPlan::new(table, vec![2], None),
            Err(ScanError::InvalidArguments(_))
        ));
    }

    #[test]
    fn filter_columns_validated() {
        let table = TableDescriptor::new("t", ["a"]);
        let filter = Expr::col(3).gt(Expr::lit(1));
        assert!(ScanPlan::new(table, vec![0], Some(filter)).is_err());
    }

    #[test]
    fn required_fields() {
        let table = TableDescriptor::new("t", ["__key", "name"])
            .with_required("__key")
            .unwrap();
        assert!(!table.fields()[0].nullable);
        assert!(table.fields()[1].nullable);
        assert!(TableDescriptor::new("t", ["a"]).with_required("zzz").is_err());
    }

    #[test]
    fn output_names_follow_projection() {
        let plan = ScanPlan::new(TableDescriptor::new("t", ["a", "b", "c"]), vec![2, 0], None).unwrap();
        assert_eq!(plan.output_names(), vec!["c", "a"]);
        assert_eq!(ScanPlan::full(TableDescriptor::new("t", ["a", "b"])).projection(), &[0, 1]);
    }
}
