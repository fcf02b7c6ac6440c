//! Row-level expression evaluation with three-valued logic.
//!
//! `Value::Null` plays the role of SQL UNKNOWN: comparisons and arithmetic
//! involving NULL yield NULL, and AND/OR follow Kleene logic.

use crate::error::{ScanError, ScanResult};
use crate::value::Value;
use std::cmp::Ordering;

/// Expression over the table's field list. `Column(i)` indexes that list.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// 컬럼 참조
    Column(usize),
    /// 리터럴 값
    Literal(Value),
    /// 이항 연산
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    Not(Box<Expr>),
    /// IS NULL
    IsNull(Box<Expr>),
    /// IS NOT NULL
    IsNotNull(Box<Expr>),
    /// IN (...)
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
}

/// 이항 연산자
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // 산술
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    // 비교
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    // 논리
    And,
    Or,
}

impl Expr {
    pub fn col(index: usize) -> Self {
        Expr::Column(index)
    }

    pub fn lit(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn binary(self, op: BinaryOperator, right: Expr) -> Self {
        Expr::BinaryOp {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    pub fn eq(self, right: Expr) -> Self {
        self.binary(BinaryOperator::Eq, right)
    }

    pub fn gt(self, right: Expr) -> Self {
        self.binary(BinaryOperator::Gt, right)
    }

    pub fn lt(self, right: Expr) -> Self {
        self.binary(BinaryOperator::Lt, right)
    }

    pub fn and(self, right: Expr) -> Self {
        self.binary(BinaryOperator::And, right)
    }

    pub fn or(self, right: Expr) -> Self {
        self.binary(BinaryOperator::Or, right)
    }

    pub fn is_null(self) -> Self {
        Expr::IsNull(Box::new(self))
    }

    /// Append every referenced column index to `out`.
    pub fn column_refs(&self, out: &mut Vec<usize>) {
        match self {
            Expr::Column(i) => out.push(*i),
            Expr::Literal(_) => {}
            Expr::BinaryOp { left, right, .. } => {
                left.column_refs(out);
                right.column_refs(out);
            }
            Expr::Not(e) | Expr::IsNull(e) | Expr::IsNotNull(e) => e.column_refs(out),
            Expr::InList { expr, list, .. } => {
                expr.column_refs(out);
                for item in list {
                    item.column_refs(out);
                }
            }
        }
    }

    /// Evaluate against one intermediate row.
    pub fn evaluate(&self, row: &[Value]) -> ScanResult<Value> {
        match self {
            Expr::Column(idx) => row.get(*idx).cloned().ok_or_else(|| {
                ScanError::FilterEvaluation(format!(
                    "column index {} out of range ({})",
                    idx,
                    row.len()
                ))
            }),
            Expr::Literal(v) => Ok(v.clone()),
            Expr::BinaryOp { left, op, right } => {
                let l = left.evaluate(row)?;
                let r = right.evaluate(row)?;
                evaluate_binary_op(&l, *op, &r)
            }
            Expr::Not(e) => match e.evaluate(row)? {
                Value::Null => Ok(Value::Null),
                Value::Boolean(b) => Ok(Value::Boolean(!b)),
                other => Err(type_mismatch("Boolean", &other)),
            },
            Expr::IsNull(e) => Ok(Value::Boolean(e.evaluate(row)?.is_null())),
            Expr::IsNotNull(e) => Ok(Value::Boolean(!e.evaluate(row)?.is_null())),
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                let needle = expr.evaluate(row)?;
                if needle.is_null() {
                    return Ok(Value::Null);
                }
                let mut saw_null = false;
                for item in list {
                    match compare_eq(&needle, &item.evaluate(row)?)? {
                        Some(true) => return Ok(Value::Boolean(!negated)),
                        Some(false) => {}
                        None => saw_null = true,
                    }
                }
                if saw_null {
                    Ok(Value::Null)
                } else {
                    Ok(Value::Boolean(*negated))
                }
            }
        }
    }

    /// Evaluate as a predicate: `Some(b)` for a definite result, `None` for UNKNOWN.
    pub fn evaluate_predicate(&self, row: &[Value]) -> ScanResult<Option<bool>> {
        match self.evaluate(row)? {
            Value::Boolean(b) => Ok(Some(b)),
            Value::Null => Ok(None),
            other => Err(type_mismatch("Boolean", &other)),
        }
    }
}

fn type_mismatch(expected: &str, actual: &Value) -> ScanError {
    ScanError::TypeMismatch {
        expected: expected.to_string(),
        actual: actual.type_name().to_string(),
    }
}

/// Evaluate a binary operation on two scalars.
fn evaluate_binary_op(left: &Value, op: BinaryOperator, right: &Value) -> ScanResult<Value> {
    match op {
        BinaryOperator::Eq
        | BinaryOperator::NotEq
        | BinaryOperator::Lt
        | BinaryOperator::LtEq
        | BinaryOperator::Gt
        | BinaryOperator::GtEq => comparison_op(left, right, op),

        BinaryOperator::And | BinaryOperator::Or => logical_op(left, right, op),

        BinaryOperator::Plus
        | BinaryOperator::Minus
        | BinaryOperator::Multiply
        | BinaryOperator::Divide
        | BinaryOperator::Modulo => arithmetic_op(left, right, op),
    }
}

/// Ordering of two non-null scalars; Int64 ↔ Float64 promote to Float64.
fn compare(left: &Value, right: &Value) -> ScanResult<Option<Ordering>> {
    let ord = match (left, right) {
        (Value::Int64(l), Value::Int64(r)) => Some(l.cmp(r)),
        (Value::Float64(l), Value::Float64(r)) => l.partial_cmp(r),
        (Value::Int64(l), Value::Float64(r)) => (*l as f64).partial_cmp(r),
        (Value::Float64(l), Value::Int64(r)) => l.partial_cmp(&(*r as f64)),
        (Value::Utf8(l), Value::Utf8(r)) => Some(l.cmp(r)),
        (Value::Boolean(l), Value::Boolean(r)) => Some(l.cmp(r)),
        (Value::Bytes(l), Value::Bytes(r)) => Some(l.cmp(r)),
        (l, r) => {
            return Err(ScanError::TypeMismatch {
                expected: l.type_name().to_string(),
                actual: r.type_name().to_string(),
            });
        }
    };
    Ok(ord)
}

/// Equality with NULL → UNKNOWN. Nested values compare structurally.
fn compare_eq(left: &Value, right: &Value) -> ScanResult<Option<bool>> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => Ok(None),
        (Value::List(_), Value::List(_)) | (Value::Object(_), Value::Object(_)) => {
            Ok(Some(left == right))
        }
        _ => Ok(compare(left, right)?.map(|o| o == Ordering::Equal)),
    }
}

fn comparison_op(left: &Value, right: &Value, op: BinaryOperator) -> ScanResult<Value> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    let result = match op {
        BinaryOperator::Eq => compare_eq(left, right)?,
        BinaryOperator::NotEq => compare_eq(left, right)?.map(|b| !b),
        BinaryOperator::Lt => compare(left, right)?.map(Ordering::is_lt),
        BinaryOperator::LtEq => compare(left, right)?.map(Ordering::is_le),
        BinaryOperator::Gt => compare(left, right)?.map(Ordering::is_gt),
        BinaryOperator::GtEq => compare(left, right)?.map(Ordering::is_ge),
        other => return Err(misplaced(other, "comparison")),
    };
    // NaN comparisons are UNKNOWN.
    Ok(result.map_or(Value::Null, Value::Boolean))
}

/// Kleene AND/OR.
fn logical_op(left: &Value, right: &Value, op: BinaryOperator) -> ScanResult<Value> {
    let as_bool = |v: &Value| match v {
        Value::Null => Ok(None),
        Value::Boolean(b) => Ok(Some(*b)),
        other => Err(type_mismatch("Boolean", other)),
    };
    let (l, r) = (as_bool(left)?, as_bool(right)?);
    let result = match op {
        BinaryOperator::And => match (l, r) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        },
        BinaryOperator::Or => match (l, r) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        },
        other => return Err(misplaced(other, "logical")),
    };
    Ok(result.map_or(Value::Null, Value::Boolean))
}

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Int64(i) => Some(*i as f64),
        Value::Float64(f) => Some(*f),
        _ => None,
    }
}

/// Arithmetic on numeric scalars.
fn arithmetic_op(left: &Value, right: &Value, op: BinaryOperator) -> ScanResult<Value> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::Int64(l), Value::Int64(r)) => {
            let (l, r) = (*l, *r);
            let result = match op {
                BinaryOperator::Plus => l.checked_add(r),
                BinaryOperator::Minus => l.checked_sub(r),
                BinaryOperator::Multiply => l.checked_mul(r),
                BinaryOperator::Divide | BinaryOperator::Modulo if r == 0 => {
                    return Err(ScanError::FilterEvaluation("division by zero".to_string()));
                }
                BinaryOperator::Divide => l.checked_div(r),
                BinaryOperator::Modulo => l.checked_rem(r),
                other => return Err(misplaced(other, "arithmetic")),
            };
            result.map(Value::Int64).ok_or_else(|| {
                ScanError::FilterEvaluation(format!("integer overflow in {l} {op:?} {r}"))
            })
        }
        _ => {
            let (Some(l), Some(r)) = (as_f64(left), as_f64(right)) else {
                let bad = if as_f64(left).is_none() { left } else { right };
                return Err(type_mismatch("Int64|Float64", bad));
            };
            let result = match op {
                BinaryOperator::Plus => l + r,
                BinaryOperator::Minus => l - r,
                BinaryOperator::Multiply => l * r,
                BinaryOperator::Divide => l / r,
                BinaryOperator::Modulo => l % r,
                other => return Err(misplaced(other, "arithmetic")),
            };
            Ok(Value::Float64(result))
        }
    }
}

fn misplaced(op: BinaryOperator, kind: &str) -> ScanError {
    ScanError::InvalidOperation {
        message: format!("{op:?} is not a {kind} operator"),
        context: "expression evaluation".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Vec<Value> {
        vec![Value::from(10), Value::Null, Value::from("abc"), Value::from(2.5)]
    }

    #[test]
    fn comparison_with_null_is_unknown() {
        let e = Expr::col(1).gt(Expr::lit(5));
        assert_eq!(e.evaluate_predicate(&row()).unwrap(), None);
        let e = Expr::col(0).gt(Expr::lit(5));
        assert_eq!(e.evaluate_predicate(&row()).unwrap(), Some(true));
    }

    #[test]
    fn numeric_promotion() {
        let e = Expr::col(0).gt(Expr::col(3));
        assert_eq!(e.evaluate(&row()).unwrap(), Value::Boolean(true));
        let e = Expr::col(0).binary(BinaryOperator::Plus, Expr::col(3));
        assert_eq!(e.evaluate(&row()).unwrap(), Value::Float64(12.5));
    }

    #[test]
    fn kleene_logic() {
        let unknown = Expr::col(1).gt(Expr::lit(0));
        let t = Expr::lit(true);
        let f = Expr::lit(false);
        let r = row();
        assert_eq!(unknown.clone().and(f.clone()).evaluate_predicate(&r).unwrap(), Some(false));
        assert_eq!(unknown.clone().and(t.clone()).evaluate_predicate(&r).unwrap(), None);
        assert_eq!(unknown.clone().or(t).evaluate_predicate(&r).unwrap(), Some(true));
        assert_eq!(unknown.or(f).evaluate_predicate(&r).unwrap(), None);
    }

    #[test]
    fn type_mismatch_is_error() {
        let e = Expr::col(2).gt(Expr::lit(1));
        assert!(matches!(
            e.evaluate(&row()).unwrap_err(),
            ScanError::TypeMismatch { .. }
        ));
        let e = Expr::col(0);
        assert!(e.evaluate_predicate(&row()).is_err());
    }

    #[test]
    fn integer_division_by_zero() {
        let e = Expr::col(0).binary(BinaryOperator::Divide, Expr::lit(0));
        assert!(matches!(
            e.evaluate(&row()).unwrap_err(),
            ScanError::FilterEvaluation(_)
        ));
    }

    #[test]
    fn in_list_semantics() {
        let r = row();
        let hit = Expr::InList {
            expr: Box::new(Expr::col(0)),
            list: vec![Expr::lit(1), Expr::lit(10)],
            negated: false,
        };
        assert_eq!(hit.evaluate_predicate(&r).unwrap(), Some(true));

        let miss_with_null = Expr::InList {
            expr: Box::new(Expr::col(0)),
            list: vec![Expr::lit(1), Expr::Literal(Value::Null)],
            negated: true,
        };
        assert_eq!(miss_with_null.evaluate_predicate(&r).unwrap(), None);
    }

    #[test]
    fn column_refs_collects_all() {
        let e = Expr::col(2).eq(Expr::lit("x")).and(Expr::col(0).is_null());
        let mut refs = Vec::new();
        e.column_refs(&mut refs);
        assert_eq!(refs, vec![2, 0]);
    }

    #[test]
    fn arithmetic_on_text_is_mismatch() {
        let e = Expr::col(2).binary(BinaryOperator::Minus, Expr::lit(1));
        assert!(matches!(
            e.evaluate(&row()).unwrap_err(),
            ScanError::TypeMismatch { .. }
        ));
        let overflow = Expr::lit(i64::MAX).binary(BinaryOperator::Plus, Expr::lit(1));
        assert!(overflow.evaluate(&row()).is_err());
    }

    #[test]
    fn column_out_of_range() {
        assert!(matches!(
            Expr::col(9).evaluate(&row()).unwrap_err(),
            ScanError::FilterEvaluation(_)
        ));
    }
}
