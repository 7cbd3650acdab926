//! In-memory evaluation of filter expressions against a row, with SQL
//! three-valued logic: comparisons involving NULL or incomparable values are
//! unknown, and unknown never satisfies a filter.

use crate::query::ast::expr::{BinaryOp, BinaryOperator, Expr};
use model::{core::value::Value, records::row::RowData};
use std::cmp::Ordering;

pub trait Evaluator {
    /// Evaluates to a value, or `None` when the result is unknown.
    fn evaluate(&self, row: &RowData) -> Option<Value>;

    /// True only when the expression is definitely true for `row`.
    fn matches(&self, row: &RowData) -> bool {
        matches!(self.evaluate(row), Some(Value::Boolean(true)))
    }
}

impl Evaluator for Expr {
    fn evaluate(&self, row: &RowData) -> Option<Value> {
        match self {
            Expr::Identifier(ident) => match row.get_value(&ident.name) {
                Value::Null => None,
                value => Some(value),
            },
            Expr::Value(Value::Null) => None,
            Expr::Value(value) => Some(value.clone()),
            Expr::BinaryOp(op) => op.evaluate(row),
        }
    }
}

impl Evaluator for BinaryOp {
    fn evaluate(&self, row: &RowData) -> Option<Value> {
        if self.op.is_logical() {
            let left = as_bool(self.left.evaluate(row));
            let right = as_bool(self.right.evaluate(row));
            return logical(self.op, left, right).map(Value::Boolean);
        }

        let left = self.left.evaluate(row)?;
        let right = self.right.evaluate(row)?;
        let ord = left.compare(&right)?;

        let result = match self.op {
            BinaryOperator::Eq => ord == Ordering::Equal,
            BinaryOperator::NotEq => ord != Ordering::Equal,
            BinaryOperator::Lt => ord == Ordering::Less,
            BinaryOperator::LtEq => ord != Ordering::Greater,
            BinaryOperator::Gt => ord == Ordering::Greater,
            BinaryOperator::GtEq => ord != Ordering::Less,
            BinaryOperator::And | BinaryOperator::Or => unreachable!("handled above"),
        };
        Some(Value::Boolean(result))
    }
}

fn as_bool(value: Option<Value>) -> Option<bool> {
    match value {
        Some(Value::Boolean(b)) => Some(b),
        _ => None,
    }
}

fn logical(op: BinaryOperator, left: Option<bool>, right: Option<bool>) -> Option<bool> {
    match op {
        BinaryOperator::And => match (left, right) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        },
        BinaryOperator::Or => match (left, right) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{ident, value};
    use model::core::value::FieldValue;

    fn row(id: Value) -> RowData {
        RowData::new("t", vec![FieldValue::new("id", id)])
    }

    #[test]
    fn comparison_against_null_is_unknown() {
        let gt = Expr::binary(ident("id"), BinaryOperator::Gt, value(Value::Int(1)));
        assert_eq!(gt.evaluate(&row(Value::Null)), None);
        assert!(!gt.matches(&row(Value::Null)));
        assert!(gt.matches(&row(Value::Int(2))));
    }

    #[test]
    fn unknown_or_true_is_true() {
        let unknown = Expr::binary(ident("missing"), BinaryOperator::Eq, value(Value::Int(1)));
        let yes = Expr::binary(ident("id"), BinaryOperator::Eq, value(Value::Int(5)));
        let no = Expr::binary(ident("id"), BinaryOperator::Eq, value(Value::Int(6)));

        let r = row(Value::Int(5));
        assert!(unknown.clone().or(yes.clone()).matches(&r));
        assert_eq!(unknown.clone().and(yes).evaluate(&r), None);
        assert_eq!(
            unknown.and(no).evaluate(&r),
            Some(Value::Boolean(false))
        );
    }
}
