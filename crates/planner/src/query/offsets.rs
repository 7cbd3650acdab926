//! Keyset pagination over a stream's key columns.
//!
//! Pages are ordered ascending on the key tuple `(k1, .., kn)` and bounded by
//! a single lexicographic comparison per side:
//!
//! ```text
//! tuple(k) >  tuple(cursor)    k1 > c1 OR (k1 = c1 AND (k2 > c2 OR ...))
//! tuple(k) <= tuple(boundary)  k1 < b1 OR (k1 = b1 AND (... kn <= bn))
//! ```
//!
//! ANDing independent per-column inequalities is wrong for composite keys
//! and is never produced here.

use crate::{
    error::PlanError,
    query::{
        ast::{
            common::OrderDir,
            expr::{BinaryOperator, Expr},
            select::OrderByExpr,
        },
        builder::select::{FromState, SelectBuilder},
        eval::Evaluator,
        ident,
        ident::validate_identifier,
        value,
    },
};
use model::{
    core::value::Value,
    records::{key::KeyValues, row::RowData},
    stream::Stream,
};
use tracing::trace;

#[derive(Debug, Clone, PartialEq)]
pub enum PageFilter {
    /// No restriction. Used by single-pass scans and boundary capture.
    All,
    /// Rows strictly after the cursor (if any) and at or below the boundary.
    Range(Expr),
    /// Nothing can match because no boundary exists.
    Empty,
}

/// Filter and ordering for one page of a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct PagePredicate {
    pub filter: PageFilter,
    pub ordering: Vec<OrderByExpr>,
}

impl PagePredicate {
    /// Whole table, in whatever order the source returns it.
    pub fn unbounded() -> Self {
        PagePredicate {
            filter: PageFilter::All,
            ordering: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.filter == PageFilter::Empty
    }

    pub fn matches(&self, row: &RowData) -> bool {
        match &self.filter {
            PageFilter::All => true,
            PageFilter::Range(expr) => expr.matches(row),
            PageFilter::Empty => false,
        }
    }

    /// Applies the pagination logic (WHERE and ORDER BY) to a SelectBuilder.
    pub fn apply_to_builder(&self, mut builder: SelectBuilder<FromState>) -> SelectBuilder<FromState> {
        match &self.filter {
            PageFilter::All => {}
            PageFilter::Range(expr) => builder = builder.and_where(expr.clone()),
            PageFilter::Empty => builder = builder.and_where(never()),
        }

        for order in &self.ordering {
            builder = builder.order_by(order.expr.clone(), order.direction);
        }

        builder
    }
}

/// Plans keyset pages for one stream.
#[derive(Debug, Clone)]
pub struct KeysetOffset {
    key_columns: Vec<String>,
}

impl KeysetOffset {
    pub fn new(key_columns: Vec<String>) -> Result<Self, PlanError> {
        if key_columns.is_empty() {
            return Err(PlanError::EmptyKey);
        }
        for column in &key_columns {
            validate_identifier(column)?;
        }
        Ok(Self { key_columns })
    }

    pub fn for_stream(stream: &Stream) -> Result<Self, PlanError> {
        Self::new(stream.key_columns.clone())
    }

    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    /// Ascending lexicographic order on the key tuple.
    pub fn ordering(&self) -> Vec<OrderByExpr> {
        self.ordered(OrderDir::Asc)
    }

    /// Selects the single maximal row: descending on every key column, to be
    /// combined with `LIMIT 1` by the caller. This yields one coordinated
    /// tuple rather than independent per-column maxima.
    pub fn boundary_predicate(&self) -> PagePredicate {
        PagePredicate {
            filter: PageFilter::All,
            ordering: self.ordered(OrderDir::Desc),
        }
    }

    /// Builds the filter and ordering for the page after `cursor`, bounded by
    /// `boundary`. A missing boundary plans an empty page; a missing cursor
    /// leaves the lower end open.
    pub fn build_predicate(
        &self,
        boundary: Option<&KeyValues>,
        cursor: Option<&KeyValues>,
    ) -> Result<PagePredicate, PlanError> {
        let Some(boundary) = boundary else {
            return Ok(PagePredicate {
                filter: PageFilter::Empty,
                ordering: self.ordering(),
            });
        };

        trace!(keys = ?self.key_columns, ?boundary, ?cursor, "Planning keyset page");
        let upper = tuple_le(&self.key_columns, boundary)?;
        let filter = match cursor {
            Some(cursor) => tuple_gt(&self.key_columns, cursor)?.and(upper),
            None => upper,
        };

        Ok(PagePredicate {
            filter: PageFilter::Range(filter),
            ordering: self.ordering(),
        })
    }

    /// The cursor after emitting `row`.
    pub fn next_cursor(&self, row: &RowData) -> Option<KeyValues> {
        KeyValues::from_row(row, &self.key_columns)
    }

    fn ordered(&self, dir: OrderDir) -> Vec<OrderByExpr> {
        self.key_columns
            .iter()
            .map(|c| OrderByExpr {
                expr: ident(c),
                direction: Some(dir),
            })
            .collect()
    }
}

/// `tuple(keys) > tuple(values)` as one lexicographic expression.
pub fn tuple_gt(keys: &[String], values: &KeyValues) -> Result<Expr, PlanError> {
    let ordered = ordered_values(keys, values, "cursor")?;
    Ok(lexicographic(
        keys,
        &ordered,
        BinaryOperator::Gt,
        BinaryOperator::Gt,
    ))
}

/// `tuple(keys) <= tuple(values)` as one lexicographic expression.
pub fn tuple_le(keys: &[String], values: &KeyValues) -> Result<Expr, PlanError> {
    let ordered = ordered_values(keys, values, "boundary")?;
    Ok(lexicographic(
        keys,
        &ordered,
        BinaryOperator::Lt,
        BinaryOperator::LtEq,
    ))
}

fn ordered_values<'a>(
    keys: &[String],
    values: &'a KeyValues,
    tuple: &'static str,
) -> Result<Vec<&'a Value>, PlanError> {
    if keys.is_empty() {
        return Err(PlanError::EmptyKey);
    }
    keys.iter()
        .map(|k| {
            values.get(k).ok_or_else(|| PlanError::MissingKeyValue {
                tuple,
                column: k.clone(),
            })
        })
        .collect()
}

// Folds from the last column: acc = kn <last> vn, then for each earlier
// column acc = ki <lead> vi OR (ki = vi AND acc).
fn lexicographic(
    keys: &[String],
    values: &[&Value],
    lead: BinaryOperator,
    last: BinaryOperator,
) -> Expr {
    let n = keys.len();
    let mut acc = Expr::binary(ident(&keys[n - 1]), last, value(values[n - 1].clone()));

    for i in (0..n - 1).rev() {
        let strict = Expr::binary(ident(&keys[i]), lead, value(values[i].clone()));
        let tied = Expr::binary(ident(&keys[i]), BinaryOperator::Eq, value(values[i].clone()));
        acc = strict.or(tied.and(acc));
    }

    acc
}

/// Constant-false condition, bound as parameters like any other value.
fn never() -> Expr {
    Expr::binary(value(Value::Int(1)), BinaryOperator::Eq, value(Value::Int(0)))
}
