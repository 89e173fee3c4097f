//! Elementwise arithmetic on float series.
//!
//! Series-series operations run over the left operand's dates; the right
//! operand is read with carry-forward at each of them (see
//! [`lookup`](crate::domain::lookup)). Division is unguarded: a zero divisor
//! yields the usual IEEE infinity or NaN.

use crate::domain::bar::Bar;
use crate::domain::context::RunContext;
use crate::domain::error::SeriesError;
use crate::domain::lookup::AlignedCursor;
use crate::domain::series::{canonical_name, FloatSeries};
use std::fmt;

/// Right-hand side of a binary operation.
#[derive(Debug, Clone)]
pub enum Operand {
    Series(FloatSeries),
    Constant(f64),
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Constant(value)
    }
}

impl From<&FloatSeries> for Operand {
    fn from(series: &FloatSeries) -> Self {
        Operand::Series(series.clone())
    }
}

impl From<FloatSeries> for Operand {
    fn from(series: FloatSeries) -> Self {
        Operand::Series(series)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Series(s) => f.write_str(s.name()),
            Operand::Constant(c) => write!(f, "{}", c),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Min,
    Max,
}

impl BinaryOp {
    pub fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            BinaryOp::Add => left + right,
            BinaryOp::Sub => left - right,
            BinaryOp::Mul => left * right,
            BinaryOp::Div => left / right,
            BinaryOp::Min => left.min(right),
            BinaryOp::Max => left.max(right),
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Min => "min",
            BinaryOp::Max => "max",
        }
    }
}

/// Applies `op` to `left` and `right`, cached under `op(left,right)`.
pub fn binary(
    ctx: &RunContext,
    op: BinaryOp,
    left: &FloatSeries,
    right: impl Into<Operand>,
) -> Result<FloatSeries, SeriesError> {
    let right = right.into();
    let name = canonical_name(op.symbol(), &[&left.name(), &right]);
    let left = left.clone();

    ctx.fetch(&name, move || {
        let lhs = left.upstream_data()?;
        match right {
            Operand::Constant(c) => Ok(lhs
                .iter()
                .map(|b| Bar::new(b.date, op.apply(b.value, c)))
                .collect()),
            Operand::Series(series) => {
                let rhs = series.upstream_data()?;
                let mut cursor = AlignedCursor::new(&rhs);
                lhs.iter()
                    .map(|b| -> Result<Bar<f64>, SeriesError> {
                        let r = cursor.value_at(b.date).ok_or_else(|| {
                            SeriesError::EmptySeries {
                                name: series.name().to_string(),
                            }
                        })?;
                        Ok(Bar::new(b.date, op.apply(b.value, r)))
                    })
                    .collect()
            }
        }
    })
}

/// Fluent forms of [`binary`].
impl FloatSeries {
    pub fn add(&self, ctx: &RunContext, rhs: impl Into<Operand>) -> Result<FloatSeries, SeriesError> {
        binary(ctx, BinaryOp::Add, self, rhs)
    }

    pub fn sub(&self, ctx: &RunContext, rhs: impl Into<Operand>) -> Result<FloatSeries, SeriesError> {
        binary(ctx, BinaryOp::Sub, self, rhs)
    }

    pub fn mul(&self, ctx: &RunContext, rhs: impl Into<Operand>) -> Result<FloatSeries, SeriesError> {
        binary(ctx, BinaryOp::Mul, self, rhs)
    }

    pub fn div(&self, ctx: &RunContext, rhs: impl Into<Operand>) -> Result<FloatSeries, SeriesError> {
        binary(ctx, BinaryOp::Div, self, rhs)
    }

    pub fn min(&self, ctx: &RunContext, rhs: impl Into<Operand>) -> Result<FloatSeries, SeriesError> {
        binary(ctx, BinaryOp::Min, self, rhs)
    }

    pub fn max(&self, ctx: &RunContext, rhs: impl Into<Operand>) -> Result<FloatSeries, SeriesError> {
        binary(ctx, BinaryOp::Max, self, rhs)
    }
}
