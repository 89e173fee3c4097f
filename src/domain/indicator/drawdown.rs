//! Drawdown from the trailing high, and the Ulcer Index built on it.

use super::average::sma;
use super::transform::{sqrt, square};
use super::{check_period, derive, trailing};
use crate::domain::bar::Bar;
use crate::domain::context::RunContext;
use crate::domain::error::SeriesError;
use crate::domain::series::{canonical_name, FloatSeries};

/// 1 - value / highest(value, period).
pub fn drawdown(
    ctx: &RunContext,
    series: &FloatSeries,
    period: usize,
) -> Result<FloatSeries, SeriesError> {
    check_period("drawdown", period)?;
    let name = canonical_name("drawdown", &[&series.name(), &period]);
    derive(ctx, name, series, move |bars| {
        let values: Vec<f64> = bars.iter().map(|b| b.value).collect();
        bars.iter()
            .enumerate()
            .map(|(i, b)| {
                let peak = trailing(&values, i, period).fold(f64::NEG_INFINITY, f64::max);
                Bar::new(b.date, 1.0 - b.value / peak)
            })
            .collect()
    })
}

/// sqrt(sma(drawdown(period)², period))
pub fn ulcer_index(
    ctx: &RunContext,
    series: &FloatSeries,
    period: usize,
) -> Result<FloatSeries, SeriesError> {
    check_period("ulcer", period)?;
    let dd = drawdown(ctx, series, period)?;
    let mean_square = sma(ctx, &square(ctx, &dd)?, period)?;
    sqrt(ctx, &mean_square)
}
