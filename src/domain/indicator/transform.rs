//! Field projections, pointwise transforms and grid resampling.

use super::derive;
use crate::domain::bar::{Bar, Ohlcv};
use crate::domain::context::RunContext;
use crate::domain::error::SeriesError;
use crate::domain::lookup::AlignedCursor;
use crate::domain::series::{canonical_name, AssetSeries, FloatSeries, SeriesValue, TimeSeries};

fn project(
    ctx: &RunContext,
    asset: &AssetSeries,
    field: &str,
    get: fn(&Ohlcv) -> f64,
) -> Result<FloatSeries, SeriesError> {
    let name = canonical_name(field, &[&asset.name()]);
    derive(ctx, name, asset, move |bars| {
        bars.iter().map(|b| Bar::new(b.date, get(&b.value))).collect()
    })
}

pub fn open(ctx: &RunContext, asset: &AssetSeries) -> Result<FloatSeries, SeriesError> {
    project(ctx, asset, "open", |b| b.open)
}

pub fn high(ctx: &RunContext, asset: &AssetSeries) -> Result<FloatSeries, SeriesError> {
    project(ctx, asset, "high", |b| b.high)
}

pub fn low(ctx: &RunContext, asset: &AssetSeries) -> Result<FloatSeries, SeriesError> {
    project(ctx, asset, "low", |b| b.low)
}

pub fn close(ctx: &RunContext, asset: &AssetSeries) -> Result<FloatSeries, SeriesError> {
    project(ctx, asset, "close", |b| b.close)
}

pub fn volume(ctx: &RunContext, asset: &AssetSeries) -> Result<FloatSeries, SeriesError> {
    project(ctx, asset, "volume", |b| b.volume)
}

fn pointwise(
    ctx: &RunContext,
    series: &FloatSeries,
    op: &str,
    f: fn(f64) -> f64,
) -> Result<FloatSeries, SeriesError> {
    let name = canonical_name(op, &[&series.name()]);
    derive(ctx, name, series, move |bars| {
        bars.iter().map(|b| Bar::new(b.date, f(b.value))).collect()
    })
}

pub fn abs(ctx: &RunContext, series: &FloatSeries) -> Result<FloatSeries, SeriesError> {
    pointwise(ctx, series, "abs", f64::abs)
}

pub fn sqrt(ctx: &RunContext, series: &FloatSeries) -> Result<FloatSeries, SeriesError> {
    pointwise(ctx, series, "sqrt", f64::sqrt)
}

pub fn square(ctx: &RunContext, series: &FloatSeries) -> Result<FloatSeries, SeriesError> {
    pointwise(ctx, series, "square", |v| v * v)
}

/// ln(value[t] / value[t-1]); the first bar compares with itself and is 0.
pub fn log_return(ctx: &RunContext, series: &FloatSeries) -> Result<FloatSeries, SeriesError> {
    let name = canonical_name("logret", &[&series.name()]);
    derive(ctx, name, series, |bars| {
        bars.iter()
            .enumerate()
            .map(|(i, b)| {
                let prev = bars[i.saturating_sub(1)].value;
                Bar::new(b.date, (b.value / prev).ln())
            })
            .collect()
    })
}

/// Re-expresses `series` on the run's date grid with carry-forward.
///
/// Grid dates before the first bar of `series` are dropped.
pub fn resample<T: SeriesValue>(
    ctx: &RunContext,
    series: &TimeSeries<T>,
) -> Result<TimeSeries<T>, SeriesError> {
    let name = canonical_name("resample", &[&series.name()]);
    let grid = ctx.grid().to_vec();
    let input = series.clone();
    ctx.fetch(&name, move || {
        let bars = input.upstream_data()?;
        let Some(first) = bars.first().map(|b| b.date) else {
            return Ok(Vec::new());
        };
        let mut cursor = AlignedCursor::new(&bars);
        Ok(grid
            .into_iter()
            .filter(|d| *d >= first)
            .filter_map(|d| cursor.value_at(d).map(|v| Bar::new(d, v)))
            .collect())
    })
}
