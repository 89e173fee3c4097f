//! Trailing-window averages and extremes.

use super::{check_period, derive, trailing};
use crate::domain::bar::Bar;
use crate::domain::context::RunContext;
use crate::domain::error::SeriesError;
use crate::domain::series::{canonical_name, FloatSeries};

/// Simple moving average over `n` bars.
pub fn sma(ctx: &RunContext, series: &FloatSeries, n: usize) -> Result<FloatSeries, SeriesError> {
    check_period("sma", n)?;
    let name = canonical_name("sma", &[&series.name(), &n]);
    derive(ctx, name, series, move |bars| {
        let values: Vec<f64> = bars.iter().map(|b| b.value).collect();
        bars.iter()
            .enumerate()
            .map(|(i, b)| Bar::new(b.date, trailing(&values, i, n).sum::<f64>() / n as f64))
            .collect()
    })
}

/// Exponential moving average, alpha = 2 / (n + 1), seeded with the first value.
pub fn ema(ctx: &RunContext, series: &FloatSeries, n: usize) -> Result<FloatSeries, SeriesError> {
    check_period("ema", n)?;
    let name = canonical_name("ema", &[&series.name(), &n]);
    derive(ctx, name, series, move |bars| {
        let alpha = 2.0 / (n as f64 + 1.0);
        let mut out = Vec::with_capacity(bars.len());
        let mut prev: Option<f64> = None;
        for b in bars {
            let value = match prev {
                Some(p) => p + alpha * (b.value - p),
                None => b.value,
            };
            prev = Some(value);
            out.push(Bar::new(b.date, value));
        }
        out
    })
}

/// Highest value over `n` bars.
pub fn highest(ctx: &RunContext, series: &FloatSeries, n: usize) -> Result<FloatSeries, SeriesError> {
    check_period("highest", n)?;
    let name = canonical_name("highest", &[&series.name(), &n]);
    derive(ctx, name, series, move |bars| {
        let values: Vec<f64> = bars.iter().map(|b| b.value).collect();
        bars.iter()
            .enumerate()
            .map(|(i, b)| Bar::new(b.date, trailing(&values, i, n).fold(f64::NEG_INFINITY, f64::max)))
            .collect()
    })
}

/// Lowest value over `n` bars.
pub fn lowest(ctx: &RunContext, series: &FloatSeries, n: usize) -> Result<FloatSeries, SeriesError> {
    check_period("lowest", n)?;
    let name = canonical_name("lowest", &[&series.name(), &n]);
    derive(ctx, name, series, move |bars| {
        let values: Vec<f64> = bars.iter().map(|b| b.value).collect();
        bars.iter()
            .enumerate()
            .map(|(i, b)| Bar::new(b.date, trailing(&values, i, n).fold(f64::INFINITY, f64::min)))
            .collect()
    })
}
