//! Sample standard deviation and volatility.
//!
//! STDDEV(n)[i] = sqrt((Σx² - (Σx)²/n) / (n - 1)) over the trailing window,
//! window elements clamped at the start of history. One pass per window,
//! Bessel-corrected. With n = 1 the divisor is zero and the result is NaN.

use super::transform::log_return;
use super::{check_period, derive, trailing};
use crate::domain::bar::Bar;
use crate::domain::context::RunContext;
use crate::domain::error::SeriesError;
use crate::domain::series::{canonical_name, FloatSeries};

pub const DEFAULT_STDDEV_PERIOD: usize = 10;

pub fn standard_deviation(
    ctx: &RunContext,
    series: &FloatSeries,
    n: usize,
) -> Result<FloatSeries, SeriesError> {
    check_period("stddev", n)?;
    let name = canonical_name("stddev", &[&series.name(), &n]);
    derive(ctx, name, series, move |bars| {
        let values: Vec<f64> = bars.iter().map(|b| b.value).collect();
        bars.iter()
            .enumerate()
            .map(|(i, b)| {
                let (sum, sum2) = trailing(&values, i, n)
                    .fold((0.0, 0.0), |(s, s2), v| (s + v, s2 + v * v));
                let variance = (sum2 - sum * sum / n as f64) / (n as f64 - 1.0);
                // rounding can push a flat window slightly negative
                let variance = if variance < 0.0 { 0.0 } else { variance };
                Bar::new(b.date, variance.sqrt())
            })
            .collect()
    })
}

/// Standard deviation of daily log returns.
pub fn volatility(
    ctx: &RunContext,
    series: &FloatSeries,
    n: usize,
) -> Result<FloatSeries, SeriesError> {
    check_period("volatility", n)?;
    let returns = log_return(ctx, series)?;
    standard_deviation(ctx, &returns, n)
}
